use anyhow::{Context, Result};
use clap::Parser;
use image::ImageReader;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use uv_align::{fit_dimensions, render_aligned, Cli, UvAlignment};

#[derive(Serialize)]
struct Report {
    scale: f64,
    rotation_degrees: f64,
    translation: [f64; 2],
    matrix: [[f64; 3]; 3],
    plane_eyes_uv: [[f64; 2]; 2],
    photo_eyes_uv: [[f64; 2]; 2],
    /// Plane UV corners (0,0), (1,0), (1,1), (0,1) in photo UV
    uv_corners: [[f64; 2]; 4],
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Load photo if given
    let photo = match &cli.photo {
        Some(path) => {
            let img = ImageReader::open(path)
                .with_context(|| format!("Failed to open photo: {:?}", path))?
                .decode()
                .with_context(|| format!("Failed to decode photo: {:?}", path))?;
            info!(path = ?path, width = img.width(), height = img.height(), "loaded photo");
            Some(img)
        }
        None => None,
    };

    let config = cli.alignment_config(photo.as_ref().map(|img| (img.width(), img.height())))?;
    let plane = config.plane.landmarks().context("Invalid plane frame")?;
    let target = config.photo.landmarks().context("Invalid photo frame")?;

    let alignment = UvAlignment::fit(&plane, &target).context("Failed to fit alignment")?;
    let transform = alignment.transform;

    let (plane_left, plane_right) = plane.normalized()?;
    let (photo_left, photo_right) = target.normalized()?;
    let m = transform.matrix();

    let report = Report {
        scale: transform.scale(),
        rotation_degrees: transform.rotation_degrees(),
        translation: [transform.tx, transform.ty],
        matrix: [
            [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
            [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
            [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
        ],
        plane_eyes_uv: [[plane_left.x, plane_left.y], [plane_right.x, plane_right.y]],
        photo_eyes_uv: [[photo_left.x, photo_left.y], [photo_right.x, photo_right.y]],
        uv_corners: alignment.corners().map(|c| [c.x, c.y]),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if let (Some(output_path), Some(img)) = (&cli.render, &photo) {
        let (width, height) = fit_dimensions(config.plane.width, config.plane.height, cli.size);
        let preview = render_aligned(&img.to_rgba8(), &alignment, width, height);
        preview
            .save(output_path)
            .with_context(|| format!("Failed to save preview: {:?}", output_path))?;
        info!(path = ?output_path, width, height, "saved aligned preview");
    }

    Ok(())
}

fn print_report(report: &Report) {
    println!("Scale:       {:.6}", report.scale);
    println!("Rotation:    {:.3}°", report.rotation_degrees);
    println!(
        "Translation: ({:.6}, {:.6})",
        report.translation[0], report.translation[1]
    );
    println!();
    println!("Transform matrix:");
    for row in &report.matrix {
        println!("  [{:10.6}, {:10.6}, {:10.6}]", row[0], row[1], row[2]);
    }
    println!();
    println!("Eyes (plane UV -> photo UV):");
    for (name, (plane, photo)) in ["left", "right"]
        .iter()
        .zip(report.plane_eyes_uv.iter().zip(&report.photo_eyes_uv))
    {
        println!(
            "  {:<5} ({:.4}, {:.4}) -> ({:.4}, {:.4})",
            name, plane[0], plane[1], photo[0], photo[1]
        );
    }
    println!();
    println!("UV corners:");
    for (label, corner) in ["(0,0)", "(1,0)", "(1,1)", "(0,1)"].iter().zip(&report.uv_corners) {
        println!("  {} -> ({:.6}, {:.6})", label, corner[0], corner[1]);
    }
}
