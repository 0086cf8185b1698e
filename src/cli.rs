use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::config::{AlignmentConfig, FrameConfig};
use crate::normalize::{Origin, VerticalAxis};

#[derive(Parser, Debug)]
#[command(name = "uv-align")]
#[command(version, about = "Align a face photo onto a plane's UV map from two eye landmarks")]
pub struct Cli {
    /// Landmark configuration (TOML); cannot be combined with the --plane-* and --photo-* flags
    #[arg(
        short,
        long,
        conflicts_with_all = [
            "plane_size", "plane_left", "plane_right", "plane_origin", "plane_vertical",
            "photo_size", "photo_left", "photo_right", "photo_origin", "photo_vertical",
        ]
    )]
    pub config: Option<PathBuf>,

    /// Plane size in local units (e.g. "9.42782:9.42782")
    #[arg(long, value_parser = parse_size)]
    pub plane_size: Option<(f64, f64)>,

    /// Left eye on the plane, local units ("X,Y")
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    pub plane_left: Option<[f64; 2]>,

    /// Right eye on the plane, local units ("X,Y")
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    pub plane_right: Option<[f64; 2]>,

    /// Where the plane's local origin sits
    #[arg(long, value_enum, default_value = "center")]
    pub plane_origin: Origin,

    /// Direction of the plane's vertical local axis
    #[arg(long, value_enum, default_value = "down")]
    pub plane_vertical: VerticalAxis,

    /// Photo size in pixels ("W:H"); read from --photo when omitted
    #[arg(long, value_parser = parse_size)]
    pub photo_size: Option<(f64, f64)>,

    /// Left eye on the photo, pixels ("X,Y")
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    pub photo_left: Option<[f64; 2]>,

    /// Right eye on the photo, pixels ("X,Y")
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    pub photo_right: Option<[f64; 2]>,

    #[arg(long, value_enum, default_value = "top-left")]
    pub photo_origin: Origin,

    #[arg(long, value_enum, default_value = "down")]
    pub photo_vertical: VerticalAxis,

    /// Photo image, used for its size and for --render
    #[arg(short, long)]
    pub photo: Option<PathBuf>,

    /// Write a preview of the photo on the aligned plane to this PNG
    #[arg(short, long, requires = "photo")]
    pub render: Option<PathBuf>,

    /// Preview size (longest side in pixels)
    #[arg(
        short,
        long,
        default_value = "512",
        value_parser = clap::value_parser!(u32).range(1..=16384)
    )]
    pub size: u32,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Show debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Landmarks from --config, or assembled from the individual flags
    ///
    /// `photo_dimensions` fills in a missing --photo-size.
    pub fn alignment_config(&self, photo_dimensions: Option<(u32, u32)>) -> Result<AlignmentConfig> {
        if let Some(path) = &self.config {
            return AlignmentConfig::load(path)
                .with_context(|| format!("Failed to load landmark config: {:?}", path));
        }

        let (plane_width, plane_height) = require(self.plane_size, "--plane-size")?;
        let (photo_width, photo_height) = match (self.photo_size, photo_dimensions) {
            (Some(size), _) => size,
            (None, Some((w, h))) => (w as f64, h as f64),
            (None, None) => bail!("--photo-size or --photo is required without --config"),
        };

        let config = AlignmentConfig {
            plane: FrameConfig {
                width: plane_width,
                height: plane_height,
                origin: self.plane_origin,
                vertical: self.plane_vertical,
                left: require(self.plane_left, "--plane-left")?,
                right: require(self.plane_right, "--plane-right")?,
            },
            photo: FrameConfig {
                width: photo_width,
                height: photo_height,
                origin: self.photo_origin,
                vertical: self.photo_vertical,
                left: require(self.photo_left, "--photo-left")?,
                right: require(self.photo_right, "--photo-right")?,
            },
        };
        Ok(config)
    }
}

fn require<T>(value: Option<T>, flag: &str) -> Result<T> {
    value.with_context(|| format!("{} is required without --config", flag))
}

fn parse_size(s: &str) -> Result<(f64, f64), String> {
    let parts: Vec<&str> = s.split([':', 'x']).collect();
    if parts.len() != 2 {
        return Err(format!("Invalid size format '{}', expected W:H", s));
    }

    let width: f64 = parts[0]
        .trim()
        .parse()
        .map_err(|_| format!("Invalid width value: {}", parts[0]))?;
    let height: f64 = parts[1]
        .trim()
        .parse()
        .map_err(|_| format!("Invalid height value: {}", parts[1]))?;

    if !(width > 0.0 && height > 0.0) {
        return Err("Size values must be positive".to_string());
    }

    Ok((width, height))
}

fn parse_point(s: &str) -> Result<[f64; 2], String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 2 {
        return Err(format!("Invalid point format '{}', expected X,Y", s));
    }

    let x: f64 = parts[0]
        .trim()
        .parse()
        .map_err(|_| format!("Invalid x value: {}", parts[0]))?;
    let y: f64 = parts[1]
        .trim()
        .parse()
        .map_err(|_| format!("Invalid y value: {}", parts[1]))?;

    if !x.is_finite() || !y.is_finite() {
        return Err(format!("Point '{}' must be finite", s));
    }

    Ok([x, y])
}
