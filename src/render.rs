use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::alignment::UvAlignment;
use crate::geometry::Point2D;

/// Premultiply alpha: RGB values are multiplied by alpha
fn premultiply_alpha(img: &RgbaImage) -> Vec<[f64; 4]> {
    img.pixels()
        .map(|pixel| {
            let alpha = pixel[3] as f64 / 255.0;
            [
                pixel[0] as f64 * alpha,
                pixel[1] as f64 * alpha,
                pixel[2] as f64 * alpha,
                pixel[3] as f64,
            ]
        })
        .collect()
}

/// Unpremultiply alpha: divide RGB by alpha
fn unpremultiply_alpha(premultiplied: [f64; 4]) -> Rgba<u8> {
    let alpha = premultiplied[3];
    if alpha < 1.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let alpha_norm = alpha / 255.0;
    let channel = |v: f64| v.round().clamp(0.0, 255.0) as u8;

    Rgba([
        channel(premultiplied[0] / alpha_norm),
        channel(premultiplied[1] / alpha_norm),
        channel(premultiplied[2] / alpha_norm),
        channel(alpha),
    ])
}

/// Cubic interpolation kernel (Catmull-Rom)
fn cubic_weight(t: f64) -> [f64; 4] {
    let t2 = t * t;
    let t3 = t2 * t;

    [
        -0.5 * t3 + t2 - 0.5 * t,
        1.5 * t3 - 2.5 * t2 + 1.0,
        -1.5 * t3 + 2.0 * t2 + 0.5 * t,
        0.5 * t3 - 0.5 * t2,
    ]
}

/// Bicubic interpolation at a pixel-space position, edges clamped
fn bicubic_interpolate(
    premultiplied: &[[f64; 4]],
    width: u32,
    height: u32,
    x: f64,
    y: f64,
) -> [f64; 4] {
    let x_floor = x.floor() as i64;
    let y_floor = y.floor() as i64;

    let wx = cubic_weight(x - x.floor());
    let wy = cubic_weight(y - y.floor());

    let mut result = [0.0; 4];

    for (j, weight_y) in wy.iter().enumerate() {
        let py = (y_floor + j as i64 - 1).clamp(0, height as i64 - 1) as u32;
        for (i, weight_x) in wx.iter().enumerate() {
            let px = (x_floor + i as i64 - 1).clamp(0, width as i64 - 1) as u32;
            let idx = (py * width + px) as usize;

            let weight = weight_x * weight_y;
            for (acc, value) in result.iter_mut().zip(premultiplied[idx]) {
                *acc += value * weight;
            }
        }
    }

    result
}

/// Render the photo as it appears on the plane once its UV map is aligned
///
/// Every output pixel is a plane UV coordinate (row 0 is the top edge, `v = 1`).
/// It is mapped through `alignment` into photo UV and sampled from `photo`.
/// Plane texels whose photo UV falls outside `[0, 1]` stay transparent.
pub fn render_aligned(
    photo: &RgbaImage,
    alignment: &UvAlignment,
    width: u32,
    height: u32,
) -> RgbaImage {
    let (photo_width, photo_height) = photo.dimensions();
    let mut output = RgbaImage::new(width, height);

    if photo_width == 0 || photo_height == 0 {
        return output;
    }

    debug!(photo_width, photo_height, width, height, "rendering aligned texture");

    // Pre-multiply alpha for correct interpolation
    let premultiplied = premultiply_alpha(photo);

    for (out_x, out_y, pixel) in output.enumerate_pixels_mut() {
        let uv = Point2D::new(
            (out_x as f64 + 0.5) / width as f64,
            1.0 - (out_y as f64 + 0.5) / height as f64,
        );
        let photo_uv = alignment.map_uv(uv);

        if !(0.0..=1.0).contains(&photo_uv.x) || !(0.0..=1.0).contains(&photo_uv.y) {
            continue;
        }

        let src_x = photo_uv.x * photo_width as f64 - 0.5;
        let src_y = (1.0 - photo_uv.y) * photo_height as f64 - 0.5;
        let interpolated =
            bicubic_interpolate(&premultiplied, photo_width, photo_height, src_x, src_y);
        *pixel = unpremultiply_alpha(interpolated);
    }

    output
}

/// Output dimensions whose longest side equals `longest`, keeping the frame's aspect ratio
pub fn fit_dimensions(width: f64, height: f64, longest: u32) -> (u32, u32) {
    let scale = longest as f64 / width.max(height);
    (
        ((width * scale).round() as u32).max(1),
        ((height * scale).round() as u32).max(1),
    )
}
