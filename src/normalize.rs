//! Conversion between raw frame coordinates and normalized UV.
//!
//! UV follows texture conventions: `(0, 0)` is the bottom-left corner and
//! `(1, 1)` the top-right. Raw frames differ in where their origin sits and
//! which way their vertical axis points; [`NormalizationFrame`] records both.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{AlignError, Result};
use crate::geometry::Point2D;

/// Where `(0, 0)` sits in the raw frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    /// Raw coordinates are centered on the frame, spanning `[-w/2, w/2]`
    Center,
    /// Raw coordinates start at a corner, spanning `[0, w]`
    TopLeft,
}

/// Direction of the raw frame's vertical axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum VerticalAxis {
    /// Same as UV: increasing values go up
    Up,
    /// Pixel rows: increasing values go down
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationFrame {
    pub width: f64,
    pub height: f64,
    pub origin: Origin,
    pub vertical: VerticalAxis,
}

impl NormalizationFrame {
    pub fn new(width: f64, height: f64, origin: Origin, vertical: VerticalAxis) -> Result<Self> {
        let frame = Self {
            width,
            height,
            origin,
            vertical,
        };
        frame.validate()?;
        Ok(frame)
    }

    /// Photo pixels: origin top-left, rows growing downwards
    pub fn pixels(width: f64, height: f64) -> Result<Self> {
        Self::new(width, height, Origin::TopLeft, VerticalAxis::Down)
    }

    /// A frame whose raw coordinates already are UV
    pub fn unit() -> Self {
        Self {
            width: 1.0,
            height: 1.0,
            origin: Origin::TopLeft,
            vertical: VerticalAxis::Up,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if valid(self.width) && valid(self.height) {
            Ok(())
        } else {
            Err(AlignError::InvalidFrame {
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Width and height in raw units
    pub fn extent(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.height / self.width
    }
}

/// Convert a raw coordinate into UV
///
/// Out-of-frame landmarks produce values outside `[0, 1]`; they are kept as is.
pub fn normalize(point: Point2D, frame: &NormalizationFrame) -> Result<Point2D> {
    frame.validate()?;

    let mut x = point.x / frame.width;
    let mut y = point.y / frame.height;

    if frame.origin == Origin::Center {
        x += 0.5;
        y += 0.5;
    }
    if frame.vertical == VerticalAxis::Down {
        y = 1.0 - y;
    }

    Ok(Point2D::new(x, y))
}

/// Inverse of [`normalize`]: convert UV back into raw frame coordinates
pub fn denormalize(uv: Point2D, frame: &NormalizationFrame) -> Result<Point2D> {
    frame.validate()?;

    let mut x = uv.x;
    let mut y = uv.y;

    if frame.vertical == VerticalAxis::Down {
        y = 1.0 - y;
    }
    if frame.origin == Origin::Center {
        x -= 0.5;
        y -= 0.5;
    }

    Ok(Point2D::new(x * frame.width, y * frame.height))
}
