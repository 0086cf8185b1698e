//! Landmark configuration loaded from TOML.
//!
//! ```toml
//! [plane]
//! width = 9.42782
//! height = 9.42782
//! left = [1.5176, -2.5064]
//! right = [-1.1690, -2.5158]
//!
//! [photo]
//! width = 2127
//! height = 1477
//! left = [873, 626]
//! right = [540, 626]
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::alignment::LandmarkPair;
use crate::error::{AlignError, Result};
use crate::geometry::Point2D;
use crate::normalize::{NormalizationFrame, Origin, VerticalAxis};

/// One frame and the two eye landmarks measured in it
#[derive(Debug, Clone, PartialEq)]
pub struct FrameConfig {
    pub width: f64,
    pub height: f64,
    pub origin: Origin,
    pub vertical: VerticalAxis,
    pub left: [f64; 2],
    pub right: [f64; 2],
}

impl FrameConfig {
    pub fn frame(&self) -> Result<NormalizationFrame> {
        NormalizationFrame::new(self.width, self.height, self.origin, self.vertical)
    }

    pub fn landmarks(&self) -> Result<LandmarkPair> {
        Ok(LandmarkPair::new(
            Point2D::new(self.left[0], self.left[1]),
            Point2D::new(self.right[0], self.right[1]),
            self.frame()?,
        ))
    }
}

// Plane-local coordinates: centered, X right, Z down
#[derive(Debug, Deserialize)]
struct PlaneSection {
    width: f64,
    height: f64,
    #[serde(default = "default_plane_origin")]
    origin: Origin,
    #[serde(default = "default_vertical")]
    vertical: VerticalAxis,
    left: [f64; 2],
    right: [f64; 2],
}

// Photo pixels: top-left origin, rows down
#[derive(Debug, Deserialize)]
struct PhotoSection {
    width: f64,
    height: f64,
    #[serde(default = "default_photo_origin")]
    origin: Origin,
    #[serde(default = "default_vertical")]
    vertical: VerticalAxis,
    left: [f64; 2],
    right: [f64; 2],
}

fn default_plane_origin() -> Origin {
    Origin::Center
}

fn default_photo_origin() -> Origin {
    Origin::TopLeft
}

fn default_vertical() -> VerticalAxis {
    VerticalAxis::Down
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    plane: PlaneSection,
    photo: PhotoSection,
}

impl From<PlaneSection> for FrameConfig {
    fn from(section: PlaneSection) -> Self {
        Self {
            width: section.width,
            height: section.height,
            origin: section.origin,
            vertical: section.vertical,
            left: section.left,
            right: section.right,
        }
    }
}

impl From<PhotoSection> for FrameConfig {
    fn from(section: PhotoSection) -> Self {
        Self {
            width: section.width,
            height: section.height,
            origin: section.origin,
            vertical: section.vertical,
            left: section.left,
            right: section.right,
        }
    }
}

/// Plane (source) and photo (target) landmarks
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentConfig {
    pub plane: FrameConfig,
    pub photo: FrameConfig,
}

impl AlignmentConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, path)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Self::parse(text, Path::new("<string>"))
    }

    fn parse(text: &str, path: &Path) -> Result<Self> {
        let raw: RawConfig = toml::from_str(text).map_err(|e| AlignError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let config = Self {
            plane: raw.plane.into(),
            photo: raw.photo.into(),
        };
        config.plane.frame()?;
        config.photo.frame()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
        [plane]
        width = 9.42782
        height = 9.42782
        left = [1.5176, -2.5064]
        right = [-1.1690, -2.5158]

        [photo]
        width = 2127
        height = 1477
        left = [873, 626]
        right = [540, 626]
    "#;

    #[test]
    fn test_defaults_per_section() {
        let config = AlignmentConfig::from_toml_str(SAMPLE).unwrap();

        assert_eq!(config.plane.origin, Origin::Center);
        assert_eq!(config.plane.vertical, VerticalAxis::Down);
        assert_eq!(config.photo.origin, Origin::TopLeft);
        assert_eq!(config.photo.vertical, VerticalAxis::Down);
        assert_eq!(config.photo.left, [873.0, 626.0]);
    }

    #[test]
    fn test_explicit_conventions() {
        let text = SAMPLE.replace(
            "[photo]",
            "[photo]\norigin = \"center\"\nvertical = \"up\"",
        );
        let config = AlignmentConfig::from_toml_str(&text).unwrap();

        assert_eq!(config.photo.origin, Origin::Center);
        assert_eq!(config.photo.vertical, VerticalAxis::Up);
    }

    #[test]
    fn test_rejects_invalid_frame() {
        let text = SAMPLE.replace("width = 2127", "width = 0");
        let err = AlignmentConfig::from_toml_str(&text).unwrap_err();
        assert!(matches!(err, AlignError::InvalidFrame { .. }));
    }

    #[test]
    fn test_rejects_missing_section() {
        let err = AlignmentConfig::from_toml_str("[plane]\nwidth = 1.0").unwrap_err();
        assert!(matches!(err, AlignError::Config { .. }));
    }

    #[test]
    fn test_parse_error_reports_location() {
        let text = SAMPLE.replace("left = [873, 626]", "left = [873, ");
        let err = AlignmentConfig::from_toml_str(&text).unwrap_err();
        match err {
            AlignError::Config { message, .. } => {
                assert!(message.contains("line"), "no location in: {}", message)
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = AlignmentConfig::load(file.path()).unwrap();
        let plane = config.plane.landmarks().unwrap();
        assert_eq!(plane.left, Point2D::new(1.5176, -2.5064));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = AlignmentConfig::load("/nonexistent/landmarks.toml").unwrap_err();
        assert!(matches!(err, AlignError::Io(_)));
    }
}
