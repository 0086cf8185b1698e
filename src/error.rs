//! Error types for uv-align.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`AlignError`].
pub type Result<T> = std::result::Result<T, AlignError>;

/// Errors raised while normalizing coordinates or fitting a transform.
#[derive(Error, Debug)]
pub enum AlignError {
    /// The two source landmarks coincide (or nearly so), leaving the fit singular.
    #[error("degenerate landmarks: {reason}")]
    DegenerateInput {
        /// What made the input degenerate.
        reason: String,
    },

    /// A normalization frame with a non-positive or non-finite extent.
    #[error("invalid frame {width}x{height}: width and height must be positive")]
    InvalidFrame {
        /// Frame width as given.
        width: f64,
        /// Frame height as given.
        height: f64,
    },

    /// A coordinate was NaN or infinite.
    #[error("non-finite coordinate in {name}: ({x}, {y})")]
    NonFiniteInput {
        /// Which input carried the value.
        name: &'static str,
        /// X coordinate.
        x: f64,
        /// Y coordinate.
        y: f64,
    },

    /// Landmark configuration could not be parsed.
    #[error("invalid configuration in {path}: {message}")]
    Config {
        /// Source of the configuration.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AlignError {
    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        AlignError::DegenerateInput {
            reason: reason.into(),
        }
    }
}
