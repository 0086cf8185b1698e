pub mod alignment;
pub mod cli;
pub mod config;
pub mod error;
pub mod geometry;
pub mod normalize;
pub mod render;

pub use alignment::{LandmarkPair, UvAlignment};
pub use cli::Cli;
pub use config::{AlignmentConfig, FrameConfig};
pub use error::{AlignError, Result};
pub use geometry::{apply, fit, Point2D, PointCorrespondence, SimilarityTransform};
pub use normalize::{denormalize, normalize, NormalizationFrame, Origin, VerticalAxis};
pub use render::{fit_dimensions, render_aligned};
