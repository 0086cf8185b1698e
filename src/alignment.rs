//! UV alignment between a plane and a photo with different aspect ratios.
//!
//! The similarity fit only preserves angles when both landmark sets live in
//! units with equal x and y scale. UV coordinates do not: one unit of `u` on a
//! 1:1.44 plane is shorter than one unit of `v`. The alignment therefore runs in
//! three explicit steps:
//!
//! 1. source UV is scaled by the source frame's extent into physical units,
//! 2. the fitted similarity transform maps source physical units to target
//!    physical units,
//! 3. the result is divided by the target frame's extent back into UV.

use tracing::debug;

use crate::error::Result;
use crate::geometry::{fit, Point2D, SimilarityTransform};
use crate::normalize::{normalize, NormalizationFrame};

/// Left and right landmark in raw coordinates of their frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkPair {
    pub left: Point2D,
    pub right: Point2D,
    pub frame: NormalizationFrame,
}

impl LandmarkPair {
    pub fn new(left: Point2D, right: Point2D, frame: NormalizationFrame) -> Self {
        Self { left, right, frame }
    }

    /// Both landmarks in UV
    pub fn normalized(&self) -> Result<(Point2D, Point2D)> {
        Ok((
            normalize(self.left, &self.frame)?,
            normalize(self.right, &self.frame)?,
        ))
    }

    /// Both landmarks in isotropic physical units (UV times frame extent)
    fn physical(&self) -> Result<(Point2D, Point2D)> {
        let (left, right) = self.normalized()?;
        let (w, h) = self.frame.extent();
        Ok((
            Point2D::new(left.x * w, left.y * h),
            Point2D::new(right.x * w, right.y * h),
        ))
    }
}

/// Maps UV coordinates of a source frame onto UV coordinates of a target frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvAlignment {
    pub source_extent: (f64, f64),
    pub target_extent: (f64, f64),
    /// Fitted transform in physical units
    pub transform: SimilarityTransform,
}

impl UvAlignment {
    /// Fit the alignment that brings `source` landmarks onto `target` landmarks
    pub fn fit(source: &LandmarkPair, target: &LandmarkPair) -> Result<Self> {
        let (source_left, source_right) = source.physical()?;
        let (target_left, target_right) = target.physical()?;

        let transform = fit(source_left, source_right, target_left, target_right)?;
        let alignment = Self {
            source_extent: source.frame.extent(),
            target_extent: target.frame.extent(),
            transform,
        };

        debug!(
            source_aspect = source.frame.aspect_ratio(),
            target_aspect = target.frame.aspect_ratio(),
            "fitted uv alignment"
        );
        Ok(alignment)
    }

    /// Map one source UV coordinate into target UV
    pub fn map_uv(&self, uv: Point2D) -> Point2D {
        let (sw, sh) = self.source_extent;
        let (tw, th) = self.target_extent;
        let physical = self.transform.apply(Point2D::new(uv.x * sw, uv.y * sh));
        Point2D::new(physical.x / tw, physical.y / th)
    }

    /// Remap a UV buffer in place
    pub fn map_uvs(&self, uvs: &mut [Point2D]) {
        for uv in uvs.iter_mut() {
            *uv = self.map_uv(*uv);
        }
    }

    /// Where the source UV corners (0,0), (1,0), (1,1), (0,1) land in target UV
    pub fn corners(&self) -> [Point2D; 4] {
        [
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(1.0, 1.0),
            Point2D::new(0.0, 1.0),
        ]
        .map(|corner| self.map_uv(corner))
    }
}
