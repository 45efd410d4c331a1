//! Placement poses and real-world fitting math.
//!
//! A [`Pose`] is a position plus orientation in the session's reference
//! space. Poses are produced once per frame by the hit-test tracker while no
//! object is placed, and frozen into a placement record on commit.

use nalgebra::{Point3, Quaternion, UnitQuaternion};

/// Fallback scale applied when an item carries no physical dimensions.
///
/// Matches the default used for models of unknown real-world size: large
/// enough to be visible, small enough to fit on a table surface.
pub const DEFAULT_VISIBILITY_SCALE: f64 = 0.5;

/// A position and orientation in the session reference space.
///
/// Immutable snapshot semantics: once a pose has been consumed by the
/// placement committer it is never updated in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Position in meters.
    pub position: Point3<f64>,
    /// Orientation as a unit quaternion.
    pub orientation: UnitQuaternion<f64>,
}

impl Pose {
    /// Create a pose from an explicit position and orientation.
    pub fn new(position: Point3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// The identity pose: origin position, no rotation.
    pub fn identity() -> Self {
        Self {
            position: Point3::origin(),
            orientation: UnitQuaternion::identity(),
        }
    }

    /// Build a pose from the raw transform reported by a platform hit-test.
    ///
    /// The orientation components are `(x, y, z, w)` as delivered by the
    /// engine. The quaternion is normalized; a degenerate all-zero
    /// orientation falls back to identity rather than producing NaN.
    pub fn from_raw(position: [f64; 3], orientation: [f64; 4]) -> Self {
        let [x, y, z, w] = orientation;
        let orientation = UnitQuaternion::try_new(Quaternion::new(w, x, y, z), 1e-12)
            .unwrap_or_else(UnitQuaternion::identity);
        Self {
            position: Point3::new(position[0], position[1], position[2]),
            orientation,
        }
    }
}

/// Physical dimensions of an item in meters.
///
/// Optional per-item data used to auto-scale a loaded model to real-world
/// size at placement time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalDimensions {
    /// Width in meters.
    pub width_m: f64,
    /// Height in meters.
    pub height_m: f64,
    /// Depth in meters.
    pub depth_m: f64,
}

impl PhysicalDimensions {
    /// Create dimensions from width, height, and depth in meters.
    pub fn new(width_m: f64, height_m: f64, depth_m: f64) -> Self {
        Self {
            width_m,
            height_m,
            depth_m,
        }
    }

    /// The largest of the three dimensions.
    pub fn max_dimension(&self) -> f64 {
        self.width_m.max(self.height_m).max(self.depth_m)
    }
}

/// Compute the uniform scale factor that fits a model to an item's physical
/// dimensions.
///
/// `bounding_max_dimension` is the largest extent of the loaded model's
/// bounding box in model units. The returned factor maps that extent onto
/// the item's largest physical dimension.
///
/// A degenerate (non-positive) bounding box falls back to
/// [`DEFAULT_VISIBILITY_SCALE`] rather than dividing by zero.
pub fn fit_scale(dims: Option<&PhysicalDimensions>, bounding_max_dimension: f64) -> f64 {
    if bounding_max_dimension <= 0.0 {
        return DEFAULT_VISIBILITY_SCALE;
    }
    match dims {
        Some(d) => d.max_dimension() / bounding_max_dimension,
        None => DEFAULT_VISIBILITY_SCALE,
    }
}
