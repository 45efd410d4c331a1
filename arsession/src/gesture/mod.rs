//! Two-finger gesture math for placed-object manipulation.
//!
//! Converts pinch/rotate touch deltas into an incremental scale and rotation
//! composed onto a persisted base transform. The math itself is pure; the
//! [`GestureTracker`] carries the small amount of state a gesture needs
//! (tracked touch ids, initial distance/angle, the base transform snapshot).
//!
//! Transforms compose across gestures: when a gesture ends, its final scale
//! and rotation become the base for the next gesture. Nothing resets between
//! interactions.

mod tracker;

pub use tracker::GestureTracker;

/// A single touch point in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    /// Platform-assigned touch identifier, stable for the touch's lifetime.
    pub id: u64,
    /// Horizontal screen coordinate.
    pub x: f64,
    /// Vertical screen coordinate.
    pub y: f64,
}

impl TouchPoint {
    /// Create a touch point with the given identifier and position.
    pub fn new(id: u64, x: f64, y: f64) -> Self {
        Self { id, x, y }
    }
}

/// Configuration for gesture interpretation.
#[derive(Debug, Clone, Copy)]
pub struct GestureConfig {
    /// Lower clamp for the composed scale.
    pub min_scale: f64,
    /// Upper clamp for the composed scale.
    pub max_scale: f64,
    /// When false, rotation stays fixed at the base rotation.
    pub enable_rotation: bool,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 5.0,
            enable_rotation: true,
        }
    }
}

/// The composed object transform driven by gestures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureTransform {
    /// Uniform scale, always within the configured clamp range.
    pub scale: f64,
    /// Rotation around the vertical axis in radians.
    pub rotation: f64,
}

impl Default for GestureTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotation: 0.0,
        }
    }
}

/// Euclidean distance between two touch points.
pub fn touch_distance(a: &TouchPoint, b: &TouchPoint) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}

/// Angle of the segment between two touch points, in radians.
pub fn touch_angle(a: &TouchPoint, b: &TouchPoint) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dy.atan2(dx)
}

/// Clamp a value to the inclusive range `[min, max]`.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_distance() {
        let a = TouchPoint::new(0, 0.0, 0.0);
        let b = TouchPoint::new(1, 3.0, 4.0);
        assert_eq!(touch_distance(&a, &b), 5.0);
    }

    #[test]
    fn test_touch_angle() {
        let a = TouchPoint::new(0, 0.0, 0.0);
        let b = TouchPoint::new(1, 0.0, 1.0);
        assert!((touch_angle(&a, &b) - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(0.05, 0.1, 5.0), 0.1);
        assert_eq!(clamp(7.0, 0.1, 5.0), 5.0);
        assert_eq!(clamp(1.3, 0.1, 5.0), 1.3);
    }
}
