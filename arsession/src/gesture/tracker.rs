//! Stateful tracking of an in-progress two-finger gesture.

use tracing::trace;

use super::{clamp, touch_angle, touch_distance, GestureConfig, GestureTransform, TouchPoint};

/// Snapshot taken when a two-finger gesture begins.
#[derive(Debug, Clone, Copy)]
struct ActiveGesture {
    /// The two touch identifiers tracked for the gesture's duration.
    ids: (u64, u64),
    initial_distance: f64,
    initial_angle: f64,
    /// Base transform the gesture composes onto.
    base: GestureTransform,
}

/// Converts touch events into a composed [`GestureTransform`].
///
/// Only the first two touch identifiers seen at gesture start are consulted;
/// a third touch joining mid-gesture changes nothing. When the gesture ends
/// the last computed transform becomes the base for the next gesture.
#[derive(Debug)]
pub struct GestureTracker {
    config: GestureConfig,
    base: GestureTransform,
    current: GestureTransform,
    active: Option<ActiveGesture>,
}

impl GestureTracker {
    /// Create a tracker with the given configuration and an identity base.
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            base: GestureTransform::default(),
            current: GestureTransform::default(),
            active: None,
        }
    }

    /// The current composed transform, clamped to the configured range.
    pub fn transform(&self) -> GestureTransform {
        self.current
    }

    /// Whether a two-finger gesture is currently in progress.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Begin a gesture when two or more touches are down.
    ///
    /// Ignored while a gesture is already active: the original two tracked
    /// identifiers keep the gesture for its whole duration.
    pub fn on_touch_start(&mut self, touches: &[TouchPoint]) {
        if self.active.is_some() || touches.len() < 2 {
            return;
        }
        let (a, b) = (&touches[0], &touches[1]);
        self.active = Some(ActiveGesture {
            ids: (a.id, b.id),
            initial_distance: touch_distance(a, b),
            initial_angle: touch_angle(a, b),
            base: self.base,
        });
        trace!(
            touch_a = a.id,
            touch_b = b.id,
            "gesture started"
        );
    }

    /// Update the transform from moved touches.
    ///
    /// Returns the newly composed transform, or `None` when no update was
    /// applied (no active gesture, a tracked touch missing, or a degenerate
    /// zero initial distance, which is ignored rather than producing NaN).
    pub fn on_touch_move(&mut self, touches: &[TouchPoint]) -> Option<GestureTransform> {
        let gesture = self.active?;
        let a = touches.iter().find(|t| t.id == gesture.ids.0)?;
        let b = touches.iter().find(|t| t.id == gesture.ids.1)?;

        if gesture.initial_distance <= 0.0 {
            // Coincident initial touch points: skip the frame instead of
            // dividing by zero.
            return None;
        }

        let ratio = touch_distance(a, b) / gesture.initial_distance;
        let scale = clamp(
            gesture.base.scale * ratio,
            self.config.min_scale,
            self.config.max_scale,
        );

        let rotation = if self.config.enable_rotation {
            gesture.base.rotation + (touch_angle(a, b) - gesture.initial_angle)
        } else {
            gesture.base.rotation
        };

        self.current = GestureTransform { scale, rotation };
        Some(self.current)
    }

    /// End the gesture when fewer than two tracked touches remain.
    ///
    /// The last computed transform is committed as the base for the next
    /// gesture.
    pub fn on_touch_end(&mut self, remaining: &[TouchPoint]) {
        let Some(gesture) = self.active else {
            return;
        };
        let still_down = remaining
            .iter()
            .filter(|t| t.id == gesture.ids.0 || t.id == gesture.ids.1)
            .count();
        if still_down < 2 {
            self.base = self.current;
            self.active = None;
            trace!(
                scale = self.base.scale,
                rotation = self.base.rotation,
                "gesture committed"
            );
        }
    }

    /// Discard all gesture state and return to the identity transform.
    ///
    /// Used when a session restarts and the placed object is discarded.
    pub fn reset(&mut self) {
        self.base = GestureTransform::default();
        self.current = GestureTransform::default();
        self.active = None;
    }
}

impl Default for GestureTracker {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}
