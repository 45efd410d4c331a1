//! Immersive session lifecycle.
//!
//! The [`SessionController`] owns one AR interaction end to end: capability
//! check, camera permission, lazy engine acquisition, native session start,
//! the per-frame hit-test feed, one-shot placement, and idempotent
//! teardown. Everything runs in a single cooperative execution context
//! driven by the host shell; the only shared object is the engine resource
//! handle.

mod controller;
mod error;
mod permission;
mod placement;
mod state;

pub use controller::{SessionController, SessionControllerConfig};
pub use error::{CommitRejected, SessionError};
pub use hit_test::HitTestTracker;
pub use permission::{PermissionProbe, StaticPermission};
pub use placement::{PlacementCommitter, PlacementRecord};
pub use state::SessionState;
