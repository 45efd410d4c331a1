//! Session lifecycle states.

use std::fmt;

/// Lifecycle of an immersive placement session.
///
/// Transitions are monotonic apart from the `Active` ↔ `Error` and
/// `Active`/`Placed` → `Ended` edges, and no path reaches `Active` without
/// passing through `CheckingSupport`, `ReadyToStart`, and
/// `RequestingPermission` in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Controller constructed, nothing queried yet.
    Idle,
    /// Capability detection in progress.
    CheckingSupport,
    /// The device cannot run immersive sessions (terminal for this device).
    Unsupported,
    /// Capabilities verified; waiting for the user to start.
    ReadyToStart,
    /// Camera permission prompt in flight.
    RequestingPermission,
    /// Native session running; hit-testing feeds the reticle.
    Active,
    /// An object is anchored; hit-test results are no longer applied.
    Placed,
    /// Session over; resources released. Restart returns to `ReadyToStart`.
    Ended,
    /// Unrecoverable failure; only an explicit restart is accepted.
    Error,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::CheckingSupport => "checking-support",
            SessionState::Unsupported => "unsupported",
            SessionState::ReadyToStart => "ready-to-start",
            SessionState::RequestingPermission => "requesting-permission",
            SessionState::Active => "active",
            SessionState::Placed => "placed",
            SessionState::Ended => "ended",
            SessionState::Error => "error",
        };
        f.write_str(name)
    }
}
