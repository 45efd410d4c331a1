//! Session error taxonomy.

use thiserror::Error;

use crate::engine::EngineError;
use crate::resource::ResourceError;

use super::state::SessionState;

/// Failures surfaced by the session lifecycle controller.
///
/// Capability and permission failures land the controller in a recoverable
/// terminal UI state; resource and engine failures leave it in
/// [`SessionState::Error`], from which only an explicit restart is
/// accepted. Every error transition runs the same teardown path as a
/// normal end.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The device lacks a required capability. Not retryable on this
    /// device.
    #[error("immersive sessions are not supported on this device")]
    Unsupported,

    /// The user declined camera access. Retryable by re-prompting.
    #[error("camera permission denied")]
    PermissionDenied,

    /// The heavy engine module failed to load. Retryable by re-acquiring.
    #[error(transparent)]
    ResourceLoad(#[from] ResourceError),

    /// The native session failed to start or crashed mid-flight.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A required per-item resource locator is missing. Not retryable until
    /// the configuration is fixed upstream.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The requested operation is not valid in the current state.
    #[error("operation not allowed in state `{state}`")]
    InvalidState {
        /// The state the controller was in.
        state: SessionState,
    },
}

/// Why a placement commit was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommitRejected {
    /// No candidate pose is currently available (tap with no surface hit).
    #[error("no candidate pose available")]
    NoCandidatePose,

    /// A placement record already exists; placement is single-shot.
    #[error("an object is already placed")]
    AlreadyPlaced,

    /// The session is not active.
    #[error("session is not active")]
    NotActive,
}
