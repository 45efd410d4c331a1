//! The session lifecycle state machine.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::capability::CapabilityDetector;
use crate::catalog::Item;
use crate::clock::Clock;
use crate::engine::{ImmersiveEngine, ImmersiveSession, ModelHandle, SessionConfig};
use crate::gesture::{GestureConfig, GestureTracker, GestureTransform, TouchPoint};
use crate::pose::{fit_scale, Pose};
use crate::resource::ResourceHandle;

use super::error::{CommitRejected, SessionError};
use super::hit_test::HitTestTracker;
use super::permission::PermissionProbe;
use super::placement::{PlacementCommitter, PlacementRecord};
use super::state::SessionState;

/// Configuration for a [`SessionController`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionControllerConfig {
    /// Options passed to the engine when starting the native session.
    pub session: SessionConfig,
    /// Gesture interpretation limits.
    pub gesture: GestureConfig,
}

/// Owns the lifecycle of one immersive placement interaction.
///
/// All state except the engine resource handle is owned exclusively by the
/// controller and mutated from a single cooperative execution context; the
/// suspension points inside [`start`](Self::start) and
/// [`mount`](Self::mount) race a per-attempt cancellation token so that a
/// session ending mid-await discards the stale result instead of applying
/// it.
pub struct SessionController {
    config: SessionControllerConfig,
    state: SessionState,
    state_tx: watch::Sender<SessionState>,
    transitions: Vec<SessionState>,
    detector: CapabilityDetector,
    permission: Arc<dyn PermissionProbe>,
    engine_handle: Arc<ResourceHandle<dyn ImmersiveEngine>>,
    clock: Arc<dyn Clock>,
    session: Option<Box<dyn ImmersiveSession>>,
    model: Option<ModelHandle>,
    model_scale: f64,
    hit_tracker: HitTestTracker,
    committer: PlacementCommitter,
    gestures: GestureTracker,
    cancel: CancellationToken,
    error: Option<SessionError>,
}

impl SessionController {
    /// Create a controller in the `Idle` state.
    pub fn new(
        config: SessionControllerConfig,
        detector: CapabilityDetector,
        permission: Arc<dyn PermissionProbe>,
        engine_handle: Arc<ResourceHandle<dyn ImmersiveEngine>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Idle);
        Self {
            gestures: GestureTracker::new(config.gesture),
            config,
            state: SessionState::Idle,
            state_tx,
            transitions: vec![SessionState::Idle],
            detector,
            permission,
            engine_handle,
            clock,
            session: None,
            model: None,
            model_scale: 1.0,
            hit_tracker: HitTestTracker::new(),
            committer: PlacementCommitter::new(),
            cancel: CancellationToken::new(),
            error: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Watch state changes (latest value semantics).
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Every state the controller has been in, in order. Diagnostic
    /// surface for shells and tests.
    pub fn transitions(&self) -> &[SessionState] {
        &self.transitions
    }

    /// The error message surfaced while in the `Error` state.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }

    /// Token cancelled when this session attempt ends.
    ///
    /// External session-end signals cancel it to detach frame delivery and
    /// unblock any pending suspension point.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The committed placement, if any.
    pub fn placement(&self) -> Option<&PlacementRecord> {
        self.committer.record()
    }

    /// The current reticle pose, or `None` when no surface is tracked or an
    /// object is already placed.
    pub fn reticle_pose(&self) -> Option<Pose> {
        if self.state == SessionState::Active {
            self.hit_tracker.current()
        } else {
            None
        }
    }

    /// The composed gesture transform.
    pub fn gesture_transform(&self) -> GestureTransform {
        self.gestures.transform()
    }

    /// Mount the interaction view: check capabilities.
    ///
    /// `Idle → CheckingSupport → ReadyToStart | Unsupported`. No permission
    /// prompt and no resource load happens here.
    pub async fn mount(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::InvalidState { state: self.state });
        }
        self.transition(SessionState::CheckingSupport);

        let detector = self.detector.clone();
        let cancel = self.cancel.clone();
        let supported = tokio::select! {
            _ = cancel.cancelled() => {
                self.end().await;
                return Ok(());
            }
            supported = detector.check_immersive_support() => supported,
        };

        if supported {
            self.transition(SessionState::ReadyToStart);
        } else {
            self.transition(SessionState::Unsupported);
        }
        Ok(())
    }

    /// Start the immersive session for an item.
    ///
    /// Requests camera permission first, then lazily acquires the engine,
    /// loads and fits the model, and starts the native session. Each
    /// suspension point is cancellable; a cancelled start converges on the
    /// normal end path with its pending result discarded.
    pub async fn start(&mut self, item: &Item) -> Result<(), SessionError> {
        if self.state != SessionState::ReadyToStart {
            return Err(SessionError::InvalidState { state: self.state });
        }

        // A missing model locator is a configuration error, detected before
        // anything is spent on permission or loading.
        let Some(locator) = item.model_locator.clone() else {
            return self
                .fail(SessionError::Configuration(format!(
                    "item `{}` has no model locator",
                    item.slug
                )))
                .await;
        };

        self.transition(SessionState::RequestingPermission);
        let cancel = self.cancel.clone();
        let permission = Arc::clone(&self.permission);
        let granted = tokio::select! {
            _ = cancel.cancelled() => {
                self.end().await;
                return Ok(());
            }
            granted = permission.request_camera() => granted,
        };
        if !granted {
            return self.fail(SessionError::PermissionDenied).await;
        }

        // Permission granted: only now pay for the heavy engine module.
        let handle = Arc::clone(&self.engine_handle);
        let engine = tokio::select! {
            _ = cancel.cancelled() => {
                self.end().await;
                return Ok(());
            }
            result = handle.acquire() => match result {
                Ok(engine) => engine,
                Err(error) => return self.fail(error.into()).await,
            },
        };

        let model = tokio::select! {
            _ = cancel.cancelled() => {
                self.end().await;
                return Ok(());
            }
            result = engine.load_model(&locator) => match result {
                Ok(model) => model,
                Err(error) => return self.fail(error.into()).await,
            },
        };
        self.model_scale = fit_scale(
            item.physical_dimensions().as_ref(),
            model.bounding_max_dimension,
        );
        debug!(scale = self.model_scale, locator = %model.locator, "model fitted");

        let session = tokio::select! {
            _ = cancel.cancelled() => {
                self.end().await;
                return Ok(());
            }
            result = engine.start_session(self.config.session) => match result {
                Ok(session) => session,
                Err(error) => return self.fail(error.into()).await,
            },
        };

        self.session = Some(session);
        self.model = Some(model);
        self.hit_tracker.reset();
        self.transition(SessionState::Active);
        Ok(())
    }

    /// Host frame callback: run the frame's hit-test and update the
    /// candidate pose.
    ///
    /// Returns the reticle pose for this frame. Frames are ignored once the
    /// object is placed or the session attempt has been cancelled, so a
    /// stale frame can never override a later commit.
    pub fn on_frame(&mut self) -> Option<Pose> {
        if self.state != SessionState::Active || self.cancel.is_cancelled() {
            return None;
        }
        let sample = self.session.as_mut()?.hit_test();
        self.hit_tracker.on_frame(sample)
    }

    /// Commit the current candidate pose as the object's anchor.
    ///
    /// Single-shot per session: a second call is rejected, not an
    /// overwrite.
    pub fn commit_placement(&mut self) -> Result<PlacementRecord, CommitRejected> {
        match self.state {
            SessionState::Active => {}
            SessionState::Placed => return Err(CommitRejected::AlreadyPlaced),
            _ => return Err(CommitRejected::NotActive),
        }

        let record = self
            .committer
            .commit(self.hit_tracker.current(), self.clock.now())?;
        if let Some(session) = self.session.as_mut() {
            session.show_object(&record.pose, self.model_scale);
        }
        self.hit_tracker.reset();
        self.transition(SessionState::Placed);
        Ok(record)
    }

    /// Begin a two-finger gesture.
    pub fn on_gesture_start(&mut self, touches: &[TouchPoint]) {
        self.gestures.on_touch_start(touches);
    }

    /// Update an in-progress gesture; the transform is forwarded to the
    /// engine once an object is placed.
    pub fn on_gesture_move(&mut self, touches: &[TouchPoint]) -> Option<GestureTransform> {
        let transform = self.gestures.on_touch_move(touches)?;
        if self.state == SessionState::Placed {
            if let Some(session) = self.session.as_mut() {
                session.update_object(&transform);
            }
        }
        Some(transform)
    }

    /// End a gesture, committing its transform as the next gesture's base.
    pub fn on_gesture_end(&mut self, remaining: &[TouchPoint]) {
        self.gestures.on_touch_end(remaining);
    }

    /// End the session and release every native resource.
    ///
    /// Idempotent, and safe to invoke from any state — including before the
    /// session ever reached `Active`. Frame delivery stops synchronously
    /// before any asynchronous teardown runs.
    pub async fn end(&mut self) {
        if self.state == SessionState::Ended {
            return;
        }
        self.teardown().await;
        self.transition(SessionState::Ended);
    }

    /// Return to `ReadyToStart` after an end or an error.
    ///
    /// Discards the placement record and gesture state for a fresh attempt.
    pub fn restart(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Ended | SessionState::Error => {}
            state => return Err(SessionError::InvalidState { state }),
        }
        self.committer.reset();
        self.hit_tracker.reset();
        self.gestures.reset();
        self.model = None;
        self.model_scale = 1.0;
        self.error = None;
        self.cancel = CancellationToken::new();
        self.transition(SessionState::ReadyToStart);
        Ok(())
    }

    /// Transition to `Error` after running the full teardown path.
    async fn fail(&mut self, error: SessionError) -> Result<(), SessionError> {
        warn!(%error, "session failed");
        self.teardown().await;
        self.error = Some(error.clone());
        self.transition(SessionState::Error);
        Err(error)
    }

    /// Release native resources. Shared by the end and error paths.
    async fn teardown(&mut self) {
        // Frame delivery must stop before anything awaits: no pose update
        // may be delivered after the session is over.
        self.cancel.cancel();
        if let Some(mut session) = self.session.take() {
            if let Err(error) = session.end().await {
                debug!(%error, "native session end reported failure");
            }
        }
        self.model = None;
    }

    fn transition(&mut self, next: SessionState) {
        info!(from = %self.state, to = %next, "session transition");
        self.state = next;
        self.transitions.push(next);
        self.state_tx.send_replace(next);
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.state)
            .field("placed", &self.committer.is_placed())
            .finish_non_exhaustive()
    }
}
