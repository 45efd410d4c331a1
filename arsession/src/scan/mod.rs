//! Image-target tracking (scan mode).
//!
//! A parallel lifecycle to the placement session, driven by continuous
//! found/lost recognition events instead of per-frame hit-testing. The
//! recognition runtime module is acquired lazily through a resource handle;
//! a recognition engine is constructed from it per scan, bound to the
//! item's tracking-target resource.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalog::Item;
use crate::engine::{EngineError, RecognitionEngine, RecognitionModule, TargetEvent};
use crate::resource::{ResourceError, ResourceHandle};

/// Lifecycle of a target-tracking scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetTrackingState {
    /// Nothing running; ready to start a scan.
    Idle,
    /// Recognition module loading and camera starting.
    Loading,
    /// Camera running, target not currently in view.
    Scanning,
    /// Target in view.
    Found,
    /// Target left the view after having been found.
    Lost,
    /// Unrecoverable failure; stop resets to `Idle`.
    Error,
}

impl fmt::Display for TargetTrackingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetTrackingState::Idle => "idle",
            TargetTrackingState::Loading => "loading",
            TargetTrackingState::Scanning => "scanning",
            TargetTrackingState::Found => "found",
            TargetTrackingState::Lost => "lost",
            TargetTrackingState::Error => "error",
        };
        f.write_str(name)
    }
}

/// Failures surfaced by the scan controller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanError {
    /// The item has no tracking-target resource. Detected before loading
    /// begins; not retryable until configuration is fixed upstream.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The recognition module failed to load. Retryable.
    #[error(transparent)]
    ResourceLoad(#[from] ResourceError),

    /// The recognition engine failed to construct or start.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The requested operation is not valid in the current state.
    #[error("operation not allowed in state `{state}`")]
    InvalidState {
        /// The state the controller was in.
        state: TargetTrackingState,
    },
}

/// Owns the lifecycle of one image-target scan.
pub struct ScanController {
    state: TargetTrackingState,
    state_tx: watch::Sender<TargetTrackingState>,
    transitions: Vec<TargetTrackingState>,
    module_handle: Arc<ResourceHandle<dyn RecognitionModule>>,
    engine: Option<Box<dyn RecognitionEngine>>,
    events: Option<mpsc::UnboundedReceiver<TargetEvent>>,
    cancel: CancellationToken,
    error: Option<ScanError>,
}

impl ScanController {
    /// Create a controller in the `Idle` state.
    pub fn new(module_handle: Arc<ResourceHandle<dyn RecognitionModule>>) -> Self {
        let (state_tx, _) = watch::channel(TargetTrackingState::Idle);
        Self {
            state: TargetTrackingState::Idle,
            state_tx,
            transitions: vec![TargetTrackingState::Idle],
            module_handle,
            engine: None,
            events: None,
            cancel: CancellationToken::new(),
            error: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TargetTrackingState {
        self.state
    }

    /// Watch state changes (latest value semantics).
    pub fn subscribe(&self) -> watch::Receiver<TargetTrackingState> {
        self.state_tx.subscribe()
    }

    /// Every state the controller has been in, in order.
    pub fn transitions(&self) -> &[TargetTrackingState] {
        &self.transitions
    }

    /// The error message surfaced while in the `Error` state.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }

    /// Take ownership of the found/lost event stream.
    ///
    /// The shell pumps these into [`on_target_event`](Self::on_target_event)
    /// from its frame context. Available once per scan.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<TargetEvent>> {
        self.events.take()
    }

    /// Start scanning for an item's tracking target.
    ///
    /// A missing target resource is a configuration error detected before
    /// any loading begins: the controller goes `Idle → Error` directly and
    /// the module loader is never invoked.
    pub async fn start(&mut self, item: &Item) -> Result<(), ScanError> {
        if self.state != TargetTrackingState::Idle {
            return Err(ScanError::InvalidState { state: self.state });
        }

        let Some(target) = item.target_locator.clone() else {
            return self.fail(ScanError::Configuration(format!(
                "item `{}` has no tracking-target resource",
                item.slug
            )));
        };

        self.cancel = CancellationToken::new();
        self.transition(TargetTrackingState::Loading);

        let handle = Arc::clone(&self.module_handle);
        let cancel = self.cancel.clone();
        let module = tokio::select! {
            _ = cancel.cancelled() => {
                self.stop().await;
                return Ok(());
            }
            result = handle.acquire() => match result {
                Ok(module) => module,
                Err(error) => return self.fail(error.into()),
            },
        };

        let pipeline = match module.create(&target) {
            Ok(pipeline) => pipeline,
            Err(error) => return self.fail(error.into()),
        };

        let start_result = tokio::select! {
            _ = cancel.cancelled() => {
                self.stop().await;
                return Ok(());
            }
            result = pipeline.engine.start() => result,
        };
        if let Err(error) = start_result {
            return self.fail(error.into());
        }

        self.engine = Some(pipeline.engine);
        self.events = Some(pipeline.events);
        self.transition(TargetTrackingState::Scanning);
        Ok(())
    }

    /// Apply a found/lost event from the recognition engine.
    ///
    /// Events arriving after a stop are discarded; duplicate events do not
    /// produce duplicate transitions.
    pub fn on_target_event(&mut self, event: TargetEvent) {
        if self.cancel.is_cancelled() {
            return;
        }
        match (self.state, event) {
            (TargetTrackingState::Scanning | TargetTrackingState::Lost, TargetEvent::Found) => {
                self.transition(TargetTrackingState::Found);
            }
            (TargetTrackingState::Found, TargetEvent::Lost) => {
                self.transition(TargetTrackingState::Lost);
            }
            _ => {
                debug!(?event, state = %self.state, "target event ignored");
            }
        }
    }

    /// Stop the scan and release the recognition engine.
    ///
    /// Idempotent. The event stream is detached before the engine is
    /// released, so no callback can fire against a torn-down scene.
    pub async fn stop(&mut self) {
        if self.state == TargetTrackingState::Idle {
            return;
        }
        // Detach event delivery synchronously before any async teardown.
        self.cancel.cancel();
        self.events = None;
        if let Some(engine) = self.engine.take() {
            if let Err(error) = engine.stop().await {
                debug!(%error, "recognition engine stop reported failure");
            }
        }
        self.error = None;
        self.transition(TargetTrackingState::Idle);
    }

    fn fail(&mut self, error: ScanError) -> Result<(), ScanError> {
        warn!(%error, "scan failed");
        self.cancel.cancel();
        self.events = None;
        self.error = Some(error.clone());
        self.transition(TargetTrackingState::Error);
        Err(error)
    }

    fn transition(&mut self, next: TargetTrackingState) {
        info!(from = %self.state, to = %next, "scan transition");
        self.state = next;
        self.transitions.push(next);
        self.state_tx.send_replace(next);
    }
}

impl fmt::Debug for ScanController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanController")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::engine::{
        EngineConfig, EngineFactory, SimulatedEngine, SimulatedEngineConfig,
        SimulatedRecognitionModule,
    };
    use crate::resource::ResourceState;

    fn scan_setup(script: Vec<TargetEvent>) -> (ScanController, Arc<SimulatedRecognitionModule>) {
        let module = Arc::new(SimulatedRecognitionModule::new(
            script,
            Duration::from_millis(1),
        ));
        let config = EngineConfig::simulated(
            Arc::new(SimulatedEngine::new(SimulatedEngineConfig::default())),
            Arc::clone(&module),
        );
        (
            ScanController::new(EngineFactory::recognition(&config)),
            module,
        )
    }

    fn item_with_target() -> Item {
        let mut item = crate::catalog::demo_item();
        item.target_locator = Some("targets/poster.mind".to_string());
        item
    }

    #[tokio::test]
    async fn test_missing_target_is_config_error_before_loading() {
        let (mut controller, _module) = scan_setup(vec![]);
        let item = crate::catalog::demo_item();
        assert!(item.target_locator.is_none());

        let err = controller.start(&item).await.unwrap_err();
        assert!(matches!(err, ScanError::Configuration(_)));
        assert_eq!(controller.state(), TargetTrackingState::Error);
        assert_eq!(
            controller.transitions(),
            &[TargetTrackingState::Idle, TargetTrackingState::Error]
        );
    }

    #[tokio::test]
    async fn test_found_lost_found_sequence() {
        let (mut controller, _module) = scan_setup(vec![]);
        controller.start(&item_with_target()).await.unwrap();
        assert_eq!(controller.state(), TargetTrackingState::Scanning);

        controller.on_target_event(TargetEvent::Found);
        controller.on_target_event(TargetEvent::Lost);
        controller.on_target_event(TargetEvent::Found);

        assert_eq!(
            controller.transitions(),
            &[
                TargetTrackingState::Idle,
                TargetTrackingState::Loading,
                TargetTrackingState::Scanning,
                TargetTrackingState::Found,
                TargetTrackingState::Lost,
                TargetTrackingState::Found,
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicate_events_do_not_duplicate_transitions() {
        let (mut controller, _module) = scan_setup(vec![]);
        controller.start(&item_with_target()).await.unwrap();
        controller.on_target_event(TargetEvent::Found);
        controller.on_target_event(TargetEvent::Found);
        controller.on_target_event(TargetEvent::Lost);
        controller.on_target_event(TargetEvent::Lost);

        assert_eq!(
            controller.transitions(),
            &[
                TargetTrackingState::Idle,
                TargetTrackingState::Loading,
                TargetTrackingState::Scanning,
                TargetTrackingState::Found,
                TargetTrackingState::Lost,
            ]
        );
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_and_detaches_events() {
        let (mut controller, module) = scan_setup(vec![]);
        controller.start(&item_with_target()).await.unwrap();
        controller.on_target_event(TargetEvent::Found);

        controller.stop().await;
        assert_eq!(controller.state(), TargetTrackingState::Idle);
        assert_eq!(module.probe().stops(), 1);

        // Events after stop are discarded, and a second stop is a no-op.
        controller.on_target_event(TargetEvent::Lost);
        controller.stop().await;
        assert_eq!(controller.state(), TargetTrackingState::Idle);
        assert_eq!(module.probe().stops(), 1);
    }

    #[tokio::test]
    async fn test_stop_from_error_resets_to_idle() {
        let (mut controller, _module) = scan_setup(vec![]);
        let _ = controller.start(&crate::catalog::demo_item()).await;
        assert_eq!(controller.state(), TargetTrackingState::Error);
        assert!(controller.error_message().is_some());

        controller.stop().await;
        assert_eq!(controller.state(), TargetTrackingState::Idle);
        assert!(controller.error_message().is_none());

        // Fixed configuration scans cleanly afterwards.
        controller.start(&item_with_target()).await.unwrap();
        assert_eq!(controller.state(), TargetTrackingState::Scanning);
    }

    #[tokio::test]
    async fn test_module_loader_not_invoked_on_config_error() {
        let module = Arc::new(SimulatedRecognitionModule::new(
            vec![],
            Duration::from_millis(1),
        ));
        let config = EngineConfig::simulated(
            Arc::new(SimulatedEngine::new(SimulatedEngineConfig::default())),
            module,
        );
        let handle = EngineFactory::recognition(&config);
        let mut controller = ScanController::new(Arc::clone(&handle));

        let _ = controller.start(&crate::catalog::demo_item()).await;
        assert_eq!(handle.state(), ResourceState::NotLoaded);
    }
}
