//! Scripted in-process engine implementations.
//!
//! These stand in for real render/tracking runtimes in the CLI demo and in
//! tests: a surface appears after a scripted number of frames, target
//! found/lost events play back on a timer, and failures can be injected at
//! module-load, model-load, and session-start boundaries.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use crate::gesture::GestureTransform;
use crate::pose::Pose;

use super::types::{
    EngineError, HitSample, ImmersiveEngine, ImmersiveSession, ModelHandle, RecognitionEngine,
    RecognitionModule, RecognitionPipeline, SessionConfig, TargetEvent,
};

/// What the simulated environment looks like.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedScript {
    /// Number of frames before the hit-test finds a surface.
    pub frames_until_surface: u32,
    /// The surface transform reported once found.
    pub surface: HitSample,
}

impl Default for SimulatedScript {
    fn default() -> Self {
        Self {
            frames_until_surface: 3,
            surface: HitSample {
                position: [0.0, 0.0, -1.0],
                orientation: [0.0, 0.0, 0.0, 1.0],
            },
        }
    }
}

/// Observable record of what a simulated engine was asked to do.
///
/// Shared between the engine and the test (or demo) that configured it.
#[derive(Debug, Default)]
pub struct SessionProbe {
    sessions_started: AtomicU32,
    sessions_ended: AtomicU32,
    placed: Mutex<Option<(Pose, f64)>>,
    last_transform: Mutex<Option<GestureTransform>>,
}

impl SessionProbe {
    /// How many native sessions were started.
    pub fn sessions_started(&self) -> u32 {
        self.sessions_started.load(Ordering::SeqCst)
    }

    /// How many native sessions were ended.
    pub fn sessions_ended(&self) -> u32 {
        self.sessions_ended.load(Ordering::SeqCst)
    }

    /// The pose and scale the object was anchored at, if placed.
    pub fn placed(&self) -> Option<(Pose, f64)> {
        *self.placed.lock()
    }

    /// The last gesture transform applied to the object.
    pub fn last_transform(&self) -> Option<GestureTransform> {
        *self.last_transform.lock()
    }
}

/// Configuration and failure injection for [`SimulatedEngine`].
#[derive(Debug, Clone)]
pub struct SimulatedEngineConfig {
    /// Environment script.
    pub script: SimulatedScript,
    /// Largest bounding-box extent of the fake loaded model.
    pub model_bounding_max: f64,
    /// When set, `load_model` fails with this reason.
    pub fail_model_load: Option<String>,
    /// When set, `start_session` fails with this reason.
    pub fail_session_start: Option<String>,
    /// Shared observation record.
    pub probe: Arc<SessionProbe>,
}

impl Default for SimulatedEngineConfig {
    fn default() -> Self {
        Self {
            script: SimulatedScript::default(),
            model_bounding_max: 2.0,
            fail_model_load: None,
            fail_session_start: None,
            probe: Arc::new(SessionProbe::default()),
        }
    }
}

/// An immersive engine backed by a script instead of real tracking.
#[derive(Debug)]
pub struct SimulatedEngine {
    config: SimulatedEngineConfig,
}

impl SimulatedEngine {
    /// Create an engine from its script and failure configuration.
    pub fn new(config: SimulatedEngineConfig) -> Self {
        Self { config }
    }

    /// The shared observation record for sessions started by this engine.
    pub fn probe(&self) -> Arc<SessionProbe> {
        Arc::clone(&self.config.probe)
    }
}

impl ImmersiveEngine for SimulatedEngine {
    fn load_model(&self, locator: &str) -> BoxFuture<'_, Result<ModelHandle, EngineError>> {
        let locator = locator.to_string();
        async move {
            if let Some(reason) = &self.config.fail_model_load {
                return Err(EngineError::ModelLoad {
                    locator,
                    reason: reason.clone(),
                });
            }
            Ok(ModelHandle {
                locator,
                bounding_max_dimension: self.config.model_bounding_max,
            })
        }
        .boxed()
    }

    fn start_session(
        &self,
        config: SessionConfig,
    ) -> BoxFuture<'_, Result<Box<dyn ImmersiveSession>, EngineError>> {
        async move {
            if let Some(reason) = &self.config.fail_session_start {
                return Err(EngineError::SessionStart(reason.clone()));
            }
            debug!(?config.reference_space, "simulated session started");
            self.config.probe.sessions_started.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(SimulatedSession {
                script: self.config.script,
                probe: Arc::clone(&self.config.probe),
                frames_seen: 0,
                ended: false,
            }) as Box<dyn ImmersiveSession>)
        }
        .boxed()
    }
}

struct SimulatedSession {
    script: SimulatedScript,
    probe: Arc<SessionProbe>,
    frames_seen: u32,
    ended: bool,
}

impl ImmersiveSession for SimulatedSession {
    fn hit_test(&mut self) -> Option<HitSample> {
        if self.ended {
            return None;
        }
        self.frames_seen += 1;
        if self.frames_seen > self.script.frames_until_surface {
            Some(self.script.surface)
        } else {
            None
        }
    }

    fn show_object(&mut self, pose: &Pose, scale: f64) {
        *self.probe.placed.lock() = Some((*pose, scale));
    }

    fn update_object(&mut self, transform: &GestureTransform) {
        *self.probe.last_transform.lock() = Some(*transform);
    }

    fn end(&mut self) -> BoxFuture<'_, Result<(), EngineError>> {
        if !self.ended {
            self.ended = true;
            self.probe.sessions_ended.fetch_add(1, Ordering::SeqCst);
        }
        async { Ok(()) }.boxed()
    }
}

/// Observable record of a simulated recognition engine's lifecycle.
#[derive(Debug, Default)]
pub struct RecognitionProbe {
    starts: AtomicU32,
    stops: AtomicU32,
}

impl RecognitionProbe {
    /// How many times recognition was started.
    pub fn starts(&self) -> u32 {
        self.starts.load(Ordering::SeqCst)
    }

    /// How many times recognition was stopped.
    pub fn stops(&self) -> u32 {
        self.stops.load(Ordering::SeqCst)
    }
}

/// Recognition module that plays back a scripted found/lost sequence.
#[derive(Debug)]
pub struct SimulatedRecognitionModule {
    script: Vec<TargetEvent>,
    event_interval: Duration,
    probe: Arc<RecognitionProbe>,
}

impl SimulatedRecognitionModule {
    /// Create a module that emits `script` with `event_interval` pacing
    /// once an engine built from it is started.
    pub fn new(script: Vec<TargetEvent>, event_interval: Duration) -> Self {
        Self {
            script,
            event_interval,
            probe: Arc::new(RecognitionProbe::default()),
        }
    }

    /// The shared lifecycle record for engines built from this module.
    pub fn probe(&self) -> Arc<RecognitionProbe> {
        Arc::clone(&self.probe)
    }
}

impl RecognitionModule for SimulatedRecognitionModule {
    fn create(&self, target_locator: &str) -> Result<RecognitionPipeline, EngineError> {
        if target_locator.is_empty() {
            return Err(EngineError::Configuration(
                "empty target resource locator".to_string(),
            ));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        Ok(RecognitionPipeline {
            engine: Box::new(SimulatedRecognition {
                script: self.script.clone(),
                event_interval: self.event_interval,
                probe: Arc::clone(&self.probe),
                stopped: Arc::new(AtomicBool::new(false)),
                tx: Mutex::new(Some(tx)),
            }),
            events: rx,
        })
    }
}

struct SimulatedRecognition {
    script: Vec<TargetEvent>,
    event_interval: Duration,
    probe: Arc<RecognitionProbe>,
    stopped: Arc<AtomicBool>,
    // Handed to the playback task on start, so the event channel closes
    // when the script runs out.
    tx: Mutex<Option<mpsc::UnboundedSender<TargetEvent>>>,
}

impl RecognitionEngine for SimulatedRecognition {
    fn start(&self) -> BoxFuture<'_, Result<(), EngineError>> {
        self.probe.starts.fetch_add(1, Ordering::SeqCst);
        let Some(tx) = self.tx.lock().take() else {
            return async { Ok(()) }.boxed();
        };
        let script = self.script.clone();
        let interval = self.event_interval;
        let stopped = Arc::clone(&self.stopped);
        tokio::spawn(async move {
            for event in script {
                tokio::time::sleep(interval).await;
                if stopped.load(Ordering::SeqCst) {
                    break;
                }
                if tx.send(event).is_err() {
                    break;
                }
            }
        });
        async { Ok(()) }.boxed()
    }

    fn stop(&self) -> BoxFuture<'_, Result<(), EngineError>> {
        // Halt the emitter before reporting stopped, so no event lands
        // after a caller has observed the stop.
        self.stopped.store(true, Ordering::SeqCst);
        self.probe.stops.fetch_add(1, Ordering::SeqCst);
        async { Ok(()) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::ReferenceSpace;

    #[tokio::test]
    async fn test_surface_appears_after_scripted_frames() {
        let config = SimulatedEngineConfig::default();
        let engine = SimulatedEngine::new(config);
        let mut session = engine
            .start_session(SessionConfig {
                reference_space: ReferenceSpace::LocalFloor,
            })
            .await
            .unwrap();

        for _ in 0..3 {
            assert!(session.hit_test().is_none());
        }
        assert!(session.hit_test().is_some());
    }

    #[tokio::test]
    async fn test_model_load_failure_injection() {
        let config = SimulatedEngineConfig {
            fail_model_load: Some("corrupt glb".to_string()),
            ..SimulatedEngineConfig::default()
        };
        let engine = SimulatedEngine::new(config);
        let err = engine.load_model("models/chair.glb").await.unwrap_err();
        assert!(matches!(err, EngineError::ModelLoad { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recognition_script_playback() {
        let module = SimulatedRecognitionModule::new(
            vec![TargetEvent::Found, TargetEvent::Lost, TargetEvent::Found],
            Duration::from_millis(10),
        );
        let mut pipeline = module.create("targets/poster.mind").unwrap();
        pipeline.engine.start().await.unwrap();

        assert_eq!(pipeline.events.recv().await, Some(TargetEvent::Found));
        assert_eq!(pipeline.events.recv().await, Some(TargetEvent::Lost));
        assert_eq!(pipeline.events.recv().await, Some(TargetEvent::Found));
        assert_eq!(module.probe().starts(), 1);
    }

    #[tokio::test]
    async fn test_recognition_rejects_empty_target() {
        let module = SimulatedRecognitionModule::new(vec![], Duration::from_millis(1));
        assert!(matches!(
            module.create(""),
            Err(EngineError::Configuration(_))
        ));
    }
}
