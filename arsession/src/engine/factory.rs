//! Typed engine providers selected by configuration.
//!
//! Replaces dynamic module loading by string path: a configuration enum
//! names the engine implementation, and the factory wraps its acquisition
//! in a [`ResourceHandle`] so the single-flight/memoization contract holds
//! for every consumer of the same handle.

use std::sync::Arc;
use std::time::Duration;

use crate::resource::{ResourceError, ResourceHandle};

use super::simulated::{SimulatedEngine, SimulatedRecognitionModule};
use super::types::{ImmersiveEngine, RecognitionModule};

/// Which engine implementation to provide.
///
/// A real deployment would add variants for concrete runtimes (for example
/// a WebXR-backed engine); the state machines only ever see the trait
/// objects the factory hands out.
#[derive(Clone)]
pub enum EngineConfig {
    /// Scripted in-process engine for demos and tests.
    Simulated {
        /// The immersive engine instance to provide.
        engine: Arc<SimulatedEngine>,
        /// The recognition module instance to provide.
        recognition: Arc<SimulatedRecognitionModule>,
        /// Simulated module-fetch latency before the engine is available.
        load_delay: Duration,
        /// When set, acquisition fails with this reason (retryable).
        fail_module_load: Option<String>,
    },
}

impl EngineConfig {
    /// Simulated engines with no injected latency or failures.
    pub fn simulated(
        engine: Arc<SimulatedEngine>,
        recognition: Arc<SimulatedRecognitionModule>,
    ) -> Self {
        Self::Simulated {
            engine,
            recognition,
            load_delay: Duration::ZERO,
            fail_module_load: None,
        }
    }
}

/// Builds lazily-loaded engine handles from configuration.
pub struct EngineFactory;

impl EngineFactory {
    /// Handle for the immersive render/tracking engine.
    pub fn immersive(config: &EngineConfig) -> Arc<ResourceHandle<dyn ImmersiveEngine>> {
        match config {
            EngineConfig::Simulated {
                engine,
                load_delay,
                fail_module_load,
                ..
            } => {
                let engine = Arc::clone(engine);
                let load_delay = *load_delay;
                let fail = fail_module_load.clone();
                Arc::new(ResourceHandle::new("immersive-engine", move || {
                    let engine = Arc::clone(&engine);
                    let fail = fail.clone();
                    async move {
                        tokio::time::sleep(load_delay).await;
                        if let Some(reason) = fail {
                            return Err(ResourceError::load_failed(reason));
                        }
                        Ok(engine as Arc<dyn ImmersiveEngine>)
                    }
                }))
            }
        }
    }

    /// Handle for the recognition runtime module.
    pub fn recognition(config: &EngineConfig) -> Arc<ResourceHandle<dyn RecognitionModule>> {
        match config {
            EngineConfig::Simulated {
                recognition,
                load_delay,
                fail_module_load,
                ..
            } => {
                let module = Arc::clone(recognition);
                let load_delay = *load_delay;
                let fail = fail_module_load.clone();
                Arc::new(ResourceHandle::new("recognition-module", move || {
                    let module = Arc::clone(&module);
                    let fail = fail.clone();
                    async move {
                        tokio::time::sleep(load_delay).await;
                        if let Some(reason) = fail {
                            return Err(ResourceError::load_failed(reason));
                        }
                        Ok(module as Arc<dyn RecognitionModule>)
                    }
                }))
            }
        }
    }
}
