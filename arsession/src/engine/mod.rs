//! Contracts for the external render/tracking runtimes.
//!
//! The interaction core does not reimplement rendering or natural-feature
//! tracking. It drives opaque engines through the narrow traits defined
//! here: load a model, start and end an immersive session, answer a
//! per-frame hit-test, emit found/lost events for an image target. Every
//! engine call may fail asynchronously and the core tolerates it.
//!
//! Engines are obtained through typed providers routed through a
//! [`ResourceHandle`](crate::resource::ResourceHandle), never by runtime
//! string import, so acquisition keeps single-flight semantics and the
//! state machines stay testable against the [`simulated`] implementations.

mod factory;
mod simulated;
mod types;

pub use factory::{EngineConfig, EngineFactory};
pub use simulated::{
    RecognitionProbe, SessionProbe, SimulatedEngine, SimulatedEngineConfig,
    SimulatedRecognitionModule, SimulatedScript,
};
pub use types::{
    EngineError, HitSample, ImmersiveEngine, ImmersiveSession, ModelHandle, RecognitionEngine,
    RecognitionModule, RecognitionPipeline, ReferenceSpace, SessionConfig, TargetEvent,
};
