//! Engine trait contracts and the data types crossing them.

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::gesture::GestureTransform;
use crate::pose::Pose;

/// Errors reported by an engine runtime.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// A model resource could not be loaded.
    #[error("failed to load model `{locator}`: {reason}")]
    ModelLoad {
        /// The model resource locator that failed.
        locator: String,
        /// Engine-reported reason.
        reason: String,
    },

    /// The native session could not be started.
    #[error("failed to start immersive session: {0}")]
    SessionStart(String),

    /// The session crashed or ended abnormally mid-flight.
    #[error("session failure: {0}")]
    SessionFailure(String),

    /// The engine rejected a stop/end call.
    #[error("engine stop failed: {0}")]
    Stop(String),

    /// A construction-time configuration problem (e.g. empty target).
    #[error("engine configuration error: {0}")]
    Configuration(String),
}

/// Raw transform reported by the platform hit-test facility.
///
/// Position and `(x, y, z, w)` orientation in the session reference space;
/// converted to a [`Pose`] by the hit-test tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitSample {
    /// Intersection position in meters.
    pub position: [f64; 3],
    /// Surface orientation quaternion components `(x, y, z, w)`.
    pub orientation: [f64; 4],
}

impl HitSample {
    /// Convert into a normalized pose.
    pub fn to_pose(&self) -> Pose {
        Pose::from_raw(self.position, self.orientation)
    }
}

/// Handle to a model loaded by the engine.
///
/// Opaque beyond the one geometric fact the core needs: the largest extent
/// of the model's bounding box, used to fit it to real-world dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelHandle {
    /// The locator the model was loaded from.
    pub locator: String,
    /// Largest bounding-box extent, in model units.
    pub bounding_max_dimension: f64,
}

/// Coordinate frame poses are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSpace {
    /// Ray origin at the viewer (hit-test source).
    Viewer,
    /// Floor-anchored local space (placement poses).
    LocalFloor,
}

/// Options for starting an immersive session.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Reference space placement poses are reported in.
    pub reference_space: ReferenceSpace,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reference_space: ReferenceSpace::LocalFloor,
        }
    }
}

/// An immersive render/tracking runtime.
///
/// Obtained lazily through a resource handle; one engine instance can start
/// sessions repeatedly.
pub trait ImmersiveEngine: Send + Sync {
    /// Load a model resource, returning its handle.
    fn load_model(&self, locator: &str) -> BoxFuture<'_, Result<ModelHandle, EngineError>>;

    /// Request a native immersive session with a frame loop enabled.
    fn start_session(
        &self,
        config: SessionConfig,
    ) -> BoxFuture<'_, Result<Box<dyn ImmersiveSession>, EngineError>>;
}

/// A running native immersive session.
///
/// Frame-loop methods are synchronous: they are called from the host's
/// per-frame callback and must not block.
pub trait ImmersiveSession: Send {
    /// Query the hit-test result for the current frame, if any surface is
    /// intersected by the viewer ray.
    fn hit_test(&mut self) -> Option<HitSample>;

    /// Anchor the placed object at a pose with the given uniform scale.
    fn show_object(&mut self, pose: &Pose, scale: f64);

    /// Apply a gesture transform to the placed object.
    fn update_object(&mut self, transform: &GestureTransform);

    /// End the native session and release its resources.
    ///
    /// Idempotent at the contract level: a second call is a no-op.
    fn end(&mut self) -> BoxFuture<'_, Result<(), EngineError>>;
}

/// Event emitted by a recognition engine while scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetEvent {
    /// The image target entered the camera view.
    Found,
    /// The image target left the camera view.
    Lost,
}

/// A running image-target recognition engine.
pub trait RecognitionEngine: Send + Sync {
    /// Start the camera and recognition loop.
    fn start(&self) -> BoxFuture<'_, Result<(), EngineError>>;

    /// Stop recognition and release the camera.
    ///
    /// Idempotent; safe to call before `start`.
    fn stop(&self) -> BoxFuture<'_, Result<(), EngineError>>;
}

/// A recognition engine plus its event stream.
pub struct RecognitionPipeline {
    /// The engine lifecycle handle.
    pub engine: Box<dyn RecognitionEngine>,
    /// Found/lost events, delivered in recognition order.
    pub events: mpsc::UnboundedReceiver<TargetEvent>,
}

/// The lazily-loaded recognition runtime module.
///
/// The module itself is the heavy thing to load (and the thing cached by
/// the resource handle); engines are constructed from it per scan, one per
/// target resource.
pub trait RecognitionModule: Send + Sync {
    /// Construct a recognition engine for the given target resource.
    fn create(&self, target_locator: &str) -> Result<RecognitionPipeline, EngineError>;
}
