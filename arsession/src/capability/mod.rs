//! Platform and device capability detection.
//!
//! Capability queries are pure and side-effect free, and they fail closed: a
//! provider that cannot answer reports [`Support::Unknown`], which the
//! detector downgrades to "not supported" instead of surfacing an error.
//! A missing capability never crashes a caller, it only degrades the
//! experience.
//!
//! The provider is injected so the session state machine can be exercised
//! without a real browser or device environment.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

/// Answer from a capability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    /// The capability is known to be available.
    Supported,
    /// The capability is known to be missing.
    Unsupported,
    /// The probe could not determine availability (treated as missing).
    Unknown,
}

/// Coarse device classification used to pick an AR delivery mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformClass {
    /// iPhone/iPad-class device (Quick Look style delivery).
    IosLike,
    /// Android-class device (immersive session delivery).
    AndroidLike,
    /// Anything else, including unknown.
    Other,
}

/// Source of capability answers.
///
/// Implementations wrap whatever platform probing is available; any internal
/// probe error must be reported as [`Support::Unknown`], never panicked or
/// propagated.
pub trait CapabilityProvider: Send + Sync {
    /// Whether an immersive AR session can be requested.
    fn immersive_support(&self) -> BoxFuture<'_, Support>;

    /// Whether a camera is present and usable.
    fn camera_available(&self) -> BoxFuture<'_, Support>;

    /// Classify the device.
    fn platform_class(&self) -> PlatformClass;
}

/// Fail-closed wrapper over a [`CapabilityProvider`].
#[derive(Clone)]
pub struct CapabilityDetector {
    provider: Arc<dyn CapabilityProvider>,
}

impl CapabilityDetector {
    /// Create a detector over the given provider.
    pub fn new(provider: Arc<dyn CapabilityProvider>) -> Self {
        Self { provider }
    }

    /// True only when immersive sessions are positively supported.
    pub async fn check_immersive_support(&self) -> bool {
        matches!(
            self.provider.immersive_support().await,
            Support::Supported
        )
    }

    /// True only when a camera is positively available.
    pub async fn check_camera_available(&self) -> bool {
        matches!(self.provider.camera_available().await, Support::Supported)
    }

    /// Classify the device; unknown classifications map to
    /// [`PlatformClass::Other`].
    pub fn classify_platform(&self) -> PlatformClass {
        self.provider.platform_class()
    }
}

impl std::fmt::Debug for CapabilityDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityDetector").finish_non_exhaustive()
    }
}

/// Capability provider with fixed answers.
///
/// Used by the CLI demo and tests, and as the building block for
/// configuration-driven capability injection.
#[derive(Debug, Clone, Copy)]
pub struct StaticCapabilities {
    /// Immersive session support answer.
    pub immersive: Support,
    /// Camera availability answer.
    pub camera: Support,
    /// Device classification answer.
    pub platform: PlatformClass,
}

impl StaticCapabilities {
    /// A fully-capable Android-class device.
    pub fn full() -> Self {
        Self {
            immersive: Support::Supported,
            camera: Support::Supported,
            platform: PlatformClass::AndroidLike,
        }
    }

    /// A device with no AR capabilities at all.
    pub fn none() -> Self {
        Self {
            immersive: Support::Unsupported,
            camera: Support::Unsupported,
            platform: PlatformClass::Other,
        }
    }
}

impl CapabilityProvider for StaticCapabilities {
    fn immersive_support(&self) -> BoxFuture<'_, Support> {
        let answer = self.immersive;
        async move { answer }.boxed()
    }

    fn camera_available(&self) -> BoxFuture<'_, Support> {
        let answer = self.camera;
        async move { answer }.boxed()
    }

    fn platform_class(&self) -> PlatformClass {
        self.platform
    }
}
