//! Camera permission boundary.

use futures::future::BoxFuture;
use futures::FutureExt;

/// Asks the platform whether the camera may be used.
///
/// A single boolean probe, invoked before any heavy resource acquisition so
/// a declined prompt costs nothing.
pub trait PermissionProbe: Send + Sync {
    /// Prompt for camera access; resolves to whether it was granted.
    fn request_camera(&self) -> BoxFuture<'_, bool>;
}

/// Permission probe with a fixed answer, for demos and tests.
#[derive(Debug, Clone, Copy)]
pub struct StaticPermission {
    granted: bool,
}

impl StaticPermission {
    /// A probe that always grants access.
    pub fn allow() -> Self {
        Self { granted: true }
    }

    /// A probe that always denies access.
    pub fn deny() -> Self {
        Self { granted: false }
    }
}

impl PermissionProbe for StaticPermission {
    fn request_camera(&self) -> BoxFuture<'_, bool> {
        let granted = self.granted;
        async move { granted }.boxed()
    }
}
