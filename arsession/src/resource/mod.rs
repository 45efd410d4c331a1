//! Deferred, memoized acquisition of heavy engine modules.
//!
//! Render and tracking runtimes are expensive to load, so nothing is fetched
//! until an AR experience is actually requested. A [`ResourceHandle`] wraps a
//! loader function with single-flight semantics: however many callers race
//! on `acquire()`, the loader runs at most once per attempt and everyone
//! shares its outcome.
//!
//! Success is cached for the handle's lifetime. Failure is recorded but not
//! cached permanently: the next explicit `acquire()` retries the loader.
//! This distinguishes the handle from plain memoization and lets a user
//! retry after a transient load failure.

use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

/// Error produced by a resource loader.
///
/// Clonable so that every caller attached to one in-flight load can observe
/// the same failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResourceError {
    /// The loader reported a failure (network, parse, or incompatible
    /// environment).
    #[error("resource load failed: {0}")]
    LoadFailed(String),
}

impl ResourceError {
    /// Build a load failure from any displayable cause.
    pub fn load_failed(cause: impl std::fmt::Display) -> Self {
        Self::LoadFailed(cause.to_string())
    }
}

/// Observable lifecycle of a handle, for UI surfaces and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    /// The loader has never been invoked.
    NotLoaded,
    /// A load is in flight; new callers attach to it.
    Loading,
    /// The resource is available.
    Loaded,
    /// The last load attempt failed; an explicit `acquire()` retries.
    Failed,
}

type InFlight<T> = Shared<BoxFuture<'static, Result<Arc<T>, ResourceError>>>;

enum LoadState<T: ?Sized> {
    NotLoaded,
    Loading(InFlight<T>),
    Loaded(Arc<T>),
    Failed(ResourceError),
}

type LoaderFn<T> =
    Box<dyn Fn() -> BoxFuture<'static, Result<Arc<T>, ResourceError>> + Send + Sync>;

/// Lazily-loaded handle to a heavy external module.
///
/// Shared by all consumers that reference the same handle instance; the
/// internal mutex guards only state transitions, never an await.
pub struct ResourceHandle<T: ?Sized> {
    name: String,
    state: Mutex<LoadState<T>>,
    loader: LoaderFn<T>,
}

impl<T: ?Sized + Send + Sync + 'static> ResourceHandle<T> {
    /// Create a handle around a loader function.
    ///
    /// The loader is not invoked until the first [`acquire`](Self::acquire)
    /// or [`preload`](Self::preload).
    pub fn new<F, Fut>(name: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Arc<T>, ResourceError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            state: Mutex::new(LoadState::NotLoaded),
            loader: Box::new(move || loader().boxed()),
        }
    }

    /// Acquire the resource, loading it on first use.
    ///
    /// Concurrent callers during a load attach to the same in-flight future;
    /// the loader itself runs exactly once per attempt. After a failure the
    /// next call starts a fresh attempt.
    pub async fn acquire(&self) -> Result<Arc<T>, ResourceError> {
        let inflight = {
            let mut state = self.state.lock();
            match &*state {
                LoadState::Loaded(value) => return Ok(Arc::clone(value)),
                LoadState::Loading(inflight) => inflight.clone(),
                LoadState::NotLoaded | LoadState::Failed(_) => {
                    debug!(resource = %self.name, "starting resource load");
                    let inflight = (self.loader)().shared();
                    *state = LoadState::Loading(inflight.clone());
                    inflight
                }
            }
        };

        let result = inflight.clone().await;

        let mut state = self.state.lock();
        // Only the attempt that is still current may publish its outcome; a
        // retry started after cancellation must not be clobbered.
        if let LoadState::Loading(current) = &*state {
            if current.ptr_eq(&inflight) {
                *state = match &result {
                    Ok(value) => LoadState::Loaded(Arc::clone(value)),
                    Err(error) => LoadState::Failed(error.clone()),
                };
            }
        }
        result
    }

    /// Trigger acquisition without waiting for the result.
    ///
    /// Failures are logged and swallowed; nothing is propagated to a caller.
    pub fn preload(self: &Arc<Self>) {
        let handle = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(error) = handle.acquire().await {
                warn!(resource = %handle.name, %error, "preload failed");
            }
        });
    }

    /// Non-blocking snapshot of the loaded value, if any.
    pub fn try_get(&self) -> Option<Arc<T>> {
        match &*self.state.lock() {
            LoadState::Loaded(value) => Some(Arc::clone(value)),
            _ => None,
        }
    }

    /// The error from the most recent failed attempt, if the handle is in
    /// the failed state.
    pub fn last_error(&self) -> Option<ResourceError> {
        match &*self.state.lock() {
            LoadState::Failed(error) => Some(error.clone()),
            _ => None,
        }
    }

    /// Whether a load attempt is currently in flight.
    pub fn is_loading(&self) -> bool {
        matches!(&*self.state.lock(), LoadState::Loading(_))
    }

    /// Current lifecycle state of the handle.
    pub fn state(&self) -> ResourceState {
        match &*self.state.lock() {
            LoadState::NotLoaded => ResourceState::NotLoaded,
            LoadState::Loading(_) => ResourceState::Loading,
            LoadState::Loaded(_) => ResourceState::Loaded,
            LoadState::Failed(_) => ResourceState::Failed,
        }
    }
}

impl<T: ?Sized> std::fmt::Debug for ResourceHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
