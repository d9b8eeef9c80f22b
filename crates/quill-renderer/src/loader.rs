//! Optional module loading.
//!
//! The highlighter and the math engine are optional. Each is wrapped in a
//! [`ModuleLoader`] that attempts the load once, on first use, and caches
//! the outcome for the lifetime of the loader. Failures are logged and
//! never retried; callers see `None` and fall back to plain rendering.

use std::fmt;
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::highlight::HighlightService;
use crate::math::MathService;

/// Error raised while loading an optional module.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The module was disabled at build time or by configuration.
    #[error("{0} is disabled")]
    Disabled(&'static str),

    /// The module failed to initialize.
    #[error("failed to initialize {module}: {message}")]
    Init {
        /// Module name.
        module: &'static str,
        /// Underlying error.
        message: String,
    },

    /// The loader panicked.
    #[error("{0} loader panicked")]
    Panicked(&'static str),
}

/// Cached outcome of a load attempt.
pub enum Availability<T: ?Sized> {
    /// Module loaded and ready.
    Available(Arc<T>),
    /// Load failed or module disabled; never retried.
    Unavailable,
}

impl<T: ?Sized> Availability<T> {
    /// Module handle, if available.
    #[must_use]
    pub fn module(&self) -> Option<Arc<T>> {
        match self {
            Self::Available(module) => Some(Arc::clone(module)),
            Self::Unavailable => None,
        }
    }
}

impl<T: ?Sized> fmt::Debug for Availability<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available(_) => f.write_str("Available"),
            Self::Unavailable => f.write_str("Unavailable"),
        }
    }
}

type LoaderFn<T> = dyn Fn() -> Result<Arc<T>, LoadError> + Send + Sync;

/// Lazily loads a module at most once.
///
/// Concurrent first callers share the same in-flight load; the loader
/// function runs on a blocking thread.
pub struct ModuleLoader<T: ?Sized> {
    name: &'static str,
    loader: Arc<LoaderFn<T>>,
    cell: OnceCell<Availability<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> ModuleLoader<T> {
    /// Create a loader. Nothing is loaded until [`ModuleLoader::load`].
    pub fn new<F>(name: &'static str, loader: F) -> Self
    where
        F: Fn() -> Result<Arc<T>, LoadError> + Send + Sync + 'static,
    {
        Self {
            name,
            loader: Arc::new(loader),
            cell: OnceCell::new(),
        }
    }

    /// Loader whose module is permanently unavailable.
    #[must_use]
    pub fn unavailable(name: &'static str) -> Self {
        Self::new(name, move || Err(LoadError::Disabled(name)))
    }

    /// Already-loaded module, bypassing the loader function.
    #[must_use]
    pub fn ready(name: &'static str, module: Arc<T>) -> Self {
        Self {
            name,
            loader: Arc::new(move || Err(LoadError::Disabled(name))),
            cell: OnceCell::new_with(Some(Availability::Available(module))),
        }
    }

    /// Module name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether a load attempt has completed.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// Load the module, or return the cached outcome.
    ///
    /// Returns `None` when the module is unavailable. Never fails.
    pub async fn load(&self) -> Option<Arc<T>> {
        self.cell
            .get_or_init(|| self.attempt())
            .await
            .module()
    }

    async fn attempt(&self) -> Availability<T> {
        let loader = Arc::clone(&self.loader);
        let result = tokio::task::spawn_blocking(move || loader())
            .await
            .unwrap_or(Err(LoadError::Panicked(self.name)));

        match result {
            Ok(module) => {
                tracing::info!(module = self.name, "Loaded optional module");
                Availability::Available(module)
            }
            Err(LoadError::Disabled(_)) => {
                tracing::info!(module = self.name, "Optional module disabled");
                Availability::Unavailable
            }
            Err(e) => {
                tracing::warn!(module = self.name, error = %e, "Optional module unavailable, using fallback rendering");
                Availability::Unavailable
            }
        }
    }
}

/// Optional modules used by the pipeline.
pub struct Services {
    /// Syntax highlighter.
    pub highlight: HighlightService,
    /// Math engine.
    pub math: MathService,
}

impl Services {
    /// Create services from explicit loaders.
    #[must_use]
    pub fn new(highlight: HighlightService, math: MathService) -> Self {
        Self { highlight, math }
    }

    /// Services backed by the engines compiled into this crate.
    #[must_use]
    pub fn bundled() -> Self {
        Self::new(HighlightService::syntect(), MathService::katex())
    }

    /// Services with both modules permanently unavailable.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::new(
            HighlightService::unavailable("highlighter"),
            MathService::unavailable("math"),
        )
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("highlight", &self.highlight.name())
            .field("math", &self.math.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    fn counting_loader(
        calls: Arc<AtomicUsize>,
        succeed: bool,
    ) -> ModuleLoader<String> {
        ModuleLoader::new("counter", move || {
            calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            if succeed {
                Ok(Arc::new("engine".to_owned()))
            } else {
                Err(LoadError::Init {
                    module: "counter",
                    message: "missing backend".to_owned(),
                })
            }
        })
    }

    #[tokio::test]
    async fn test_load_success_is_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = counting_loader(Arc::clone(&calls), true);

        assert!(!loader.is_loaded());
        assert_eq!(loader.load().await.as_deref(), Some(&"engine".to_owned()));
        assert_eq!(loader.load().await.as_deref(), Some(&"engine".to_owned()));
        assert!(loader.is_loaded());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_load_failure_is_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = counting_loader(Arc::clone(&calls), false);

        assert!(loader.load().await.is_none());
        assert!(loader.load().await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_calls_share_one_load() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = counting_loader(Arc::clone(&calls), true);

        let (a, b, c) = tokio::join!(loader.load(), loader.load(), loader.load());

        assert!(a.is_some() && b.is_some() && c.is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_loader_is_unavailable() {
        let loader: ModuleLoader<String> = ModuleLoader::new("boom", || panic!("init crashed"));

        assert!(loader.load().await.is_none());
        assert!(loader.is_loaded());
    }

    #[tokio::test]
    async fn test_unavailable_loader() {
        let loader: ModuleLoader<String> = ModuleLoader::unavailable("off");
        assert!(loader.load().await.is_none());
    }

    #[tokio::test]
    async fn test_ready_loader_skips_loading() {
        let loader = ModuleLoader::ready("fixed", Arc::new(7_u32));
        assert!(loader.is_loaded());
        assert_eq!(loader.load().await.as_deref(), Some(&7));
    }

    #[tokio::test]
    async fn test_unavailable_services() {
        let services = Services::unavailable();
        assert!(services.highlight.load().await.is_none());
        assert!(services.math.load().await.is_none());
    }

    #[test]
    fn test_load_error_display() {
        let err = LoadError::Init {
            module: "katex",
            message: "no js runtime".to_owned(),
        };
        assert_eq!(err.to_string(), "failed to initialize katex: no js runtime");
        assert_eq!(LoadError::Disabled("syntect").to_string(), "syntect is disabled");
    }
}
