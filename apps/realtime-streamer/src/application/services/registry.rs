//! Tokenizer Registry
//!
//! Process-wide cache of loaded tokenizer handles with single-flight loading.
//!
//! # Design
//!
//! Each name maps to a slot that is either `Loading` (a shared in-flight load)
//! or `Ready` (a loaded handle). The first caller for an uncached name starts
//! the load; concurrent callers for the same name await the same shared
//! future and receive the same result, success or failure. A successful load
//! turns the slot `Ready`; a failed load removes it so the next resolution
//! retries from scratch.

use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;

use crate::application::ports::TokenizerLoader;
use crate::domain::tokenizer::{TokenizerCatalog, TokenizerError, TokenizerHandle, TokenizerSpec};

type LoadResult = Result<Arc<TokenizerHandle>, TokenizerError>;
type InFlightLoad = Shared<BoxFuture<'static, LoadResult>>;

enum Slot {
    Loading(InFlightLoad),
    Ready(Arc<TokenizerHandle>),
}

type Slots = Arc<Mutex<HashMap<String, Slot>>>;

/// Resolves tokenizer names to shared handles.
///
/// Constructed once at start-up and shared by every session.
pub struct TokenizerRegistry {
    catalog: TokenizerCatalog,
    loader: Arc<dyn TokenizerLoader>,
    slots: Slots,
}

impl TokenizerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new(catalog: TokenizerCatalog, loader: Arc<dyn TokenizerLoader>) -> Self {
        Self {
            catalog,
            loader,
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Resolve `name` to a loaded handle.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::UnknownTokenizer`] for names outside the
    /// catalog, or the loader's [`TokenizerError::LoadFailure`].
    pub async fn resolve(&self, name: &str) -> Result<Arc<TokenizerHandle>, TokenizerError> {
        let spec = self.catalog.lookup(name)?;

        let pending = {
            let mut slots = self.slots.lock();
            match slots.get(name) {
                Some(Slot::Ready(handle)) => return Ok(Arc::clone(handle)),
                Some(Slot::Loading(load)) => {
                    tracing::debug!(tokenizer = name, "Joining in-flight tokenizer load");
                    load.clone()
                }
                None => {
                    let load = self.start_load(spec);
                    slots.insert(name.to_string(), Slot::Loading(load.clone()));
                    load
                }
            }
        };

        pending.await
    }

    fn start_load(&self, spec: TokenizerSpec) -> InFlightLoad {
        let loader = Arc::clone(&self.loader);
        let slots = Arc::clone(&self.slots);

        async move {
            let name = spec.name().to_string();
            tracing::info!(tokenizer = %name, backend = spec.family().label(), "Loading tokenizer");

            let result = loader.load(&spec).await.map(Arc::new);

            {
                let mut slots = slots.lock();
                match &result {
                    Ok(handle) => {
                        slots.insert(name.clone(), Slot::Ready(Arc::clone(handle)));
                    }
                    Err(_) => {
                        slots.remove(&name);
                    }
                }
            }

            match &result {
                Ok(_) => tracing::info!(tokenizer = %name, "Tokenizer ready"),
                Err(e) => tracing::warn!(tokenizer = %name, error = %e, "Tokenizer load failed"),
            }
            result
        }
        .boxed()
        .shared()
    }

    /// Whether `name` has a loaded handle.
    #[must_use]
    pub fn is_loaded(&self, name: &str) -> bool {
        matches!(self.slots.lock().get(name), Some(Slot::Ready(_)))
    }

    /// Names with loaded handles, sorted.
    #[must_use]
    pub fn loaded_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .slots
            .lock()
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Ready(_)))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Every name the catalog recognizes.
    #[must_use]
    pub fn known_names(&self) -> Vec<String> {
        self.catalog.names()
    }
}

impl std::fmt::Debug for TokenizerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenizerRegistry")
            .field("catalog", &self.catalog)
            .field("loaded", &self.loaded_names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::domain::tokenizer::{Backend, BackendFamily};

    /// Counts loads; fails the first `failures` attempts.
    struct CountingLoader {
        loads: AtomicUsize,
        failures: AtomicUsize,
        latency: Duration,
    }

    impl CountingLoader {
        fn new(failures: usize, latency: Duration) -> Arc<Self> {
            Arc::new(Self {
                loads: AtomicUsize::new(0),
                failures: AtomicUsize::new(failures),
                latency,
            })
        }

        fn loads(&self) -> usize {
            self.loads.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenizerLoader for CountingLoader {
        async fn load(&self, spec: &TokenizerSpec) -> Result<TokenizerHandle, TokenizerError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.latency).await;

            let failing = self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(TokenizerError::load_failure(spec.name(), "weights missing"));
            }

            let BackendFamily::Tiktoken(_) = spec.family() else {
                return Err(TokenizerError::load_failure(spec.name(), "offline test"));
            };
            let bpe = tiktoken_rs::cl100k_base().map_err(|e| TokenizerError::load_failure(spec.name(), e))?;
            Ok(TokenizerHandle::new(spec.clone(), Backend::Tiktoken(Box::new(bpe))))
        }
    }

    fn registry(loader: Arc<CountingLoader>) -> TokenizerRegistry {
        TokenizerRegistry::new(TokenizerCatalog::default(), loader)
    }

    #[tokio::test]
    async fn unknown_name_never_reaches_loader() {
        let loader = CountingLoader::new(0, Duration::ZERO);
        let registry = registry(Arc::clone(&loader));

        let err = registry.resolve("does-not-exist").await.unwrap_err();
        assert_eq!(
            err,
            TokenizerError::UnknownTokenizer("does-not-exist".to_string())
        );
        assert_eq!(loader.loads(), 0);
    }

    #[tokio::test]
    async fn resolved_handle_is_cached() {
        let loader = CountingLoader::new(0, Duration::ZERO);
        let registry = registry(Arc::clone(&loader));

        let first = registry.resolve("cl100k_base").await.unwrap();
        let second = registry.resolve("cl100k_base").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.loads(), 1);
        assert!(registry.is_loaded("cl100k_base"));
        assert_eq!(registry.loaded_names(), vec!["cl100k_base".to_string()]);
    }

    #[tokio::test]
    async fn concurrent_first_use_loads_once() {
        let loader = CountingLoader::new(0, Duration::from_millis(100));
        let registry = Arc::new(registry(Arc::clone(&loader)));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.resolve("cl100k_base").await })
            })
            .collect();

        let mut handles = Vec::new();
        for task in tasks {
            handles.push(task.await.unwrap().unwrap());
        }

        assert_eq!(loader.loads(), 1);
        assert!(handles.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[tokio::test]
    async fn concurrent_waiters_share_failure() {
        let loader = CountingLoader::new(1, Duration::from_millis(100));
        let registry = Arc::new(registry(Arc::clone(&loader)));

        let (a, b) = tokio::join!(
            registry.resolve("cl100k_base"),
            registry.resolve("cl100k_base")
        );

        assert!(matches!(a, Err(TokenizerError::LoadFailure { .. })));
        assert!(matches!(b, Err(TokenizerError::LoadFailure { .. })));
        assert_eq!(loader.loads(), 1);
    }

    #[tokio::test]
    async fn failed_load_does_not_poison_cache() {
        let loader = CountingLoader::new(1, Duration::ZERO);
        let registry = registry(Arc::clone(&loader));

        assert!(registry.resolve("cl100k_base").await.is_err());
        assert!(!registry.is_loaded("cl100k_base"));

        let handle = registry.resolve("cl100k_base").await.unwrap();
        assert_eq!(handle.name(), "cl100k_base");
        assert_eq!(loader.loads(), 2);
    }

    #[tokio::test]
    async fn distinct_names_load_independently() {
        let loader = CountingLoader::new(0, Duration::ZERO);
        let registry = registry(Arc::clone(&loader));

        registry.resolve("cl100k_base").await.unwrap();
        registry.resolve("o200k_base").await.unwrap();

        assert_eq!(loader.loads(), 2);
        assert_eq!(
            registry.loaded_names(),
            vec!["cl100k_base".to_string(), "o200k_base".to_string()]
        );
    }

    #[test]
    fn known_names_come_from_catalog() {
        let registry = registry(CountingLoader::new(0, Duration::ZERO));
        let names = registry.known_names();
        assert!(names.contains(&"gpt2".to_string()));
        assert!(names.contains(&"o200k_base".to_string()));
    }
}
