//! Fetch-once cache for the package index.
//!
//! The first [`IndexLoader::load`] starts a fetch and parks a shared future in
//! the loader. Every caller that arrives while it is pending gets a clone of
//! that same future, so there is never more than one fetch in flight. A
//! successful result is kept for the rest of the process; a failure is handed
//! to every waiter and the next call fetches again.

use futures::FutureExt;
use futures::future::{self, BoxFuture, Shared};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::source::IndexSource;
use super::types::PackageIndex;
use crate::error::IndexLoadError;

pub type LoadResult = Result<Arc<PackageIndex>, IndexLoadError>;

/// Handle on a load. Clones of the same pending load compare equal with
/// [`Shared::ptr_eq`].
pub type IndexFuture = Shared<BoxFuture<'static, LoadResult>>;

enum LoadState {
    Empty,
    Pending(IndexFuture),
    Resolved(Arc<PackageIndex>),
    Failed(IndexLoadError),
}

/// Snapshot of the loader state, for display.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Empty,
    Pending,
    Resolved { packages: usize, types: usize },
    Failed(IndexLoadError),
}

pub struct IndexLoader {
    source: Arc<dyn IndexSource>,
    state: Arc<Mutex<LoadState>>,
    fetches: AtomicUsize,
}

impl IndexLoader {
    pub fn new(source: Arc<dyn IndexSource>) -> Self {
        Self {
            source,
            state: Arc::new(Mutex::new(LoadState::Empty)),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn location(&self) -> &str {
        self.source.location()
    }

    /// Get the index, fetching it only if no load is cached or in flight.
    pub fn load(&self) -> IndexFuture {
        let mut state = self.state.lock();
        match &*state {
            LoadState::Resolved(index) => {
                return future::ready(Ok(Arc::clone(index))).boxed().shared();
            }
            LoadState::Pending(pending) => {
                debug!(location = self.location(), "joining pending index load");
                return pending.clone();
            }
            LoadState::Empty | LoadState::Failed(_) => {}
        }

        let attempt = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        info!(location = self.location(), attempt, "fetching package index");

        let pending = fetch_and_store(
            Arc::clone(&self.source),
            Arc::downgrade(&self.state),
        )
        .boxed()
        .shared();
        *state = LoadState::Pending(pending.clone());
        pending
    }

    /// The cached index, if a load has succeeded. Never fetches.
    pub fn cached(&self) -> Option<Arc<PackageIndex>> {
        match &*self.state.lock() {
            LoadState::Resolved(index) => Some(Arc::clone(index)),
            _ => None,
        }
    }

    pub fn status(&self) -> LoadStatus {
        match &*self.state.lock() {
            LoadState::Empty => LoadStatus::Empty,
            LoadState::Pending(_) => LoadStatus::Pending,
            LoadState::Resolved(index) => LoadStatus::Resolved {
                packages: index.len(),
                types: index.type_count(),
            },
            LoadState::Failed(err) => LoadStatus::Failed(err.clone()),
        }
    }

    /// Number of fetches issued so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

async fn fetch_and_store(
    source: Arc<dyn IndexSource>,
    state: Weak<Mutex<LoadState>>,
) -> LoadResult {
    let start = Instant::now();
    let result = source
        .fetch()
        .await
        .and_then(|body| PackageIndex::from_bytes(&body))
        .map(Arc::new);

    match &result {
        Ok(index) => info!(
            location = source.location(),
            packages = index.len(),
            types = index.type_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "package index loaded"
        ),
        Err(err) => warn!(location = source.location(), error = %err, "package index load failed"),
    }

    // The loader may have been dropped while the fetch was in flight.
    if let Some(state) = state.upgrade() {
        *state.lock() = match &result {
            Ok(index) => LoadState::Resolved(Arc::clone(index)),
            Err(err) => LoadState::Failed(err.clone()),
        };
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use tokio::sync::Notify;

    const SAMPLE: &[u8] = br#"{"pkgA": {"Type1": {"doc": "first"}}}"#;

    /// Serves `SAMPLE`, but only once the gate is opened.
    struct GatedSource {
        gate: Arc<Notify>,
        calls: AtomicUsize,
    }

    impl GatedSource {
        fn new() -> Self {
            Self {
                gate: Arc::new(Notify::new()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl IndexSource for GatedSource {
        fn location(&self) -> &str {
            "gated"
        }

        fn fetch(&self) -> BoxFuture<'static, Result<Vec<u8>, IndexLoadError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let gate = Arc::clone(&self.gate);
            async move {
                gate.notified().await;
                Ok(SAMPLE.to_vec())
            }
            .boxed()
        }
    }

    /// Replays a fixed sequence of responses, one per fetch.
    struct ScriptedSource {
        responses: parking_lot::Mutex<VecDeque<Result<Vec<u8>, IndexLoadError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<Vec<u8>, IndexLoadError>>) -> Self {
            Self {
                responses: parking_lot::Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl IndexSource for ScriptedSource {
        fn location(&self) -> &str {
            "scripted"
        }

        fn fetch(&self) -> BoxFuture<'static, Result<Vec<u8>, IndexLoadError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let response = self.responses.lock().pop_front().unwrap_or_else(|| {
                Err(IndexLoadError::Fetch {
                    location: "scripted".to_string(),
                    message: "no more responses".to_string(),
                })
            });
            future::ready(response).boxed()
        }
    }

    fn outage() -> IndexLoadError {
        IndexLoadError::Status {
            location: "scripted".to_string(),
            status: 503,
        }
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_fetch() {
        let source = Arc::new(GatedSource::new());
        let loader = IndexLoader::new(source.clone());

        let pending: Vec<IndexFuture> = (0..5).map(|_| loader.load()).collect();
        assert!(pending.windows(2).all(|pair| pair[0].ptr_eq(&pair[1])));
        assert_eq!(loader.status(), LoadStatus::Pending);
        assert_eq!(loader.fetch_count(), 1);

        source.gate.notify_one();
        let results = future::join_all(pending).await;

        assert_eq!(source.calls(), 1);
        let first = results[0].as_ref().unwrap();
        for result in &results {
            assert!(Arc::ptr_eq(first, result.as_ref().unwrap()));
        }
    }

    #[tokio::test]
    async fn test_resolved_index_is_reused_without_fetching() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(SAMPLE.to_vec())]));
        let loader = IndexLoader::new(source.clone());

        let first = loader.load().await.unwrap();
        let cached = loader.cached().unwrap();
        assert!(Arc::ptr_eq(&cached, &first));

        let second = loader.load();
        assert!(
            second.clone().now_or_never().is_some(),
            "cached load should already be ready"
        );
        let second = second.await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.calls(), 1);
        assert_eq!(loader.fetch_count(), 1);
        assert_eq!(
            loader.status(),
            LoadStatus::Resolved {
                packages: 1,
                types: 1
            }
        );
    }

    #[tokio::test]
    async fn test_failure_reaches_all_waiters_and_next_call_retries() {
        let source = Arc::new(ScriptedSource::new(vec![
            Err(outage()),
            Ok(SAMPLE.to_vec()),
        ]));
        let loader = IndexLoader::new(source.clone());

        let a = loader.load();
        let b = loader.load();
        assert_eq!(a.await, Err(outage()));
        assert_eq!(b.await, Err(outage()));
        assert_eq!(loader.status(), LoadStatus::Failed(outage()));
        assert!(loader.cached().is_none());

        let index = loader.load().await.unwrap();
        assert!(index.package("pkgA").is_some());
        assert_eq!(source.calls(), 2);
        assert_eq!(loader.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_invalid_body_is_reported_as_failure() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(b"not json".to_vec())]));
        let loader = IndexLoader::new(source);

        let result = loader.load().await;
        assert!(matches!(result, Err(IndexLoadError::Parse(_))));
        assert!(matches!(loader.status(), LoadStatus::Failed(IndexLoadError::Parse(_))));
    }

    #[tokio::test]
    async fn test_abandoned_waiter_does_not_lose_pending_fetch() {
        let source = Arc::new(GatedSource::new());
        let loader = IndexLoader::new(source.clone());

        // Start the fetch, then walk away from it.
        let first = loader.load();
        assert!(futures::poll!(first.clone()).is_pending());
        drop(first);

        source.gate.notify_one();
        let index = loader.load().await.unwrap();
        assert!(index.package("pkgA").is_some());
        assert_eq!(source.calls(), 1);
    }

    #[test]
    fn test_new_loader_is_empty() {
        let loader = IndexLoader::new(Arc::new(GatedSource::new()));
        assert_eq!(loader.status(), LoadStatus::Empty);
        assert!(loader.cached().is_none());
        assert_eq!(loader.fetch_count(), 0);
        assert_eq!(loader.location(), "gated");
    }
}
