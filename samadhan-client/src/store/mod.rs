//! Complaint store
//!
//! Process-local cache of the complaint set visible to the signed-in
//! administrator. The cached set is only ever replaced as a whole by a
//! fetch; records are never patched in place.
//!
//! Refreshes are coalesced: while one is in flight, further callers
//! (manual refresh, auto-refresh, post-mutation refresh) await the same
//! fetch instead of issuing another.

mod filter;
mod poller;

pub use filter::{ALL_CATEGORIES, ALL_STATUS, ComplaintFilter, Selection};
pub use poller::AutoRefresh;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use shared::Complaint;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::auth::IdentityProvider;
use crate::http::ComplaintsApi;
use crate::{ClientError, ClientResult};

/// Immutable view of the cached complaint set
pub type ComplaintSet = Arc<Vec<Complaint>>;

type RefreshFuture = Shared<BoxFuture<'static, ClientResult<ComplaintSet>>>;

struct Snapshot {
    complaints: ComplaintSet,
    generation: u64,
    refreshed_at: Option<DateTime<Utc>>,
    /// Failure of the latest refresh; cleared by the next success
    last_error: Option<ClientError>,
}

struct StoreInner<A, I> {
    api: Arc<A>,
    identity: Arc<I>,
    snapshot: RwLock<Snapshot>,
    inflight: Mutex<Option<RefreshFuture>>,
    generation_tx: watch::Sender<u64>,
    shutdown: CancellationToken,
}

/// Cheaply clonable handle to a complaint store
pub struct ComplaintStore<A, I> {
    inner: Arc<StoreInner<A, I>>,
}

impl<A, I> Clone for ComplaintStore<A, I> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A, I> ComplaintStore<A, I>
where
    A: ComplaintsApi + 'static,
    I: IdentityProvider + 'static,
{
    pub fn new(api: Arc<A>, identity: Arc<I>) -> Self {
        let (generation_tx, _) = watch::channel(0);
        Self {
            inner: Arc::new(StoreInner {
                api,
                identity,
                snapshot: RwLock::new(Snapshot {
                    complaints: Arc::new(Vec::new()),
                    generation: 0,
                    refreshed_at: None,
                    last_error: None,
                }),
                inflight: Mutex::new(None),
                generation_tx,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Fetch the full visible complaint set without touching the cache
    pub async fn load(&self) -> ClientResult<Vec<Complaint>> {
        self.inner.load().await
    }

    /// Re-fetch and atomically replace the cached set.
    ///
    /// Joins the in-flight refresh if there is one.
    pub async fn refresh(&self) -> ClientResult<ComplaintSet> {
        if self.inner.shutdown.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        let refresh = {
            let mut slot = self.inner.inflight.lock();
            match slot.as_ref() {
                Some(running) => {
                    tracing::debug!("Joining in-flight complaint refresh");
                    running.clone()
                }
                None => {
                    let running = self.spawn_refresh();
                    *slot = Some(running.clone());
                    running
                }
            }
        };

        refresh.await
    }

    /// Refresh with a fetch that starts no earlier than this call.
    ///
    /// A refresh already in flight may have been issued before the caller's
    /// last write, so it is awaited first and then a new one is joined or
    /// started.
    pub async fn refresh_latest(&self) -> ClientResult<ComplaintSet> {
        let stale = self.inner.inflight.lock().clone();
        if let Some(stale) = stale {
            let _ = stale.await;
        }
        self.refresh().await
    }

    fn spawn_refresh(&self) -> RefreshFuture {
        let inner = self.inner.clone();
        // Runs as its own task so it completes even if every waiter goes away.
        let task = tokio::spawn(async move { inner.run_refresh().await });
        async move {
            task.await.unwrap_or_else(|e| {
                if e.is_panic() {
                    tracing::error!("Complaint refresh task panicked");
                }
                Err(ClientError::Cancelled)
            })
        }
        .boxed()
        .shared()
    }

    /// Start periodic refresh; stops when the handle is dropped or the store shuts down
    pub fn start_auto_refresh(&self, period: Duration) -> AutoRefresh {
        AutoRefresh::spawn(self.clone(), period)
    }

    /// Tear the store down.
    ///
    /// Pending refreshes are abandoned and the cached set is never modified
    /// after this returns.
    pub fn shutdown(&self) {
        let _snapshot = self.inner.snapshot.write();
        self.inner.shutdown.cancel();
        tracing::debug!("Complaint store shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    pub(crate) fn shutdown_token(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }

    pub(crate) fn api(&self) -> Arc<A> {
        self.inner.api.clone()
    }

    pub(crate) fn identity(&self) -> Arc<I> {
        self.inner.identity.clone()
    }
}

impl<A, I> ComplaintStore<A, I> {
    /// Current cached set
    pub fn snapshot(&self) -> ComplaintSet {
        self.inner.snapshot.read().complaints.clone()
    }

    /// Cached record by id
    pub fn get(&self, complaint_id: &str) -> Option<Complaint> {
        self.inner
            .snapshot
            .read()
            .complaints
            .iter()
            .find(|c| c.complaint_id == complaint_id)
            .cloned()
    }

    /// Filter the cached set; purely local
    pub fn filter(&self, filter: &ComplaintFilter) -> Vec<Complaint> {
        filter.apply(&self.snapshot())
    }

    /// Number of successful replacements so far
    pub fn generation(&self) -> u64 {
        self.inner.snapshot.read().generation
    }

    pub fn last_refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.inner.snapshot.read().refreshed_at
    }

    /// Why the latest refresh failed, if it did
    pub fn last_error(&self) -> Option<ClientError> {
        self.inner.snapshot.read().last_error.clone()
    }

    /// Forget the latest refresh failure
    pub fn clear_last_error(&self) {
        self.inner.snapshot.write().last_error = None;
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.inflight.lock().is_some()
    }

    /// Receiver that changes whenever the cached set is replaced or a
    /// refresh fails; the value is the current generation
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.generation_tx.subscribe()
    }
}

impl<A, I> StoreInner<A, I>
where
    A: ComplaintsApi,
    I: IdentityProvider,
{
    async fn load(&self) -> ClientResult<Vec<Complaint>> {
        let session = self.identity.get_session(false).await?;
        self.api.list_complaints(&session.id_token).await
    }

    async fn run_refresh(&self) -> ClientResult<ComplaintSet> {
        let loaded = tokio::select! {
            _ = self.shutdown.cancelled() => Err(ClientError::Cancelled),
            result = self.load() => result,
        };

        let outcome = match loaded {
            Ok(complaints) => self.replace(complaints),
            Err(ClientError::Cancelled) => Err(ClientError::Cancelled),
            Err(e) => {
                tracing::warn!(error = %e, "Complaint refresh failed");
                self.record_failure(&e);
                Err(e)
            }
        };

        self.inflight.lock().take();
        outcome
    }

    fn replace(&self, complaints: Vec<Complaint>) -> ClientResult<ComplaintSet> {
        for c in complaints.iter().filter(|c| !c.assignment_consistent()) {
            tracing::warn!(
                complaint_id = %c.complaint_id,
                "Complaint is Assigned without a department"
            );
        }

        let complaints = Arc::new(complaints);
        let generation = {
            let mut snapshot = self.snapshot.write();
            if self.shutdown.is_cancelled() {
                return Err(ClientError::Cancelled);
            }
            snapshot.complaints = complaints.clone();
            snapshot.generation += 1;
            snapshot.refreshed_at = Some(Utc::now());
            snapshot.last_error = None;
            snapshot.generation
        };
        self.generation_tx.send_replace(generation);

        tracing::info!(count = complaints.len(), generation, "Complaint store refreshed");
        Ok(complaints)
    }

    /// Keep the set, remember the error and wake subscribers
    fn record_failure(&self, error: &ClientError) {
        let generation = {
            let mut snapshot = self.snapshot.write();
            if self.shutdown.is_cancelled() {
                return;
            }
            snapshot.last_error = Some(error.clone());
            snapshot.generation
        };
        self.generation_tx.send_replace(generation);
    }
}
