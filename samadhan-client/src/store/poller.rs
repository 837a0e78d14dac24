//! Auto-refresh task
//!
//! Periodically calls [`ComplaintStore::refresh`], sharing the coalescing
//! path with manual refreshes. Failures are left on the store for the view
//! to report. Polling stops once the session is refused.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::ComplaintStore;
use crate::auth::IdentityProvider;
use crate::http::ComplaintsApi;

/// Handle to a running auto-refresh task
///
/// Dropping the handle stops the task. Store shutdown stops it too.
pub struct AutoRefresh {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl AutoRefresh {
    pub(crate) fn spawn<A, I>(store: ComplaintStore<A, I>, period: Duration) -> Self
    where
        A: ComplaintsApi + 'static,
        I: IdentityProvider + 'static,
    {
        let cancel = store.shutdown_token().child_token();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            tracing::info!(period_secs = period.as_secs(), "Auto-refresh started");
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await; // skip immediate tick

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        tokio::select! {
                            _ = token.cancelled() => break,
                            result = store.refresh() => match result {
                                Err(e) if e.requires_reauth() => {
                                    tracing::warn!(error = %e, "Session refused, auto-refresh stopping");
                                    break;
                                }
                                Err(e) => tracing::warn!(error = %e, "Auto-refresh failed"),
                                Ok(_) => {}
                            }
                        }
                    }
                }
            }

            tracing::info!("Auto-refresh stopped");
        });

        Self {
            cancel,
            task: Some(task),
        }
    }

    /// Stop polling; an in-flight refresh is abandoned by this task
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop and wait for the task to exit
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
