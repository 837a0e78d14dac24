//! In-flight action tracking
//!
//! At most one mutating action per complaint is in flight. The slot is
//! released when the [`PendingGuard`] drops, on success, failure or
//! cancellation alike.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use shared::ComplaintUpdate;

use super::action::ActionKind;
use crate::{ClientError, ClientResult};

/// An action submitted and not yet settled
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAction {
    pub complaint_id: String,
    pub kind: ActionKind,
    pub payload: ComplaintUpdate,
    pub requested_at: DateTime<Utc>,
}

/// Registry of pending actions keyed by complaint id
#[derive(Debug, Clone, Default)]
pub struct PendingActions {
    inner: Arc<DashMap<String, PendingAction>>,
}

impl PendingActions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the complaint for one action, or fail with `AlreadyUpdating`
    pub fn begin(
        &self,
        complaint_id: &str,
        kind: ActionKind,
        payload: ComplaintUpdate,
    ) -> ClientResult<PendingGuard> {
        match self.inner.entry(complaint_id.to_string()) {
            Entry::Occupied(existing) => {
                tracing::debug!(
                    complaint_id,
                    pending = %existing.get().kind,
                    rejected = %kind,
                    "Action rejected, complaint already updating"
                );
                Err(ClientError::AlreadyUpdating(complaint_id.to_string()))
            }
            Entry::Vacant(slot) => {
                slot.insert(PendingAction {
                    complaint_id: complaint_id.to_string(),
                    kind,
                    payload,
                    requested_at: Utc::now(),
                });
                Ok(PendingGuard {
                    registry: self.inner.clone(),
                    complaint_id: complaint_id.to_string(),
                })
            }
        }
    }

    pub fn is_pending(&self, complaint_id: &str) -> bool {
        self.inner.contains_key(complaint_id)
    }

    pub fn get(&self, complaint_id: &str) -> Option<PendingAction> {
        self.inner.get(complaint_id).map(|entry| entry.value().clone())
    }
}

/// Releases the pending slot on drop
#[derive(Debug)]
pub struct PendingGuard {
    registry: Arc<DashMap<String, PendingAction>>,
    complaint_id: String,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.registry.remove(&self.complaint_id);
    }
}
