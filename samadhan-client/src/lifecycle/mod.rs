//! Complaint lifecycle controller
//!
//! Every mutation follows the same path: claim the complaint's pending
//! slot, re-resolve the role from a fresh session, check the rules, call
//! the API, then refresh the store. Assignment and status changes must go
//! through a [`PendingConfirmation`] first.

mod action;
mod confirmation;
mod pending;

pub use action::{Action, ActionKind, ProgressUpdate, authorize, can_perform};
pub use confirmation::{PendingConfirmation, Severity};
pub use pending::{PendingAction, PendingActions, PendingGuard};

use std::sync::Arc;

use parking_lot::Mutex;
use shared::{Complaint, ComplaintStatus, Department, Role};
use uuid::Uuid;

use crate::auth::{IdentityProvider, RoleResolver};
use crate::http::ComplaintsApi;
use crate::store::ComplaintStore;
use crate::{ClientError, ClientResult};

/// State of the store refresh that follows a successful mutation
#[derive(Debug, Clone)]
pub enum RefreshStatus {
    Refreshed { generation: u64 },
    /// The mutation stands; the cached set is stale until the next refresh
    Failed(ClientError),
}

/// Result of an accepted mutation
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    pub complaint_id: String,
    pub kind: ActionKind,
    /// Record echoed by the API, when it sent one
    pub returned: Option<Complaint>,
    pub refresh: RefreshStatus,
}

impl MutationOutcome {
    pub fn refreshed(&self) -> bool {
        matches!(self.refresh, RefreshStatus::Refreshed { .. })
    }
}

pub struct LifecycleController<A, I> {
    api: Arc<A>,
    store: ComplaintStore<A, I>,
    roles: RoleResolver<I>,
    pending: PendingActions,
    confirmation: Mutex<Option<PendingConfirmation>>,
}

impl<A, I> LifecycleController<A, I>
where
    A: ComplaintsApi + 'static,
    I: IdentityProvider + 'static,
{
    pub fn new(store: ComplaintStore<A, I>) -> Self {
        Self {
            api: store.api(),
            roles: RoleResolver::new(store.identity()),
            store,
            pending: PendingActions::new(),
            confirmation: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &ComplaintStore<A, I> {
        &self.store
    }

    /// The action currently in flight for `complaint_id`, if any
    pub fn pending_action(&self, complaint_id: &str) -> Option<PendingAction> {
        self.pending.get(complaint_id)
    }

    pub fn is_pending(&self, complaint_id: &str) -> bool {
        self.pending.is_pending(complaint_id)
    }

    /// Role of the signed-in user, from a fresh session
    pub async fn current_role(&self) -> ClientResult<Role> {
        self.roles.current_role().await
    }

    // ========== Confirmation ==========

    /// Ask to assign a complaint to a department
    pub async fn request_assignment(
        &self,
        complaint_id: &str,
        department: Department,
    ) -> ClientResult<PendingConfirmation> {
        self.request(complaint_id, Action::Assign { department }).await
    }

    /// Ask to move a complaint to `status`
    pub async fn request_status_change(
        &self,
        complaint_id: &str,
        status: ComplaintStatus,
    ) -> ClientResult<PendingConfirmation> {
        self.request(complaint_id, Action::UpdateStatus { status }).await
    }

    async fn request(&self, complaint_id: &str, action: Action) -> ClientResult<PendingConfirmation> {
        if self.pending.is_pending(complaint_id) {
            return Err(ClientError::AlreadyUpdating(complaint_id.to_string()));
        }
        let complaint = self.cached(complaint_id)?;
        let (_, role) = self.roles.current().await?;
        authorize(role, &action, &complaint)?;

        let confirmation = PendingConfirmation::for_action(&complaint, action);
        if let Some(previous) = self.confirmation.lock().replace(confirmation.clone()) {
            tracing::debug!(
                complaint_id = %previous.complaint_id,
                "Replaced unanswered confirmation"
            );
        }
        Ok(confirmation)
    }

    pub fn pending_confirmation(&self) -> Option<PendingConfirmation> {
        self.confirmation.lock().clone()
    }

    /// Dismiss the open confirmation without side effects
    pub fn cancel_confirmation(&self) -> Option<PendingConfirmation> {
        self.confirmation.lock().take()
    }

    /// Execute the confirmed action.
    ///
    /// Rules are checked again; the complaint may have moved since the
    /// confirmation was raised.
    pub async fn confirm(&self, confirmation_id: Uuid) -> ClientResult<MutationOutcome> {
        let confirmation = {
            let mut slot = self.confirmation.lock();
            if slot.as_ref().is_some_and(|open| open.id == confirmation_id) {
                slot.take()
            } else {
                None
            }
        }
        .ok_or_else(|| ClientError::ConfirmationNotFound(confirmation_id.to_string()))?;

        self.execute(&confirmation.complaint_id, confirmation.action).await
    }

    // ========== Progress ==========

    /// Record departmental progress; no confirmation step
    pub async fn submit_progress_update(
        &self,
        complaint_id: &str,
        progress: ProgressUpdate,
    ) -> ClientResult<MutationOutcome> {
        self.execute(complaint_id, Action::SubmitProgress(progress)).await
    }

    // ========== Execution ==========

    async fn execute(&self, complaint_id: &str, action: Action) -> ClientResult<MutationOutcome> {
        let kind = action.kind();
        let update = action.to_update();
        let _guard = self.pending.begin(complaint_id, kind, update.clone())?;

        let complaint = self.cached(complaint_id)?;
        let (session, role) = self.roles.current().await?;
        authorize(role, &action, &complaint)?;

        tracing::info!(
            complaint_id,
            role = %role,
            update_type = update.update_type(),
            "Submitting complaint update"
        );
        let returned = self
            .api
            .update_complaint(&session.id_token, complaint_id, &update)
            .await
            .inspect_err(|e| {
                tracing::warn!(complaint_id, error = %e, "Complaint update failed");
            })?;

        let refresh = match self.store.refresh_latest().await {
            Ok(_) => RefreshStatus::Refreshed {
                generation: self.store.generation(),
            },
            Err(e) => {
                tracing::warn!(complaint_id, error = %e, "Refresh after update failed");
                RefreshStatus::Failed(e)
            }
        };

        if let Action::Assign { department } = action {
            self.check_assignment(complaint_id, department);
        }

        Ok(MutationOutcome {
            complaint_id: complaint_id.to_string(),
            kind,
            returned,
            refresh,
        })
    }

    fn cached(&self, complaint_id: &str) -> ClientResult<Complaint> {
        self.store
            .get(complaint_id)
            .ok_or_else(|| ClientError::NotFound(complaint_id.to_string()))
    }

    fn check_assignment(&self, complaint_id: &str, department: Department) {
        let Some(current) = self.store.get(complaint_id) else {
            return;
        };
        if current.status != ComplaintStatus::Assigned
            || current.assigned_department != Some(department)
        {
            tracing::warn!(
                complaint_id,
                status = %current.status,
                department = ?current.assigned_department,
                expected = %department,
                "Assignment not reflected in refreshed complaint"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Session, StaticIdentity};
    use crate::test_support::{FakeApi, complaint, wait_until};
    use shared::ComplaintUpdate;

    type Controller = LifecycleController<FakeApi, StaticIdentity>;

    async fn controller(
        complaints: Vec<Complaint>,
        groups: &[&str],
    ) -> (Arc<Controller>, Arc<FakeApi>, Arc<StaticIdentity>) {
        let api = Arc::new(FakeApi::with(complaints));
        let identity = Arc::new(StaticIdentity::with_groups("token", groups.iter().copied()));
        let store = ComplaintStore::new(api.clone(), identity.clone());
        store.refresh().await.unwrap();
        (Arc::new(LifecycleController::new(store)), api, identity)
    }

    #[tokio::test]
    async fn test_assignment_requires_confirmation() {
        let (ctl, api, _) =
            controller(vec![complaint("CMPT001", ComplaintStatus::Submitted)], &["SuperAdmin"]).await;

        let confirmation = ctl
            .request_assignment("CMPT001", Department::RoadsTransportation)
            .await
            .unwrap();
        assert_eq!(confirmation.severity, Severity::Warning);
        assert_eq!(api.update_calls(), 0);
        assert_eq!(ctl.pending_confirmation(), Some(confirmation.clone()));

        let outcome = ctl.confirm(confirmation.id).await.unwrap();
        assert_eq!(outcome.kind, ActionKind::Assignment);
        assert!(outcome.refreshed());
        assert!(ctl.pending_confirmation().is_none());
        assert!(!ctl.is_pending("CMPT001"));

        let current = ctl.store().get("CMPT001").unwrap();
        assert_eq!(current.status, ComplaintStatus::Assigned);
        assert_eq!(
            current.assigned_department,
            Some(Department::RoadsTransportation)
        );
        assert_eq!(
            api.updates(),
            vec![(
                "CMPT001".to_string(),
                ComplaintUpdate::Assignment {
                    assigned_department: Department::RoadsTransportation
                }
            )]
        );
    }

    #[tokio::test]
    async fn test_cancel_has_no_side_effects() {
        let (ctl, api, _) =
            controller(vec![complaint("CMPT001", ComplaintStatus::Submitted)], &["SuperAdmin"]).await;

        let confirmation = ctl
            .request_status_change("CMPT001", ComplaintStatus::Rejected)
            .await
            .unwrap();
        assert_eq!(confirmation.severity, Severity::Danger);

        assert_eq!(ctl.cancel_confirmation(), Some(confirmation.clone()));
        let err = ctl.confirm(confirmation.id).await.unwrap_err();
        assert!(matches!(err, ClientError::ConfirmationNotFound(_)));
        assert_eq!(api.update_calls(), 0);
        assert_eq!(
            ctl.store().get("CMPT001").unwrap().status,
            ComplaintStatus::Submitted
        );
    }

    #[tokio::test]
    async fn test_newer_request_supersedes_open_confirmation() {
        let (ctl, _, _) =
            controller(vec![complaint("CMPT001", ComplaintStatus::Submitted)], &["SuperAdmin"]).await;

        let first = ctl
            .request_status_change("CMPT001", ComplaintStatus::Acknowledged)
            .await
            .unwrap();
        let second = ctl
            .request_status_change("CMPT001", ComplaintStatus::Rejected)
            .await
            .unwrap();

        assert!(matches!(
            ctl.confirm(first.id).await,
            Err(ClientError::ConfirmationNotFound(_))
        ));
        assert_eq!(ctl.pending_confirmation(), Some(second));
    }

    #[tokio::test]
    async fn test_department_role_cannot_assign() {
        let (ctl, api, _) =
            controller(vec![complaint("CMPT001", ComplaintStatus::Submitted)], &["RoadsAdmin"]).await;

        let err = ctl
            .request_assignment("CMPT001", Department::RoadsTransportation)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Authorization(_)));
        assert!(ctl.pending_confirmation().is_none());
        assert_eq!(api.update_calls(), 0);
    }

    #[tokio::test]
    async fn test_role_is_rechecked_at_confirm_time() {
        let (ctl, api, identity) =
            controller(vec![complaint("CMPT001", ComplaintStatus::Submitted)], &["SuperAdmin"]).await;

        let confirmation = ctl
            .request_status_change("CMPT001", ComplaintStatus::Acknowledged)
            .await
            .unwrap();
        identity.replace(Session::new("token", vec!["WaterAdmin".into()]));

        let err = ctl.confirm(confirmation.id).await.unwrap_err();
        assert!(matches!(err, ClientError::Authorization(_)));
        assert_eq!(api.update_calls(), 0);
    }

    #[tokio::test]
    async fn test_rejected_is_terminal() {
        let (ctl, api, _) =
            controller(vec![complaint("CMPT005", ComplaintStatus::Rejected)], &["SuperAdmin"]).await;

        for status in ComplaintStatus::ALL {
            let err = ctl.request_status_change("CMPT005", status).await.unwrap_err();
            assert!(matches!(err, ClientError::InvalidTransition { .. }));
        }
        assert_eq!(api.update_calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_complaint() {
        let (ctl, _, _) = controller(vec![], &["SuperAdmin"]).await;
        let err = ctl
            .request_status_change("CMPT404", ComplaintStatus::Acknowledged)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_second_action_while_pending() {
        let mut c = complaint("CMPT002", ComplaintStatus::Assigned);
        c.assigned_department = Some(Department::WaterDrainage);
        let (ctl, api, _) = controller(vec![c], &["WaterAdmin"]).await;
        let gate = api.hold_updates();

        let first = tokio::spawn({
            let ctl = ctl.clone();
            async move {
                ctl.submit_progress_update("CMPT002", ProgressUpdate::new("Crew dispatched"))
                    .await
            }
        });
        wait_until(|| api.update_calls() == 1).await;
        assert!(ctl.is_pending("CMPT002"));

        let err = ctl
            .submit_progress_update("CMPT002", ProgressUpdate::new("Pipe replaced"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::AlreadyUpdating(_)));

        gate.notify_one();
        first.await.unwrap().unwrap();
        assert!(!ctl.is_pending("CMPT002"));
        assert_eq!(api.update_calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_update_keeps_store_and_clears_pending() {
        let (ctl, api, _) =
            controller(vec![complaint("CMPT001", ComplaintStatus::Acknowledged)], &["SuperAdmin"]).await;
        let generation = ctl.store().generation();

        let confirmation = ctl
            .request_status_change("CMPT001", ComplaintStatus::InProgress)
            .await
            .unwrap();
        api.fail_next_update(ClientError::Network("timed out".into()));

        let err = ctl.confirm(confirmation.id).await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
        assert!(!ctl.is_pending("CMPT001"));
        assert_eq!(ctl.store().generation(), generation);
        assert_eq!(
            ctl.store().get("CMPT001").unwrap().status,
            ComplaintStatus::Acknowledged
        );
    }

    #[tokio::test]
    async fn test_refresh_failure_does_not_fail_mutation() {
        let (ctl, api, _) =
            controller(vec![complaint("CMPT001", ComplaintStatus::Submitted)], &["SuperAdmin"]).await;

        let confirmation = ctl
            .request_status_change("CMPT001", ComplaintStatus::Acknowledged)
            .await
            .unwrap();
        api.fail_next_list(ClientError::Network("reset".into()));

        let outcome = ctl.confirm(confirmation.id).await.unwrap();
        assert!(matches!(outcome.refresh, RefreshStatus::Failed(ClientError::Network(_))));
        assert_eq!(
            outcome.returned.map(|c| c.status),
            Some(ComplaintStatus::Acknowledged)
        );
    }

    #[tokio::test]
    async fn test_progress_outside_department_is_refused_by_api() {
        let mut c = complaint("CMPT002", ComplaintStatus::Assigned);
        c.assigned_department = Some(Department::RoadsTransportation);
        let (ctl, api, _) = controller(vec![c], &["WaterAdmin"]).await;
        api.set_token_department("token", Department::WaterDrainage);

        let err = ctl
            .submit_progress_update("CMPT002", ProgressUpdate::new("Not ours"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Authorization(_)));
        assert_eq!(api.update_calls(), 1);
    }

    #[tokio::test]
    async fn test_dropped_mutation_releases_slot() {
        let (ctl, api, _) =
            controller(vec![complaint("CMPT001", ComplaintStatus::Submitted)], &["SuperAdmin"]).await;
        let _gate = api.hold_updates();

        let confirmation = ctl
            .request_status_change("CMPT001", ComplaintStatus::Acknowledged)
            .await
            .unwrap();
        let task = tokio::spawn({
            let ctl = ctl.clone();
            async move { ctl.confirm(confirmation.id).await }
        });
        wait_until(|| api.update_calls() == 1).await;
        assert!(ctl.is_pending("CMPT001"));

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
        assert!(!ctl.is_pending("CMPT001"));
    }
}
