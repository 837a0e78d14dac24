//! Dashboard view model
//!
//! Turns user intents into controller and store calls and renders a
//! plain [`DashboardState`] for whatever front end sits on top. No rule
//! lives here: permitted actions come from [`can_perform`] and every
//! mutation is enforced again by the controller.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use shared::{Complaint, ComplaintStatus, Department, Role};

use crate::auth::IdentityProvider;
use crate::http::ComplaintsApi;
use crate::lifecycle::{
    Action, ActionKind, LifecycleController, MutationOutcome, PendingConfirmation, ProgressUpdate,
    RefreshStatus, authorize, can_perform,
};
use crate::store::ComplaintFilter;
use crate::{ClientError, ClientResult};

/// Something the user asked for
#[derive(Debug, Clone)]
pub enum Intent {
    ViewDetails(String),
    CloseDetails,
    Assign {
        complaint_id: String,
        department: Department,
    },
    UpdateStatus {
        complaint_id: String,
        status: ComplaintStatus,
    },
    /// Confirm the open confirmation
    Confirm,
    CancelConfirmation,
    SubmitProgress {
        complaint_id: String,
        progress: ProgressUpdate,
    },
    Refresh,
    ChangeFilter(ComplaintFilter),
    DismissError,
}

/// One line of the complaint list
#[derive(Debug, Clone, Serialize)]
pub struct ComplaintRow {
    pub complaint: Complaint,
    pub updating: bool,
    pub actions: Vec<ActionKind>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapMarker {
    pub complaint_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: ComplaintStatus,
    pub color: &'static str,
    pub label: String,
}

/// Detail panel for the selected complaint
#[derive(Debug, Clone, Serialize)]
pub struct ComplaintDetail {
    pub complaint: Complaint,
    /// Masked reporter id
    pub reporter: Option<String>,
    pub updating: bool,
    /// Kind of the action in flight, while `updating`
    pub in_flight: Option<ActionKind>,
    pub actions: Vec<ActionKind>,
    pub next_statuses: Vec<ComplaintStatus>,
    pub departments: Vec<Department>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub by_status: Vec<(ComplaintStatus, usize)>,
}

impl StatusCounts {
    fn tally(complaints: &[Complaint]) -> Self {
        let by_status = ComplaintStatus::ALL
            .iter()
            .map(|status| {
                let n = complaints.iter().filter(|c| c.status == *status).count();
                (*status, n)
            })
            .collect();
        Self {
            total: complaints.len(),
            by_status,
        }
    }

    pub fn get(&self, status: ComplaintStatus) -> usize {
        self.by_status
            .iter()
            .find(|(s, _)| *s == status)
            .map_or(0, |(_, n)| *n)
    }
}

/// Everything a front end needs to draw one frame
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub role: Option<Role>,
    pub filter: ComplaintFilter,
    pub rows: Vec<ComplaintRow>,
    pub markers: Vec<MapMarker>,
    pub counts: StatusCounts,
    pub selected: Option<ComplaintDetail>,
    pub confirmation: Option<PendingConfirmation>,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub refreshing: bool,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

/// Marker colour for a status
pub fn status_color(status: ComplaintStatus) -> &'static str {
    match status {
        ComplaintStatus::Submitted | ComplaintStatus::Acknowledged => "#2563EB",
        ComplaintStatus::Assigned => "#9333EA",
        ComplaintStatus::InProgress => "#F59E0B",
        ComplaintStatus::Resolved => "#22C55E",
        ComplaintStatus::Rejected => "#EF4444",
    }
}

#[derive(Default)]
struct UiState {
    filter: ComplaintFilter,
    selected: Option<String>,
    role: Option<Role>,
    error: Option<ClientError>,
    notice: Option<String>,
}

pub struct Dashboard<A, I> {
    controller: Arc<LifecycleController<A, I>>,
    ui: Mutex<UiState>,
}

impl<A, I> Dashboard<A, I>
where
    A: ComplaintsApi + 'static,
    I: IdentityProvider + 'static,
{
    pub fn new(controller: Arc<LifecycleController<A, I>>) -> Self {
        Self {
            controller,
            ui: Mutex::new(UiState::default()),
        }
    }

    pub fn with_filter(self, filter: ComplaintFilter) -> Self {
        self.ui.lock().filter = filter;
        self
    }

    pub fn controller(&self) -> &Arc<LifecycleController<A, I>> {
        &self.controller
    }

    /// Route an intent.
    ///
    /// Errors are returned and also kept for [`DashboardState::error`]
    /// until the next successful intent or [`Intent::DismissError`].
    pub async fn dispatch(&self, intent: Intent) -> ClientResult<()> {
        tracing::debug!(?intent, "Dashboard intent");
        let result = self.route(intent).await;
        let mut ui = self.ui.lock();
        match &result {
            Ok(notice) => {
                ui.error = None;
                if notice.is_some() {
                    ui.notice = notice.clone();
                }
            }
            Err(e) => {
                if e.requires_reauth() {
                    ui.role = None;
                }
                ui.notice = None;
                ui.error = Some(e.clone());
            }
        }
        result.map(|_| ())
    }

    async fn route(&self, intent: Intent) -> ClientResult<Option<String>> {
        match intent {
            Intent::ViewDetails(complaint_id) => {
                if self.controller.store().get(&complaint_id).is_none() {
                    return Err(ClientError::NotFound(complaint_id));
                }
                self.ui.lock().selected = Some(complaint_id);
                Ok(None)
            }
            Intent::CloseDetails => {
                self.ui.lock().selected = None;
                Ok(None)
            }
            Intent::Assign {
                complaint_id,
                department,
            } => {
                self.controller
                    .request_assignment(&complaint_id, department)
                    .await?;
                Ok(None)
            }
            Intent::UpdateStatus {
                complaint_id,
                status,
            } => {
                self.controller
                    .request_status_change(&complaint_id, status)
                    .await?;
                Ok(None)
            }
            Intent::Confirm => {
                let open = self
                    .controller
                    .pending_confirmation()
                    .ok_or_else(|| ClientError::ConfirmationNotFound("none open".into()))?;
                let outcome = self.controller.confirm(open.id).await?;
                Ok(Some(outcome_notice(&outcome)))
            }
            Intent::CancelConfirmation => {
                self.controller.cancel_confirmation();
                Ok(None)
            }
            Intent::SubmitProgress {
                complaint_id,
                progress,
            } => {
                let outcome = self
                    .controller
                    .submit_progress_update(&complaint_id, progress)
                    .await?;
                Ok(Some(outcome_notice(&outcome)))
            }
            Intent::Refresh => {
                self.refresh().await?;
                Ok(None)
            }
            Intent::ChangeFilter(filter) => {
                self.ui.lock().filter = filter;
                Ok(None)
            }
            Intent::DismissError => {
                self.controller.store().clear_last_error();
                Ok(None)
            }
        }
    }

    /// Re-resolve the role and reload the complaint set
    pub async fn refresh(&self) -> ClientResult<()> {
        self.resolve_role().await?;
        self.controller.store().refresh().await?;
        Ok(())
    }

    /// Catch up after a background refresh.
    ///
    /// Re-resolves the role so group changes show without a manual
    /// refresh. A refused session clears the role and is kept for
    /// [`DashboardState::error`].
    pub async fn sync(&self) -> ClientResult<()> {
        let result = self.resolve_role().await;
        if let Err(e) = &result {
            let mut ui = self.ui.lock();
            if e.requires_reauth() {
                ui.role = None;
            }
            ui.error = Some(e.clone());
        }
        result.map(|_| ())
    }

    async fn resolve_role(&self) -> ClientResult<Role> {
        let role = self.controller.current_role().await?;
        let previous = self.ui.lock().role.replace(role);
        if previous.is_some_and(|p| p != role) {
            tracing::info!(from = ?previous, to = %role, "Operator role changed");
        }
        Ok(role)
    }

    pub fn state(&self) -> DashboardState {
        let store = self.controller.store();
        let snapshot = store.snapshot();
        let refresh_error = store.last_error();
        let ui = self.ui.lock();

        // A refused background refresh revokes the role until the next sign-in
        let role = if refresh_error.as_ref().is_some_and(ClientError::requires_reauth) {
            None
        } else {
            ui.role
        };

        let actions_for = |complaint: &Complaint| -> Vec<ActionKind> {
            match role {
                Some(role) => ActionKind::ALL
                    .into_iter()
                    .filter(|kind| can_perform(role, *kind, complaint))
                    .collect(),
                None => Vec::new(),
            }
        };

        let visible = ui.filter.apply(&snapshot);
        let rows = visible
            .iter()
            .map(|c| ComplaintRow {
                complaint: c.clone(),
                updating: self.controller.is_pending(&c.complaint_id),
                actions: actions_for(c),
            })
            .collect();

        let markers = visible
            .iter()
            .filter_map(|c| {
                let (latitude, longitude) = c.coordinates()?;
                Some(MapMarker {
                    complaint_id: c.complaint_id.clone(),
                    latitude,
                    longitude,
                    status: c.status,
                    color: status_color(c.status),
                    label: format!("{} ({})", c.category, c.status),
                })
            })
            .collect();

        let selected = ui
            .selected
            .as_deref()
            .and_then(|id| snapshot.iter().find(|c| c.complaint_id == id))
            .map(|c| {
                let actions = actions_for(c);
                let in_flight = self
                    .controller
                    .pending_action(&c.complaint_id)
                    .map(|pending| pending.kind);
                ComplaintDetail {
                    reporter: c.masked_user_id(),
                    updating: in_flight.is_some(),
                    in_flight,
                    next_statuses: match role {
                        Some(role) if actions.contains(&ActionKind::StatusChange) => c
                            .status
                            .next_statuses()
                            .into_iter()
                            .filter(|status| {
                                authorize(role, &Action::UpdateStatus { status: *status }, c)
                                    .is_ok()
                            })
                            .collect(),
                        _ => Vec::new(),
                    },
                    departments: if actions.contains(&ActionKind::Assignment) {
                        Department::ALL.to_vec()
                    } else {
                        Vec::new()
                    },
                    actions,
                    complaint: c.clone(),
                }
            });

        DashboardState {
            role,
            filter: ui.filter.clone(),
            rows,
            markers,
            counts: StatusCounts::tally(&snapshot),
            selected,
            confirmation: self.controller.pending_confirmation(),
            error: ui
                .error
                .as_ref()
                .or(refresh_error.as_ref())
                .map(ClientError::user_message),
            notice: ui.notice.clone(),
            refreshing: store.is_refreshing(),
            last_refreshed_at: store.last_refreshed_at(),
        }
    }
}

fn outcome_notice(outcome: &MutationOutcome) -> String {
    match &outcome.refresh {
        RefreshStatus::Refreshed { .. } => {
            format!("Complaint {} updated", outcome.complaint_id)
        }
        RefreshStatus::Failed(_) => format!(
            "Complaint {} updated; the list could not be refreshed",
            outcome.complaint_id
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Session, StaticIdentity};
    use crate::store::ComplaintStore;
    use crate::test_support::{FakeApi, complaint, wait_until};

    async fn dashboard(
        complaints: Vec<Complaint>,
        group: &str,
    ) -> (Dashboard<FakeApi, StaticIdentity>, Arc<FakeApi>) {
        let api = Arc::new(FakeApi::with(complaints));
        let identity = Arc::new(StaticIdentity::with_groups("token", [group]));
        let store = ComplaintStore::new(api.clone(), identity);
        let dashboard = Dashboard::new(Arc::new(LifecycleController::new(store)));
        dashboard.dispatch(Intent::Refresh).await.unwrap();
        (dashboard, api)
    }

    #[tokio::test]
    async fn test_rows_carry_permitted_actions() {
        let (dash, _) = dashboard(
            vec![
                complaint("CMPT001", ComplaintStatus::Submitted),
                complaint("CMPT003", ComplaintStatus::Resolved),
            ],
            "SuperAdmin",
        )
        .await;

        let state = dash.state();
        assert_eq!(state.role, Some(Role::SuperAdmin));
        assert_eq!(
            state.rows[0].actions,
            vec![ActionKind::Assignment, ActionKind::StatusChange]
        );
        assert!(state.rows[1].actions.is_empty());
        assert_eq!(state.counts.total, 2);
        assert_eq!(state.counts.get(ComplaintStatus::Resolved), 1);
        assert_eq!(state.counts.get(ComplaintStatus::Rejected), 0);
    }

    #[tokio::test]
    async fn test_markers_skip_unmappable() {
        let mut unmapped = complaint("CMPT002", ComplaintStatus::Assigned);
        unmapped.latitude = None;
        let (dash, _) = dashboard(
            vec![complaint("CMPT001", ComplaintStatus::Submitted), unmapped],
            "SuperAdmin",
        )
        .await;

        let markers = dash.state().markers;
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].complaint_id, "CMPT001");
        assert_eq!(markers[0].color, status_color(ComplaintStatus::Submitted));
    }

    #[tokio::test]
    async fn test_confirm_flow_through_intents() {
        let (dash, api) =
            dashboard(vec![complaint("CMPT001", ComplaintStatus::Submitted)], "SuperAdmin").await;

        dash.dispatch(Intent::Assign {
            complaint_id: "CMPT001".into(),
            department: Department::RoadsTransportation,
        })
        .await
        .unwrap();
        assert!(dash.state().confirmation.is_some());
        assert_eq!(api.update_calls(), 0);

        dash.dispatch(Intent::Confirm).await.unwrap();
        let state = dash.state();
        assert!(state.confirmation.is_none());
        assert_eq!(state.notice.as_deref(), Some("Complaint CMPT001 updated"));
        assert_eq!(state.rows[0].complaint.status, ComplaintStatus::Assigned);
    }

    #[tokio::test]
    async fn test_errors_surface_as_messages() {
        let (dash, _) =
            dashboard(vec![complaint("CMPT001", ComplaintStatus::Submitted)], "RoadsAdmin").await;

        let err = dash
            .dispatch(Intent::UpdateStatus {
                complaint_id: "CMPT001".into(),
                status: ComplaintStatus::Acknowledged,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Authorization(_)));
        assert_eq!(dash.state().error, Some(err.user_message()));

        dash.dispatch(Intent::DismissError).await.unwrap();
        assert!(dash.state().error.is_none());
    }

    #[tokio::test]
    async fn test_detail_lists_choices_for_role() {
        let (dash, _) =
            dashboard(vec![complaint("CMPT001", ComplaintStatus::Acknowledged)], "SuperAdmin").await;

        dash.dispatch(Intent::ViewDetails("CMPT001".into()))
            .await
            .unwrap();
        let detail = dash.state().selected.unwrap();
        assert_eq!(detail.departments.len(), Department::ALL.len());
        assert!(detail.next_statuses.contains(&ComplaintStatus::Rejected));

        assert!(
            dash.dispatch(Intent::ViewDetails("CMPT404".into()))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_detail_hides_assigned_without_department() {
        let mut routed = complaint("CMPT002", ComplaintStatus::Acknowledged);
        routed.assigned_department = Some(Department::RoadsTransportation);
        let (dash, _) = dashboard(
            vec![complaint("CMPT001", ComplaintStatus::Submitted), routed],
            "SuperAdmin",
        )
        .await;

        dash.dispatch(Intent::ViewDetails("CMPT001".into()))
            .await
            .unwrap();
        let detail = dash.state().selected.unwrap();
        assert!(!detail.next_statuses.contains(&ComplaintStatus::Assigned));
        assert!(detail.next_statuses.contains(&ComplaintStatus::InProgress));

        dash.dispatch(Intent::ViewDetails("CMPT002".into()))
            .await
            .unwrap();
        let detail = dash.state().selected.unwrap();
        assert!(detail.next_statuses.contains(&ComplaintStatus::Assigned));
    }

    #[tokio::test]
    async fn test_detail_shows_action_in_flight() {
        let (dash, api) =
            dashboard(vec![complaint("CMPT001", ComplaintStatus::Acknowledged)], "SuperAdmin").await;
        let gate = api.hold_updates();

        dash.dispatch(Intent::ViewDetails("CMPT001".into()))
            .await
            .unwrap();
        dash.dispatch(Intent::UpdateStatus {
            complaint_id: "CMPT001".into(),
            status: ComplaintStatus::InProgress,
        })
        .await
        .unwrap();

        let watch = async {
            wait_until(|| api.update_calls() == 1).await;
            let detail = dash.state().selected.unwrap();
            assert!(detail.updating);
            assert_eq!(detail.in_flight, Some(ActionKind::StatusChange));
            gate.notify_one();
        };
        let (confirmed, ()) = tokio::join!(dash.dispatch(Intent::Confirm), watch);
        confirmed.unwrap();

        let detail = dash.state().selected.unwrap();
        assert!(!detail.updating);
        assert!(detail.in_flight.is_none());
        assert_eq!(detail.complaint.status, ComplaintStatus::InProgress);
    }

    #[tokio::test]
    async fn test_background_refresh_failure_is_reported() {
        let (dash, api) =
            dashboard(vec![complaint("CMPT001", ComplaintStatus::Submitted)], "SuperAdmin").await;
        let store = dash.controller().store().clone();

        api.fail_next_list(ClientError::Network("reset".into()));
        store.refresh().await.unwrap_err();
        let state = dash.state();
        assert_eq!(state.role, Some(Role::SuperAdmin));
        assert_eq!(state.rows.len(), 1);
        assert!(state.error.as_deref().unwrap().contains("Could not reach"));

        dash.dispatch(Intent::DismissError).await.unwrap();
        assert!(dash.state().error.is_none());

        api.fail_next_list(ClientError::Auth("Token expired".into()));
        store.refresh().await.unwrap_err();
        let state = dash.state();
        assert_eq!(state.role, None);
        assert!(state.rows[0].actions.is_empty());
        assert!(state.error.as_deref().unwrap().contains("sign in"));
    }

    #[tokio::test]
    async fn test_sync_picks_up_group_change() {
        let api = Arc::new(FakeApi::with(vec![complaint(
            "CMPT001",
            ComplaintStatus::Submitted,
        )]));
        let identity = Arc::new(StaticIdentity::with_groups("token", ["RoadsAdmin"]));
        let store = ComplaintStore::new(api, identity.clone());
        let dash = Dashboard::new(Arc::new(LifecycleController::new(store)));
        dash.dispatch(Intent::Refresh).await.unwrap();
        assert_eq!(dash.state().role, Some(Role::RoadsAdmin));

        identity.replace(Session::new("token", vec!["SuperAdmin".into()]));
        dash.sync().await.unwrap();
        assert_eq!(dash.state().role, Some(Role::SuperAdmin));

        identity.sign_out();
        assert!(dash.sync().await.unwrap_err().requires_reauth());
        let state = dash.state();
        assert_eq!(state.role, None);
        assert!(state.error.is_some());
    }

    #[tokio::test]
    async fn test_filter_intent_narrows_rows() {
        let mut pothole = complaint("CMPT001", ComplaintStatus::Submitted);
        pothole.description = "Deep POTHOLE on highway".into();
        let (dash, _) = dashboard(
            vec![pothole, complaint("CMPT002", ComplaintStatus::Submitted)],
            "SuperAdmin",
        )
        .await;

        dash.dispatch(Intent::ChangeFilter(
            ComplaintFilter::new().with_search("pothole"),
        ))
        .await
        .unwrap();
        let rows = dash.state().rows;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].complaint.complaint_id, "CMPT001");
    }
}
