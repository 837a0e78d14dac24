//! In-memory fakes for unit tests

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use shared::{Category, Complaint, ComplaintStatus, ComplaintUpdate, Department, Priority};
use tokio::sync::Notify;

use crate::http::ComplaintsApi;
use crate::{ClientError, ClientResult};

pub(crate) fn complaint(id: &str, status: ComplaintStatus) -> Complaint {
    Complaint {
        complaint_id: id.to_string(),
        category: Category::RoadsTransportation,
        sub_category: String::new(),
        description: format!("Complaint {id}"),
        image_url: None,
        manual_location: "Ranchi".into(),
        district: "Ranchi".into(),
        latitude: Some("23.3441".into()),
        longitude: Some("85.3096".into()),
        status,
        priority: Priority::Medium,
        assigned_department: None,
        created_at: None,
        updated_at: None,
        user_id: None,
    }
}

/// Yield until `condition` holds; panics if it never does
pub(crate) async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..1_000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

#[derive(Default)]
struct FakeState {
    complaints: Vec<Complaint>,
    fail_list: Option<ClientError>,
    fail_update: Option<ClientError>,
    updates: Vec<(String, ComplaintUpdate)>,
    token_departments: HashMap<String, Department>,
    list_gate: Option<Arc<Notify>>,
    update_gate: Option<Arc<Notify>>,
}

/// Complaints API backed by a vector
#[derive(Default)]
pub(crate) struct FakeApi {
    state: Mutex<FakeState>,
    list_calls: AtomicUsize,
    update_calls: AtomicUsize,
}

impl FakeApi {
    pub(crate) fn with(complaints: Vec<Complaint>) -> Self {
        let api = Self::default();
        api.state.lock().complaints = complaints;
        api
    }

    pub(crate) fn set_status(&self, complaint_id: &str, status: ComplaintStatus) {
        let mut state = self.state.lock();
        if let Some(c) = state
            .complaints
            .iter_mut()
            .find(|c| c.complaint_id == complaint_id)
        {
            c.status = status;
        }
    }

    /// Progress updates with `token` are refused unless the complaint
    /// belongs to `department`
    pub(crate) fn set_token_department(&self, token: &str, department: Department) {
        self.state
            .lock()
            .token_departments
            .insert(token.to_string(), department);
    }

    pub(crate) fn fail_next_list(&self, error: ClientError) {
        self.state.lock().fail_list = Some(error);
    }

    pub(crate) fn fail_next_update(&self, error: ClientError) {
        self.state.lock().fail_update = Some(error);
    }

    /// List calls block until the returned gate is notified, once per call
    pub(crate) fn hold_lists(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state.lock().list_gate = Some(gate.clone());
        gate
    }

    pub(crate) fn hold_updates(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state.lock().update_gate = Some(gate.clone());
        gate
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn updates(&self) -> Vec<(String, ComplaintUpdate)> {
        self.state.lock().updates.clone()
    }
}

#[async_trait]
impl ComplaintsApi for FakeApi {
    async fn list_complaints(&self, _token: &str) -> ClientResult<Vec<Complaint>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.state.lock().list_gate.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut state = self.state.lock();
        match state.fail_list.take() {
            Some(e) => Err(e),
            None => Ok(state.complaints.clone()),
        }
    }

    async fn update_complaint(
        &self,
        token: &str,
        complaint_id: &str,
        update: &ComplaintUpdate,
    ) -> ClientResult<Option<Complaint>> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.state.lock().update_gate.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut state = self.state.lock();
        if let Some(e) = state.fail_update.take() {
            return Err(e);
        }
        let owner = state.token_departments.get(token).copied();

        let Some(record) = state
            .complaints
            .iter_mut()
            .find(|c| c.complaint_id == complaint_id)
        else {
            return Err(ClientError::NotFound(complaint_id.to_string()));
        };

        match update {
            ComplaintUpdate::Assignment {
                assigned_department,
            } => {
                record.assigned_department = Some(*assigned_department);
                record.status = ComplaintStatus::Assigned;
            }
            ComplaintUpdate::Status { status } => record.status = *status,
            ComplaintUpdate::Progress { .. } => {
                if owner.is_some_and(|owner| record.assigned_department != Some(owner)) {
                    return Err(ClientError::Authorization(
                        "Complaint is not assigned to your department".into(),
                    ));
                }
            }
        }
        let record = record.clone();
        state.updates.push((complaint_id.to_string(), update.clone()));
        Ok(Some(record))
    }
}
