//! Confirmation requests for consequential actions

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{Complaint, ComplaintStatus};
use uuid::Uuid;

use super::action::Action;

/// How consequential the confirmed action is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Danger,
}

/// An action awaiting explicit confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirmation {
    pub id: Uuid,
    pub complaint_id: String,
    pub action: Action,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub confirm_label: String,
    pub requested_at: DateTime<Utc>,
}

impl PendingConfirmation {
    pub(crate) fn for_action(complaint: &Complaint, action: Action) -> Self {
        let id = &complaint.complaint_id;
        let (severity, title, message, confirm_label) = match &action {
            Action::Assign { department } => (
                Severity::Warning,
                "Assign Complaint".to_string(),
                format!("Assign complaint {id} to {department}? The department will take ownership of it."),
                "Assign",
            ),
            Action::UpdateStatus {
                status: ComplaintStatus::Rejected,
            } => (
                Severity::Danger,
                "Reject Complaint".to_string(),
                format!("Reject complaint {id}? A rejected complaint cannot be reopened."),
                "Reject",
            ),
            Action::UpdateStatus {
                status: ComplaintStatus::Resolved,
            } => (
                Severity::Warning,
                "Resolve Complaint".to_string(),
                format!("Mark complaint {id} as Resolved? No further updates will be possible."),
                "Mark Resolved",
            ),
            Action::UpdateStatus { status } => (
                Severity::Info,
                "Update Status".to_string(),
                format!(
                    "Change the status of complaint {id} from {} to {status}?",
                    complaint.status
                ),
                "Update",
            ),
            Action::SubmitProgress(_) => (
                Severity::Info,
                "Submit Progress Update".to_string(),
                format!("Submit a progress update for complaint {id}?"),
                "Submit",
            ),
        };

        Self {
            id: Uuid::new_v4(),
            complaint_id: id.clone(),
            action,
            severity,
            title,
            message,
            confirm_label: confirm_label.to_string(),
            requested_at: Utc::now(),
        }
    }
}
