//! Lifecycle actions and the rules that gate them

use serde::Serialize;
use shared::{Complaint, ComplaintStatus, ComplaintUpdate, Department, ImageAttachment, Role};

use crate::{ClientError, ClientResult};

/// Kind of mutating action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ActionKind {
    Assignment,
    StatusChange,
    ProgressUpdate,
}

impl ActionKind {
    pub const ALL: [ActionKind; 3] = [
        ActionKind::Assignment,
        ActionKind::StatusChange,
        ActionKind::ProgressUpdate,
    ];
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ActionKind::Assignment => "assignment",
            ActionKind::StatusChange => "status change",
            ActionKind::ProgressUpdate => "progress update",
        };
        write!(f, "{}", name)
    }
}

/// Departmental progress note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub description: String,
    pub image: Option<ImageAttachment>,
}

impl ProgressUpdate {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: ImageAttachment) -> Self {
        self.image = Some(image);
        self
    }
}

/// A requested mutation of one complaint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Assign { department: Department },
    UpdateStatus { status: ComplaintStatus },
    SubmitProgress(ProgressUpdate),
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Assign { .. } => ActionKind::Assignment,
            Action::UpdateStatus { .. } => ActionKind::StatusChange,
            Action::SubmitProgress(_) => ActionKind::ProgressUpdate,
        }
    }

    /// Request body sent to the complaints API
    pub fn to_update(&self) -> ComplaintUpdate {
        match self {
            Action::Assign { department } => ComplaintUpdate::Assignment {
                assigned_department: *department,
            },
            Action::UpdateStatus { status } => ComplaintUpdate::Status { status: *status },
            Action::SubmitProgress(progress) => ComplaintUpdate::Progress {
                description: progress.description.trim().to_string(),
                image: progress.image.clone(),
            },
        }
    }
}

/// Enforce role tier and lifecycle rules for `action` on `complaint`.
///
/// Department ownership for progress updates is left to the API, which
/// answers 403 on a mismatch.
pub fn authorize(role: Role, action: &Action, complaint: &Complaint) -> ClientResult<()> {
    match action {
        Action::Assign { .. } => {
            if !role.is_super_admin() {
                return Err(ClientError::Authorization(format!(
                    "{} cannot assign complaints",
                    role
                )));
            }
            if complaint.status.is_terminal() {
                return Err(ClientError::InvalidTransition {
                    from: complaint.status,
                    to: ComplaintStatus::Assigned,
                });
            }
        }
        Action::UpdateStatus { status } => {
            if !role.is_super_admin() {
                return Err(ClientError::Authorization(format!(
                    "{} cannot change complaint status",
                    role
                )));
            }
            if !complaint.status.can_transition_to(*status) {
                return Err(ClientError::InvalidTransition {
                    from: complaint.status,
                    to: *status,
                });
            }
            // Assigned requires a department; that goes through assignment
            if *status == ComplaintStatus::Assigned && complaint.assigned_department.is_none() {
                return Err(ClientError::InvalidTransition {
                    from: complaint.status,
                    to: *status,
                });
            }
        }
        Action::SubmitProgress(progress) => {
            if role.is_super_admin() {
                return Err(ClientError::Authorization(
                    "Progress updates are submitted by the assigned department".into(),
                ));
            }
            if progress.description.trim().is_empty() {
                return Err(ClientError::Validation(
                    "Progress description must not be empty".into(),
                ));
            }
        }
    }
    Ok(())
}

/// Capability check for views: may `role` offer `kind` on `complaint`?
///
/// Stricter than [`authorize`] in one respect: progress updates are only
/// offered to the owning department when the role maps to one.
pub fn can_perform(role: Role, kind: ActionKind, complaint: &Complaint) -> bool {
    match kind {
        ActionKind::Assignment => role.is_super_admin() && !complaint.status.is_terminal(),
        ActionKind::StatusChange => {
            role.is_super_admin()
                && complaint.status.next_statuses().iter().any(|next| {
                    *next != ComplaintStatus::Assigned || complaint.assigned_department.is_some()
                })
        }
        ActionKind::ProgressUpdate => {
            !role.is_super_admin()
                && match role.department() {
                    Some(department) => complaint.assigned_department == Some(department),
                    None => true,
                }
        }
    }
}
