//! Request types for the complaints API
//!
//! `PUT /complaints/{complaintId}` takes one of these bodies, discriminated
//! by `updateType`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::models::{ComplaintStatus, Department};

/// Upper bound for a progress photo (5 MiB)
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Update request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "updateType", rename_all = "lowercase")]
pub enum ComplaintUpdate {
    /// Route the complaint to a department
    Assignment {
        #[serde(rename = "assignedDepartment")]
        assigned_department: Department,
    },
    /// Move the complaint to a new status
    Status { status: ComplaintStatus },
    /// Departmental progress note, optionally with a photo
    Progress {
        description: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image: Option<ImageAttachment>,
    },
}

impl ComplaintUpdate {
    pub fn update_type(&self) -> &'static str {
        match self {
            ComplaintUpdate::Assignment { .. } => "assignment",
            ComplaintUpdate::Status { .. } => "status",
            ComplaintUpdate::Progress { .. } => "progress",
        }
    }
}

/// Image attached to a progress update, base64-encoded on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAttachment {
    pub file_name: String,
    pub content_type: String,
    pub data: String,
}

impl ImageAttachment {
    /// Encode raw image bytes, rejecting non-images and oversize files
    pub fn encode(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: &[u8],
    ) -> Result<Self, ModelError> {
        let content_type = content_type.into();
        if !content_type.starts_with("image/") {
            return Err(ModelError::InvalidImage(format!(
                "unsupported content type {}",
                content_type
            )));
        }
        if bytes.is_empty() {
            return Err(ModelError::InvalidImage("empty file".to_string()));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ModelError::InvalidImage(format!(
                "{} bytes exceeds the {} byte limit",
                bytes.len(),
                MAX_IMAGE_BYTES
            )));
        }
        Ok(Self {
            file_name: file_name.into(),
            content_type,
            data: STANDARD.encode(bytes),
        })
    }
}
