//! Client error types
//!
//! Every operation returns a typed [`ClientError`]; none is fatal to the
//! process and each is scoped to the operation that raised it.

use shared::{ComplaintStatus, ModelError};
use thiserror::Error;

/// Client error type
///
/// `Clone` so a coalesced refresh can hand the same outcome to every waiter.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// No usable session; the user must sign in again
    #[error("Authentication required: {0}")]
    Auth(String),

    /// Transport failure or timeout
    #[error("Network error: {0}")]
    Network(String),

    /// The backend refused the action for this role or department
    #[error("Permission denied: {0}")]
    Authorization(String),

    /// Lifecycle rule violated; caught before any request is sent
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: ComplaintStatus,
        to: ComplaintStatus,
    },

    /// Another action on this complaint is still in flight
    #[error("Complaint {0} is already being updated")]
    AlreadyUpdating(String),

    /// Complaint not in the store, or the API returned 404 for it
    #[error("Not found: {0}")]
    NotFound(String),

    /// Input rejected locally
    #[error("Validation error: {0}")]
    Validation(String),

    /// Any other non-2xx response to an update
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Response body did not match the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The confirmation being resolved is no longer open
    #[error("Confirmation not found: {0}")]
    ConfirmationNotFound(String),

    /// The owning store was torn down
    #[error("Operation cancelled")]
    Cancelled,
}

impl ClientError {
    /// The caller should send the user back to sign-in
    pub fn requires_reauth(&self) -> bool {
        matches!(self, ClientError::Auth(_))
    }

    /// The same request may succeed if the user tries again
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Network(_) | ClientError::AlreadyUpdating(_) => true,
            ClientError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Message suitable for showing to the operator
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Auth(_) => "Your session has expired. Please sign in again.".to_string(),
            ClientError::Network(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            ClientError::Authorization(_) => {
                "You do not have permission to perform this action on this complaint.".to_string()
            }
            ClientError::InvalidTransition { from, to } => {
                format!("A complaint cannot move from {} to {}.", from, to)
            }
            ClientError::AlreadyUpdating(_) => {
                "An update for this complaint is already in progress.".to_string()
            }
            ClientError::NotFound(id) => format!("Complaint {} was not found.", id),
            ClientError::Validation(msg) => msg.clone(),
            ClientError::Api { status, .. } => {
                format!("The server rejected the request (status {}).", status)
            }
            ClientError::InvalidResponse(_) => {
                "The server sent an unexpected response.".to_string()
            }
            ClientError::ConfirmationNotFound(_) => {
                "This confirmation is no longer valid. Please start again.".to_string()
            }
            ClientError::Cancelled => "The operation was cancelled.".to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::InvalidResponse(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::InvalidResponse(err.to_string())
    }
}

impl From<ModelError> for ClientError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::MalformedToken(msg) => ClientError::Auth(msg),
            other => ClientError::Validation(other.to_string()),
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
