//! Shared types for the Lok Samadhan admin client
//!
//! Complaint, role and request models used by the client library
//! and the operator console.

pub mod client;
pub mod error;
pub mod models;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use client::{ComplaintUpdate, ImageAttachment};
pub use error::ModelError;
pub use models::{Category, Complaint, ComplaintStatus, Department, Priority, Role};
