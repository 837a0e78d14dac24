//! Samadhan Client - admin client for the Lok Samadhan complaints API
//!
//! Resolves the operator's role from identity-token groups, caches the
//! visible complaint set, and drives complaints through their lifecycle.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod store;
pub mod view;

#[cfg(test)]
pub(crate) mod test_support;

pub use auth::{IdentityProvider, RoleResolver, Session, StaticIdentity, resolve_role};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::{ComplaintsApi, NetworkComplaintsApi};
pub use lifecycle::{
    Action, ActionKind, LifecycleController, MutationOutcome, PendingConfirmation, ProgressUpdate,
    RefreshStatus, Severity, can_perform,
};
pub use store::{AutoRefresh, ComplaintFilter, ComplaintSet, ComplaintStore};
pub use view::{Dashboard, DashboardState, Intent};

// Re-export shared types for convenience
pub use shared::{
    Category, Complaint, ComplaintStatus, ComplaintUpdate, Department, ImageAttachment, Role,
};
