//! Session/role resolution

use std::sync::Arc;

use shared::Role;

use super::session::{IdentityProvider, Session};
use crate::ClientResult;

/// Derive the acting role from group claims.
///
/// Exactly one role wins by [`Role::PRECEDENCE`]; users in no recognised
/// group fall back to [`Role::DepartmentAdmin`].
pub fn resolve_role(session: &Session) -> Role {
    Role::PRECEDENCE
        .into_iter()
        .find(|role| session.in_group(role.as_str()))
        .unwrap_or_default()
}

/// Resolves the role against a freshly fetched session
///
/// Group claims in a cached token can be stale, so every lookup forces
/// the identity provider to refresh.
pub struct RoleResolver<I> {
    identity: Arc<I>,
}

impl<I> Clone for RoleResolver<I> {
    fn clone(&self) -> Self {
        Self {
            identity: self.identity.clone(),
        }
    }
}

impl<I: IdentityProvider> RoleResolver<I> {
    pub fn new(identity: Arc<I>) -> Self {
        Self { identity }
    }

    /// Fresh session plus the role derived from it
    pub async fn current(&self) -> ClientResult<(Session, Role)> {
        let session = self.identity.get_session(true).await?;
        let role = resolve_role(&session);
        tracing::debug!(role = %role, groups = ?session.groups, "Resolved role");
        Ok((session, role))
    }

    pub async fn current_role(&self) -> ClientResult<Role> {
        Ok(self.current().await?.1)
    }
}
