//! Identity-provider boundary
//!
//! Sign-in, token issuance and group membership live in the external
//! identity provider. The client only asks it for a current session.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use parking_lot::RwLock;
use serde::Deserialize;
use shared::ModelError;

use crate::{ClientError, ClientResult};

/// Claim carrying group membership in the ID token
pub const GROUPS_CLAIM: &str = "cognito:groups";

/// Authenticated session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Bearer token for API calls
    pub id_token: String,
    /// Group memberships from the token claims
    pub groups: Vec<String>,
}

#[derive(Deserialize)]
struct GroupClaims {
    #[serde(rename = "cognito:groups", default)]
    groups: Vec<String>,
}

impl Session {
    pub fn new(id_token: impl Into<String>, groups: Vec<String>) -> Self {
        Self {
            id_token: id_token.into(),
            groups,
        }
    }

    /// Build a session from a raw JWT, reading the groups claim.
    ///
    /// The signature is not checked here; the API verifies every token it
    /// receives.
    pub fn from_id_token(id_token: impl Into<String>) -> Result<Self, ModelError> {
        let id_token = id_token.into();
        let mut parts = id_token.split('.');
        let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(_), Some(payload), Some(_), None) => payload,
            _ => {
                return Err(ModelError::MalformedToken(
                    "expected three dot-separated segments".into(),
                ));
            }
        };
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| ModelError::MalformedToken(e.to_string()))?;
        let claims: GroupClaims = serde_json::from_slice(&bytes)
            .map_err(|e| ModelError::MalformedToken(e.to_string()))?;

        Ok(Self {
            id_token,
            groups: claims.groups,
        })
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }
}

/// Source of authenticated sessions
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Return the current session.
    ///
    /// With `force_refresh` the provider must bypass any cached token so the
    /// group claims reflect current membership.
    async fn get_session(&self, force_refresh: bool) -> ClientResult<Session>;
}

/// Identity provider backed by a fixed token
///
/// Used by the console (token supplied through the environment) and in
/// tests. `replace` simulates a token refresh; `sign_out` drops the
/// session so later calls fail with `Auth`.
#[derive(Debug, Default)]
pub struct StaticIdentity {
    session: RwLock<Option<Session>>,
}

impl StaticIdentity {
    pub fn new(session: Session) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }

    pub fn from_id_token(id_token: impl Into<String>) -> ClientResult<Self> {
        Ok(Self::new(Session::from_id_token(id_token)?))
    }

    /// Session holding `groups` with an opaque token
    pub fn with_groups<I, S>(id_token: impl Into<String>, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Session::new(
            id_token,
            groups.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn replace(&self, session: Session) {
        *self.session.write() = Some(session);
    }

    pub fn sign_out(&self) {
        *self.session.write() = None;
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn get_session(&self, _force_refresh: bool) -> ClientResult<Session> {
        self.session
            .read()
            .clone()
            .ok_or_else(|| ClientError::Auth("No active session".into()))
    }
}
