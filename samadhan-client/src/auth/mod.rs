//! Authentication and role resolution

mod role;
mod session;

pub use role::{RoleResolver, resolve_role};
pub use session::{GROUPS_CLAIM, IdentityProvider, Session, StaticIdentity};
