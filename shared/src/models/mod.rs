//! Data models
//!
//! Wire types shared between the client library and the console.
//! Field names follow the complaints API (camelCase JSON).

pub mod category;
pub mod complaint;
pub mod role;

// Re-exports
pub use category::*;
pub use complaint::*;
pub use role::*;
