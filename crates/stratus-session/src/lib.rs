//! # stratus-session
//!
//! The session/identity layer of the Stratus simulator: a store of
//! per-tenant authentication sessions reachable through multiple consistent
//! lookup keys, and the identity service that turns authentication requests
//! into sessions and rendered identity documents.

pub mod behaviors;
pub mod service;
pub mod store;

pub use behaviors::{AuthBehavior, authentication_event};
pub use service::IdentityService;
pub use store::{Impersonation, SessionStore, TenantMismatch};
