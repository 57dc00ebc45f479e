//! # stratus-core
//!
//! Foundation crate for the Stratus cloud-provider simulator: the unified
//! error type, configuration schemas, the virtual clock every timed behavior
//! reads from, in-process request/response value types, and the plugin trait
//! the router dispatches to.

pub mod clock;
pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use clock::VirtualClock;
pub use error::{AppError, ErrorKind};
pub use result::AppResult;
