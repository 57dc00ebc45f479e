//! # stratus-compute
//!
//! The compute-resource lifecycle simulator: per-tenant, per-region
//! collections of virtual servers with a timed state machine, cursor-based
//! pagination, metadata-driven creation directives, and behavior-injected
//! creation outcomes. Registered with the router as a plugin.

pub mod behaviors;
pub mod collection;
pub mod directives;
pub mod plugin;
pub mod service;
pub mod views;

pub use behaviors::{CreateServerBehavior, server_creation_event};
pub use plugin::ComputePlugin;
pub use service::ComputeService;
