//! # stratus-registry
//!
//! The router/core of the Stratus simulator: an explicit plugin registry,
//! `(region, service id)` request dispatch with token resolution, per-tenant
//! service catalog assembly, and the control plane test authors drive the
//! virtual clock and behavior registrations through.

pub mod control;
pub mod registry;
pub mod router;

pub use control::{BehaviorSurface, ControlPlane};
pub use registry::PluginRegistry;
pub use router::Router;
