//! Capability traits implemented across the workspace.

pub mod plugin;

pub use plugin::CloudPlugin;
