//! Compute simulator configuration.

use serde::{Deserialize, Serialize};

/// Compute simulator configuration.
///
/// All durations are virtual seconds; they only elapse when the control
/// plane advances the clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeConfig {
    /// How long a soft reboot keeps a server in `REBOOT`.
    #[serde(default = "default_soft_reboot")]
    pub soft_reboot_seconds: u64,
    /// How long a hard reboot keeps a server in `HARD_REBOOT`.
    #[serde(default = "default_hard_reboot")]
    pub hard_reboot_seconds: u64,
    /// How long a rebuild keeps a server in `REBUILD`.
    #[serde(default = "default_rebuild")]
    pub rebuild_seconds: u64,
    /// How long a password change keeps a server in `PASSWORD`.
    #[serde(default = "default_password")]
    pub password_seconds: u64,
    /// How long deleted servers remain visible to `changes-since` pollers.
    #[serde(default = "default_tracking_window")]
    pub deleted_tracking_window_seconds: u64,
    /// Maximum number of metadata entries per server.
    #[serde(default = "default_metadata_limit")]
    pub metadata_item_limit: usize,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            soft_reboot_seconds: default_soft_reboot(),
            hard_reboot_seconds: default_hard_reboot(),
            rebuild_seconds: default_rebuild(),
            password_seconds: default_password(),
            deleted_tracking_window_seconds: default_tracking_window(),
            metadata_item_limit: default_metadata_limit(),
        }
    }
}

fn default_soft_reboot() -> u64 {
    10
}

fn default_hard_reboot() -> u64 {
    30
}

fn default_rebuild() -> u64 {
    60
}

fn default_password() -> u64 {
    5
}

fn default_tracking_window() -> u64 {
    3_600
}

fn default_metadata_limit() -> usize {
    40
}
