//! Server state-machine states and pending transitions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State-machine state of a virtual server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServerStatus {
    /// Being provisioned; becomes `ACTIVE` once the build deadline passes.
    #[serde(rename = "BUILD")]
    Build,
    /// Running normally.
    #[serde(rename = "ACTIVE")]
    Active,
    /// Provisioning failed.
    #[serde(rename = "ERROR")]
    Error,
    /// Resized; waiting for the caller to confirm or revert.
    #[serde(rename = "VERIFY_RESIZE")]
    VerifyResize,
    /// Soft reboot in progress.
    #[serde(rename = "REBOOT")]
    Reboot,
    /// Hard reboot in progress.
    #[serde(rename = "HARD_REBOOT")]
    HardReboot,
    /// Booted into the rescue environment.
    #[serde(rename = "RESCUE")]
    Rescue,
    /// Being rebuilt from a new image.
    #[serde(rename = "REBUILD")]
    Rebuild,
    /// Password change in progress.
    #[serde(rename = "PASSWORD")]
    Password,
    /// Deleted; retained as a tombstone for change-tracking pollers.
    #[serde(rename = "DELETED")]
    Deleted,
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Build => "BUILD",
            Self::Active => "ACTIVE",
            Self::Error => "ERROR",
            Self::VerifyResize => "VERIFY_RESIZE",
            Self::Reboot => "REBOOT",
            Self::HardReboot => "HARD_REBOOT",
            Self::Rescue => "RESCUE",
            Self::Rebuild => "REBUILD",
            Self::Password => "PASSWORD",
            Self::Deleted => "DELETED",
        };
        write!(f, "{s}")
    }
}

/// A clock-gated transition waiting to fire.
///
/// Never pushed by a background task; resolved lazily whenever the resource
/// is read, by comparing the deadline against the virtual clock.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PendingTransition {
    /// Status the server moves to once the deadline passes.
    pub target: ServerStatus,
    /// Virtual instant at which the transition becomes visible.
    pub deadline: DateTime<Utc>,
}
