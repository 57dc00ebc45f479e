//! Virtual server entity model.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::id::ServerId;
use crate::server::status::{PendingTransition, ServerStatus};

/// A virtual compute instance.
///
/// Owned exclusively by its regional collection; mutated by action calls and
/// by lazy clock-driven transition resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerResource {
    /// Unique server identifier.
    pub id: ServerId,
    /// Display name.
    pub name: String,
    /// Tenant that owns the server.
    pub tenant_id: String,
    /// User that created the server.
    pub user_id: Uuid,
    /// Current state-machine state.
    pub status: ServerStatus,
    /// Flavor reference, an opaque string.
    pub flavor_ref: String,
    /// Flavor held before an unconfirmed resize, for revert.
    pub previous_flavor_ref: Option<String>,
    /// Image reference, an opaque string.
    pub image_ref: String,
    /// String-to-string metadata, bounded by the configured ceiling.
    pub metadata: BTreeMap<String, String>,
    /// Canned address document generated at creation.
    pub addresses: Value,
    /// Admin password issued at creation or by rescue/changePassword.
    pub admin_pass: String,
    /// When the server was created, in virtual time.
    pub created_at: DateTime<Utc>,
    /// When the server last changed, in virtual time.
    pub updated_at: DateTime<Utc>,
    /// Clock-gated transition waiting to fire, if any.
    pub pending: Option<PendingTransition>,
}

impl ServerResource {
    /// Resolve the pending transition against the current virtual instant.
    ///
    /// Returns `true` if the transition fired. The `updated_at` stamp is set
    /// to the deadline, not the observation time, so a change-tracking
    /// poller sees the instant the state actually changed.
    pub fn resolve_pending(&mut self, now: DateTime<Utc>) -> bool {
        match self.pending {
            Some(transition) if now >= transition.deadline => {
                self.status = transition.target;
                self.updated_at = transition.deadline;
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Schedule a clock-gated transition to `target` at `deadline`.
    pub fn schedule(&mut self, target: ServerStatus, deadline: DateTime<Utc>) {
        self.pending = Some(PendingTransition { target, deadline });
    }

    /// Whether the server is a deletion tombstone.
    pub fn is_tombstone(&self) -> bool {
        self.status == ServerStatus::Deleted
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn instant(seconds: i64) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .expect("valid")
            .with_timezone(&Utc)
            + TimeDelta::seconds(seconds)
    }

    fn server() -> ServerResource {
        ServerResource {
            id: ServerId::new(),
            name: "web-1".to_string(),
            tenant_id: "t1".to_string(),
            user_id: Uuid::new_v4(),
            status: ServerStatus::Build,
            flavor_ref: "2".to_string(),
            previous_flavor_ref: None,
            image_ref: "img-1".to_string(),
            metadata: BTreeMap::new(),
            addresses: Value::Null,
            admin_pass: "secret".to_string(),
            created_at: instant(0),
            updated_at: instant(0),
            pending: None,
        }
    }

    #[test]
    fn test_pending_fires_at_deadline() {
        let mut server = server();
        server.schedule(ServerStatus::Active, instant(5));

        assert!(!server.resolve_pending(instant(4)));
        assert_eq!(server.status, ServerStatus::Build);

        assert!(server.resolve_pending(instant(5)));
        assert_eq!(server.status, ServerStatus::Active);
        assert_eq!(server.updated_at, instant(5));
        assert!(server.pending.is_none());
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let mut server = server();
        server.schedule(ServerStatus::Active, instant(5));
        server.resolve_pending(instant(10));
        assert!(!server.resolve_pending(instant(20)));
        assert_eq!(server.updated_at, instant(5));
    }
}
