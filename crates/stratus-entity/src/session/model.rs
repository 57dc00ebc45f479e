//! Session entity model.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::id::SessionId;

/// Namespace for deriving stable user ids from usernames.
const USER_ID_NAMESPACE: Uuid = Uuid::from_bytes([
    0x9f, 0x3a, 0x1c, 0x5e, 0x42, 0x7b, 0x4d, 0x09, 0x8a, 0x61, 0xd4, 0x2f, 0x17, 0xee, 0x90, 0x33,
]);

/// Identity state for one simulated tenant.
///
/// Sessions are created on first authentication for a given identity key and
/// live for the lifetime of the process; impersonation mutates the expiry in
/// place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier.
    pub id: SessionId,
    /// Username this session authenticates.
    pub username: String,
    /// Opaque credential identifying the session.
    pub token: String,
    /// Tenant the session is bound to.
    pub tenant_id: String,
    /// Stable identifier derived from the username.
    pub user_id: Uuid,
    /// When the token expires, in virtual time.
    pub expires: DateTime<Utc>,
    /// When the session was created, in virtual time.
    pub created_at: DateTime<Utc>,
    /// Lazily created per-plugin scratch state, keyed by plugin identity.
    #[serde(default)]
    pub plugin_data: HashMap<String, Value>,
}

impl Session {
    /// Derive the stable user id for a username.
    ///
    /// The same username always yields the same id, across sessions and
    /// across process restarts.
    pub fn user_id_for(username: &str) -> Uuid {
        Uuid::new_v5(&USER_ID_NAMESPACE, username.as_bytes())
    }

    /// Whether the token has expired at the given virtual instant.
    ///
    /// Expiry is reported state only; the store never evicts sessions.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }

    /// Per-plugin data for `plugin_id`, if any has been stored.
    pub fn plugin_data(&self, plugin_id: &str) -> Option<&Value> {
        self.plugin_data.get(plugin_id)
    }
}
