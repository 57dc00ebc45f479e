//! The session store: identity state with multiple consistent lookup keys.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::TimeDelta;
use rand::RngExt;
use rand::distr::Alphanumeric;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use stratus_core::VirtualClock;
use stratus_core::config::session::SessionConfig;
use stratus_entity::id::SessionId;
use stratus_entity::session::Session;

/// A token or tenant lookup found a session bound to a different tenant.
///
/// Carries the existing session and the tenant the caller asked for;
/// callers render this as a 401 in the body shape of their call site.
#[derive(Debug, Error)]
#[error("session is bound to tenant {}, not {requested}", session.tenant_id)]
pub struct TenantMismatch {
    /// The session that was found for the lookup key.
    pub session: Session,
    /// The tenant the caller asked for.
    pub requested: String,
}

/// An impersonation grant: the target session plus the freshly registered
/// impersonation token that now resolves to it.
#[derive(Debug, Clone)]
pub struct Impersonation {
    /// The impersonated user's session.
    pub session: Session,
    /// Token minted (or supplied) for this impersonation.
    pub token: String,
}

#[derive(Debug, Default)]
struct StoreInner {
    sessions: HashMap<SessionId, Session>,
    by_token: HashMap<String, SessionId>,
    by_username: HashMap<String, SessionId>,
    by_tenant: HashMap<String, SessionId>,
    /// Impersonation token → impersonator session id. An id reference, not
    /// an owning handle: the impersonator session's lifetime is independent.
    impersonator_by_token: HashMap<String, SessionId>,
}

/// Creates and looks up per-tenant authentication sessions by token,
/// username, or tenant id.
///
/// Sessions are created on first authentication attempt for a given identity
/// key and never destroyed; all three indexes are kept consistent on every
/// creation. Expiry is recorded state, mutated by impersonation, and not
/// enforced by lookups.
#[derive(Debug)]
pub struct SessionStore {
    clock: Arc<VirtualClock>,
    config: SessionConfig,
    inner: RwLock<StoreInner>,
}

impl SessionStore {
    /// Creates an empty session store.
    pub fn new(clock: Arc<VirtualClock>, config: SessionConfig) -> Self {
        Self {
            clock,
            config,
            inner: RwLock::new(StoreInner::default()),
        }
    }

    /// The clock sessions take their expiry from.
    pub fn clock(&self) -> &Arc<VirtualClock> {
        &self.clock
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the session for `token`, creating one if the token is
    /// unknown.
    ///
    /// If the token is unknown but `tenant_id` is supplied and already bound
    /// to a session, that session is returned as-is. A supplied `tenant_id`
    /// that differs from a found session's binding is a [`TenantMismatch`].
    pub fn session_for_token(
        &self,
        token: &str,
        tenant_id: Option<&str>,
    ) -> Result<Session, TenantMismatch> {
        {
            let inner = self.read();
            if let Some(session) = inner.by_token.get(token).and_then(|id| inner.sessions.get(id))
            {
                return match tenant_id {
                    Some(requested) if requested != session.tenant_id => Err(TenantMismatch {
                        session: session.clone(),
                        requested: requested.to_string(),
                    }),
                    _ => Ok(session.clone()),
                };
            }
            if let Some(tenant) = tenant_id
                && let Some(session) =
                    inner.by_tenant.get(tenant).and_then(|id| inner.sessions.get(id))
            {
                return Ok(session.clone());
            }
        }
        Ok(self.create_session(None, Some(token), tenant_id))
    }

    /// Returns the session for `username`, creating one on first use.
    ///
    /// Idempotent per username; the password is accepted unconditionally.
    /// The tenant-mismatch contract is the same as for token lookups.
    pub fn session_for_username_password(
        &self,
        username: &str,
        _password: &str,
        tenant_id: Option<&str>,
    ) -> Result<Session, TenantMismatch> {
        {
            let inner = self.read();
            if let Some(session) = inner
                .by_username
                .get(username)
                .and_then(|id| inner.sessions.get(id))
            {
                return match tenant_id {
                    Some(requested) if requested != session.tenant_id => Err(TenantMismatch {
                        session: session.clone(),
                        requested: requested.to_string(),
                    }),
                    _ => Ok(session.clone()),
                };
            }
        }
        Ok(self.create_session(Some(username), None, tenant_id))
    }

    /// API keys are not distinguished from passwords.
    pub fn session_for_api_key(
        &self,
        username: &str,
        key: &str,
        tenant_id: Option<&str>,
    ) -> Result<Session, TenantMismatch> {
        self.session_for_username_password(username, key, tenant_id)
    }

    /// Fetches or creates the session for `username`, overwrites its expiry
    /// to `now + ttl_seconds`, and records the impersonation token.
    ///
    /// Repeated calls for the same username mutate the same underlying
    /// session. The impersonation token becomes a lookup key for the target
    /// session, and the reverse link to the impersonator's session is kept
    /// so later token lookups can report who is impersonating.
    pub fn session_for_impersonation(
        &self,
        username: &str,
        ttl_seconds: u64,
        impersonator_token: Option<&str>,
        impersonated_token: Option<&str>,
    ) -> Impersonation {
        // Both sessions exist before any index is touched.
        let mut target = match self.session_for_username_password(username, "", None) {
            Ok(session) => session,
            Err(mismatch) => mismatch.session,
        };
        let impersonator = impersonator_token.map(|token| {
            self.session_for_token(token, None)
                .map_or_else(|mismatch| mismatch.session, |session| session)
        });

        let expires = self.clock.now() + TimeDelta::seconds(ttl_seconds as i64);
        let token = impersonated_token
            .map(str::to_string)
            .unwrap_or_else(|| format!("impersonated_{}", self.random_string(24)));

        target.expires = expires;
        let mut inner = self.write();
        let session = inner
            .sessions
            .get_mut(&target.id)
            .map(|entry| {
                entry.expires = expires;
                entry.clone()
            })
            .unwrap_or(target);
        inner.by_token.insert(token.clone(), session.id);
        if let Some(impersonator) = impersonator {
            inner
                .impersonator_by_token
                .insert(token.clone(), impersonator.id);
        }

        info!(
            username = %session.username,
            token = %token,
            expires = %expires,
            "Impersonation session granted"
        );
        Impersonation { session, token }
    }

    /// Returns the session bound to `tenant_id`, creating one on first use
    /// and pinning `token` to it if supplied.
    pub fn session_for_tenant_id(&self, tenant_id: &str, token: Option<&str>) -> Session {
        {
            let inner = self.read();
            if let Some(session) = inner
                .by_tenant
                .get(tenant_id)
                .and_then(|id| inner.sessions.get(id))
            {
                return session.clone();
            }
        }
        self.create_session(None, token, Some(tenant_id))
    }

    /// The session `token` resolves to, without creating one.
    ///
    /// Used by validation endpoints, where presenting an unknown token is a
    /// not-found condition rather than an implicit enrollment.
    pub fn existing_session_for_token(&self, token: &str) -> Option<Session> {
        let inner = self.read();
        inner
            .by_token
            .get(token)
            .and_then(|id| inner.sessions.get(id))
            .cloned()
    }

    /// The session impersonating through `token`, if `token` was minted by
    /// an impersonation call.
    pub fn impersonator_for_token(&self, token: &str) -> Option<Session> {
        let inner = self.read();
        inner
            .impersonator_by_token
            .get(token)
            .and_then(|id| inner.sessions.get(id))
            .cloned()
    }

    /// Stores per-plugin scratch data on a session.
    pub fn set_plugin_data(&self, session_id: SessionId, plugin_id: &str, data: Value) {
        let mut inner = self.write();
        if let Some(session) = inner.sessions.get_mut(&session_id) {
            session.plugin_data.insert(plugin_id.to_string(), data);
        }
    }

    /// Reads per-plugin scratch data from a session.
    pub fn plugin_data(&self, session_id: SessionId, plugin_id: &str) -> Option<Value> {
        let inner = self.read();
        inner
            .sessions
            .get(&session_id)
            .and_then(|s| s.plugin_data.get(plugin_id))
            .cloned()
    }

    /// Creates a session, generating whichever identity keys were not
    /// supplied, and installs it in all three indexes.
    fn create_session(
        &self,
        username: Option<&str>,
        token: Option<&str>,
        tenant_id: Option<&str>,
    ) -> Session {
        let now = self.clock.now();
        let username = username
            .map(str::to_string)
            .unwrap_or_else(|| format!("user_{}", self.random_string(12)));
        let token = token
            .map(str::to_string)
            .unwrap_or_else(|| self.random_string(self.config.token_length));
        let tenant_id = tenant_id
            .map(str::to_string)
            .unwrap_or_else(|| self.random_digits(7));

        let session = Session {
            id: SessionId::new(),
            user_id: Session::user_id_for(&username),
            username,
            token,
            tenant_id,
            expires: now + TimeDelta::seconds(self.config.default_ttl_seconds as i64),
            created_at: now,
            plugin_data: HashMap::new(),
        };

        let mut inner = self.write();
        inner.by_token.insert(session.token.clone(), session.id);
        inner
            .by_username
            .insert(session.username.clone(), session.id);
        inner
            .by_tenant
            .insert(session.tenant_id.clone(), session.id);
        inner.sessions.insert(session.id, session.clone());

        info!(
            username = %session.username,
            tenant_id = %session.tenant_id,
            session_id = %session.id,
            "Session created"
        );
        session
    }

    fn random_string(&self, length: usize) -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect()
    }

    fn random_digits(&self, length: usize) -> String {
        let mut rng = rand::rng();
        (0..length)
            .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
            .collect()
    }
}
