//! The per-(tenant, region) server collection and its pagination.

use chrono::{DateTime, TimeDelta, Utc};

use stratus_core::types::PageParams;
use stratus_core::{AppError, AppResult};
use stratus_entity::id::ServerId;
use stratus_entity::server::ServerResource;

/// One page cut from a collection.
#[derive(Debug)]
pub struct Page<'a> {
    /// Resources on this page, in insertion order.
    pub items: Vec<&'a ServerResource>,
    /// Marker for the next page, when more results remain.
    pub next_marker: Option<ServerId>,
}

/// Ordered set of servers for one (tenant, region) pair.
///
/// Owns all contained resources; insertion order is pagination order.
#[derive(Debug)]
pub struct RegionalServerCollection {
    tenant_id: String,
    region: String,
    servers: Vec<ServerResource>,
}

impl RegionalServerCollection {
    /// Creates an empty collection.
    pub fn new(tenant_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            region: region.into(),
            servers: Vec::new(),
        }
    }

    /// Tenant this collection belongs to.
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Region this collection belongs to.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Number of resources, tombstones included.
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// Whether the collection holds nothing at all.
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Appends a freshly created server.
    pub fn insert(&mut self, server: ServerResource) {
        self.servers.push(server);
    }

    /// Looks up a server by id.
    pub fn get(&self, id: ServerId) -> Option<&ServerResource> {
        self.servers.iter().find(|s| s.id == id)
    }

    /// Looks up a server by id for mutation.
    pub fn get_mut(&mut self, id: ServerId) -> Option<&mut ServerResource> {
        self.servers.iter_mut().find(|s| s.id == id)
    }

    /// Resolves every clock-gated transition whose deadline has passed.
    ///
    /// Called on every read path so state is always a pure function of the
    /// stored deadlines and the current clock value.
    pub fn resolve_pending(&mut self, now: DateTime<Utc>) {
        for server in &mut self.servers {
            server.resolve_pending(now);
        }
    }

    /// Drops tombstones whose change-tracking window has elapsed.
    pub fn purge_tombstones(&mut self, now: DateTime<Utc>, window: TimeDelta) {
        self.servers
            .retain(|s| !s.is_tombstone() || s.updated_at + window > now);
    }

    /// Cuts one page out of the collection.
    ///
    /// The filters run first: a `name` substring match, then
    /// `updated_at >= changes-since`. The latter deliberately includes
    /// tombstones so a poller can learn about deletions, while a plain list
    /// hides them. The marker must identify a resource in the unfiltered
    /// collection; the page starts immediately after its insertion
    /// position.
    pub fn page(&self, params: &PageParams) -> AppResult<Page<'_>> {
        let start = match &params.marker {
            None => 0,
            Some(marker) => {
                let position = self
                    .servers
                    .iter()
                    .position(|s| s.id.to_string() == *marker)
                    .ok_or_else(|| AppError::validation(format!("marker [{marker}] not found")))?;
                position + 1
            }
        };

        let filtered: Vec<&ServerResource> = self.servers[start..]
            .iter()
            .filter(|s| match &params.name {
                Some(fragment) => s.name.contains(fragment.as_str()),
                None => true,
            })
            .filter(|s| match params.changes_since {
                Some(since) => s.updated_at >= since,
                None => !s.is_tombstone(),
            })
            .collect();

        let (items, next_marker) = match params.limit {
            Some(0) => (Vec::new(), None),
            Some(limit) if filtered.len() > limit => {
                let items: Vec<&ServerResource> = filtered[..limit].to_vec();
                let next = items.last().map(|s| s.id);
                (items, next)
            }
            _ => (filtered, None),
        };

        Ok(Page { items, next_marker })
    }
}
