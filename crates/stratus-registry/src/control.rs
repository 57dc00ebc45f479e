//! The control plane: clock advancement and behavior registration.
//!
//! Test authors drive the simulator through this surface rather than
//! through the provider APIs: advancing virtual time, and installing or
//! removing behavior registrations for any event that exposes one.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::{Value, json};
use uuid::Uuid;

use stratus_core::types::ApiResponse;
use stratus_core::{AppError, AppResult, VirtualClock};

/// One event's behavior registration surface, as seen by the control plane.
///
/// Events that scope registrations per region (like server creation) read
/// the `region` argument; global events (like authentication) ignore it.
pub trait BehaviorSurface: Send + Sync {
    /// The event name this surface registers behaviors for.
    fn event_name(&self) -> &'static str;

    /// Install a registration from the JSON surface, returning its id.
    fn register(&self, region: Option<&str>, spec: &Value) -> AppResult<Uuid>;

    /// Remove a registration. Unknown ids are a not-found error.
    fn unregister(&self, region: Option<&str>, id: Uuid) -> AppResult<()>;
}

/// The simulator's out-of-band control surface.
pub struct ControlPlane {
    clock: Arc<VirtualClock>,
    surfaces: RwLock<HashMap<&'static str, Arc<dyn BehaviorSurface>>>,
}

impl ControlPlane {
    /// Creates a control plane over the shared clock.
    pub fn new(clock: Arc<VirtualClock>) -> Self {
        Self {
            clock,
            surfaces: RwLock::new(HashMap::new()),
        }
    }

    /// The clock this control plane advances.
    pub fn clock(&self) -> &Arc<VirtualClock> {
        &self.clock
    }

    /// Expose an event's behavior surface by name.
    pub fn add_surface(&self, surface: Arc<dyn BehaviorSurface>) {
        let mut surfaces = self
            .surfaces
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        surfaces.insert(surface.event_name(), surface);
    }

    /// Advance the virtual clock from a `{"amount": seconds}` document.
    pub fn tick(&self, body: &Value) -> AppResult<ApiResponse> {
        let amount = body
            .get("amount")
            .and_then(Value::as_f64)
            .ok_or_else(|| AppError::validation("Invalid JSON request body: missing 'amount'"))?;
        let now = self.clock.advance_seconds(amount)?;
        tracing::info!(amount, now = %now, "Clock ticked");
        Ok(ApiResponse::ok(json!({
            "advanced": amount,
            "now": now.to_rfc3339(),
        })))
    }

    /// Register a behavior for an event, returning `{"id": <uuid>}`.
    pub fn register_behavior(
        &self,
        event: &str,
        region: Option<&str>,
        spec: &Value,
    ) -> AppResult<ApiResponse> {
        let surface = self.surface(event)?;
        let id = surface.register(region, spec)?;
        Ok(ApiResponse::created(json!({"id": id})))
    }

    /// Remove a behavior registration by id. Unknown ids are a 404.
    pub fn unregister_behavior(
        &self,
        event: &str,
        region: Option<&str>,
        id: &str,
    ) -> AppResult<ApiResponse> {
        let id = Uuid::parse_str(id).map_err(|_| {
            AppError::not_found(format!("behavior registration {id} does not exist"))
        })?;
        let surface = self.surface(event)?;
        surface.unregister(region, id)?;
        Ok(ApiResponse::no_content())
    }

    fn surface(&self, event: &str) -> AppResult<Arc<dyn BehaviorSurface>> {
        let surfaces = self
            .surfaces
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        surfaces
            .get(event)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("event '{event}' does not exist")))
    }
}

impl std::fmt::Debug for ControlPlane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let surfaces = self
            .surfaces
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("ControlPlane")
            .field("events", &surfaces.keys().collect::<Vec<_>>())
            .finish()
    }
}
