//! # stratus
//!
//! An in-process, stateful test double for a multi-tenant cloud provider's
//! control-plane APIs. Every call is served from memory with deterministic,
//! test-controllable timing: a virtual clock that only moves when the
//! control plane advances it, a session store with multiple consistent
//! identity keys, a behavior-injection engine for overriding default
//! responses, and a compute lifecycle simulator with a timed state machine.
//!
//! [`StratusCloud`] wires the standard deployment together; an embedding
//! transport adapter translates wire requests into [`ApiRequest`] values
//! and serializes calls into the core.

use std::sync::Arc;

use serde_json::Value;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

pub use stratus_core::config::AppConfig;
pub use stratus_core::traits::CloudPlugin;
pub use stratus_core::types::{ApiRequest, ApiResponse, CatalogEntry, Endpoint};
pub use stratus_core::{AppError, AppResult, ErrorKind, VirtualClock};
pub use stratus_entity::server::ServerStatus;
pub use stratus_entity::session::Session;

use stratus_compute::{ComputePlugin, ComputeService};
use stratus_core::config::logging::LoggingConfig;
use stratus_registry::{BehaviorSurface, ControlPlane, PluginRegistry, Router};
use stratus_session::{IdentityService, SessionStore};

/// The fully wired simulator: clock, sessions, behaviors, plugins.
#[derive(Debug)]
pub struct StratusCloud {
    clock: Arc<VirtualClock>,
    compute: Arc<ComputeService>,
    compute_service_id: String,
    router: Router,
    control: ControlPlane,
}

impl StratusCloud {
    /// Builds the standard deployment from configuration.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        Self::with_plugins(config, Vec::new())
    }

    /// Builds the standard deployment with default configuration.
    pub fn with_defaults() -> AppResult<Self> {
        Self::new(AppConfig::default())
    }

    /// Builds the standard deployment plus additional plugins.
    pub fn with_plugins(
        config: AppConfig,
        extra_plugins: Vec<Arc<dyn CloudPlugin>>,
    ) -> AppResult<Self> {
        let clock = Arc::new(VirtualClock::from_config(&config.clock)?);
        let store = Arc::new(SessionStore::new(clock.clone(), config.session.clone()));
        let identity = Arc::new(IdentityService::new(store));
        let compute = Arc::new(ComputeService::new(
            clock.clone(),
            config.compute.clone(),
            config.catalog.url_prefix.clone(),
        ));

        let compute_plugin = Arc::new(ComputePlugin::new(compute.clone()));
        let compute_service_id = compute_plugin.service_id().to_string();

        let mut registry = PluginRegistry::new();
        registry.register(compute_plugin)?;
        for plugin in extra_plugins {
            registry.register(plugin)?;
        }

        let control = ControlPlane::new(clock.clone());
        control.add_surface(Arc::new(AuthBehaviorSurface {
            identity: identity.clone(),
        }));
        control.add_surface(Arc::new(CreateServerBehaviorSurface {
            compute: compute.clone(),
        }));

        let router = Router::new(config.catalog, identity, registry);

        tracing::info!(
            compute_service_id = %compute_service_id,
            plugins = router.registry().len(),
            "Stratus cloud assembled"
        );

        Ok(Self {
            clock,
            compute,
            compute_service_id,
            router,
            control,
        })
    }

    /// The router dispatching provider API requests.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// The control plane test authors drive the simulator through.
    pub fn control(&self) -> &ControlPlane {
        &self.control
    }

    /// The shared virtual clock.
    pub fn clock(&self) -> &Arc<VirtualClock> {
        &self.clock
    }

    /// The compute simulator service.
    pub fn compute(&self) -> &Arc<ComputeService> {
        &self.compute
    }

    /// Service id the compute plugin registered under.
    pub fn compute_service_id(&self) -> &str {
        &self.compute_service_id
    }
}

/// The authentication event's control-plane surface.
struct AuthBehaviorSurface {
    identity: Arc<IdentityService>,
}

impl BehaviorSurface for AuthBehaviorSurface {
    fn event_name(&self) -> &'static str {
        "authentication"
    }

    fn register(&self, _region: Option<&str>, spec: &Value) -> AppResult<Uuid> {
        self.identity.register_behavior(spec)
    }

    fn unregister(&self, _region: Option<&str>, id: Uuid) -> AppResult<()> {
        self.identity.unregister_behavior(id)
    }
}

/// The server-creation event's control-plane surface, scoped per region.
struct CreateServerBehaviorSurface {
    compute: Arc<ComputeService>,
}

impl CreateServerBehaviorSurface {
    fn require_region<'a>(&self, region: Option<&'a str>) -> AppResult<&'a str> {
        region.ok_or_else(|| {
            AppError::validation("event 'server-creation' registrations require a region")
        })
    }
}

impl BehaviorSurface for CreateServerBehaviorSurface {
    fn event_name(&self) -> &'static str {
        "server-creation"
    }

    fn register(&self, region: Option<&str>, spec: &Value) -> AppResult<Uuid> {
        let region = self.require_region(region)?;
        self.compute.register_create_behavior(region, spec)
    }

    fn unregister(&self, region: Option<&str>, id: Uuid) -> AppResult<()> {
        let region = self.require_region(region)?;
        self.compute.unregister_create_behavior(region, id)
    }
}

/// Initialize tracing for an embedding binary.
///
/// Honors `RUST_LOG` when set; falls back to the configured level.
pub fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}
