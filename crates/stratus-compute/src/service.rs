//! Compute operations: the timed state machine over regional collections.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, TimeDelta, Utc};
use rand::RngExt;
use rand::distr::Alphanumeric;
use serde_json::{Value, json};
use tracing::info;
use uuid::Uuid;

use stratus_behavior::{Attributes, BehaviorRegistry};
use stratus_core::VirtualClock;
use stratus_core::config::compute::ComputeConfig;
use stratus_core::types::{ApiResponse, PageParams};
use stratus_core::{AppError, AppResult};
use stratus_entity::id::ServerId;
use stratus_entity::server::{ServerResource, ServerStatus};
use stratus_entity::session::Session;

use crate::behaviors::{CreateServerBehavior, server_creation_event};
use crate::collection::RegionalServerCollection;
use crate::directives;
use crate::views;

/// The compute simulator's operation surface.
///
/// Holds every (tenant, region) collection and the per-region creation
/// behavior registries. All operations are synchronous; clock-gated
/// transitions are resolved lazily at the start of each one.
pub struct ComputeService {
    clock: Arc<VirtualClock>,
    config: ComputeConfig,
    url_prefix: String,
    collections: RwLock<HashMap<(String, String), RegionalServerCollection>>,
    behaviors: RwLock<HashMap<String, BehaviorRegistry<CreateServerBehavior>>>,
}

impl ComputeService {
    /// Creates the service.
    pub fn new(clock: Arc<VirtualClock>, config: ComputeConfig, url_prefix: String) -> Self {
        Self {
            clock,
            config,
            url_prefix,
            collections: RwLock::new(HashMap::new()),
            behaviors: RwLock::new(HashMap::new()),
        }
    }

    /// The URL prefix compute documents link back to for a tenant.
    pub fn endpoint_prefix(&self, tenant_id: &str) -> String {
        format!("{}/compute/v2/{tenant_id}", self.url_prefix)
    }

    /// Register a server-creation behavior for one region.
    pub fn register_create_behavior(&self, region: &str, spec: &Value) -> AppResult<Uuid> {
        let mut behaviors = self
            .behaviors
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        behaviors
            .entry(region.to_string())
            .or_insert_with(|| BehaviorRegistry::new(server_creation_event()))
            .register_from_spec(spec)
    }

    /// Remove a server-creation behavior registration from one region.
    pub fn unregister_create_behavior(&self, region: &str, id: Uuid) -> AppResult<()> {
        let mut behaviors = self
            .behaviors
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match behaviors.get_mut(region) {
            Some(registry) => registry.unregister(id),
            None => Err(AppError::not_found(format!(
                "behavior registration {id} does not exist"
            ))),
        }
    }

    /// Create a server from a `{"server": {...}}` document.
    pub fn create_server(
        &self,
        tenant_id: &str,
        region: &str,
        body: &Value,
    ) -> AppResult<ApiResponse> {
        let doc = body
            .get("server")
            .and_then(Value::as_object)
            .ok_or_else(|| AppError::validation("Malformed request body"))?;
        let name = doc
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::validation("Server name is not defined"))?;
        let flavor_ref = doc
            .get("flavorRef")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::validation("Missing flavorRef attribute"))?;
        let image_ref = doc
            .get("imageRef")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::validation("Missing imageRef attribute"))?;
        let metadata = match doc.get("metadata") {
            Some(value) => directives::validate_metadata(value, self.config.metadata_item_limit)?,
            None => Default::default(),
        };

        let mut attrs = Attributes::new();
        attrs.insert("server_name".to_string(), json!(name));
        attrs.insert("metadata".to_string(), json!(metadata));
        let behavior = {
            let behaviors = self
                .behaviors
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            behaviors
                .get(region)
                .map(|registry| registry.behavior_for_attributes(&attrs))
                .unwrap_or(CreateServerBehavior::Default)
        };

        match behavior {
            CreateServerBehavior::Fail {
                code,
                message,
                error_type,
            } => {
                info!(server_name = name, code, "Injected server creation failure");
                Ok(ApiResponse::injected(
                    code,
                    json!({error_type: {"message": message, "code": code}}),
                ))
            }
            CreateServerBehavior::FalseNegative { code, message } => {
                self.admit_server(tenant_id, region, name, flavor_ref, image_ref, metadata)?;
                info!(
                    server_name = name,
                    code, "Server created behind a false-negative response"
                );
                Ok(ApiResponse::injected(
                    code,
                    json!({"computeFault": {"message": message, "code": code}}),
                ))
            }
            CreateServerBehavior::Default => {
                let server =
                    self.admit_server(tenant_id, region, name, flavor_ref, image_ref, metadata)?;
                let prefix = self.endpoint_prefix(tenant_id);
                Ok(ApiResponse::accepted(views::created(&server, &prefix)))
            }
        }
    }

    /// List servers, brief or detailed, with pagination and filters.
    pub fn list_servers(
        &self,
        tenant_id: &str,
        region: &str,
        params: &PageParams,
        detail: bool,
    ) -> AppResult<ApiResponse> {
        let prefix = self.endpoint_prefix(tenant_id);
        self.with_collection(tenant_id, region, |collection, _now| {
            let page = collection.page(params)?;
            let rendered: Vec<Value> = page
                .items
                .iter()
                .map(|server| {
                    if detail {
                        views::detail(server, &prefix)
                    } else {
                        views::brief(server, &prefix)
                    }
                })
                .collect();

            let mut body = json!({"servers": rendered});
            if let Some(marker) = page.next_marker {
                let path = if detail { "servers/detail" } else { "servers" };
                body["servers_links"] = views::next_link(&prefix, path, marker, params.limit);
            }
            Ok(ApiResponse::ok(body))
        })
    }

    /// Get one server's detail document.
    ///
    /// Tombstones inside the tracking window are still returned, with
    /// status `DELETED`; beyond it the server is gone.
    pub fn get_server(&self, tenant_id: &str, region: &str, id: &str) -> AppResult<ApiResponse> {
        let server_id = parse_server_id(id)?;
        let prefix = self.endpoint_prefix(tenant_id);
        self.with_collection(tenant_id, region, |collection, _now| {
            let server = collection
                .get(server_id)
                .ok_or_else(|| not_found(server_id))?;
            Ok(ApiResponse::ok(
                json!({"server": views::detail(server, &prefix)}),
            ))
        })
    }

    /// Rename a server and/or replace its metadata.
    pub fn update_server(
        &self,
        tenant_id: &str,
        region: &str,
        id: &str,
        body: &Value,
    ) -> AppResult<ApiResponse> {
        let server_id = parse_server_id(id)?;
        let doc = body
            .get("server")
            .and_then(Value::as_object)
            .ok_or_else(|| AppError::validation("Malformed request body"))?;
        let name = doc.get("name").and_then(Value::as_str).map(str::to_string);
        let metadata = match doc.get("metadata") {
            Some(value) => Some(directives::validate_metadata(
                value,
                self.config.metadata_item_limit,
            )?),
            None => None,
        };

        let prefix = self.endpoint_prefix(tenant_id);
        self.with_collection(tenant_id, region, |collection, now| {
            let server = collection
                .get_mut(server_id)
                .filter(|s| !s.is_tombstone())
                .ok_or_else(|| not_found(server_id))?;
            if let Some(name) = name {
                server.name = name;
            }
            if let Some(metadata) = metadata {
                server.metadata = metadata;
            }
            server.updated_at = now;
            Ok(ApiResponse::ok(
                json!({"server": views::detail(server, &prefix)}),
            ))
        })
    }

    /// Delete a server, honoring any `delete_server_failure` countdown.
    pub fn delete_server(&self, tenant_id: &str, region: &str, id: &str) -> AppResult<ApiResponse> {
        let server_id = parse_server_id(id)?;
        self.with_collection(tenant_id, region, |collection, now| {
            let server = collection
                .get_mut(server_id)
                .filter(|s| !s.is_tombstone())
                .ok_or_else(|| not_found(server_id))?;

            if let Some(mut directive) = directives::delete_failure(&server.metadata)?
                && directive.times > 0
            {
                directive.times -= 1;
                let code = directive.code;
                directives::store_delete_failure(&mut server.metadata, &directive);
                info!(server_id = %server_id, code, "Injected server deletion failure");
                return Ok(ApiResponse::injected(
                    code,
                    json!({"computeFault": {"message": "Server deletion failed.", "code": code}}),
                ));
            }

            server.status = ServerStatus::Deleted;
            server.pending = None;
            server.updated_at = now;
            info!(server_id = %server_id, "Server deleted");
            Ok(ApiResponse::no_content())
        })
    }

    /// Perform a `{"<action>": {...}}` call against a server.
    pub fn server_action(
        &self,
        tenant_id: &str,
        region: &str,
        id: &str,
        body: &Value,
    ) -> AppResult<ApiResponse> {
        let server_id = parse_server_id(id)?;
        let doc = body
            .as_object()
            .filter(|doc| doc.len() == 1)
            .ok_or_else(|| AppError::validation("Malformed request body"))?;
        let (action, params) = doc
            .iter()
            .next()
            .map(|(k, v)| (k.clone(), v.clone()))
            .ok_or_else(|| AppError::validation("Malformed request body"))?;

        let config = self.config.clone();
        let prefix = self.endpoint_prefix(tenant_id);
        self.with_collection(tenant_id, region, |collection, now| {
            let server = collection
                .get_mut(server_id)
                .filter(|s| !s.is_tombstone())
                .ok_or_else(|| not_found(server_id))?;
            apply_action(server, &action, &params, now, &config, &prefix)
        })
    }

    /// Run `f` against the tenant+region collection with transitions
    /// resolved and expired tombstones purged.
    fn with_collection<R>(
        &self,
        tenant_id: &str,
        region: &str,
        f: impl FnOnce(&mut RegionalServerCollection, DateTime<Utc>) -> R,
    ) -> R {
        let now = self.clock.now();
        let window = TimeDelta::seconds(self.config.deleted_tracking_window_seconds as i64);
        let mut collections = self
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let collection = collections
            .entry((tenant_id.to_string(), region.to_string()))
            .or_insert_with(|| RegionalServerCollection::new(tenant_id, region));
        collection.resolve_pending(now);
        collection.purge_tombstones(now, window);
        f(collection, now)
    }

    /// Build the resource and insert it into its collection.
    fn admit_server(
        &self,
        tenant_id: &str,
        region: &str,
        name: &str,
        flavor_ref: &str,
        image_ref: &str,
        metadata: std::collections::BTreeMap<String, String>,
    ) -> AppResult<ServerResource> {
        let build_seconds = directives::build_seconds(&metadata)?;
        let server = self.with_collection(tenant_id, region, |collection, now| {
            let status = if directives::wants_error_state(&metadata) {
                ServerStatus::Error
            } else if build_seconds.is_some() {
                ServerStatus::Build
            } else {
                ServerStatus::Active
            };

            let mut server = ServerResource {
                id: ServerId::new(),
                name: name.to_string(),
                tenant_id: tenant_id.to_string(),
                user_id: Session::user_id_for(tenant_id),
                status,
                flavor_ref: flavor_ref.to_string(),
                previous_flavor_ref: None,
                image_ref: image_ref.to_string(),
                metadata,
                addresses: views::generate_addresses(),
                admin_pass: random_password(),
                created_at: now,
                updated_at: now,
                pending: None,
            };
            if let Some(seconds) = build_seconds {
                server.schedule(ServerStatus::Active, now + seconds_delta(seconds));
            }
            collection.insert(server.clone());
            server
        });

        info!(
            server_id = %server.id,
            server_name = name,
            tenant_id,
            region,
            status = %server.status,
            "Server created"
        );
        Ok(server)
    }
}

impl std::fmt::Debug for ComputeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputeService")
            .field("config", &self.config)
            .field("url_prefix", &self.url_prefix)
            .finish()
    }
}

/// Apply one action to a server already resolved against the clock.
fn apply_action(
    server: &mut ServerResource,
    action: &str,
    params: &Value,
    now: DateTime<Utc>,
    config: &ComputeConfig,
    prefix: &str,
) -> AppResult<ApiResponse> {
    match action {
        "resize" => {
            let flavor = params
                .get("flavorRef")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    AppError::validation("Resize requests require 'flavorRef' attribute.")
                })?;
            require_status(server, ServerStatus::Active, "resize")?;
            server.previous_flavor_ref = Some(std::mem::replace(
                &mut server.flavor_ref,
                flavor.to_string(),
            ));
            server.status = ServerStatus::VerifyResize;
            server.updated_at = now;
            Ok(ApiResponse::accepted(json!({})))
        }
        "confirmResize" => {
            require_status(server, ServerStatus::VerifyResize, "confirmResize")?;
            server.previous_flavor_ref = None;
            server.status = ServerStatus::Active;
            server.updated_at = now;
            Ok(ApiResponse::no_content())
        }
        "revertResize" => {
            require_status(server, ServerStatus::VerifyResize, "revertResize")?;
            if let Some(previous) = server.previous_flavor_ref.take() {
                server.flavor_ref = previous;
            }
            server.status = ServerStatus::Active;
            server.updated_at = now;
            Ok(ApiResponse::accepted(json!({})))
        }
        "reboot" => {
            let (status, seconds) = match params.get("type").and_then(Value::as_str) {
                Some("SOFT") => (ServerStatus::Reboot, config.soft_reboot_seconds),
                Some("HARD") => (ServerStatus::HardReboot, config.hard_reboot_seconds),
                _ => {
                    return Err(AppError::validation(
                        "Argument 'type' for reboot is not HARD or SOFT",
                    ));
                }
            };
            require_status(server, ServerStatus::Active, "reboot")?;
            server.status = status;
            server.updated_at = now;
            server.schedule(ServerStatus::Active, now + seconds_delta(seconds as f64));
            Ok(ApiResponse::accepted(json!({})))
        }
        "rescue" => {
            require_status(server, ServerStatus::Active, "rescue")?;
            server.status = ServerStatus::Rescue;
            server.admin_pass = random_password();
            server.updated_at = now;
            Ok(ApiResponse::ok(json!({"adminPass": server.admin_pass})))
        }
        "unrescue" => {
            require_status(server, ServerStatus::Rescue, "unrescue")?;
            server.status = ServerStatus::Active;
            server.updated_at = now;
            Ok(ApiResponse::accepted(json!({})))
        }
        "rebuild" => {
            let image = params
                .get("imageRef")
                .and_then(Value::as_str)
                .ok_or_else(|| AppError::validation("Could not parse imageRef from request."))?;
            require_status(server, ServerStatus::Active, "rebuild")?;
            server.image_ref = image.to_string();
            server.status = ServerStatus::Rebuild;
            server.updated_at = now;
            server.schedule(
                ServerStatus::Active,
                now + seconds_delta(config.rebuild_seconds as f64),
            );
            Ok(ApiResponse::accepted(
                json!({"server": views::detail(server, prefix)}),
            ))
        }
        "changePassword" => {
            let password = params
                .get("adminPass")
                .and_then(Value::as_str)
                .ok_or_else(|| AppError::validation("No adminPass was specified"))?;
            require_status(server, ServerStatus::Active, "changePassword")?;
            server.admin_pass = password.to_string();
            server.status = ServerStatus::Password;
            server.updated_at = now;
            server.schedule(
                ServerStatus::Active,
                now + seconds_delta(config.password_seconds as f64),
            );
            Ok(ApiResponse::accepted(json!({})))
        }
        unknown => Err(AppError::validation(format!(
            "There is no such action: {unknown}"
        ))),
    }
}

/// 409 naming the offending state when an action's source state is wrong.
fn require_status(
    server: &ServerResource,
    expected: ServerStatus,
    action: &str,
) -> AppResult<()> {
    if server.status != expected {
        return Err(AppError::conflict(format!(
            "Cannot '{action}' server {} while it is in state {}",
            server.id, server.status
        )));
    }
    Ok(())
}

fn parse_server_id(id: &str) -> AppResult<ServerId> {
    ServerId::from_str(id).map_err(|_| AppError::not_found(format!("Server {id} could not be found.")))
}

fn not_found(id: ServerId) -> AppError {
    AppError::not_found(format!("Server {id} could not be found."))
}

fn seconds_delta(seconds: f64) -> TimeDelta {
    TimeDelta::milliseconds((seconds * 1000.0) as i64)
}

fn random_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}
