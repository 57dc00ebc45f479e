//! Plugin registry storing registered plugin instances.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use stratus_core::traits::CloudPlugin;
use stratus_core::{AppError, AppResult};

/// Registry of all provider plugins.
///
/// Plugins are registered explicitly at startup; there is no runtime
/// discovery. Registration order is preserved for catalog assembly.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn CloudPlugin>>,
    by_service_id: HashMap<String, usize>,
}

impl PluginRegistry {
    /// Creates a new empty plugin registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin. Duplicate service ids are rejected.
    pub fn register(&mut self, plugin: Arc<dyn CloudPlugin>) -> AppResult<()> {
        let service_id = plugin.service_id().to_string();
        if self.by_service_id.contains_key(&service_id) {
            return Err(AppError::conflict(format!(
                "plugin with service id '{service_id}' is already registered"
            )));
        }

        info!(
            service_id = %service_id,
            service_name = plugin.service_name(),
            service_type = plugin.service_type(),
            "Registering plugin"
        );
        self.by_service_id.insert(service_id, self.plugins.len());
        self.plugins.push(plugin);
        Ok(())
    }

    /// Gets a plugin by service id.
    pub fn get(&self, service_id: &str) -> Option<&Arc<dyn CloudPlugin>> {
        self.by_service_id
            .get(service_id)
            .and_then(|&index| self.plugins.get(index))
    }

    /// Iterates plugins in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn CloudPlugin>> {
        self.plugins.iter()
    }

    /// Number of registered plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether no plugin has been registered.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("services", &self.by_service_id.keys().collect::<Vec<_>>())
            .finish()
    }
}
