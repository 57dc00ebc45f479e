//! Service catalog configuration.

use serde::{Deserialize, Serialize};

/// Service catalog configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Regions advertised in every plugin's catalog endpoints.
    #[serde(default = "default_regions")]
    pub regions: Vec<String>,
    /// URL prefix placeholder substituted by the embedding transport layer
    /// with the actual base URL of the running instance.
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            regions: default_regions(),
            url_prefix: default_url_prefix(),
        }
    }
}

fn default_regions() -> Vec<String> {
    vec!["ORD".to_string(), "DFW".to_string(), "IAD".to_string()]
}

fn default_url_prefix() -> String {
    "{base}".to_string()
}
