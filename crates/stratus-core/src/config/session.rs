//! Session store configuration.

use serde::{Deserialize, Serialize};

/// Session store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Default lifetime of a freshly created session token, in virtual
    /// seconds. Impersonation calls override this per session.
    #[serde(default = "default_ttl")]
    pub default_ttl_seconds: u64,
    /// Length of generated opaque token strings.
    #[serde(default = "default_token_length")]
    pub token_length: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_ttl_seconds: default_ttl(),
            token_length: default_token_length(),
        }
    }
}

fn default_ttl() -> u64 {
    86_400
}

fn default_token_length() -> usize {
    36
}
