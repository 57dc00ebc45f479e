//! Metadata validation and the creation/deletion directives encoded in it.
//!
//! Test authors steer the default creation behavior through magic metadata
//! keys: `server_building` holds a build duration in seconds,
//! `server_error` forces the `ERROR` state, and `delete_server_failure`
//! carries a JSON countdown of deletes that must fail before one succeeds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use stratus_core::{AppError, AppResult};

/// Metadata key directing the initial state into `BUILD` for N seconds.
pub const SERVER_BUILDING: &str = "server_building";
/// Metadata key directing the initial state into `ERROR`.
pub const SERVER_ERROR: &str = "server_error";
/// Metadata key carrying a delete-failure countdown.
pub const DELETE_SERVER_FAILURE: &str = "delete_server_failure";

/// Parsed `delete_server_failure` directive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteFailure {
    /// How many more deletes must fail.
    pub times: u32,
    /// Status code those deletes fail with.
    pub code: u16,
}

/// Validate a metadata document against the simulator's constraints.
///
/// Metadata must be a JSON object of string values with at most
/// `item_limit` entries; violations reproduce the upstream error shapes
/// (400 for malformed input, 403 for the quota ceiling).
pub fn validate_metadata(value: &Value, item_limit: usize) -> AppResult<BTreeMap<String, String>> {
    let object = value
        .as_object()
        .ok_or_else(|| AppError::validation("Malformed request body. metadata must be an object"))?;

    if object.len() > item_limit {
        return Err(AppError::forbidden(format!(
            "Quota exceeded for metadata_items: Request was made with {} metadata items \
             when only {item_limit} are allowed.",
            object.len(),
        )));
    }

    let mut metadata = BTreeMap::new();
    for (key, value) in object {
        let value = value.as_str().ok_or_else(|| {
            AppError::validation("Invalid metadata: The input is not a string or unicode")
        })?;
        metadata.insert(key.clone(), value.to_string());
    }
    Ok(metadata)
}

/// The build duration requested by `server_building`, if present.
pub fn build_seconds(metadata: &BTreeMap<String, String>) -> AppResult<Option<f64>> {
    match metadata.get(SERVER_BUILDING) {
        None => Ok(None),
        Some(raw) => {
            let seconds: f64 = raw.parse().map_err(|_| {
                AppError::validation(format!("Invalid {SERVER_BUILDING} value: {raw}"))
            })?;
            Ok(Some(seconds))
        }
    }
}

/// Whether `server_error` requests an `ERROR` initial state.
pub fn wants_error_state(metadata: &BTreeMap<String, String>) -> bool {
    metadata.contains_key(SERVER_ERROR)
}

/// The `delete_server_failure` countdown, if present and well-formed.
pub fn delete_failure(metadata: &BTreeMap<String, String>) -> AppResult<Option<DeleteFailure>> {
    match metadata.get(DELETE_SERVER_FAILURE) {
        None => Ok(None),
        Some(raw) => {
            let directive: DeleteFailure = serde_json::from_str(raw).map_err(|_| {
                AppError::validation(format!("Invalid {DELETE_SERVER_FAILURE} value: {raw}"))
            })?;
            Ok(Some(directive))
        }
    }
}

/// Store the decremented countdown back into the metadata, removing the
/// directive entirely once it reaches zero.
pub fn store_delete_failure(metadata: &mut BTreeMap<String, String>, directive: &DeleteFailure) {
    if directive.times == 0 {
        metadata.remove(DELETE_SERVER_FAILURE);
    } else if let Ok(raw) = serde_json::to_string(directive) {
        metadata.insert(DELETE_SERVER_FAILURE.to_string(), raw);
    }
}
