//! Injectable behaviors for the server-creation event.

use serde_json::Value;

use stratus_behavior::EventDescription;

/// What a create-server call should do for a matched request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateServerBehavior {
    /// Create normally, honoring metadata directives.
    Default,
    /// Respond with the configured failure; the server is never created.
    Fail {
        /// Status code of the injected failure.
        code: u16,
        /// Message placed in the failure body.
        message: String,
        /// Label wrapping the failure body, e.g. `"computeFault"`.
        error_type: String,
    },
    /// Respond with a failure but create the server anyway, to model an
    /// infrastructure that lies about its own outcomes.
    FalseNegative {
        /// Status code of the reported (false) failure.
        code: u16,
        /// Message placed in the failure body.
        message: String,
    },
}

/// The server-creation event: its named behaviors and criteria.
///
/// Criteria match the attributes of the create call: `server_name` by regex
/// and `metadata` by object subset.
pub fn server_creation_event() -> EventDescription<CreateServerBehavior> {
    EventDescription::new("server-creation", CreateServerBehavior::Default)
        .with_behavior("fail", |params: &Value| {
            Ok(CreateServerBehavior::Fail {
                code: params.get("code").and_then(Value::as_u64).unwrap_or(500) as u16,
                message: params
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Server creation failed.")
                    .to_string(),
                error_type: params
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("computeFault")
                    .to_string(),
            })
        })
        .with_behavior("false_negative", |params: &Value| {
            Ok(CreateServerBehavior::FalseNegative {
                code: params.get("code").and_then(Value::as_u64).unwrap_or(500) as u16,
                message: params
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Server creation failed.")
                    .to_string(),
            })
        })
        .with_regex_criterion("server_name")
        .with_subset_criterion("metadata")
}
