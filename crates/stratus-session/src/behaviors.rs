//! Injectable behaviors for the authentication event.

use serde_json::Value;

use stratus_behavior::EventDescription;

/// What an authentication call should do for a matched request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthBehavior {
    /// Authenticate normally through the session store.
    Default,
    /// Fail with the configured status and message; no session is touched.
    Fail {
        /// Status code of the injected failure.
        code: u16,
        /// Message placed in the failure body.
        message: String,
    },
}

/// The authentication event: its named behaviors and criteria.
///
/// Criteria match the attributes an authentication call exposes: `username`,
/// `tenant_id`, and `token`, all by regex.
pub fn authentication_event() -> EventDescription<AuthBehavior> {
    EventDescription::new("authentication", AuthBehavior::Default)
        .with_behavior("fail", |params: &Value| {
            let code = params.get("code").and_then(Value::as_u64).unwrap_or(401) as u16;
            let message = params
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Authentication failed.")
                .to_string();
            Ok(AuthBehavior::Fail { code, message })
        })
        .with_regex_criterion("username")
        .with_regex_criterion("tenant_id")
        .with_regex_criterion("token")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_fail_behavior_defaults() {
        let behavior = authentication_event()
            .create_behavior("fail", &json!({}))
            .expect("known behavior");
        assert_eq!(
            behavior,
            AuthBehavior::Fail {
                code: 401,
                message: "Authentication failed.".to_string()
            }
        );
    }

    #[test]
    fn test_fail_behavior_parameters() {
        let behavior = authentication_event()
            .create_behavior("fail", &json!({"code": 500, "message": "boom"}))
            .expect("known behavior");
        assert_eq!(
            behavior,
            AuthBehavior::Fail {
                code: 500,
                message: "boom".to_string()
            }
        );
    }
}
