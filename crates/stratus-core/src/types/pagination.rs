//! Pagination parameters for list endpoints.
//!
//! Cursor-style pagination: the `marker` is the id of the last resource the
//! caller has seen, `limit` caps the page size, and `name`/`changes-since`
//! filter the collection before the page is cut.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::result::AppResult;

/// Parsed pagination and filter query parameters.
#[derive(Debug, Clone, Default)]
pub struct PageParams {
    /// Id of the last resource on the previous page.
    pub marker: Option<String>,
    /// Maximum number of items to return. `None` means unlimited.
    pub limit: Option<usize>,
    /// Substring filter on resource names.
    pub name: Option<String>,
    /// Only include resources updated at or after this virtual instant.
    pub changes_since: Option<DateTime<Utc>>,
}

impl PageParams {
    /// Parse pagination parameters out of a query map.
    ///
    /// Violations are validation errors: a non-integer or negative `limit`,
    /// or an unparseable `changes-since` timestamp.
    pub fn from_query(query: &HashMap<String, String>) -> AppResult<Self> {
        let marker = query.get("marker").cloned();
        let name = query.get("name").cloned();

        let limit = match query.get("limit") {
            None => None,
            Some(raw) => {
                let value: i64 = raw
                    .parse()
                    .map_err(|_| AppError::validation("limit param must be an integer"))?;
                if value < 0 {
                    return Err(AppError::validation("limit param must be positive"));
                }
                Some(value as usize)
            }
        };

        let changes_since = match query.get("changes-since") {
            None => None,
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(raw)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|_| AppError::validation("Invalid changes-since value"))?,
            ),
        };

        Ok(Self {
            marker,
            limit,
            name,
            changes_since,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_query_is_unbounded() {
        let params = PageParams::from_query(&query(&[])).expect("parse");
        assert!(params.marker.is_none());
        assert!(params.limit.is_none());
    }

    #[test]
    fn test_limit_zero_is_allowed() {
        let params = PageParams::from_query(&query(&[("limit", "0")])).expect("parse");
        assert_eq!(params.limit, Some(0));
    }

    #[test]
    fn test_limit_must_be_integer() {
        let err = PageParams::from_query(&query(&[("limit", "two")])).unwrap_err();
        assert_eq!(err.message, "limit param must be an integer");
    }

    #[test]
    fn test_limit_must_be_positive() {
        let err = PageParams::from_query(&query(&[("limit", "-3")])).unwrap_err();
        assert_eq!(err.message, "limit param must be positive");
    }

    #[test]
    fn test_changes_since_parses_rfc3339() {
        let params = PageParams::from_query(&query(&[("changes-since", "2024-01-01T00:05:00Z")]))
            .expect("parse");
        let expected = DateTime::parse_from_rfc3339("2024-01-01T00:05:00Z")
            .expect("valid")
            .with_timezone(&Utc);
        assert_eq!(params.changes_since, Some(expected));
    }

    #[test]
    fn test_changes_since_rejects_garbage() {
        assert!(PageParams::from_query(&query(&[("changes-since", "five minutes ago")])).is_err());
    }
}
