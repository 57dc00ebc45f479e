//! Criteria: named attribute predicates matched against request attributes.

use regex::Regex;
use serde_json::{Map, Value};

use stratus_core::{AppError, AppResult};

/// Runtime attributes of one request, as seen by the behavior engine.
///
/// Different call sites pass different attribute shapes; string attributes
/// are matched by regex criteria, object attributes by subset criteria.
pub type Attributes = Map<String, Value>;

/// A named attribute plus a predicate. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct Criterion {
    /// Attribute this criterion inspects.
    attribute: String,
    matcher: Matcher,
}

#[derive(Debug, Clone)]
enum Matcher {
    /// The entire string attribute must match the pattern.
    Regex(Regex),
    /// The object attribute must contain every key/value pair.
    Subset(Map<String, Value>),
}

impl Criterion {
    /// Create a regex criterion on `attribute`.
    ///
    /// The pattern is anchored: the whole attribute value must match.
    pub fn regex(attribute: impl Into<String>, pattern: &str) -> AppResult<Self> {
        let anchored = format!("^(?:{pattern})$");
        let regex = Regex::new(&anchored)
            .map_err(|e| AppError::behavior(format!("invalid criterion pattern: {e}")))?;
        Ok(Self {
            attribute: attribute.into(),
            matcher: Matcher::Regex(regex),
        })
    }

    /// Create a subset criterion on `attribute`: the attribute must be an
    /// object containing every key/value pair of `expected`.
    pub fn subset(attribute: impl Into<String>, expected: Map<String, Value>) -> Self {
        Self {
            attribute: attribute.into(),
            matcher: Matcher::Subset(expected),
        }
    }

    /// The attribute this criterion inspects.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Whether the criterion matches the given attributes.
    ///
    /// A missing attribute never matches.
    pub fn matches(&self, attrs: &Attributes) -> bool {
        let Some(value) = attrs.get(&self.attribute) else {
            return false;
        };
        match &self.matcher {
            Matcher::Regex(regex) => value.as_str().is_some_and(|s| regex.is_match(s)),
            Matcher::Subset(expected) => value.as_object().is_some_and(|actual| {
                expected
                    .iter()
                    .all(|(key, want)| actual.get(key) == Some(want))
            }),
        }
    }
}

/// An immutable conjunction of criteria: matches only if every member does.
#[derive(Debug, Clone, Default)]
pub struct CriteriaCollection {
    criteria: Vec<Criterion>,
}

impl CriteriaCollection {
    /// Create a collection from its members.
    pub fn new(criteria: Vec<Criterion>) -> Self {
        Self { criteria }
    }

    /// Whether every member matches the given attributes.
    ///
    /// Matching is a pure function with no side effects; an empty
    /// collection matches everything.
    pub fn matches(&self, attrs: &Attributes) -> bool {
        self.criteria.iter().all(|c| c.matches(attrs))
    }
}
