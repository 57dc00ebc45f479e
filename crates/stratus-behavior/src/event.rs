//! Event descriptions: the per-event vocabulary of behaviors and criteria.

use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Value};

use stratus_core::{AppError, AppResult};

use crate::criteria::{CriteriaCollection, Criterion};

type BehaviorCtor<B> = Box<dyn Fn(&Value) -> AppResult<B> + Send + Sync>;
type CriterionCtor = Box<dyn Fn(&Value) -> AppResult<Criterion> + Send + Sync>;

/// Declares, for one category of request, the set of named behavior
/// constructors, the set of named criterion constructors, and one default
/// behavior. Built once at startup; read-only afterward.
///
/// The type parameter `B` is the event's behavior type, so only behaviors
/// and criteria declared for this event are legal in its registration JSON
/// while each call site keeps a statically typed behavior value.
pub struct EventDescription<B> {
    name: &'static str,
    behaviors: HashMap<&'static str, BehaviorCtor<B>>,
    criteria: HashMap<&'static str, CriterionCtor>,
    default: B,
}

impl<B> fmt::Debug for EventDescription<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDescription")
            .field("name", &self.name)
            .field("behaviors", &self.behaviors.keys().collect::<Vec<_>>())
            .field("criteria", &self.criteria.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<B: Clone> EventDescription<B> {
    /// Create an event description with its default behavior.
    pub fn new(name: &'static str, default: B) -> Self {
        Self {
            name,
            behaviors: HashMap::new(),
            criteria: HashMap::new(),
            default,
        }
    }

    /// The event's name, as addressed by the registration surface.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The event's default behavior.
    pub fn default_behavior(&self) -> B {
        self.default.clone()
    }

    /// Declare a named behavior constructor.
    pub fn with_behavior(
        mut self,
        name: &'static str,
        ctor: impl Fn(&Value) -> AppResult<B> + Send + Sync + 'static,
    ) -> Self {
        self.behaviors.insert(name, Box::new(ctor));
        self
    }

    /// Declare a named criterion constructor.
    pub fn with_criterion(
        mut self,
        name: &'static str,
        ctor: impl Fn(&Value) -> AppResult<Criterion> + Send + Sync + 'static,
    ) -> Self {
        self.criteria.insert(name, Box::new(ctor));
        self
    }

    /// Declare a regex criterion matching the attribute of the same name.
    pub fn with_regex_criterion(self, name: &'static str) -> Self {
        self.with_criterion(name, move |value| {
            let pattern = value.as_str().ok_or_else(|| {
                AppError::behavior(format!("criterion '{name}' takes a string pattern"))
            })?;
            Criterion::regex(name, pattern)
        })
    }

    /// Declare a subset criterion matching the object attribute of the same
    /// name.
    pub fn with_subset_criterion(self, name: &'static str) -> Self {
        self.with_criterion(name, move |value| {
            let expected = value.as_object().ok_or_else(|| {
                AppError::behavior(format!("criterion '{name}' takes an object"))
            })?;
            Ok(Criterion::subset(name, expected.clone()))
        })
    }

    /// Construct the named behavior from registration parameters.
    pub fn create_behavior(&self, name: &str, parameters: &Value) -> AppResult<B> {
        let ctor = self.behaviors.get(name).ok_or_else(|| {
            AppError::behavior(format!(
                "event '{}' has no behavior named '{name}'",
                self.name
            ))
        })?;
        ctor(parameters)
    }

    /// Build a criteria collection from the registration's criteria list.
    ///
    /// Each list element is an object of `criterion name → value` pairs.
    pub fn create_criteria(&self, spec: &[Value]) -> AppResult<CriteriaCollection> {
        let mut criteria = Vec::new();
        for element in spec {
            let object: &Map<String, Value> = element.as_object().ok_or_else(|| {
                AppError::behavior("criteria list elements must be objects".to_string())
            })?;
            for (name, value) in object {
                let ctor = self.criteria.get(name.as_str()).ok_or_else(|| {
                    AppError::behavior(format!(
                        "event '{}' has no criterion named '{name}'",
                        self.name
                    ))
                })?;
                criteria.push(ctor(value)?);
            }
        }
        Ok(CriteriaCollection::new(criteria))
    }
}
