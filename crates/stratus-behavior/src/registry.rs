//! Ordered behavior registration lists with first-match-wins lookup.

use serde_json::Value;
use uuid::Uuid;

use stratus_core::{AppError, AppResult};

use crate::criteria::{Attributes, CriteriaCollection};
use crate::event::EventDescription;

/// One registered `(behavior, criteria, id)` tuple.
#[derive(Debug)]
struct BehaviorRegistration<B> {
    behavior: B,
    criteria: CriteriaCollection,
    id: Uuid,
}

/// The ordered registration list for one event.
///
/// Insertion order is match-priority order; unregistering an entry lets
/// lookups fall through to the next-oldest matching registration or to the
/// event's default behavior.
#[derive(Debug)]
pub struct BehaviorRegistry<B> {
    event: EventDescription<B>,
    registrations: Vec<BehaviorRegistration<B>>,
}

impl<B: Clone> BehaviorRegistry<B> {
    /// Create an empty registry for the given event.
    pub fn new(event: EventDescription<B>) -> Self {
        Self {
            event,
            registrations: Vec::new(),
        }
    }

    /// The event this registry serves.
    pub fn event(&self) -> &EventDescription<B> {
        &self.event
    }

    /// Register a behavior from the JSON registration surface:
    /// `{"name": ..., "parameters": ..., "criteria": [{name: value}, ...]}`.
    ///
    /// Returns the generated registration id used for later removal.
    pub fn register_from_spec(&mut self, spec: &Value) -> AppResult<Uuid> {
        let name = spec
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::behavior("behavior registration requires a 'name'"))?;
        let default_params = Value::Object(serde_json::Map::new());
        let parameters = spec.get("parameters").unwrap_or(&default_params);
        let criteria_spec: &[Value] = match spec.get("criteria") {
            None => &[],
            Some(value) => value.as_array().ok_or_else(|| {
                AppError::behavior("behavior registration 'criteria' must be a list")
            })?,
        };

        let behavior = self.event.create_behavior(name, parameters)?;
        let criteria = self.event.create_criteria(criteria_spec)?;
        let id = Uuid::new_v4();

        tracing::info!(
            event = self.event.name(),
            behavior = name,
            registration_id = %id,
            "Behavior registered"
        );

        self.registrations.push(BehaviorRegistration {
            behavior,
            criteria,
            id,
        });
        Ok(id)
    }

    /// Register a behavior directly, bypassing the JSON surface.
    pub fn register(&mut self, behavior: B, criteria: CriteriaCollection) -> Uuid {
        let id = Uuid::new_v4();
        self.registrations.push(BehaviorRegistration {
            behavior,
            criteria,
            id,
        });
        id
    }

    /// Return the first registered behavior whose criteria all match, or
    /// the event's default behavior. Pure: no side effects, no mutation.
    pub fn behavior_for_attributes(&self, attrs: &Attributes) -> B {
        self.registrations
            .iter()
            .find(|r| r.criteria.matches(attrs))
            .map(|r| r.behavior.clone())
            .unwrap_or_else(|| self.event.default_behavior())
    }

    /// Remove a registration by id. Unknown ids are a not-found error.
    pub fn unregister(&mut self, id: Uuid) -> AppResult<()> {
        let position = self
            .registrations
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| {
                AppError::not_found(format!("behavior registration {id} does not exist"))
            })?;
        self.registrations.remove(position);
        tracing::info!(
            event = self.event.name(),
            registration_id = %id,
            "Behavior unregistered"
        );
        Ok(())
    }
}
