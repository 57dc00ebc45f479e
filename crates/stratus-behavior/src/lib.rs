//! # stratus-behavior
//!
//! A small forward-chaining rule substrate that lets a test author inject
//! non-default responses for matching requests, independent of which
//! subsystem is asking. Registrations pair a named behavior with a criteria
//! collection; lookups scan in registration order and fall back to the
//! event's default behavior when nothing matches.

pub mod criteria;
pub mod event;
pub mod registry;

pub use criteria::{Attributes, CriteriaCollection, Criterion};
pub use event::EventDescription;
pub use registry::BehaviorRegistry;
