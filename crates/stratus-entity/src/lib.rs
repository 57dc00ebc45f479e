//! # stratus-entity
//!
//! Domain entity models for the Stratus simulator. Every struct in this
//! crate represents a piece of simulated provider state. All entities derive
//! `Debug`, `Clone`, `Serialize`, and `Deserialize`; none of them touch the
//! wall clock, since timestamps are always injected virtual time.

pub mod id;
pub mod server;
pub mod session;

pub use id::{ServerId, SessionId};
