//! Virtual server entities.

pub mod model;
pub mod status;

pub use model::ServerResource;
pub use status::{PendingTransition, ServerStatus};
