//! Resource slots and the staging area shared with loader workers.

mod resource;
mod staging;

pub use resource::{LoadStats, PendingResource, PublishOutcome, ResourceState};
pub use staging::Staging;
