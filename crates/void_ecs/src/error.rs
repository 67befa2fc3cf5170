//! Error types for the ECS

use thiserror::Error;

use crate::entity::Entity;

/// ECS access errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcsError {
    /// Handle is null, stale, or was never allocated by this world
    #[error("Entity {0:?} is not alive")]
    EntityNotAlive(Entity),

    /// Entity is alive but does not carry the requested component
    #[error("Entity {entity:?} has no {component} component")]
    ComponentMissing {
        /// Entity that was queried
        entity: Entity,
        /// Short type name of the missing component
        component: &'static str,
    },
}

/// Result type for ECS operations
pub type Result<T> = core::result::Result<T, EcsError>;
