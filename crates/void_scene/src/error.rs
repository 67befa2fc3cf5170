//! Scene error types

use thiserror::Error;

use void_core::Uuid;
use void_ecs::{EcsError, Entity};

use crate::config::ConfigError;

/// Structural hierarchy errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    /// Reparenting would make an entity its own ancestor
    #[error("Cycle detected in hierarchy: {entities:?}")]
    CycleDetected {
        /// Entities forming the cycle
        entities: Vec<Entity>,
    },

    /// Handle is stale or null
    #[error("Entity not found: {entity:?}")]
    EntityNotFound {
        /// The missing entity
        entity: Entity,
    },

    /// Entity does not carry an IdComponent
    #[error("Entity {entity:?} has no identity")]
    MissingIdentity {
        /// The entity lacking an IdComponent
        entity: Entity,
    },

    /// Entity does not carry a RelationshipComponent
    #[error("Entity {entity:?} has no RelationshipComponent")]
    MissingRelationship {
        /// The entity lacking a RelationshipComponent
        entity: Entity,
    },

    /// Parent view belongs to another scene
    #[error("Cannot parent {child:?} to {parent:?} from a different scene")]
    CrossScene {
        /// Entity being reparented
        child: Entity,
        /// Requested parent
        parent: Entity,
    },

    /// Reparenting would push the hierarchy past the configured limit
    #[error("Hierarchy depth {depth} exceeds limit {limit}")]
    DepthExceeded {
        /// Depth the deepest descendant would reach
        depth: u32,
        /// Configured maximum
        limit: u32,
    },

    /// Child names a parent that does not list it
    #[error("{child} names parent {parent}, which does not list it")]
    ChildNotListed {
        /// Child UUID
        child: Uuid,
        /// Parent UUID
        parent: Uuid,
    },

    /// Parent lists a child whose parent link points elsewhere
    #[error("{parent} lists {child}, whose parent is {actual}")]
    StrayChild {
        /// Parent UUID
        parent: Uuid,
        /// Listed child UUID
        child: Uuid,
        /// The child's actual parent UUID
        actual: Uuid,
    },

    /// A children list holds the same UUID more than once
    #[error("{parent} lists {child} more than once")]
    DuplicateChild {
        /// Parent UUID
        parent: Uuid,
        /// Repeated child UUID
        child: Uuid,
    },

    /// Relationship refers to a UUID that no live entity carries
    #[error("{entity} refers to unknown entity {missing}")]
    DanglingReference {
        /// Entity holding the link
        entity: Uuid,
        /// Unresolvable UUID
        missing: Uuid,
    },
}

/// Scene errors
#[derive(Debug, Error)]
pub enum SceneError {
    /// Hierarchy error
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    /// Component store error
    #[error(transparent)]
    Ecs(#[from] EcsError),

    /// Core error
    #[error(transparent)]
    Core(#[from] void_core::Error),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Entity lacks a component a scene accessor requires
    #[error("Entity {entity:?} has no {component}")]
    MissingComponent {
        /// Entity that was queried
        entity: Entity,
        /// Component name
        component: &'static str,
    },

    /// The nil UUID cannot identify an entity
    #[error("The nil UUID is reserved for \"no parent\"")]
    NilUuid,

    /// UUID already resolves to a live entity
    #[error("UUID {0} is already in use")]
    DuplicateUuid(Uuid),
}

/// Result type for scene operations
pub type Result<T> = std::result::Result<T, SceneError>;
