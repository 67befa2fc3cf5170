//! # void_ecs - Sparse-set Entity Component System
//!
//! The generic component store underneath the scene graph:
//! - Generational entity IDs for use-after-free safety
//! - One sparse set per component type for O(1) `has`/`get`/`add`
//! - Type-erased storage registry keyed by [`ComponentId`]
//!
//! The store offers no referential integrity between entities; anything
//! relational is layered on top by `void_scene`.
//!
//! ## Example
//!
//! ```ignore
//! use void_ecs::prelude::*;
//!
//! #[derive(Clone, Copy)]
//! struct Position { x: f32, y: f32 }
//!
//! let mut world = World::new();
//! let entity = world.spawn();
//! world.add_component(entity, Position { x: 0.0, y: 0.0 });
//!
//! if let Some(pos) = world.get_component_mut::<Position>(entity) {
//!     pos.x += 1.0;
//! }
//! ```

pub mod component;
pub mod entity;
pub mod error;
pub mod storage;
pub mod world;

pub use component::{Component, ComponentId, ComponentInfo, ComponentRegistry};
pub use entity::{Entity, EntityAllocator};
pub use error::EcsError;
pub use storage::{ComponentStorage, SparseStorage};
pub use world::World;

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::component::{Component, ComponentId, ComponentInfo, ComponentRegistry};
    pub use crate::entity::{Entity, EntityAllocator};
    pub use crate::error::EcsError;
    pub use crate::world::World;
    pub use crate::{EntityBuilder, WorldExt};
}

/// Entity builder for ergonomic entity creation
pub struct EntityBuilder<'w> {
    world: &'w mut World,
    entity: Entity,
}

impl<'w> EntityBuilder<'w> {
    /// Create a new entity builder
    pub fn new(world: &'w mut World) -> Self {
        let entity = world.spawn();
        Self { world, entity }
    }

    /// Add a component to the entity
    pub fn with<T: Component>(self, component: T) -> Self {
        self.world.add_component(self.entity, component);
        self
    }

    /// Get the entity ID
    pub fn id(&self) -> Entity {
        self.entity
    }

    /// Finish building and return the entity
    pub fn build(self) -> Entity {
        self.entity
    }
}

/// Extension trait for World to provide builder pattern
pub trait WorldExt {
    /// Start building a new entity
    fn build_entity(&mut self) -> EntityBuilder<'_>;
}

impl WorldExt for World {
    fn build_entity(&mut self) -> EntityBuilder<'_> {
        EntityBuilder::new(self)
    }
}
