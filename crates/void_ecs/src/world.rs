//! World - Container for all ECS data
//!
//! The World owns the entity allocator and one sparse store per component
//! type. It is the generic Component Store the scene layer builds on: it
//! offers O(1) `has`/`get`/`add` by handle and guarantees that dead or
//! recycled handles never reach live data, but it knows nothing about
//! relationships between entities.

use crate::component::{short_type_name, Component, ComponentId, ComponentInfo, ComponentRegistry};
use crate::entity::{Entity, EntityAllocator};
use crate::error::{EcsError, Result};
use crate::storage::{ComponentStorage, SparseStorage};

/// The ECS World - container for entities and their components
pub struct World {
    /// Entity allocator
    entities: EntityAllocator,
    /// Component registry
    components: ComponentRegistry,
    /// One store per registered component, indexed by `ComponentId`
    storages: Vec<Box<dyn ComponentStorage>>,
}

impl World {
    /// Create a new empty world
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create with initial entity capacity
    pub fn with_capacity(entity_capacity: usize) -> Self {
        Self {
            entities: EntityAllocator::with_capacity(entity_capacity),
            components: ComponentRegistry::new(),
            storages: Vec::new(),
        }
    }

    // ========== Component Registration ==========

    /// Register a component type
    pub fn register_component<T: Component>(&mut self) -> ComponentId {
        let id = self.components.register::<T>();
        if id.index() == self.storages.len() {
            self.storages.push(Box::new(SparseStorage::<T>::new()));
        }
        id
    }

    /// Get component ID by type
    pub fn component_id<T: Component>(&self) -> Option<ComponentId> {
        self.components.get_id::<T>()
    }

    /// Get component ID by short type name
    pub fn component_id_by_name(&self, name: &str) -> Option<ComponentId> {
        self.components.get_id_by_name(name)
    }

    /// Get component info
    pub fn component_info(&self, id: ComponentId) -> Option<&ComponentInfo> {
        self.components.get_info(id)
    }

    fn storage<T: Component>(&self) -> Option<&SparseStorage<T>> {
        let id = self.components.get_id::<T>()?;
        self.storages[id.index()].as_any().downcast_ref::<SparseStorage<T>>()
    }

    fn storage_mut<T: Component>(&mut self) -> Option<&mut SparseStorage<T>> {
        let id = self.components.get_id::<T>()?;
        self.storages[id.index()]
            .as_any_mut()
            .downcast_mut::<SparseStorage<T>>()
    }

    // ========== Entity Management ==========

    /// Spawn a new entity (without components initially)
    pub fn spawn(&mut self) -> Entity {
        self.entities.allocate()
    }

    /// Despawn an entity, dropping all of its components
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.entities.is_alive(entity) {
            return false;
        }

        for storage in &mut self.storages {
            storage.remove_entity(entity);
        }
        self.entities.deallocate(entity)
    }

    /// Check if an entity is alive
    #[inline]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Get the number of alive entities
    pub fn entity_count(&self) -> usize {
        self.entities.alive_count()
    }

    /// Iterate alive entities in ascending index order
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter_alive()
    }

    // ========== Component Access ==========

    /// Add a component to an entity, replacing any existing value.
    ///
    /// Returns `None` if the entity is not alive.
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> Option<&mut T> {
        if !self.entities.is_alive(entity) {
            return None;
        }

        self.register_component::<T>();
        let storage = self.storage_mut::<T>()?;
        storage.insert(entity, component);
        storage.get_mut(entity)
    }

    /// Remove a component from an entity
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.storage_mut::<T>()?.remove(entity)
    }

    /// Get a component reference
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.storage::<T>()?.get(entity)
    }

    /// Get a mutable component reference
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.storage_mut::<T>()?.get_mut(entity)
    }

    /// Check if entity has a component
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.get_component::<T>(entity).is_some()
    }

    /// Get a component, distinguishing a dead handle from a missing component
    pub fn try_component<T: Component>(&self, entity: Entity) -> Result<&T> {
        if !self.entities.is_alive(entity) {
            return Err(EcsError::EntityNotAlive(entity));
        }
        self.storage::<T>()
            .and_then(|s| s.get(entity))
            .ok_or(EcsError::ComponentMissing {
                entity,
                component: short_type_name(core::any::type_name::<T>()),
            })
    }

    /// Mutable twin of [`try_component`](Self::try_component)
    pub fn try_component_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T> {
        if !self.entities.is_alive(entity) {
            return Err(EcsError::EntityNotAlive(entity));
        }
        self.storage_mut::<T>()
            .and_then(|s| s.get_mut(entity))
            .ok_or(EcsError::ComponentMissing {
                entity,
                component: short_type_name(core::any::type_name::<T>()),
            })
    }

    /// Get a component that must exist
    ///
    /// # Panics
    ///
    /// Panics if the entity is dead or lacks the component.
    pub fn component<T: Component>(&self, entity: Entity) -> &T {
        self.try_component::<T>(entity)
            .unwrap_or_else(|e| panic!("{}", e))
    }

    /// Mutable twin of [`component`](Self::component)
    ///
    /// # Panics
    ///
    /// Panics if the entity is dead or lacks the component.
    pub fn component_mut<T: Component>(&mut self, entity: Entity) -> &mut T {
        self.try_component_mut::<T>(entity)
            .unwrap_or_else(|e| panic!("{}", e))
    }

    /// Iterate every `(entity, component)` pair of one type, in storage order
    pub fn iter_component<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.storage::<T>().into_iter().flat_map(|s| s.iter())
    }

    // ========== Maintenance ==========

    /// Clear all entities and components.
    ///
    /// Every handle issued before the call becomes stale.
    pub fn clear(&mut self) {
        for storage in &mut self.storages {
            storage.clear();
        }
        self.entities.clear();
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Velocity {
        x: f32,
        y: f32,
    }

    #[test]
    fn test_world_spawn_despawn() {
        let mut world = World::new();

        let e1 = world.spawn();
        let e2 = world.spawn();

        assert!(world.is_alive(e1));
        assert!(world.is_alive(e2));
        assert_eq!(world.entity_count(), 2);

        world.despawn(e1);
        assert!(!world.is_alive(e1));
        assert!(world.is_alive(e2));
        assert_eq!(world.entity_count(), 1);
        assert!(!world.despawn(e1));
    }

    #[test]
    fn test_world_components() {
        let mut world = World::new();

        let entity = world.spawn();
        world.add_component(entity, Position { x: 1.0, y: 2.0 });
        world.add_component(entity, Velocity { x: 0.5, y: -0.5 });

        assert!(world.has_component::<Position>(entity));
        assert!(world.has_component::<Velocity>(entity));

        let pos = world.get_component::<Position>(entity).unwrap();
        assert_eq!(pos.x, 1.0);
        assert_eq!(pos.y, 2.0);

        // Modify component
        if let Some(vel) = world.get_component_mut::<Velocity>(entity) {
            vel.x = 1.0;
        }

        assert_eq!(world.component::<Velocity>(entity).x, 1.0);
    }

    #[test]
    fn test_add_returns_stored_value() {
        let mut world = World::new();
        let entity = world.spawn();

        let pos = world.add_component(entity, Position { x: 3.0, y: 4.0 }).unwrap();
        pos.y = 5.0;

        assert_eq!(world.component::<Position>(entity).y, 5.0);
        // Replacing keeps a single value
        world.add_component(entity, Position { x: 0.0, y: 0.0 });
        assert_eq!(world.iter_component::<Position>().count(), 1);
    }

    #[test]
    fn test_world_remove_component() {
        let mut world = World::new();

        let entity = world.spawn();
        world.add_component(entity, Position { x: 1.0, y: 2.0 });
        world.add_component(entity, Velocity { x: 0.5, y: -0.5 });

        let removed = world.remove_component::<Position>(entity);
        assert_eq!(removed, Some(Position { x: 1.0, y: 2.0 }));
        assert!(!world.has_component::<Position>(entity));
        assert!(world.has_component::<Velocity>(entity));
    }

    #[test]
    fn test_dead_handle_is_a_miss() {
        let mut world = World::new();
        let old = world.spawn();
        world.add_component(old, Position { x: 1.0, y: 1.0 });
        world.despawn(old);

        let new = world.spawn();
        assert_eq!(new.index(), old.index());

        assert!(world.add_component(old, Position { x: 9.0, y: 9.0 }).is_none());
        assert!(world.get_component::<Position>(old).is_none());
        assert!(!world.has_component::<Position>(new));
        assert_eq!(world.try_component::<Position>(old), Err(EcsError::EntityNotAlive(old)));
    }

    #[test]
    fn test_try_component_missing() {
        let mut world = World::new();
        let entity = world.spawn();

        let err = world.try_component::<Velocity>(entity).unwrap_err();
        assert_eq!(
            err,
            EcsError::ComponentMissing { entity, component: "Velocity" }
        );
    }

    #[test]
    #[should_panic(expected = "has no Velocity component")]
    fn test_component_panics_when_missing() {
        let mut world = World::new();
        let entity = world.spawn();
        world.component::<Velocity>(entity);
    }

    #[test]
    fn test_clear() {
        let mut world = World::new();
        let a = world.spawn();
        let b = world.spawn();
        world.add_component(a, Position { x: 0.0, y: 0.0 });

        world.clear();

        assert_eq!(world.entity_count(), 0);
        assert!(!world.is_alive(a));
        assert!(!world.is_alive(b));
        assert_eq!(world.iter_component::<Position>().count(), 0);
    }
}
