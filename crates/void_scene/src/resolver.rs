//! Identity Resolver
//!
//! Maps persistent [`Uuid`]s to live [`Entity`] handles. The table is owned
//! by the scene and only changes together with an entity's IdComponent:
//! on spawn, on despawn, and through `EntityView::set_uuid` /
//! `remove_component::<IdComponent>()`. The scene also checks every hit
//! against the entity's IdComponent, so a stale entry resolves to nothing.

use std::collections::HashMap;

use void_core::Uuid;
use void_ecs::Entity;

/// UUID -> handle table
#[derive(Debug, Default, Clone)]
pub struct IdentityResolver {
    map: HashMap<Uuid, Entity>,
}

impl IdentityResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
        }
    }

    /// Map `uuid` to `entity`, returning the previous mapping.
    /// The nil UUID is never stored.
    pub fn insert(&mut self, uuid: Uuid, entity: Entity) -> Option<Entity> {
        if uuid.is_nil() {
            return None;
        }
        self.map.insert(uuid, entity)
    }

    /// Remove a mapping
    pub fn remove(&mut self, uuid: Uuid) -> Option<Entity> {
        self.map.remove(&uuid)
    }

    /// Look up a handle (may be stale; callers check liveness)
    pub fn get(&self, uuid: Uuid) -> Option<Entity> {
        if uuid.is_nil() {
            return None;
        }
        self.map.get(&uuid).copied()
    }

    /// Check if `uuid` is mapped
    pub fn contains(&self, uuid: Uuid) -> bool {
        self.get(uuid).is_some()
    }

    /// Number of mapped UUIDs
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Drop every mapping
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Iterate mappings in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (Uuid, Entity)> + '_ {
        self.map.iter().map(|(&uuid, &entity)| (uuid, entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let mut resolver = IdentityResolver::new();
        let uuid = Uuid::new();
        let entity = Entity::new(3, 1);

        assert_eq!(resolver.insert(uuid, entity), None);
        assert_eq!(resolver.get(uuid), Some(entity));
        assert!(resolver.contains(uuid));
        assert_eq!(resolver.remove(uuid), Some(entity));
        assert!(resolver.is_empty());
    }

    #[test]
    fn test_nil_never_resolves() {
        let mut resolver = IdentityResolver::new();
        assert_eq!(resolver.insert(Uuid::NIL, Entity::new(0, 0)), None);
        assert_eq!(resolver.get(Uuid::NIL), None);
        assert_eq!(resolver.len(), 0);
    }

    #[test]
    fn test_clear() {
        let mut resolver = IdentityResolver::with_capacity(4);
        resolver.insert(Uuid::new(), Entity::new(0, 0));
        resolver.insert(Uuid::new(), Entity::new(1, 0));
        assert_eq!(resolver.iter().count(), 2);

        resolver.clear();
        assert!(resolver.is_empty());
    }
}
