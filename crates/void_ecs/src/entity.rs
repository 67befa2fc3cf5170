//! Entity - Scene-local runtime handles
//!
//! Entities are lightweight identifiers with generational indices
//! to detect use-after-free. A handle is only meaningful inside the
//! [`World`](crate::World) that allocated it.

use core::fmt;
use core::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Entity identifier with generation for ABA protection
#[derive(Clone, Copy, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "u64", into = "u64")]
pub struct Entity {
    /// Index into entity storage
    index: u32,
    /// Generation to detect stale references
    generation: u32,
}

impl Entity {
    /// Create a new entity
    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Create an invalid/null entity
    #[inline]
    pub const fn null() -> Self {
        Self {
            index: u32::MAX,
            generation: u32::MAX,
        }
    }

    /// Get the entity index
    #[inline]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Get the generation
    #[inline]
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Check if this is a null entity
    #[inline]
    pub const fn is_null(&self) -> bool {
        self.index == u32::MAX
    }

    /// Pack into a u64: generation in the high half, index in the low half
    #[inline]
    pub const fn to_bits(&self) -> u64 {
        ((self.generation as u64) << 32) | (self.index as u64)
    }

    /// Unpack from [`to_bits`](Self::to_bits)
    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl PartialEq for Entity {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_bits().hash(state);
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::null()
    }
}

impl From<u64> for Entity {
    fn from(bits: u64) -> Self {
        Self::from_bits(bits)
    }
}

impl From<Entity> for u64 {
    fn from(entity: Entity) -> Self {
        entity.to_bits()
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Entity(null)")
        } else {
            write!(f, "Entity({}v{})", self.index, self.generation)
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "null")
        } else {
            write!(f, "{}v{}", self.index, self.generation)
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Slot {
    generation: u32,
    alive: bool,
}

/// Entity allocator with free list
///
/// Freed indices are recycled with a bumped generation, so a handle kept
/// past its entity's death never matches the new occupant.
#[derive(Debug)]
pub struct EntityAllocator {
    /// Generation and liveness for each index
    slots: Vec<Slot>,
    /// Free indices
    free_list: Vec<u32>,
    /// Number of alive entities
    alive_count: usize,
}

impl EntityAllocator {
    /// Create a new entity allocator
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create with initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            alive_count: 0,
        }
    }

    /// Allocate a new entity
    pub fn allocate(&mut self) -> Entity {
        self.alive_count += 1;

        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.alive = true;
            Entity::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot { generation: 0, alive: true });
            Entity::new(index, 0)
        }
    }

    /// Deallocate an entity
    ///
    /// Returns `false` if the handle was already dead.
    pub fn deallocate(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }

        let slot = &mut self.slots[entity.index as usize];
        slot.generation = slot.generation.wrapping_add(1);
        slot.alive = false;
        self.free_list.push(entity.index);
        self.alive_count -= 1;
        true
    }

    /// Deallocate every alive entity, invalidating all outstanding handles
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.alive {
                slot.generation = slot.generation.wrapping_add(1);
                slot.alive = false;
                self.free_list.push(index as u32);
            }
        }
        self.alive_count = 0;
    }

    /// Check if an entity is alive
    #[inline]
    pub fn is_alive(&self, entity: Entity) -> bool {
        if entity.is_null() {
            return false;
        }
        self.slots
            .get(entity.index as usize)
            .map(|slot| slot.alive && slot.generation == entity.generation)
            .unwrap_or(false)
    }

    /// Iterate alive entities in ascending index order
    pub fn iter_alive(&self) -> impl Iterator<Item = Entity> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.alive)
            .map(|(index, slot)| Entity::new(index as u32, slot.generation))
    }

    /// Get the number of alive entities
    #[inline]
    pub fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Get total number of slots ever allocated
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Reserve additional capacity
    pub fn reserve(&mut self, additional: usize) {
        self.slots.reserve(additional);
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_creation() {
        let e = Entity::new(5, 3);
        assert_eq!(e.index(), 5);
        assert_eq!(e.generation(), 3);
        assert!(!e.is_null());
    }

    #[test]
    fn test_entity_null() {
        let e = Entity::null();
        assert!(e.is_null());
        assert_eq!(Entity::default(), e);
        assert_eq!(format!("{:?}", e), "Entity(null)");
    }

    #[test]
    fn test_entity_serializes_as_bits() {
        let e = Entity::new(123, 456);
        let json = serde_json::to_string(&e).unwrap();
        assert_eq!(json, e.to_bits().to_string());
        let restored: Entity = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, e);
    }

    #[test]
    fn test_allocator() {
        let mut alloc = EntityAllocator::new();

        let e1 = alloc.allocate();
        let e2 = alloc.allocate();

        assert!(alloc.is_alive(e1));
        assert!(alloc.is_alive(e2));
        assert_eq!(alloc.alive_count(), 2);

        assert!(alloc.deallocate(e1));
        assert!(!alloc.deallocate(e1));
        assert!(!alloc.is_alive(e1));
        assert_eq!(alloc.alive_count(), 1);

        // Reallocate - should reuse index with new generation
        let e3 = alloc.allocate();
        assert_eq!(e3.index(), e1.index());
        assert_ne!(e3.generation(), e1.generation());
        assert!(!alloc.is_alive(e1));
    }

    #[test]
    fn test_clear_invalidates_handles() {
        let mut alloc = EntityAllocator::new();
        let e1 = alloc.allocate();
        let e2 = alloc.allocate();

        alloc.clear();

        assert_eq!(alloc.alive_count(), 0);
        assert!(!alloc.is_alive(e1));
        assert!(!alloc.is_alive(e2));
        assert_eq!(alloc.iter_alive().count(), 0);

        let e3 = alloc.allocate();
        assert!(alloc.is_alive(e3));
        assert_ne!(e3, e1);
        assert_ne!(e3, e2);
    }

    #[test]
    fn test_iter_alive_order() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        let c = alloc.allocate();
        alloc.deallocate(b);

        let alive: Vec<_> = alloc.iter_alive().collect();
        assert_eq!(alive, vec![a, c]);
    }
}
