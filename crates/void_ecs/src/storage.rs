//! Sparse-set component storage
//!
//! Each component type lives in its own [`SparseStorage<T>`]: a sparse array
//! indexed by entity index points into a dense array of values. Lookups,
//! inserts and removals are O(1); removal swap-removes from the dense side.
//!
//! The dense side remembers the full [`Entity`] (index + generation) that
//! owns each value, so a stale handle whose index has been recycled never
//! reads the new occupant's data.

use core::any::Any;

use crate::entity::Entity;

/// Type-erased view of a component store
///
/// The world keeps one boxed `ComponentStorage` per registered component type
/// and uses this trait for operations that do not need to know `T`
/// (despawning, clearing, diagnostics).
pub trait ComponentStorage: Any + Send + Sync {
    /// Check if `entity` has a value in this store
    fn contains(&self, entity: Entity) -> bool;

    /// Drop the value owned by `entity`, if any
    fn remove_entity(&mut self, entity: Entity) -> bool;

    /// Drop every value
    fn clear(&mut self);

    /// Number of stored values
    fn len(&self) -> usize;

    /// Check if empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Component type name
    fn type_name(&self) -> &'static str;

    /// Upcast for downcasting to the concrete store
    fn as_any(&self) -> &dyn Any;

    /// Upcast for downcasting to the concrete store
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Sparse set keyed by entity index
pub struct SparseStorage<T> {
    /// Sparse array: entity index -> dense index (or None)
    sparse: Vec<Option<usize>>,
    /// Dense array of values
    dense: Vec<T>,
    /// Owner of each dense slot (for reverse lookup and generation checks)
    owners: Vec<Entity>,
}

impl<T> SparseStorage<T> {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            sparse: Vec::new(),
            dense: Vec::new(),
            owners: Vec::new(),
        }
    }

    /// Create with initial sparse and dense capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sparse: Vec::with_capacity(capacity),
            dense: Vec::with_capacity(capacity),
            owners: Vec::with_capacity(capacity),
        }
    }

    fn dense_index(&self, entity: Entity) -> Option<usize> {
        let dense_idx = (*self.sparse.get(entity.index() as usize)?)?;
        (self.owners[dense_idx] == entity).then_some(dense_idx)
    }

    /// Insert or replace the value for `entity`, returning the old value
    pub fn insert(&mut self, entity: Entity, value: T) -> Option<T> {
        let index = entity.index() as usize;
        if index >= self.sparse.len() {
            self.sparse.resize(index + 1, None);
        }

        match self.sparse[index] {
            Some(dense_idx) if self.owners[dense_idx] == entity => {
                Some(core::mem::replace(&mut self.dense[dense_idx], value))
            }
            Some(dense_idx) => {
                // Slot still held by a dead generation of this index
                self.owners[dense_idx] = entity;
                self.dense[dense_idx] = value;
                None
            }
            None => {
                self.sparse[index] = Some(self.dense.len());
                self.dense.push(value);
                self.owners.push(entity);
                None
            }
        }
    }

    /// Remove the value owned by `entity`
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let dense_idx = self.dense_index(entity)?;
        self.sparse[entity.index() as usize] = None;

        let value = self.dense.swap_remove(dense_idx);
        self.owners.swap_remove(dense_idx);

        // Update the swapped element's sparse entry
        if let Some(moved) = self.owners.get(dense_idx) {
            self.sparse[moved.index() as usize] = Some(dense_idx);
        }

        Some(value)
    }

    /// Get a reference to the value owned by `entity`
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.dense_index(entity).map(|i| &self.dense[i])
    }

    /// Get a mutable reference to the value owned by `entity`
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.dense_index(entity).map(move |i| &mut self.dense[i])
    }

    /// Iterate `(owner, value)` pairs in dense order
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.owners.iter().copied().zip(self.dense.iter())
    }

    /// Iterate `(owner, value)` pairs mutably in dense order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.owners.iter().copied().zip(self.dense.iter_mut())
    }
}

impl<T> Default for SparseStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> ComponentStorage for SparseStorage<T> {
    fn contains(&self, entity: Entity) -> bool {
        self.dense_index(entity).is_some()
    }

    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_some()
    }

    fn clear(&mut self) {
        self.sparse.clear();
        self.dense.clear();
        self.owners.clear();
    }

    fn len(&self) -> usize {
        self.dense.len()
    }

    fn type_name(&self) -> &'static str {
        core::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
