//! Component - Data attached to entities
//!
//! Components are plain data with no behavior. Any `Send + Sync + 'static`
//! type is a component; the registry hands out a dense [`ComponentId`] per
//! type the first time it is stored.

use core::any::TypeId;
use std::collections::{BTreeMap, HashMap};

/// Unique identifier for a component type
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(pub u32);

impl ComponentId {
    /// Invalid component ID
    pub const INVALID: Self = Self(u32::MAX);

    /// Create a new component ID
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    #[inline]
    pub const fn id(&self) -> u32 {
        self.0
    }

    /// Position of this component's storage in the world's store list
    #[inline]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Check if this is a valid ID
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.0 != u32::MAX
    }
}

/// Information about a component type
#[derive(Clone, Debug)]
pub struct ComponentInfo {
    /// Unique ID for this component
    pub id: ComponentId,
    /// Type name for debugging
    pub name: &'static str,
    /// Rust type of the component
    pub type_id: TypeId,
}

impl ComponentInfo {
    /// Create info for a Rust type (ID assigned by the registry)
    pub fn of<T: Component>() -> Self {
        Self {
            id: ComponentId::INVALID,
            name: core::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }

    /// Type name without the module path
    pub fn short_name(&self) -> &'static str {
        short_type_name(self.name)
    }
}

/// Trait for component types
pub trait Component: Send + Sync + 'static {}

// Blanket implementation for all suitable types
impl<T: Send + Sync + 'static> Component for T {}

/// Registry for component types
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    /// Registered components by ID
    components: Vec<ComponentInfo>,
    /// TypeId to ComponentId mapping
    type_map: HashMap<TypeId, ComponentId>,
    /// Short name to ComponentId mapping
    name_map: BTreeMap<&'static str, ComponentId>,
}

impl ComponentRegistry {
    /// Create a new component registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component type, returning the existing ID if already known
    pub fn register<T: Component>(&mut self) -> ComponentId {
        let type_id = TypeId::of::<T>();
        if let Some(&id) = self.type_map.get(&type_id) {
            return id;
        }

        let id = ComponentId::new(self.components.len() as u32);
        let mut info = ComponentInfo::of::<T>();
        info.id = id;

        log::trace!("registered component {} as {:?}", info.name, id);

        self.type_map.insert(type_id, id);
        self.name_map.insert(info.short_name(), id);
        self.components.push(info);
        id
    }

    /// Get component ID by type
    pub fn get_id<T: Component>(&self) -> Option<ComponentId> {
        self.type_map.get(&TypeId::of::<T>()).copied()
    }

    /// Get component ID by short type name (e.g. `"TagComponent"`)
    pub fn get_id_by_name(&self, name: &str) -> Option<ComponentId> {
        self.name_map.get(name).copied()
    }

    /// Get component info
    pub fn get_info(&self, id: ComponentId) -> Option<&ComponentInfo> {
        self.components.get(id.index())
    }

    /// Iterate over all registered components
    pub fn iter(&self) -> impl Iterator<Item = &ComponentInfo> {
        self.components.iter()
    }

    /// Get the number of registered components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Strip the module path from a type name, keeping generic arguments intact
pub(crate) fn short_type_name(name: &'static str) -> &'static str {
    let base_end = name.find('<').unwrap_or(name.len());
    match name[..base_end].rfind("::") {
        Some(pos) => &name[pos + 2..],
        None => name,
    }
}
