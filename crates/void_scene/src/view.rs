//! Entity View
//!
//! [`EntityView`] pairs a runtime handle with the scene that owns it. It
//! owns no data and caches nothing: every accessor goes through the scene,
//! so a view outliving its entity just reports itself invalid.
//!
//! Component accessors return lock guards onto the scene. Drop them before
//! calling a mutating scene or hierarchy operation on the same scene.

use std::any::{Any, TypeId};
use std::hash::{Hash, Hasher};

use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLockReadGuard, RwLockWriteGuard};

use void_core::Uuid;
use void_ecs::{Component, EcsError, Entity};

use crate::components::{IdComponent, TagComponent, TransformComponent};
use crate::error::{Result, SceneError};
use crate::hierarchy;
use crate::scene::Scene;

fn is_identity<T: 'static>() -> bool {
    TypeId::of::<T>() == TypeId::of::<IdComponent>()
}

/// Non-owning accessor for one entity of a scene
#[derive(Clone, Copy)]
pub struct EntityView<'s> {
    handle: Entity,
    scene: &'s Scene,
}

impl<'s> EntityView<'s> {
    pub(crate) fn new(handle: Entity, scene: &'s Scene) -> Self {
        Self { handle, scene }
    }

    /// The invalid view of `scene`
    pub fn null(scene: &'s Scene) -> Self {
        Self::new(Entity::null(), scene)
    }

    /// Runtime handle
    #[inline]
    pub fn handle(&self) -> Entity {
        self.handle
    }

    /// Owning scene
    #[inline]
    pub fn scene(&self) -> &'s Scene {
        self.scene
    }

    /// Check if the handle still refers to a live entity
    pub fn is_valid(&self) -> bool {
        self.scene.read().world.is_alive(self.handle)
    }

    // ========== Components ==========

    /// Check for a component
    pub fn has_component<T: Component>(&self) -> bool {
        self.scene.read().world.has_component::<T>(self.handle)
    }

    /// Read a component if present
    pub fn try_component<T: Component>(&self) -> Option<MappedRwLockReadGuard<'s, T>> {
        let handle = self.handle;
        RwLockReadGuard::try_map(self.scene.read(), |state| state.world.get_component::<T>(handle)).ok()
    }

    /// Write a component if present.
    ///
    /// Always `None` for [`IdComponent`]; change identity with
    /// [`set_uuid`](Self::set_uuid).
    pub fn try_component_mut<T: Component>(&self) -> Option<MappedRwLockWriteGuard<'s, T>> {
        if is_identity::<T>() {
            return None;
        }
        let handle = self.handle;
        RwLockWriteGuard::try_map(self.scene.write(), |state| {
            state.world.get_component_mut::<T>(handle)
        })
        .ok()
    }

    /// Read a component
    ///
    /// # Panics
    ///
    /// Panics if the entity is dead or lacks `T`.
    pub fn component<T: Component>(&self) -> MappedRwLockReadGuard<'s, T> {
        let handle = self.handle;
        RwLockReadGuard::map(self.scene.read(), |state| state.world.component::<T>(handle))
    }

    /// Write a component
    ///
    /// # Panics
    ///
    /// Panics if the entity is dead or lacks `T`, or if `T` is
    /// [`IdComponent`] (use [`set_uuid`](Self::set_uuid)).
    pub fn component_mut<T: Component>(&self) -> MappedRwLockWriteGuard<'s, T> {
        if is_identity::<T>() {
            panic!("IdComponent cannot be edited in place; use EntityView::set_uuid");
        }
        let handle = self.handle;
        RwLockWriteGuard::map(self.scene.write(), |state| state.world.component_mut::<T>(handle))
    }

    /// Add or replace a component and return it.
    ///
    /// Adding an [`IdComponent`] goes through [`set_uuid`](Self::set_uuid).
    /// Replacing a [`RelationshipComponent`](crate::RelationshipComponent)
    /// this way bypasses hierarchy bookkeeping.
    ///
    /// # Panics
    ///
    /// Panics if the entity is dead, or if an [`IdComponent`] carries a nil
    /// or already used UUID.
    pub fn add_component<T: Component>(&self, component: T) -> MappedRwLockWriteGuard<'s, T> {
        let handle = self.handle;
        let mut state = self.scene.write();

        if let Some(id) = (&component as &dyn Any).downcast_ref::<IdComponent>() {
            if let Err(err) = hierarchy::set_identity(&mut state, handle, id.uuid) {
                panic!("{}", err);
            }
            self.scene.after_mutation(&state);
            return RwLockWriteGuard::map(state, |state| state.world.component_mut::<T>(handle));
        }

        RwLockWriteGuard::map(state, |state| {
            state
                .world
                .add_component(handle, component)
                .unwrap_or_else(|| panic!("{}", EcsError::EntityNotAlive(handle)))
        })
    }

    /// Remove a component, returning it.
    ///
    /// Removing the [`IdComponent`] also unlinks the entity from the
    /// hierarchy and from UUID resolution.
    pub fn remove_component<T: Component>(&self) -> Option<T> {
        let mut state = self.scene.write();
        if is_identity::<T>() {
            hierarchy::forget_identity(&mut state, self.handle);
            self.scene.after_mutation(&state);
        }
        state.world.remove_component::<T>(self.handle)
    }

    // ========== Identity ==========

    /// Persistent UUID
    ///
    /// # Panics
    ///
    /// Panics if the entity is dead or has no [`IdComponent`].
    pub fn uuid(&self) -> Uuid {
        self.try_uuid().unwrap_or_else(|e| panic!("{}", e))
    }

    /// Persistent UUID, or why it is unavailable
    pub fn try_uuid(&self) -> Result<Uuid> {
        let state = self.scene.read();
        if !state.world.is_alive(self.handle) {
            return Err(EcsError::EntityNotAlive(self.handle).into());
        }
        state.uuid_of(self.handle).ok_or(SceneError::MissingComponent {
            entity: self.handle,
            component: "IdComponent",
        })
    }

    /// Change the persistent UUID.
    ///
    /// The resolver is re-keyed, and the parent's children list and the
    /// children's parent links are rewritten to the new UUID.
    pub fn set_uuid(&self, uuid: Uuid) -> Result<()> {
        let mut state = self.scene.write();
        hierarchy::set_identity(&mut state, self.handle, uuid)?;
        self.scene.after_mutation(&state);
        Ok(())
    }

    /// Display name; empty when the entity is dead or untagged
    pub fn name(&self) -> String {
        self.scene
            .read()
            .world
            .get_component::<TagComponent>(self.handle)
            .map(|tag| tag.tag.clone())
            .unwrap_or_default()
    }

    /// Set the display name, adding a tag if needed.
    /// Returns `false` if the entity is dead.
    pub fn set_name(&self, name: impl Into<String>) -> bool {
        let mut state = self.scene.write();
        let name = name.into();
        match state.world.get_component_mut::<TagComponent>(self.handle) {
            Some(tag) => {
                tag.tag = name;
                true
            }
            None => state
                .world
                .add_component(self.handle, TagComponent::new(name))
                .is_some(),
        }
    }

    /// Local transform
    ///
    /// # Panics
    ///
    /// Panics if the entity is dead or has no [`TransformComponent`].
    pub fn transform(&self) -> MappedRwLockReadGuard<'s, TransformComponent> {
        self.component::<TransformComponent>()
    }

    /// Mutable local transform
    ///
    /// # Panics
    ///
    /// Panics if the entity is dead or has no [`TransformComponent`].
    pub fn transform_mut(&self) -> MappedRwLockWriteGuard<'s, TransformComponent> {
        self.component_mut::<TransformComponent>()
    }
}

impl PartialEq for EntityView<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle && self.scene.id() == other.scene.id()
    }
}

impl Eq for EntityView<'_> {}

impl Hash for EntityView<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.handle.hash(state);
        self.scene.id().hash(state);
    }
}

impl std::fmt::Debug for EntityView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EntityView({:?} @ {})", self.handle, self.scene.id())
    }
}
