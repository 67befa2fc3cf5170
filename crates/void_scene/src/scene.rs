//! Scene - owner of the component store and the identity resolver
//!
//! A [`Scene`] holds a flat pool of entities in a [`World`] plus the
//! [`IdentityResolver`] mapping persistent UUIDs to live handles. Both live
//! behind one lock, so every graph operation sees and updates them together.
//!
//! Entities are handed out as [`EntityView`]s: cheap, copyable accessors
//! borrowing the scene. Views never cache anything; after [`Scene::clear`]
//! or [`Scene::destroy_entity`] old views simply stop being valid.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use void_core::Uuid;
use void_ecs::{Entity, World, WorldExt};

use crate::components::{
    multiply_matrices, IdComponent, RelationshipComponent, TagComponent, TransformComponent,
    IDENTITY_MATRIX,
};
use crate::config::SceneConfig;
use crate::error::{HierarchyError, Result, SceneError};
use crate::hierarchy;
use crate::resolver::IdentityResolver;
use crate::view::EntityView;

/// Name given to entities created with an empty name
pub const DEFAULT_ENTITY_NAME: &str = "Entity";

static NEXT_SCENE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique scene identity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(u64);

impl SceneId {
    fn next() -> Self {
        Self(NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SceneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "scene#{}", self.0)
    }
}

/// Store and resolver, locked together
pub(crate) struct SceneState {
    pub(crate) world: World,
    pub(crate) resolver: IdentityResolver,
}

impl SceneState {
    fn new(capacity: usize) -> Self {
        let mut world = World::with_capacity(capacity);
        world.register_component::<IdComponent>();
        world.register_component::<TagComponent>();
        world.register_component::<TransformComponent>();
        world.register_component::<RelationshipComponent>();

        Self {
            world,
            resolver: IdentityResolver::with_capacity(capacity),
        }
    }

    /// UUID -> live handle; `None` for nil, unknown or stale.
    /// The handle must still carry `uuid` in its IdComponent.
    pub(crate) fn resolve(&self, uuid: Uuid) -> Option<Entity> {
        self.resolver
            .get(uuid)
            .filter(|&entity| self.uuid_of(entity) == Some(uuid))
    }

    pub(crate) fn uuid_of(&self, entity: Entity) -> Option<Uuid> {
        self.world
            .get_component::<IdComponent>(entity)
            .map(|id| id.uuid)
    }

    pub(crate) fn relationship(&self, entity: Entity) -> Option<&RelationshipComponent> {
        self.world.get_component::<RelationshipComponent>(entity)
    }

    pub(crate) fn relationship_mut(&mut self, entity: Entity) -> Option<&mut RelationshipComponent> {
        self.world.get_component_mut::<RelationshipComponent>(entity)
    }

    fn spawn(&mut self, uuid: Uuid, name: &str) -> Entity {
        let tag = if name.is_empty() { DEFAULT_ENTITY_NAME } else { name };
        let entity = self
            .world
            .build_entity()
            .with(IdComponent::new(uuid))
            .with(TagComponent::new(tag))
            .with(TransformComponent::IDENTITY)
            .with(RelationshipComponent::new())
            .build();
        self.resolver.insert(uuid, entity);
        entity
    }
}

/// A scene: a flat pool of entities linked into a UUID-based hierarchy
pub struct Scene {
    id: SceneId,
    config: SceneConfig,
    state: RwLock<SceneState>,
    validation_failures: AtomicU64,
}

impl Scene {
    /// Create an empty scene with default settings
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(SceneConfig::named(name))
    }

    /// Create an empty scene from a config
    pub fn with_config(config: SceneConfig) -> Self {
        let id = SceneId::next();
        log::debug!("Created {} '{}'", id, config.name);
        Self {
            id,
            state: RwLock::new(SceneState::new(config.initial_capacity)),
            config,
            validation_failures: AtomicU64::new(0),
        }
    }

    /// Scene identity
    pub fn id(&self) -> SceneId {
        self.id
    }

    /// Scene name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Active configuration
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, SceneState> {
        self.state.read()
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, SceneState> {
        self.state.write()
    }

    /// Run validation if the config asks for it
    pub(crate) fn after_mutation(&self, state: &SceneState) {
        if !self.config.validate_on_mutation {
            return;
        }
        if let Err(err) = hierarchy::validate(state) {
            self.validation_failures.fetch_add(1, Ordering::Relaxed);
            log::error!("{}: hierarchy invalid after mutation: {}", self.id, err);
        }
    }

    /// Number of mutations after which `validate_on_mutation` found the
    /// hierarchy invalid
    pub fn validation_failures(&self) -> u64 {
        self.validation_failures.load(Ordering::Relaxed)
    }

    // ========== Entity lifecycle ==========

    /// Create a root entity with a fresh UUID
    pub fn create_entity(&self, name: &str) -> EntityView<'_> {
        let mut state = self.write();
        let uuid = loop {
            let candidate = Uuid::new();
            if !state.resolver.contains(candidate) {
                break candidate;
            }
        };
        let entity = state.spawn(uuid, name);
        log::debug!("{}: created entity {} ({:?}) '{}'", self.id, uuid, entity, name);
        EntityView::new(entity, self)
    }

    /// Create a root entity with a caller-chosen UUID (e.g. when loading)
    pub fn create_entity_with_uuid(&self, uuid: Uuid, name: &str) -> Result<EntityView<'_>> {
        if uuid.is_nil() {
            return Err(SceneError::NilUuid);
        }

        let mut state = self.write();
        if state.resolve(uuid).is_some() {
            return Err(SceneError::DuplicateUuid(uuid));
        }
        let entity = state.spawn(uuid, name);
        log::debug!("{}: created entity {} ({:?}) '{}'", self.id, uuid, entity, name);
        Ok(EntityView::new(entity, self))
    }

    /// Create an entity already attached under `parent`
    pub fn create_child_entity(&self, parent: EntityView<'_>, name: &str) -> Result<EntityView<'_>> {
        if !parent.is_valid() {
            return Err(HierarchyError::EntityNotFound {
                entity: parent.handle(),
            }
            .into());
        }

        let child = self.create_entity(name);
        if let Err(err) = child.set_parent(parent) {
            self.destroy_entity(child, false);
            return Err(err.into());
        }
        Ok(child)
    }

    /// Destroy an entity.
    ///
    /// The entity is removed from its parent's children. Its descendants are
    /// destroyed too (deepest first) unless `exclude_children` is set, in
    /// which case its direct children become roots.
    ///
    /// Returns `false` if the view is invalid or belongs to another scene.
    pub fn destroy_entity(&self, entity: EntityView<'_>, exclude_children: bool) -> bool {
        if entity.scene().id() != self.id {
            log::warn!("{}: refusing to destroy {:?} from another scene", self.id, entity);
            return false;
        }

        let mut state = self.write();
        if !state.world.is_alive(entity.handle()) {
            return false;
        }
        hierarchy::destroy(&mut state, entity.handle(), exclude_children);
        self.after_mutation(&state);
        true
    }

    /// Destroy every entity. All outstanding views become invalid.
    pub fn clear(&self) {
        let mut state = self.write();
        state.world.clear();
        state.resolver.clear();
        log::debug!("{}: cleared", self.id);
    }

    // ========== Lookup ==========

    /// View for a raw handle (invalid if the handle is not alive)
    pub fn entity(&self, handle: Entity) -> EntityView<'_> {
        EntityView::new(handle, self)
    }

    /// The invalid view of this scene
    pub fn null_entity(&self) -> EntityView<'_> {
        EntityView::null(self)
    }

    /// Resolve a UUID; invalid view for nil, unknown or destroyed UUIDs
    pub fn resolve(&self, uuid: Uuid) -> EntityView<'_> {
        match self.read().resolve(uuid) {
            Some(entity) => EntityView::new(entity, self),
            None => self.null_entity(),
        }
    }

    /// Resolve a UUID the caller knows to be live
    ///
    /// # Panics
    ///
    /// Panics if `uuid` does not resolve to a live entity.
    pub fn resolve_strict(&self, uuid: Uuid) -> EntityView<'_> {
        let view = self.resolve(uuid);
        if !view.is_valid() {
            panic!("{}: no entity with UUID {}", self.id, uuid);
        }
        view
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.read().world.entity_count()
    }

    /// Every live entity, in handle order
    pub fn entities(&self) -> Vec<EntityView<'_>> {
        self.read()
            .world
            .entities()
            .map(|entity| EntityView::new(entity, self))
            .collect()
    }

    /// Every live entity without a parent, in handle order
    pub fn root_entities(&self) -> Vec<EntityView<'_>> {
        let state = self.read();
        let roots = state
            .world
            .entities()
            .filter(|&entity| state.relationship(entity).map_or(true, |rel| rel.is_root()))
            .map(|entity| EntityView::new(entity, self))
            .collect();
        roots
    }

    /// First entity (in handle order) whose tag equals `tag`
    pub fn find_entity_by_tag(&self, tag: &str) -> EntityView<'_> {
        let state = self.read();
        let found = state.world.entities().find(|&entity| {
            state
                .world
                .get_component::<TagComponent>(entity)
                .is_some_and(|t| t.tag == tag)
        });
        drop(state);

        match found {
            Some(entity) => EntityView::new(entity, self),
            None => self.null_entity(),
        }
    }

    // ========== Hierarchy ==========

    /// Compose local transforms from the root down to `entity`.
    /// Entities without a transform contribute identity.
    pub fn world_transform(&self, entity: EntityView<'_>) -> [[f32; 4]; 4] {
        if entity.scene().id() != self.id {
            return IDENTITY_MATRIX;
        }

        let state = self.read();
        if !state.world.is_alive(entity.handle()) {
            return IDENTITY_MATRIX;
        }

        let mut chain = hierarchy::ancestors(&state, entity.handle(), self.config.max_hierarchy_depth);
        chain.reverse();
        chain.push(entity.handle());

        chain.iter().fold(IDENTITY_MATRIX, |acc, &node| {
            match state.world.get_component::<TransformComponent>(node) {
                Some(transform) => multiply_matrices(&acc, &transform.to_matrix()),
                None => acc,
            }
        })
    }

    /// Check every relationship for mutual consistency, dangling links,
    /// duplicate children and cycles
    pub fn validate_hierarchy(&self) -> std::result::Result<(), HierarchyError> {
        hierarchy::validate(&self.read())
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.id)
            .field("name", &self.config.name)
            .field("entities", &self.entity_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_entity_components() {
        let scene = Scene::new("test");
        let e = scene.create_entity("Player");

        assert!(e.is_valid());
        assert!(e.has_component::<IdComponent>());
        assert!(e.has_component::<TagComponent>());
        assert!(e.has_component::<TransformComponent>());
        assert!(e.has_component::<RelationshipComponent>());
        assert_eq!(e.name(), "Player");
        assert!(!e.uuid().is_nil());
        assert_eq!(scene.entity_count(), 1);
    }

    #[test]
    fn test_empty_name_gets_default() {
        let scene = Scene::new("test");
        assert_eq!(scene.create_entity("").name(), DEFAULT_ENTITY_NAME);
    }

    #[test]
    fn test_create_with_uuid() {
        let scene = Scene::new("test");
        let uuid = Uuid::from_u128(42);
        let e = scene.create_entity_with_uuid(uuid, "Fixed").unwrap();

        assert_eq!(e.uuid(), uuid);
        assert_eq!(scene.resolve(uuid), e);
        assert!(matches!(
            scene.create_entity_with_uuid(uuid, "Again"),
            Err(SceneError::DuplicateUuid(u)) if u == uuid
        ));
        assert!(matches!(
            scene.create_entity_with_uuid(Uuid::NIL, "Nil"),
            Err(SceneError::NilUuid)
        ));
    }

    #[test]
    fn test_resolve_misses() {
        let scene = Scene::new("test");
        assert!(!scene.resolve(Uuid::NIL).is_valid());
        assert!(!scene.resolve(Uuid::new()).is_valid());
    }

    #[test]
    #[should_panic(expected = "no entity with UUID")]
    fn test_resolve_strict_panics() {
        let scene = Scene::new("test");
        scene.resolve_strict(Uuid::new());
    }

    #[test]
    fn test_destroy_subtree() {
        let scene = Scene::new("test");
        let root = scene.create_entity("root");
        let mid = scene.create_child_entity(root, "mid").unwrap();
        let leaf = scene.create_child_entity(mid, "leaf").unwrap();
        let (mid_uuid, leaf_uuid) = (mid.uuid(), leaf.uuid());

        assert!(scene.destroy_entity(mid, false));

        assert!(!mid.is_valid());
        assert!(!leaf.is_valid());
        assert!(!scene.resolve(mid_uuid).is_valid());
        assert!(!scene.resolve(leaf_uuid).is_valid());
        assert!(root.children().is_empty());
        assert_eq!(scene.entity_count(), 1);
        assert!(scene.validate_hierarchy().is_ok());
    }

    #[test]
    fn test_destroy_exclude_children() {
        let scene = Scene::new("test");
        let root = scene.create_entity("root");
        let mid = scene.create_child_entity(root, "mid").unwrap();
        let leaf = scene.create_child_entity(mid, "leaf").unwrap();

        assert!(scene.destroy_entity(mid, true));

        assert!(leaf.is_valid());
        assert!(leaf.is_root());
        assert!(!leaf.parent().is_valid());
        assert!(root.children().is_empty());
        assert!(scene.validate_hierarchy().is_ok());
    }

    #[test]
    fn test_destroy_twice() {
        let scene = Scene::new("test");
        let e = scene.create_entity("e");
        assert!(scene.destroy_entity(e, false));
        assert!(!scene.destroy_entity(e, false));
    }

    #[test]
    fn test_clear_invalidates_views() {
        let scene = Scene::new("test");
        let a = scene.create_entity("a");
        let uuid = a.uuid();

        scene.clear();

        assert!(!a.is_valid());
        assert!(!scene.resolve(uuid).is_valid());
        assert_eq!(scene.entity_count(), 0);

        // Recycled slot must not revive the old view
        let b = scene.create_entity("b");
        assert_ne!(a, b);
        assert!(!a.is_valid());
    }

    #[test]
    fn test_root_entities_and_tag_lookup() {
        let scene = Scene::new("test");
        let a = scene.create_entity("a");
        let b = scene.create_entity("b");
        scene.create_child_entity(a, "child").unwrap();

        assert_eq!(scene.root_entities(), vec![a, b]);
        assert_eq!(scene.find_entity_by_tag("b"), b);
        assert!(!scene.find_entity_by_tag("nobody").is_valid());
        assert_eq!(scene.entities().len(), 3);
    }

    #[test]
    fn test_world_transform() {
        let scene = Scene::new("test");
        let parent = scene.create_entity("parent");
        let child = scene.create_child_entity(parent, "child").unwrap();

        *parent.transform_mut() = TransformComponent::from_translation([10.0, 0.0, 0.0]);
        *child.transform_mut() = TransformComponent::from_translation([5.0, 1.0, 0.0]);

        let m = scene.world_transform(child);
        assert!((m[3][0] - 15.0).abs() < 1e-5);
        assert!((m[3][1] - 1.0).abs() < 1e-5);
        assert_eq!(scene.world_transform(scene.null_entity()), IDENTITY_MATRIX);
    }

    #[test]
    fn test_removed_identity_leaves_resolver() {
        let scene = Scene::new("test");
        let a = scene.create_entity("a");
        let uuid = a.uuid();

        a.remove_component::<IdComponent>();
        assert!(!scene.resolve(uuid).is_valid());
        assert!(scene.read().resolver.is_empty());

        assert!(scene.destroy_entity(a, false));
        assert!(scene.read().resolver.is_empty());
    }

    #[test]
    fn test_destroy_drops_resolver_entries() {
        let scene = Scene::new("test");
        let root = scene.create_entity("root");
        scene.create_child_entity(root, "child").unwrap();
        assert_eq!(scene.read().resolver.len(), 2);

        scene.destroy_entity(root, false);
        assert!(scene.read().resolver.is_empty());
    }

    #[test]
    fn test_validation_failures_counted() {
        let scene = Scene::with_config(SceneConfig {
            validate_on_mutation: true,
            ..SceneConfig::named("checked")
        });
        let a = scene.create_entity("a");
        let b = scene.create_entity("b");
        let c = scene.create_entity("c");

        b.set_parent(a).unwrap();
        assert_eq!(scene.validation_failures(), 0);

        // One-sided edit leaves `a` listing a child that points elsewhere
        let c_uuid = c.uuid();
        a.children_mut().push(c_uuid);
        b.unparent().unwrap();

        assert_eq!(scene.validation_failures(), 1);
    }

    #[test]
    fn test_validation_off_counts_nothing() {
        let scene = Scene::new("unchecked");
        let a = scene.create_entity("a");
        let b = scene.create_entity("b");
        let b_uuid = b.uuid();

        a.children_mut().push(b_uuid);
        b.set_parent(a).unwrap();
        assert_eq!(scene.validation_failures(), 0);
    }

    #[test]
    fn test_scene_ids_unique() {
        assert_ne!(Scene::new("a").id(), Scene::new("b").id());
    }

    #[test]
    fn test_with_config() {
        let config = SceneConfig {
            initial_capacity: 16,
            ..SceneConfig::named("configured")
        };
        let scene = Scene::with_config(config);
        assert_eq!(scene.name(), "configured");
        assert_eq!(scene.config().initial_capacity, 16);
    }
}
