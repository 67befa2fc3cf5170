//! Hierarchy operations
//!
//! Parent/child links live in [`RelationshipComponent`]s as UUIDs. Every
//! mutating operation here updates both sides of a link under one write
//! lock, so a child's `parent` and its parent's `children` always agree:
//!
//! - detach from the old parent before the `parent` field is overwritten
//! - attach to the new parent's `children` at most once
//!
//! Reparenting rejects cycles and over-deep hierarchies before touching
//! any component.

use std::collections::HashSet;

use void_core::Uuid;
use void_ecs::{EcsError, Entity};

use crate::components::{IdComponent, RelationshipComponent};
use crate::error::{HierarchyError, Result, SceneError};
use crate::scene::SceneState;
use crate::view::EntityView;

type HierarchyResult<T> = std::result::Result<T, HierarchyError>;

// ============================================================================
// Graph algorithms over scene state
// ============================================================================

/// Resolved parent of `entity`, if any
pub(crate) fn parent_of(state: &SceneState, entity: Entity) -> Option<Entity> {
    let parent = state.relationship(entity)?.parent;
    if parent.is_nil() {
        return None;
    }
    let resolved = state.resolve(parent);
    if resolved.is_none() {
        log::warn!("{:?} names parent {} which does not resolve", entity, parent);
    }
    resolved
}

/// Live children of `entity` in list order, skipping stale UUIDs
pub(crate) fn children_of(state: &SceneState, entity: Entity) -> Vec<Entity> {
    let Some(rel) = state.relationship(entity) else {
        return Vec::new();
    };
    rel.children
        .iter()
        .filter_map(|&child| {
            let resolved = state.resolve(child);
            if resolved.is_none() {
                log::warn!("{:?} lists child {} which does not resolve", entity, child);
            }
            resolved
        })
        .collect()
}

/// Depth-first search of `ancestor`'s subtree for `candidate`.
///
/// Assumes the graph is acyclic, which `set_parent` guarantees.
pub(crate) fn is_ancestor_of(state: &SceneState, ancestor: Entity, candidate: Entity) -> bool {
    let Some(rel) = state.relationship(ancestor) else {
        return false;
    };
    if rel.children.is_empty() {
        return false;
    }
    let Some(candidate_uuid) = state.uuid_of(candidate) else {
        return false;
    };

    if rel.has_child(candidate_uuid) {
        return true;
    }

    rel.children
        .iter()
        .filter_map(|&child| state.resolve(child))
        .any(|child| is_ancestor_of(state, child, candidate))
}

/// Parents of `entity`, nearest first
pub(crate) fn ancestors(state: &SceneState, entity: Entity, limit: u32) -> Vec<Entity> {
    let mut result = Vec::new();
    let mut current = entity;

    while let Some(parent) = parent_of(state, current) {
        if result.len() as u32 >= limit {
            log::warn!("Ancestor walk from {:?} exceeded {} levels", entity, limit);
            break;
        }
        result.push(parent);
        current = parent;
    }

    result
}

/// Descendants of `entity` in depth-first pre-order
pub(crate) fn descendants(state: &SceneState, entity: Entity, out: &mut Vec<Entity>) {
    for child in children_of(state, entity) {
        out.push(child);
        descendants(state, child, out);
    }
}

/// Longest parent-chain below `entity` (0 for a leaf)
fn subtree_height(state: &SceneState, entity: Entity) -> u32 {
    children_of(state, entity)
        .into_iter()
        .map(|child| subtree_height(state, child) + 1)
        .max()
        .unwrap_or(0)
}

/// Remove `child` from `parent`'s children list
pub(crate) fn remove_child(state: &mut SceneState, parent: Entity, child: Uuid) -> bool {
    let removed = state
        .relationship_mut(parent)
        .map_or(false, |rel| rel.remove_child(child));
    if removed {
        log::trace!("Removed child {} from {:?}", child, parent);
    }
    removed
}

/// Reparent `child` under `new_parent`, or make it a root when `None`
pub(crate) fn set_parent(
    state: &mut SceneState,
    max_depth: u32,
    child: Entity,
    new_parent: Option<Entity>,
) -> HierarchyResult<()> {
    if !state.world.is_alive(child) {
        return Err(HierarchyError::EntityNotFound { entity: child });
    }
    let child_uuid = state
        .uuid_of(child)
        .ok_or(HierarchyError::MissingIdentity { entity: child })?;
    let current = state
        .relationship(child)
        .ok_or(HierarchyError::MissingRelationship { entity: child })?
        .parent;

    let parent_uuid = match new_parent {
        Some(parent) => {
            if parent == child {
                return Err(HierarchyError::CycleDetected {
                    entities: vec![child],
                });
            }
            if state.relationship(parent).is_none() {
                return Err(HierarchyError::MissingRelationship { entity: parent });
            }
            state
                .uuid_of(parent)
                .ok_or(HierarchyError::MissingIdentity { entity: parent })?
        }
        None => Uuid::NIL,
    };

    if current == parent_uuid {
        log::trace!("{:?} already has parent {}", child, parent_uuid);
        return Ok(());
    }

    if let Some(parent) = new_parent {
        if is_ancestor_of(state, child, parent) {
            return Err(HierarchyError::CycleDetected {
                entities: vec![child, parent],
            });
        }

        let parent_depth = ancestors(state, parent, max_depth).len() as u32;
        let depth = parent_depth + 1 + subtree_height(state, child);
        if depth > max_depth {
            return Err(HierarchyError::DepthExceeded {
                depth,
                limit: max_depth,
            });
        }
    }

    // Detach first: the old parent is only reachable through `current`
    if let Some(old_parent) = state.resolve(current) {
        remove_child(state, old_parent, child_uuid);
    } else if !current.is_nil() {
        log::warn!("{:?} had unresolvable parent {}", child, current);
    }

    if let Some(rel) = state.relationship_mut(child) {
        rel.parent = parent_uuid;
    }

    if let Some(parent) = new_parent {
        if let Some(rel) = state.relationship_mut(parent) {
            rel.push_child(child_uuid);
        }
    }

    log::debug!("Reparented {} under {}", child_uuid, parent_uuid);
    Ok(())
}

/// Give `entity` a new UUID, re-keying the resolver and rewriting the links
/// that name the old one
pub(crate) fn set_identity(state: &mut SceneState, entity: Entity, uuid: Uuid) -> Result<()> {
    if !state.world.is_alive(entity) {
        return Err(EcsError::EntityNotAlive(entity).into());
    }
    if uuid.is_nil() {
        return Err(SceneError::NilUuid);
    }

    let old = state.uuid_of(entity);
    if old == Some(uuid) {
        return Ok(());
    }
    if state.resolve(uuid).is_some() {
        return Err(SceneError::DuplicateUuid(uuid));
    }

    let parent = parent_of(state, entity);
    let children = children_of(state, entity);

    state.world.add_component(entity, IdComponent::new(uuid));
    state.resolver.insert(uuid, entity);

    if let Some(old) = old {
        state.resolver.remove(old);

        if let Some(rel) = parent.and_then(|p| state.relationship_mut(p)) {
            for child in rel.children.iter_mut().filter(|c| **c == old) {
                *child = uuid;
            }
        }
        for child in children {
            if let Some(rel) = state.relationship_mut(child).filter(|rel| rel.parent == old) {
                rel.parent = uuid;
            }
        }
    }

    log::debug!("Re-keyed {:?} from {:?} to {}", entity, old, uuid);
    Ok(())
}

/// Unlink `entity` from the hierarchy and from UUID resolution ahead of its
/// IdComponent being removed. Children become roots.
pub(crate) fn forget_identity(state: &mut SceneState, entity: Entity) {
    let Some(uuid) = state.uuid_of(entity) else {
        return;
    };

    if let Some(parent) = parent_of(state, entity) {
        remove_child(state, parent, uuid);
    }
    for child in children_of(state, entity) {
        if let Some(rel) = state.relationship_mut(child).filter(|rel| rel.parent == uuid) {
            rel.parent = Uuid::NIL;
        }
    }
    if let Some(rel) = state.relationship_mut(entity) {
        rel.parent = Uuid::NIL;
        rel.children.clear();
    }

    state.resolver.remove(uuid);
    log::debug!("Dropped identity {} of {:?}", uuid, entity);
}

/// Destroy `entity`, detaching it from its parent.
/// Children are destroyed recursively, or re-rooted with `exclude_children`.
pub(crate) fn destroy(state: &mut SceneState, entity: Entity, exclude_children: bool) {
    let children = children_of(state, entity);

    if exclude_children {
        for child in children {
            if let Some(rel) = state.relationship_mut(child) {
                rel.parent = Uuid::NIL;
            }
        }
    } else {
        for child in children {
            destroy_subtree(state, child);
        }
    }

    if let (Some(parent), Some(uuid)) = (parent_of(state, entity), state.uuid_of(entity)) {
        remove_child(state, parent, uuid);
    }

    despawn(state, entity);
}

fn destroy_subtree(state: &mut SceneState, entity: Entity) {
    for child in children_of(state, entity) {
        destroy_subtree(state, child);
    }
    despawn(state, entity);
}

fn despawn(state: &mut SceneState, entity: Entity) {
    let uuid = state.uuid_of(entity);
    if let Some(uuid) = uuid {
        state.resolver.remove(uuid);
    }
    state.world.despawn(entity);
    log::debug!("Destroyed entity {:?} ({:?})", uuid, entity);
}

/// Check every relationship in the scene
pub(crate) fn validate(state: &SceneState) -> HierarchyResult<()> {
    for entity in state.world.entities() {
        let Some(rel) = state.relationship(entity) else {
            continue;
        };
        let Some(uuid) = state.uuid_of(entity) else {
            continue;
        };

        if !rel.parent.is_nil() {
            let parent = state
                .resolve(rel.parent)
                .ok_or(HierarchyError::DanglingReference {
                    entity: uuid,
                    missing: rel.parent,
                })?;
            let listed = state.relationship(parent).is_some_and(|p| p.has_child(uuid));
            if !listed {
                return Err(HierarchyError::ChildNotListed {
                    child: uuid,
                    parent: rel.parent,
                });
            }
        }

        let mut seen = HashSet::with_capacity(rel.children.len());
        for &child_uuid in &rel.children {
            if !seen.insert(child_uuid) {
                return Err(HierarchyError::DuplicateChild {
                    parent: uuid,
                    child: child_uuid,
                });
            }
            let child = state
                .resolve(child_uuid)
                .ok_or(HierarchyError::DanglingReference {
                    entity: uuid,
                    missing: child_uuid,
                })?;
            let actual = state.relationship(child).map_or(Uuid::NIL, |c| c.parent);
            if actual != uuid {
                return Err(HierarchyError::StrayChild {
                    parent: uuid,
                    child: child_uuid,
                    actual,
                });
            }
        }
    }

    detect_cycles(state)
}

/// Walk every parent chain, reporting the first loop found
fn detect_cycles(state: &SceneState) -> HierarchyResult<()> {
    let mut finished: HashSet<Entity> = HashSet::new();

    for start in state.world.entities() {
        let mut path: Vec<Entity> = Vec::new();
        let mut on_path: HashSet<Entity> = HashSet::new();
        let mut current = Some(start);

        while let Some(entity) = current {
            if finished.contains(&entity) {
                break;
            }
            if !on_path.insert(entity) {
                let begin = path.iter().position(|&e| e == entity).unwrap_or(0);
                return Err(HierarchyError::CycleDetected {
                    entities: path[begin..].to_vec(),
                });
            }
            path.push(entity);
            current = state
                .relationship(entity)
                .filter(|rel| !rel.parent.is_nil())
                .and_then(|rel| state.resolve(rel.parent));
        }

        finished.extend(path);
    }

    Ok(())
}

// ============================================================================
// EntityView graph API
// ============================================================================

impl<'s> EntityView<'s> {
    /// Parent view; invalid for roots, entities without a relationship and
    /// stale parent UUIDs
    pub fn parent(&self) -> EntityView<'s> {
        match parent_of(&self.scene().read(), self.handle()) {
            Some(parent) => EntityView::new(parent, self.scene()),
            None => EntityView::null(self.scene()),
        }
    }

    /// Raw parent UUID (nil for roots)
    ///
    /// # Panics
    ///
    /// Panics if the entity is dead or has no [`RelationshipComponent`].
    pub fn parent_uuid(&self) -> Uuid {
        self.try_parent_uuid().unwrap_or_else(|e| panic!("{}", e))
    }

    /// Raw parent UUID, or why it is unavailable
    pub fn try_parent_uuid(&self) -> Result<Uuid> {
        Ok(self.relationship()?.parent)
    }

    /// Child UUIDs in order
    ///
    /// # Panics
    ///
    /// Panics if the entity is dead or has no [`RelationshipComponent`].
    pub fn children(&self) -> Vec<Uuid> {
        self.component::<RelationshipComponent>().children.clone()
    }

    /// The backing children list, for in-place edits.
    ///
    /// Edits here do not touch the children's `parent` fields.
    ///
    /// # Panics
    ///
    /// Panics if the entity is dead or has no [`RelationshipComponent`].
    pub fn children_mut(&self) -> parking_lot::MappedRwLockWriteGuard<'s, Vec<Uuid>> {
        parking_lot::MappedRwLockWriteGuard::map(self.component_mut::<RelationshipComponent>(), |rel| {
            &mut rel.children
        })
    }

    /// Live children as views, skipping stale UUIDs
    pub fn child_entities(&self) -> Vec<EntityView<'s>> {
        children_of(&self.scene().read(), self.handle())
            .into_iter()
            .map(|child| EntityView::new(child, self.scene()))
            .collect()
    }

    /// Number of listed children (0 without a relationship)
    pub fn child_count(&self) -> usize {
        self.try_component::<RelationshipComponent>()
            .map_or(0, |rel| rel.children.len())
    }

    /// Reparent under `new_parent`; an invalid view makes this entity a root.
    ///
    /// Rejected without side effects when the parent is in another scene,
    /// when it would create a cycle, or when it would exceed the configured
    /// hierarchy depth.
    pub fn set_parent(&self, new_parent: EntityView<'_>) -> std::result::Result<(), HierarchyError> {
        let scene = self.scene();
        if new_parent.scene().id() != scene.id() {
            return Err(HierarchyError::CrossScene {
                child: self.handle(),
                parent: new_parent.handle(),
            });
        }

        let mut state = scene.write();
        let parent = Some(new_parent.handle()).filter(|&p| state.world.is_alive(p));
        set_parent(&mut state, scene.config().max_hierarchy_depth, self.handle(), parent)?;
        scene.after_mutation(&state);
        Ok(())
    }

    /// Detach from the parent, becoming a root
    pub fn unparent(&self) -> std::result::Result<(), HierarchyError> {
        self.set_parent(EntityView::null(self.scene()))
    }

    /// Remove `child` from this entity's children list.
    ///
    /// Returns whether it was listed. The child's own `parent` is left as is.
    pub fn remove_child(&self, child: EntityView<'_>) -> bool {
        if child.scene().id() != self.scene().id() {
            return false;
        }

        let mut state = self.scene().write();
        let Some(child_uuid) = state.uuid_of(child.handle()) else {
            return false;
        };
        let removed = remove_child(&mut state, self.handle(), child_uuid);
        if removed {
            self.scene().after_mutation(&state);
        }
        removed
    }

    /// Check if `candidate` is somewhere below this entity
    pub fn is_ancestor_of(&self, candidate: EntityView<'_>) -> bool {
        if candidate.scene().id() != self.scene().id() {
            return false;
        }
        is_ancestor_of(&self.scene().read(), self.handle(), candidate.handle())
    }

    /// Check if this entity is somewhere below `candidate`
    pub fn is_descendant_of(&self, candidate: EntityView<'_>) -> bool {
        candidate.is_ancestor_of(*self)
    }

    /// Topmost ancestor (self for roots)
    pub fn root(&self) -> EntityView<'s> {
        self.ancestors().last().copied().unwrap_or(*self)
    }

    /// Parents, nearest first
    pub fn ancestors(&self) -> Vec<EntityView<'s>> {
        let scene = self.scene();
        ancestors(&scene.read(), self.handle(), scene.config().max_hierarchy_depth)
            .into_iter()
            .map(|entity| EntityView::new(entity, scene))
            .collect()
    }

    /// Every entity below this one, depth-first pre-order
    pub fn descendants(&self) -> Vec<EntityView<'s>> {
        let mut out = Vec::new();
        descendants(&self.scene().read(), self.handle(), &mut out);
        out.into_iter()
            .map(|entity| EntityView::new(entity, self.scene()))
            .collect()
    }

    /// Number of ancestors (0 for roots)
    pub fn depth(&self) -> u32 {
        self.ancestors().len() as u32
    }

    /// Check if the entity has no parent
    pub fn is_root(&self) -> bool {
        self.try_component::<RelationshipComponent>()
            .map_or(true, |rel| rel.is_root())
    }

    /// Check if the entity has no children
    pub fn is_leaf(&self) -> bool {
        self.child_count() == 0
    }

    fn relationship(&self) -> Result<RelationshipComponent> {
        let state = self.scene().read();
        if !state.world.is_alive(self.handle()) {
            return Err(SceneError::Ecs(EcsError::EntityNotAlive(self.handle())));
        }
        state
            .relationship(self.handle())
            .cloned()
            .ok_or(SceneError::MissingComponent {
                entity: self.handle(),
                component: "RelationshipComponent",
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use crate::scene::Scene;

    #[test]
    fn test_set_parent_links_both_sides() {
        let scene = Scene::new("test");
        let parent = scene.create_entity("parent");
        let child = scene.create_entity("child");

        child.set_parent(parent).unwrap();

        assert_eq!(child.parent(), parent);
        assert_eq!(child.parent_uuid(), parent.uuid());
        assert_eq!(parent.children(), vec![child.uuid()]);
        assert!(scene.validate_hierarchy().is_ok());
    }

    #[test]
    fn test_unparent() {
        let scene = Scene::new("test");
        let parent = scene.create_entity("parent");
        let child = scene.create_child_entity(parent, "child").unwrap();

        child.unparent().unwrap();

        assert!(child.is_root());
        assert!(child.parent_uuid().is_nil());
        assert!(parent.is_leaf());
    }

    #[test]
    fn test_reject_descendant_as_parent() {
        let scene = Scene::new("test");
        let a = scene.create_entity("a");
        let b = scene.create_child_entity(a, "b").unwrap();
        let c = scene.create_child_entity(b, "c").unwrap();

        let err = a.set_parent(c).unwrap_err();
        assert_eq!(
            err,
            HierarchyError::CycleDetected {
                entities: vec![a.handle(), c.handle()]
            }
        );
        assert!(a.is_root());
        assert_eq!(b.children(), vec![c.uuid()]);
        assert!(c.is_leaf());
    }

    #[test]
    fn test_cross_scene_rejected() {
        let first = Scene::new("first");
        let second = Scene::new("second");
        let a = first.create_entity("a");
        let b = second.create_entity("b");

        assert!(matches!(a.set_parent(b), Err(HierarchyError::CrossScene { .. })));
        assert!(!b.is_ancestor_of(a));
        assert!(!b.remove_child(a));
    }

    #[test]
    fn test_depth_limit() {
        let scene = Scene::with_config(SceneConfig {
            max_hierarchy_depth: 2,
            ..SceneConfig::named("shallow")
        });
        let a = scene.create_entity("a");
        let b = scene.create_child_entity(a, "b").unwrap();
        let c = scene.create_child_entity(b, "c").unwrap();
        let d = scene.create_entity("d");

        assert_eq!(c.depth(), 2);
        assert_eq!(
            d.set_parent(c),
            Err(HierarchyError::DepthExceeded { depth: 3, limit: 2 })
        );
        assert!(d.is_root());

        // Moving a subtree counts its height too
        let e = scene.create_entity("e");
        scene.create_child_entity(e, "f").unwrap();
        assert!(matches!(
            e.set_parent(b),
            Err(HierarchyError::DepthExceeded { depth: 3, .. })
        ));
    }

    #[test]
    fn test_dead_child_rejected() {
        let scene = Scene::new("test");
        let a = scene.create_entity("a");
        let b = scene.create_entity("b");
        scene.destroy_entity(a, false);

        assert_eq!(
            a.set_parent(b),
            Err(HierarchyError::EntityNotFound { entity: a.handle() })
        );
    }

    #[test]
    fn test_missing_relationship() {
        let scene = Scene::new("test");
        let a = scene.create_entity("a");
        let b = scene.create_entity("b");
        a.remove_component::<RelationshipComponent>();

        assert!(!a.parent().is_valid());
        assert!(a.is_root());
        assert_eq!(a.child_count(), 0);
        assert!(matches!(
            a.try_parent_uuid(),
            Err(SceneError::MissingComponent { component: "RelationshipComponent", .. })
        ));
        assert_eq!(
            a.set_parent(b),
            Err(HierarchyError::MissingRelationship { entity: a.handle() })
        );
        assert_eq!(
            b.set_parent(a),
            Err(HierarchyError::MissingRelationship { entity: a.handle() })
        );
    }

    #[test]
    #[should_panic(expected = "has no RelationshipComponent")]
    fn test_parent_uuid_panics_without_relationship() {
        let scene = Scene::new("test");
        let a = scene.create_entity("a");
        a.remove_component::<RelationshipComponent>();
        a.parent_uuid();
    }

    #[test]
    fn test_queries() {
        let scene = Scene::new("test");
        let root = scene.create_entity("root");
        let a = scene.create_child_entity(root, "a").unwrap();
        let a1 = scene.create_child_entity(a, "a1").unwrap();
        let b = scene.create_child_entity(root, "b").unwrap();

        assert_eq!(a1.root(), root);
        assert_eq!(root.root(), root);
        assert_eq!(a1.ancestors(), vec![a, root]);
        assert_eq!(root.descendants(), vec![a, a1, b]);
        assert_eq!(root.child_entities(), vec![a, b]);
        assert_eq!(root.child_count(), 2);
        assert_eq!(a1.depth(), 2);
        assert!(a1.is_leaf());
        assert!(!a.is_root());
    }

    #[test]
    fn test_children_mut_edits_backing_list() {
        let scene = Scene::new("test");
        let parent = scene.create_entity("parent");
        let a = scene.create_child_entity(parent, "a").unwrap();
        let b = scene.create_child_entity(parent, "b").unwrap();

        parent.children_mut().reverse();

        assert_eq!(parent.children(), vec![b.uuid(), a.uuid()]);
        assert!(scene.validate_hierarchy().is_ok());
    }

    #[test]
    fn test_validate_reports_one_sided_links() {
        let scene = Scene::new("test");
        let parent = scene.create_entity("parent");
        let child = scene.create_entity("child");
        let (parent_uuid, child_uuid) = (parent.uuid(), child.uuid());

        child.component_mut::<RelationshipComponent>().parent = parent_uuid;
        assert_eq!(
            scene.validate_hierarchy(),
            Err(HierarchyError::ChildNotListed {
                child: child_uuid,
                parent: parent_uuid
            })
        );

        child.component_mut::<RelationshipComponent>().parent = Uuid::NIL;
        parent.children_mut().push(child_uuid);
        assert_eq!(
            scene.validate_hierarchy(),
            Err(HierarchyError::StrayChild {
                parent: parent_uuid,
                child: child_uuid,
                actual: Uuid::NIL
            })
        );
    }

    #[test]
    fn test_validate_reports_dangling_and_duplicates() {
        let scene = Scene::new("test");
        let parent = scene.create_entity("parent");
        let child = scene.create_child_entity(parent, "child").unwrap();
        let child_uuid = child.uuid();
        let ghost = Uuid::new();

        parent.children_mut().push(child_uuid);
        assert!(matches!(
            scene.validate_hierarchy(),
            Err(HierarchyError::DuplicateChild { .. })
        ));

        parent.children_mut().retain(|&c| c != child_uuid);
        parent.children_mut().push(ghost);
        child.unparent().unwrap();
        assert!(matches!(
            scene.validate_hierarchy(),
            Err(HierarchyError::DanglingReference { missing, .. }) if missing == ghost
        ));
    }

    #[test]
    fn test_validate_detects_cycle() {
        let scene = Scene::new("test");
        let a = scene.create_entity("a");
        let b = scene.create_entity("b");
        let (a_uuid, b_uuid) = (a.uuid(), b.uuid());

        // Forge a two-entity loop, bypassing set_parent
        {
            let mut rel = a.component_mut::<RelationshipComponent>();
            rel.parent = b_uuid;
            rel.children = vec![b_uuid];
        }
        {
            let mut rel = b.component_mut::<RelationshipComponent>();
            rel.parent = a_uuid;
            rel.children = vec![a_uuid];
        }

        assert!(matches!(
            scene.validate_hierarchy(),
            Err(HierarchyError::CycleDetected { entities }) if entities.len() == 2
        ));
    }
}
