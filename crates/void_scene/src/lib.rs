//! # void_scene - Scene Graph
//!
//! Hierarchical entity graph layered on the `void_ecs` component store:
//! - **Scenes** own a [`World`](void_ecs::World) and an [`IdentityResolver`]
//! - **Entity views** are copyable, non-owning accessors compared by
//!   handle and scene
//! - **Relationships** link entities by persistent [`Uuid`], so links survive
//!   handle reuse and save/load
//! - **Graph operations** keep both sides of every link consistent and
//!   reject cycles
//!
//! ## Example
//!
//! ```ignore
//! use void_scene::prelude::*;
//!
//! let scene = Scene::new("Level 1");
//! let player = scene.create_entity("Player");
//! let weapon = scene.create_entity("Weapon");
//!
//! weapon.set_parent(player)?;
//! assert_eq!(player.children(), vec![weapon.uuid()]);
//! assert!(player.is_ancestor_of(weapon));
//!
//! // Cycles are rejected before anything changes
//! assert!(player.set_parent(weapon).is_err());
//! ```

pub mod components;
pub mod config;
pub mod error;
mod hierarchy;
pub mod resolver;
pub mod scene;
pub mod view;

pub use components::{IdComponent, RelationshipComponent, TagComponent, TransformComponent};
pub use config::{ConfigError, SceneConfig};
pub use error::{HierarchyError, Result, SceneError};
pub use resolver::IdentityResolver;
pub use scene::{Scene, SceneId};
pub use view::EntityView;

pub use void_core::Uuid;

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::components::{IdComponent, RelationshipComponent, TagComponent, TransformComponent};
    pub use crate::config::SceneConfig;
    pub use crate::error::{HierarchyError, SceneError};
    pub use crate::scene::Scene;
    pub use crate::view::EntityView;
    pub use void_core::Uuid;
}
