//! Scene Components
//!
//! The components every scene entity carries:
//!
//! - [`IdComponent`] - persistent [`Uuid`] identity
//! - [`TagComponent`] - human-readable name
//! - [`TransformComponent`] - local TRS transform (relative to the parent)
//! - [`RelationshipComponent`] - parent UUID and ordered child UUIDs
//!
//! Links between entities are stored as UUIDs, never as runtime handles, so
//! they stay valid when the store relocates entities or when a scene is
//! saved and reloaded.
//!
//! # Hot-Swap Support
//!
//! All components are serializable and implement [`HotReloadable`]; their
//! snapshots carry UUIDs bit-for-bit.

use serde::{Deserialize, Serialize};

use void_core::{HotReloadSnapshot, HotReloadable, Result, Uuid};

// ============================================================================
// Identity
// ============================================================================

/// Persistent identity of an entity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdComponent {
    /// The entity's UUID (never nil for a live scene entity)
    pub uuid: Uuid,
}

impl IdComponent {
    /// Create a new IdComponent
    pub fn new(uuid: Uuid) -> Self {
        Self { uuid }
    }
}

// ============================================================================
// Tag
// ============================================================================

/// Display name of an entity
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagComponent {
    /// The name
    pub tag: String,
}

impl TagComponent {
    /// Create a new TagComponent
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

// ============================================================================
// Transform
// ============================================================================

/// Local transform relative to the parent (or the world for roots).
///
/// The transform is applied in TRS order: Translation * Rotation * Scale.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransformComponent {
    /// Translation offset in parent space
    pub translation: [f32; 3],
    /// Rotation quaternion [x, y, z, w] (unit quaternion)
    pub rotation: [f32; 4],
    /// Scale factors
    pub scale: [f32; 3],
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl TransformComponent {
    /// Identity transform (no translation, no rotation, unit scale)
    pub const IDENTITY: Self = Self {
        translation: [0.0, 0.0, 0.0],
        rotation: [0.0, 0.0, 0.0, 1.0],
        scale: [1.0, 1.0, 1.0],
    };

    /// Create from translation only
    pub fn from_translation(translation: [f32; 3]) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Set rotation from quaternion
    pub fn with_rotation(mut self, rotation: [f32; 4]) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set scale
    pub fn with_scale(mut self, scale: [f32; 3]) -> Self {
        self.scale = scale;
        self
    }

    /// Convert to 4x4 column-major transformation matrix
    pub fn to_matrix(&self) -> [[f32; 4]; 4] {
        let [tx, ty, tz] = self.translation;
        let [qx, qy, qz, qw] = self.rotation;
        let [sx, sy, sz] = self.scale;

        let x2 = qx + qx;
        let y2 = qy + qy;
        let z2 = qz + qz;
        let xx = qx * x2;
        let xy = qx * y2;
        let xz = qx * z2;
        let yy = qy * y2;
        let yz = qy * z2;
        let zz = qz * z2;
        let wx = qw * x2;
        let wy = qw * y2;
        let wz = qw * z2;

        [
            [sx * (1.0 - yy - zz), sx * (xy + wz), sx * (xz - wy), 0.0],
            [sy * (xy - wz), sy * (1.0 - xx - zz), sy * (yz + wx), 0.0],
            [sz * (xz + wy), sz * (yz - wx), sz * (1.0 - xx - yy), 0.0],
            [tx, ty, tz, 1.0],
        ]
    }
}

/// 4x4 identity matrix
pub const IDENTITY_MATRIX: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Multiply two column-major matrices: `a * b`
pub fn multiply_matrices(a: &[[f32; 4]; 4], b: &[[f32; 4]; 4]) -> [[f32; 4]; 4] {
    let mut result = [[0.0f32; 4]; 4];

    for col in 0..4 {
        for row in 0..4 {
            result[col][row] = a[0][row] * b[col][0]
                + a[1][row] * b[col][1]
                + a[2][row] * b[col][2]
                + a[3][row] * b[col][3];
        }
    }

    result
}

// ============================================================================
// Relationship
// ============================================================================

/// Parent/child links of one entity.
///
/// `parent` is [`Uuid::NIL`] for roots. `children` holds each child's UUID
/// once, in attachment order.
///
/// **Prefer the hierarchy API** on [`EntityView`](crate::EntityView): it
/// keeps the parent's `children` and the child's `parent` in agreement.
/// Editing one side alone breaks that agreement until the other side is
/// fixed up; [`Scene::validate_hierarchy`](crate::Scene::validate_hierarchy)
/// reports such states.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipComponent {
    /// Parent UUID, or nil for a root
    pub parent: Uuid,
    /// Child UUIDs in attachment order
    pub children: Vec<Uuid>,
}

impl RelationshipComponent {
    /// Create a root relationship with no children
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a relationship under `parent`
    pub fn with_parent(parent: Uuid) -> Self {
        Self {
            parent,
            children: Vec::new(),
        }
    }

    /// Check if this entity has no parent
    pub fn is_root(&self) -> bool {
        self.parent.is_nil()
    }

    /// Check if `child` is listed
    pub fn has_child(&self, child: Uuid) -> bool {
        self.children.contains(&child)
    }

    /// Append `child` unless already listed; returns whether it was added
    pub(crate) fn push_child(&mut self, child: Uuid) -> bool {
        if self.children.contains(&child) {
            return false;
        }
        self.children.push(child);
        true
    }

    /// Remove every occurrence of `child`; returns whether anything was removed
    pub(crate) fn remove_child(&mut self, child: Uuid) -> bool {
        let before = self.children.len();
        self.children.retain(|&c| c != child);
        self.children.len() != before
    }
}

// ============================================================================
// Hot-reload
// ============================================================================

/// Snapshot layout revision shared by the scene components
const COMPONENT_FORMAT: u32 = 1;

macro_rules! impl_hot_reloadable {
    ($($ty:ty),* $(,)?) => {
        $(
            impl HotReloadable for $ty {
                fn snapshot(&self) -> Result<HotReloadSnapshot> {
                    HotReloadSnapshot::encode(self, COMPONENT_FORMAT)
                }

                fn restore(&mut self, snapshot: HotReloadSnapshot) -> Result<()> {
                    if !self.is_compatible(snapshot.format) {
                        return Err(void_core::Error::IncompatibleFormat {
                            found: snapshot.format,
                            supported: COMPONENT_FORMAT,
                        });
                    }
                    *self = snapshot.decode()?;
                    Ok(())
                }

                fn is_compatible(&self, format: u32) -> bool {
                    format == COMPONENT_FORMAT
                }
            }
        )*
    };
}

impl_hot_reloadable!(IdComponent, TagComponent, TransformComponent, RelationshipComponent);
