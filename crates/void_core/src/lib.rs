//! # void_core - Void Engine Core
//!
//! Foundational primitives shared by the ECS and scene crates:
//! - **Identity**: [`Uuid`], the persistent identifier that survives
//!   serialization and handle reallocation
//! - **Errors**: the core [`Error`] type and [`Result`] alias
//! - **Hot-reload**: [`HotReloadSnapshot`] and the [`HotReloadable`] trait used
//!   to carry component state across a reload bit-for-bit

pub mod error;
pub mod hot_reload;
pub mod identity;

pub use error::{Error, Result};
pub use hot_reload::{HotReloadSnapshot, HotReloadable};
pub use identity::Uuid;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::hot_reload::{HotReloadSnapshot, HotReloadable};
    pub use crate::identity::Uuid;
}
