//! Persistent entity identity
//!
//! A [`Uuid`] is stable across save/load and handle reallocation. Runtime
//! handles are scene-local and die with the process; anything that must
//! outlive them (parent/child links, cross-entity references) stores a `Uuid`.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// 128-bit universally unique identifier.
///
/// The all-zero value [`Uuid::NIL`] is reserved as the "no entity" sentinel
/// and is never produced by [`Uuid::new`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uuid(::uuid::Uuid);

impl Uuid {
    /// The sentinel: no parent / root / unresolvable
    pub const NIL: Self = Self(::uuid::Uuid::nil());

    /// Generate a new random (version 4) identifier
    pub fn new() -> Self {
        loop {
            let id = ::uuid::Uuid::new_v4();
            if !id.is_nil() {
                return Self(id);
            }
        }
    }

    /// Create from a raw 128-bit value
    #[inline]
    pub const fn from_u128(value: u128) -> Self {
        Self(::uuid::Uuid::from_u128(value))
    }

    /// Get the raw 128-bit value
    #[inline]
    pub const fn as_u128(&self) -> u128 {
        self.0.as_u128()
    }

    /// Check if this is the sentinel
    #[inline]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Parse from the hyphenated or simple textual form
    pub fn parse(s: &str) -> Result<Self, Error> {
        ::uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| Error::InvalidUuid(e.to_string().into()))
    }

    /// Borrow the underlying `uuid::Uuid`
    #[inline]
    pub fn as_uuid(&self) -> &::uuid::Uuid {
        &self.0
    }
}

impl Default for Uuid {
    /// Defaults to the sentinel, not a fresh identifier
    fn default() -> Self {
        Self::NIL
    }
}

impl From<::uuid::Uuid> for Uuid {
    fn from(id: ::uuid::Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for Uuid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nil() {
            write!(f, "Uuid(nil)")
        } else {
            write!(f, "Uuid({})", self.0)
        }
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
