//! Hot-reload infrastructure
//!
//! Components that must survive a reload (or a save/load round trip) encode
//! their serde representation into a [`HotReloadSnapshot`]. The encoding is
//! `bincode`, so identifiers such as [`Uuid`](crate::Uuid) come back
//! bit-for-bit identical.

use core::any::TypeId;
use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

/// Snapshot of a hot-reloadable object's state
#[derive(Clone, Debug)]
pub struct HotReloadSnapshot {
    /// Serialized state data
    pub data: Vec<u8>,
    /// Type of the snapshotted object
    pub type_id: TypeId,
    /// Type name for debugging
    pub type_name: String,
    /// Layout revision of the serialized data
    pub format: u32,
    /// Custom metadata
    pub metadata: BTreeMap<String, String>,
}

impl HotReloadSnapshot {
    /// Create a new snapshot from already-encoded data
    pub fn new<T: 'static>(data: Vec<u8>, format: u32) -> Self {
        Self {
            data,
            type_id: TypeId::of::<T>(),
            type_name: core::any::type_name::<T>().into(),
            format,
            metadata: BTreeMap::new(),
        }
    }

    /// Encode `value` into a snapshot
    pub fn encode<T: Serialize + 'static>(value: &T, format: u32) -> Result<Self> {
        let data = bincode::serialize(value).map_err(|e| Error::SnapshotFailed(e.to_string().into()))?;
        Ok(Self::new::<T>(data, format))
    }

    /// Decode the snapshot back into a `T`
    ///
    /// Fails with [`Error::TypeMismatch`] if the snapshot was taken from a
    /// different type.
    pub fn decode<T: DeserializeOwned + 'static>(&self) -> Result<T> {
        if !self.is_type::<T>() {
            return Err(Error::TypeMismatch {
                expected: core::any::type_name::<T>().into(),
                found: self.type_name.as_str().into(),
            });
        }
        bincode::deserialize(&self.data).map_err(|e| Error::RestoreFailed(e.to_string().into()))
    }

    /// Add metadata to the snapshot
    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Check if this snapshot is for a specific type
    pub fn is_type<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

/// Trait for types that can be hot-reloaded
pub trait HotReloadable: Send + Sync {
    /// Create a snapshot of the current state
    fn snapshot(&self) -> Result<HotReloadSnapshot>;

    /// Restore from a snapshot
    fn restore(&mut self, snapshot: HotReloadSnapshot) -> Result<()>;

    /// Check if a snapshot in the given format can be restored
    fn is_compatible(&self, format: u32) -> bool;

    /// Called before reload to prepare
    fn prepare_reload(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called after reload completed
    fn finish_reload(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Counter {
        value: u32,
        label: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Other;

    #[test]
    fn test_encode_decode() {
        let counter = Counter { value: 7, label: "seven".into() };
        let snapshot = HotReloadSnapshot::encode(&counter, 1).unwrap();

        assert!(snapshot.is_type::<Counter>());
        assert_eq!(snapshot.format, 1);
        assert_eq!(snapshot.decode::<Counter>().unwrap(), counter);
    }

    #[test]
    fn test_decode_wrong_type() {
        let snapshot = HotReloadSnapshot::encode(&Other, 1).unwrap();
        let result = snapshot.decode::<Counter>();
        assert!(matches!(result, Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn test_metadata() {
        let snapshot = HotReloadSnapshot::new::<Other>(Vec::new(), 2)
            .with_metadata("scene", "main");
        assert_eq!(snapshot.metadata.get("scene").map(String::as_str), Some("main"));
    }
}
