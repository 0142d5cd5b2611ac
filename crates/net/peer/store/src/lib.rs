//! Peer address persistence with generic versioned record storage.
//!
//! Records are keyed by identifier and carry a monotonically increasing
//! version (the address nonce). A store keeps exactly one record per
//! identifier: the one with the highest version seen, regardless of the order
//! in which records arrive.

mod memory;

pub use memory::MemoryAddressStore;

use std::fmt::Debug;
use std::hash::Hash;

use auto_impl::auto_impl;

/// A record that can be superseded by a newer version of itself.
pub trait VersionedRecord: Clone + PartialEq + Send + Sync + 'static {
    type Id: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    fn record_id(&self) -> &Self::Id;

    /// Monotonic version; higher wins.
    fn version(&self) -> u64;

    /// Whether the record may enter a store at all.
    fn is_valid(&self) -> bool {
        true
    }
}

/// What happened to a record offered to [`AddressStore::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum InsertOutcome {
    /// No record was known for the identifier.
    Inserted,
    /// Replaced a record with a lower version.
    Superseded { previous: u64 },
    /// The identical record is already stored.
    Unchanged,
    /// A record with an equal or higher version is already stored; nothing changed.
    Stale { current: u64 },
}

impl InsertOutcome {
    /// True if the offered record is now the stored one.
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::Stale { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record is invalid and cannot be stored")]
    InvalidRecord,
    #[error("storage error: {0}")]
    Storage(String),
}

/// Address store with auto-impl for &, Box, Arc.
///
/// Implementations must make `insert` linearizable per identifier: two
/// concurrent inserts for the same identifier end with the higher version
/// stored. Records for different identifiers are independent.
#[auto_impl(&, Box, Arc)]
pub trait AddressStore<R: VersionedRecord>: Send + Sync {
    fn get(&self, id: &R::Id) -> Result<Option<R>, StoreError>;

    /// Insert `record` unless a record with an equal or higher version exists.
    fn insert(&self, record: R) -> Result<InsertOutcome, StoreError>;

    fn all(&self) -> Result<Vec<R>, StoreError>;

    fn remove(&self, id: &R::Id) -> Result<Option<R>, StoreError>;

    fn len(&self) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn contains(&self, id: &R::Id) -> Result<bool, StoreError> {
        Ok(self.get(id)?.is_some())
    }
}
