//! In-memory address store (does not persist across restarts).

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::trace;

use crate::{AddressStore, InsertOutcome, StoreError, VersionedRecord};

/// In-memory store; each identifier is updated under its own shard lock.
#[derive(Debug)]
pub struct MemoryAddressStore<R: VersionedRecord> {
    records: DashMap<R::Id, R>,
}

impl<R: VersionedRecord> Default for MemoryAddressStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: VersionedRecord> MemoryAddressStore<R> {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }
}

impl<R: VersionedRecord> AddressStore<R> for MemoryAddressStore<R> {
    fn get(&self, id: &R::Id) -> Result<Option<R>, StoreError> {
        Ok(self.records.get(id).map(|entry| entry.value().clone()))
    }

    fn insert(&self, record: R) -> Result<InsertOutcome, StoreError> {
        if !record.is_valid() {
            return Err(StoreError::InvalidRecord);
        }

        let outcome = match self.records.entry(record.record_id().clone()) {
            Entry::Vacant(entry) => {
                entry.insert(record);
                InsertOutcome::Inserted
            }
            Entry::Occupied(mut entry) => {
                let current = entry.get().version();
                if record.version() > current {
                    entry.insert(record);
                    InsertOutcome::Superseded { previous: current }
                } else if record.version() == current && entry.get() == &record {
                    InsertOutcome::Unchanged
                } else {
                    InsertOutcome::Stale { current }
                }
            }
        };

        trace!(%outcome, "address store insert");
        Ok(outcome)
    }

    fn all(&self) -> Result<Vec<R>, StoreError> {
        Ok(self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    fn remove(&self, id: &R::Id) -> Result<Option<R>, StoreError> {
        Ok(self.records.remove(id).map(|(_, record)| record))
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.records.len())
    }
}
