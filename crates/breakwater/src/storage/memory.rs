// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use parking_lot::RwLock;

use crate::{CircuitState, Storage, StorageError};

/// Keeps the breaker record in process memory.
///
/// The record is guarded by a single read-write lock and is only reachable through the
/// [`Storage`] methods. This backend never fails.
///
/// Use it when only one process guards the operation. Breakers in other processes cannot see
/// this record; use [`SharedStorage`][crate::SharedStorage] for that.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    record: RwLock<Record>,
}

#[derive(Debug, Default)]
struct Record {
    state: CircuitState,
    failures: u64,
}

impl MemoryStorage {
    /// Creates an empty storage: closed, with no failures.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn current_state(&self) -> Result<CircuitState, StorageError> {
        Ok(self.record.read().state)
    }

    fn set_current_state(&self, state: CircuitState) -> Result<(), StorageError> {
        self.record.write().state = state;
        Ok(())
    }

    fn increment_failures(&self) -> Result<(), StorageError> {
        let mut record = self.record.write();
        record.failures = record.failures.saturating_add(1);
        Ok(())
    }

    fn failure_count(&self) -> Result<u64, StorageError> {
        Ok(self.record.read().failures)
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.record.write().failures = 0;
        Ok(())
    }
}
