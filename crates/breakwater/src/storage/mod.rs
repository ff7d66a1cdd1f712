// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Persistence of the circuit state and the failure count.
//!
//! The breaker never keeps counters itself. Everything that must survive between calls, or be
//! shared between breakers, goes through a [`Storage`] backend:
//!
//! - [`MemoryStorage`] keeps the record in process memory. Use it when a single breaker instance
//!   guards the operation.
//! - [`SharedStorage`] keeps the record in an external key-value store reached through a
//!   [`CounterStore`], so that several processes can trip and recover together.
//!
//! # Contract
//!
//! All operations are synchronous and may block for as long as the backend does. A key that has
//! never been written is not an error: [`Storage::current_state`] reads it as
//! [`CircuitState::Closed`] and [`Storage::failure_count`] as `0`. Any real failure is returned as a
//! [`StorageError`] enriched with the operation name; the breaker then falls back to the same
//! defaults, so all backends degrade the same way.
//!
//! [`Storage::increment_failures`] must be atomic with respect to every other caller that shares
//! the record.

use std::sync::Arc;

use crate::{CircuitState, StorageError};

mod memory;
mod shared;

pub use memory::MemoryStorage;
pub use shared::{CounterStore, SharedStorage};

/// A backend that persists the circuit state tag and the failure count of a breaker.
///
/// # Examples
///
/// ```
/// use breakwater::{CircuitState, MemoryStorage, Storage};
///
/// let storage = MemoryStorage::new();
/// storage.increment_failures()?;
/// storage.set_current_state(CircuitState::Open)?;
///
/// assert_eq!(storage.failure_count()?, 1);
/// assert_eq!(storage.current_state()?, CircuitState::Open);
///
/// storage.clear()?;
/// assert_eq!(storage.failure_count()?, 0);
/// assert_eq!(storage.current_state()?, CircuitState::Open);
/// # Ok::<(), breakwater::StorageError>(())
/// ```
pub trait Storage: Send + Sync {
    /// Returns the persisted circuit state, [`CircuitState::Closed`] if none was persisted yet.
    fn current_state(&self) -> Result<CircuitState, StorageError>;

    /// Persists the circuit state.
    fn set_current_state(&self, state: CircuitState) -> Result<(), StorageError>;

    /// Atomically increments the failure count by one.
    fn increment_failures(&self) -> Result<(), StorageError>;

    /// Returns the failure count, `0` if none was persisted yet.
    fn failure_count(&self) -> Result<u64, StorageError>;

    /// Resets the failure count to zero. The circuit state is left untouched.
    fn clear(&self) -> Result<(), StorageError>;
}

impl<T: Storage + ?Sized> Storage for Arc<T> {
    fn current_state(&self) -> Result<CircuitState, StorageError> {
        (**self).current_state()
    }

    fn set_current_state(&self, state: CircuitState) -> Result<(), StorageError> {
        (**self).set_current_state(state)
    }

    fn increment_failures(&self) -> Result<(), StorageError> {
        (**self).increment_failures()
    }

    fn failure_count(&self) -> Result<u64, StorageError> {
        (**self).failure_count()
    }

    fn clear(&self) -> Result<(), StorageError> {
        (**self).clear()
    }
}

impl<T: Storage + ?Sized> Storage for &T {
    fn current_state(&self) -> Result<CircuitState, StorageError> {
        (**self).current_state()
    }

    fn set_current_state(&self, state: CircuitState) -> Result<(), StorageError> {
        (**self).set_current_state(state)
    }

    fn increment_failures(&self) -> Result<(), StorageError> {
        (**self).increment_failures()
    }

    fn failure_count(&self) -> Result<u64, StorageError> {
        (**self).failure_count()
    }

    fn clear(&self) -> Result<(), StorageError> {
        (**self).clear()
    }
}
