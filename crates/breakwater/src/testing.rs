// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Storage doubles for testing code that uses a breaker.
//!
//! - [`MockCounterStore`] is an in-process [`CounterStore`] that stands in for an external
//!   key-value store behind [`SharedStorage`][crate::SharedStorage].
//! - [`FaultyStorage`] wraps any [`Storage`] and fails selected operations on demand.
//!
//! Both record every operation and accept a failure predicate, so error paths can be exercised
//! without a real backend.

use std::collections::HashMap;
use std::sync::Arc;

use ohno::EnrichableExt;
use parking_lot::Mutex;

use crate::{CircuitState, CounterStore, Storage, StorageError};

/// Operation recorded by [`MockCounterStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterOp {
    /// A value was read.
    Get(String),
    /// A value was written.
    Set {
        /// The key that was written.
        key: String,
        /// The value that was written.
        value: String,
    },
    /// A counter was incremented.
    Incr(String),
}

type CounterPredicate = Box<dyn Fn(&CounterOp) -> bool + Send + Sync>;

/// An in-process [`CounterStore`] with failure injection.
///
/// Clones share the same data, so a clone handed to a [`SharedStorage`][crate::SharedStorage]
/// can be inspected and manipulated from the test.
///
/// # Examples
///
/// ```
/// use breakwater::CounterStore;
/// use breakwater::testing::{CounterOp, MockCounterStore};
///
/// let store = MockCounterStore::new();
/// assert_eq!(store.incr("hits").unwrap(), 1);
/// assert_eq!(store.value("hits").as_deref(), Some("1"));
///
/// store.fail_when(|op| matches!(op, CounterOp::Incr(_)));
/// assert!(store.incr("hits").is_err());
/// ```
#[derive(Clone, Default)]
pub struct MockCounterStore {
    data: Arc<Mutex<HashMap<String, String>>>,
    operations: Arc<Mutex<Vec<CounterOp>>>,
    fail_when: Arc<Mutex<Option<CounterPredicate>>>,
}

impl std::fmt::Debug for MockCounterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCounterStore")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl MockCounterStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw value stored under `key`, bypassing recording and failure injection.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<String> {
        self.data.lock().get(key).cloned()
    }

    /// Sets a predicate that decides which operations fail.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&CounterOp) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Removes the failure predicate, letting all operations succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<CounterOp> {
        self.operations.lock().clone()
    }

    /// Forgets all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn admit(&self, op: CounterOp, message: &'static str) -> Result<(), StorageError> {
        let fail = self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(&op));
        self.operations.lock().push(op);

        if fail { Err(StorageError::backend(message)) } else { Ok(()) }
    }
}

impl CounterStore for MockCounterStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.admit(CounterOp::Get(key.to_owned()), "mock: get failed")?;
        Ok(self.data.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.admit(
            CounterOp::Set {
                key: key.to_owned(),
                value: value.to_owned(),
            },
            "mock: set failed",
        )?;
        self.data.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn incr(&self, key: &str) -> Result<i64, StorageError> {
        self.admit(CounterOp::Incr(key.to_owned()), "mock: incr failed")?;

        let mut data = self.data.lock();
        let current = match data.get(key) {
            Some(value) => value
                .parse::<i64>()
                .map_err(|e| StorageError::conversion(e).enrich("mock: value is not an integer or out of range"))?,
            None => 0,
        };
        let next = current.saturating_add(1);
        data.insert(key.to_owned(), next.to_string());

        Ok(next)
    }
}

/// Operation recorded by [`FaultyStorage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOp {
    /// [`Storage::current_state`] was called.
    CurrentState,
    /// [`Storage::set_current_state`] was called with the given state.
    SetCurrentState(CircuitState),
    /// [`Storage::increment_failures`] was called.
    IncrementFailures,
    /// [`Storage::failure_count`] was called.
    FailureCount,
    /// [`Storage::clear`] was called.
    Clear,
}

type StoragePredicate = Box<dyn Fn(StorageOp) -> bool + Send + Sync>;

/// Wraps a [`Storage`] and fails selected operations on demand.
///
/// A failed operation is not forwarded to the inner storage.
///
/// # Examples
///
/// ```
/// use breakwater::testing::{FaultyStorage, StorageOp};
/// use breakwater::{MemoryStorage, Storage};
///
/// let storage = FaultyStorage::new(MemoryStorage::new());
/// storage.fail_when(|op| op == StorageOp::FailureCount);
///
/// assert!(storage.failure_count().is_err());
/// assert!(storage.increment_failures().is_ok());
/// ```
pub struct FaultyStorage<S> {
    inner: S,
    operations: Mutex<Vec<StorageOp>>,
    fail_when: Mutex<Option<StoragePredicate>>,
}

impl<S: std::fmt::Debug> std::fmt::Debug for FaultyStorage<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaultyStorage")
            .field("inner", &self.inner)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl<S> FaultyStorage<S> {
    /// Wraps `inner`; all operations succeed until a predicate is set.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            operations: Mutex::new(Vec::new()),
            fail_when: Mutex::new(None),
        }
    }

    /// Returns the wrapped storage.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Sets a predicate that decides which operations fail.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(StorageOp) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Removes the failure predicate, letting all operations succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<StorageOp> {
        self.operations.lock().clone()
    }

    /// Forgets all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn admit(&self, op: StorageOp) -> Result<(), StorageError> {
        let fail = self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(op));
        self.operations.lock().push(op);

        if fail {
            Err(StorageError::backend("storage not available"))
        } else {
            Ok(())
        }
    }
}

impl<S: Storage> Storage for FaultyStorage<S> {
    fn current_state(&self) -> Result<CircuitState, StorageError> {
        self.admit(StorageOp::CurrentState)?;
        self.inner.current_state()
    }

    fn set_current_state(&self, state: CircuitState) -> Result<(), StorageError> {
        self.admit(StorageOp::SetCurrentState(state))?;
        self.inner.set_current_state(state)
    }

    fn increment_failures(&self) -> Result<(), StorageError> {
        self.admit(StorageOp::IncrementFailures)?;
        self.inner.increment_failures()
    }

    fn failure_count(&self) -> Result<u64, StorageError> {
        self.admit(StorageOp::FailureCount)?;
        self.inner.failure_count()
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.admit(StorageOp::Clear)?;
        self.inner.clear()
    }
}
