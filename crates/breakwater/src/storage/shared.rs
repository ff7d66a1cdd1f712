// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;

use ohno::EnrichableExt;

use crate::constants::{FAILURES_KEY_SUFFIX, STATE_KEY_SUFFIX};
use crate::{BreakerId, CircuitState, Storage, StorageError};

/// The external key-value store behind a [`SharedStorage`].
///
/// Implement this for the client of whatever store your processes share (Redis, a database
/// table, ...). Values are plain strings; `incr` must be the store's own atomic increment so that
/// concurrent callers in different processes never lose updates.
///
/// A key that does not exist reads as `None` from [`get`](Self::get) and as `0` before
/// [`incr`](Self::incr) applies.
pub trait CounterStore: Send + Sync {
    /// Reads the value of `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes `value` to `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Atomically increments the integer stored at `key` and returns the new value.
    fn incr(&self, key: &str) -> Result<i64, StorageError>;
}

impl<T: CounterStore + ?Sized> CounterStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn incr(&self, key: &str) -> Result<i64, StorageError> {
        (**self).incr(key)
    }
}

impl<T: CounterStore + ?Sized> CounterStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn incr(&self, key: &str) -> Result<i64, StorageError> {
        (**self).incr(key)
    }
}

/// Keeps the breaker record in an external store shared by several processes.
///
/// Each breaker identifier maps to two keys: `"{id}_STATE"` holds the state tag
/// (`"closed"`, `"open"` or `"half-open"`) and `"{id}_FAILURES"` holds the failure count.
/// Failures are counted with the store's atomic increment.
///
/// Only the state tag is shared, not the open-state deadline: every breaker that observes the
/// circuit as open times its own cooldown. Writes of the state tag are last-writer-wins, so other
/// instances see a transition eventually rather than immediately.
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "test-util")]
/// # {
/// use std::sync::Arc;
///
/// use breakwater::testing::MockCounterStore;
/// use breakwater::{CircuitState, SharedStorage, Storage};
///
/// let store = Arc::new(MockCounterStore::new());
///
/// // Two instances sharing one record.
/// let first = SharedStorage::new(Arc::clone(&store), "inventory");
/// let second = SharedStorage::new(Arc::clone(&store), "inventory");
///
/// first.increment_failures().unwrap();
/// second.increment_failures().unwrap();
/// first.set_current_state(CircuitState::Open).unwrap();
///
/// assert_eq!(second.failure_count().unwrap(), 2);
/// assert_eq!(second.current_state().unwrap(), CircuitState::Open);
/// # }
/// ```
#[derive(Debug)]
pub struct SharedStorage<C> {
    store: C,
    id: BreakerId,
    state_key: String,
    failures_key: String,
}

impl<C> SharedStorage<C> {
    /// Creates a storage for the breaker record identified by `id`.
    pub fn new(store: C, id: impl Into<BreakerId>) -> Self {
        let id = id.into();

        Self {
            store,
            state_key: id.key(STATE_KEY_SUFFIX),
            failures_key: id.key(FAILURES_KEY_SUFFIX),
            id,
        }
    }

    /// Creates a storage under a fresh random identifier.
    ///
    /// The record is not shared with anyone until the identifier is handed to other instances.
    pub fn with_random_id(store: C) -> Self {
        Self::new(store, BreakerId::random())
    }

    /// Returns the identifier of the breaker record.
    #[must_use]
    pub fn id(&self) -> &BreakerId {
        &self.id
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &C {
        &self.store
    }
}

impl<C: CounterStore> Storage for SharedStorage<C> {
    fn current_state(&self) -> Result<CircuitState, StorageError> {
        match self.store.get(&self.state_key) {
            Ok(None) => Ok(CircuitState::Closed),
            Ok(Some(value)) => value
                .parse()
                .map_err(|e| StorageError::conversion(e).enrich("SharedStorage::current_state -> conversion")),
            Err(e) => Err(e.enrich("SharedStorage::current_state")),
        }
    }

    fn set_current_state(&self, state: CircuitState) -> Result<(), StorageError> {
        self.store
            .set(&self.state_key, state.as_str())
            .map_err(|e| e.enrich("SharedStorage::set_current_state"))
    }

    fn increment_failures(&self) -> Result<(), StorageError> {
        self.store
            .incr(&self.failures_key)
            .map(drop)
            .map_err(|e| e.enrich("SharedStorage::increment_failures"))
    }

    fn failure_count(&self) -> Result<u64, StorageError> {
        match self.store.get(&self.failures_key) {
            Ok(None) => Ok(0),
            Ok(Some(value)) => value
                .trim()
                .parse::<u64>()
                .map_err(|e| StorageError::conversion(e).enrich("SharedStorage::failure_count -> conversion")),
            Err(e) => Err(e.enrich("SharedStorage::failure_count")),
        }
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.store.set(&self.failures_key, "0").map_err(|e| e.enrich("SharedStorage::clear"))
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use rstest::rstest;
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::testing::{CounterOp, MockCounterStore};

    assert_impl_all!(SharedStorage<MockCounterStore>: Send, Sync, Storage);

    fn storage() -> SharedStorage<MockCounterStore> {
        SharedStorage::new(MockCounterStore::new(), "orders")
    }

    #[test]
    fn keys_follow_identifier() {
        let storage = storage();

        storage.set_current_state(CircuitState::Open).unwrap();
        storage.increment_failures().unwrap();

        assert_eq!(storage.store().value("orders_STATE").as_deref(), Some("open"));
        assert_eq!(storage.store().value("orders_FAILURES").as_deref(), Some("1"));
    }

    #[test]
    fn missing_keys_read_as_defaults() {
        let storage = storage();

        assert_eq!(storage.current_state().unwrap(), CircuitState::Closed);
        assert_eq!(storage.failure_count().unwrap(), 0);
    }

    #[rstest]
    #[case(CircuitState::Closed)]
    #[case(CircuitState::Open)]
    #[case(CircuitState::HalfOpen)]
    fn state_round_trips(#[case] state: CircuitState) {
        let storage = storage();

        storage.set_current_state(state).unwrap();

        assert_eq!(storage.current_state().unwrap(), state);
    }

    #[test]
    fn increment_uses_atomic_incr() {
        let storage = storage();

        storage.increment_failures().unwrap();

        assert_eq!(storage.store().operations(), vec![CounterOp::Incr("orders_FAILURES".to_string())]);
    }

    #[test]
    fn clear_writes_zero_and_keeps_state() {
        let storage = storage();
        storage.set_current_state(CircuitState::HalfOpen).unwrap();
        storage.increment_failures().unwrap();

        storage.clear().unwrap();

        assert_eq!(storage.failure_count().unwrap(), 0);
        assert_eq!(storage.current_state().unwrap(), CircuitState::HalfOpen);
    }

    #[test]
    fn get_failure_is_enriched_with_operation() {
        let storage = storage();
        storage.store().fail_when(|op| matches!(op, CounterOp::Get(_)));

        let error = storage.failure_count().unwrap_err();
        assert!(error.to_string().contains("SharedStorage::failure_count"), "got: {error}");

        let error = storage.current_state().unwrap_err();
        assert!(error.to_string().contains("SharedStorage::current_state"), "got: {error}");
    }

    #[test]
    fn write_failures_are_enriched_with_operation() {
        let storage = storage();
        storage.store().fail_when(|_| true);

        let error = storage.set_current_state(CircuitState::Open).unwrap_err();
        assert!(error.to_string().contains("SharedStorage::set_current_state"), "got: {error}");

        let error = storage.increment_failures().unwrap_err();
        assert!(error.to_string().contains("SharedStorage::increment_failures"), "got: {error}");

        let error = storage.clear().unwrap_err();
        assert!(error.to_string().contains("SharedStorage::clear"), "got: {error}");
    }

    #[test]
    fn malformed_counter_is_conversion_failure() {
        let storage = storage();
        storage.store().set("orders_FAILURES", "INVALID INTEGER VALUE").unwrap();

        let error = storage.failure_count().unwrap_err();

        assert!(error.to_string().contains("SharedStorage::failure_count -> conversion"), "got: {error}");
    }

    #[test]
    fn negative_counter_is_conversion_failure() {
        let storage = storage();
        storage.store().set("orders_FAILURES", "-3").unwrap();

        assert!(storage.failure_count().is_err());
    }

    #[test]
    fn unknown_state_tag_is_conversion_failure() {
        let storage = storage();
        storage.store().set("orders_STATE", "tripped").unwrap();

        let error = storage.current_state().unwrap_err();

        assert!(error.to_string().contains("unknown circuit state `tripped`"), "got: {error}");
    }

    #[test]
    fn distinct_identifiers_do_not_interfere() {
        let store = Arc::new(MockCounterStore::new());
        let orders = SharedStorage::new(Arc::clone(&store), "orders");
        let billing = SharedStorage::new(Arc::clone(&store), "billing");

        orders.increment_failures().unwrap();
        orders.set_current_state(CircuitState::Open).unwrap();

        assert_eq!(billing.failure_count().unwrap(), 0);
        assert_eq!(billing.current_state().unwrap(), CircuitState::Closed);
    }

    #[test]
    fn random_identifier_is_exposed() {
        let storage = SharedStorage::with_random_id(MockCounterStore::new());

        storage.increment_failures().unwrap();

        let key = format!("{}_FAILURES", storage.id());
        assert_eq!(storage.store().value(&key).as_deref(), Some("1"));
    }
}
