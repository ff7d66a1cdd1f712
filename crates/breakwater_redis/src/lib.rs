// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Redis storage for [`breakwater`] circuit breakers.
//!
//! [`RedisCounterStore`] implements [`CounterStore`] on top of a synchronous Redis connection,
//! so that breakers in several processes can share one record through
//! [`SharedStorage`]. Failures are counted with `INCR`, which Redis applies atomically.
//!
//! # Examples
//!
//! ```no_run
//! use breakwater::{Breaker, BreakerOptions};
//! use breakwater_redis::RedisCounterStore;
//! use tick::Clock;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), breakwater::StorageError> {
//! let store = RedisCounterStore::open("redis://127.0.0.1/")?;
//! let storage = breakwater_redis::redis_storage(store, "inventory-service");
//!
//! let clock = Clock::new_tokio();
//! let (breaker, load_error) = Breaker::new(storage, BreakerOptions::default(), &clock);
//! if let Some(e) = load_error {
//!     eprintln!("breaker state unavailable, starting closed: {e}");
//! }
//!
//! if breaker.request_admission().is_ok() {
//!     // call the inventory service and report the outcome
//!     breaker.report_success()?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Every breaker instance sharing the identifier `"inventory-service"` reads and writes the
//! `inventory-service_STATE` and `inventory-service_FAILURES` keys.

use breakwater::{BreakerId, CounterStore, SharedStorage, StorageError};
use ohno::EnrichableExt;
use parking_lot::Mutex;
use redis::ConnectionLike;

/// Shared breaker storage backed by Redis.
pub type RedisStorage<C = redis::Connection> = SharedStorage<RedisCounterStore<C>>;

/// Creates a shared breaker storage for the record `id` on top of `store`.
pub fn redis_storage<C>(store: RedisCounterStore<C>, id: impl Into<BreakerId>) -> RedisStorage<C> {
    SharedStorage::new(store, id)
}

/// A [`CounterStore`] that talks to Redis.
///
/// The connection is used behind a lock, so one store serves one command at a time. Use one
/// store per breaker, or a multiplexing connection type, if that becomes a bottleneck.
#[derive(Debug)]
pub struct RedisCounterStore<C = redis::Connection> {
    connection: Mutex<C>,
}

impl RedisCounterStore {
    /// Connects to the Redis server at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the server cannot be reached.
    pub fn open(url: &str) -> Result<Self, StorageError> {
        let client = redis::Client::open(url).map_err(|e| StorageError::backend(e).enrich("RedisCounterStore::open"))?;
        let connection = client
            .get_connection()
            .map_err(|e| StorageError::backend(e).enrich("RedisCounterStore::open -> connect"))?;

        Ok(Self::new(connection))
    }
}

impl<C> RedisCounterStore<C> {
    /// Wraps an established connection.
    pub fn new(connection: C) -> Self {
        Self {
            connection: Mutex::new(connection),
        }
    }

    /// Consumes the store, returning the connection.
    pub fn into_inner(self) -> C {
        self.connection.into_inner()
    }
}

impl<C: ConnectionLike + Send> RedisCounterStore<C> {
    fn query<T: redis::FromRedisValue>(&self, cmd: &redis::Cmd, operation: &'static str) -> Result<T, StorageError> {
        let mut connection = self.connection.lock();
        cmd.query(&mut *connection)
            .map_err(|e| StorageError::backend(e).enrich(operation))
    }
}

impl<C: ConnectionLike + Send> CounterStore for RedisCounterStore<C> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.query(redis::cmd("GET").arg(key), "RedisCounterStore::get")
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.query(redis::cmd("SET").arg(key).arg(value), "RedisCounterStore::set")
    }

    fn incr(&self, key: &str) -> Result<i64, StorageError> {
        self.query(redis::cmd("INCR").arg(key), "RedisCounterStore::incr")
    }
}
