// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A storage-backed circuit breaker.
//!
//! A [`Breaker`] watches the outcomes of an unreliable operation, such as a call to a remote
//! service, and stops admitting calls once too many of them have failed. After a cooldown it lets
//! probe calls through and closes again when they succeed.
//!
//! The breaker keeps no counters of its own. The circuit state tag and the failure count live in
//! a [`Storage`] backend, which makes it possible to share one breaker record between processes:
//!
//! - [`MemoryStorage`]: an in-process record for a single breaker.
//! - [`SharedStorage`]: a record in an external key-value store reached through a
//!   [`CounterStore`]. The `breakwater_redis` crate provides a Redis-backed counter store.
//!
//! # Usage
//!
//! ```
//! use std::time::Duration;
//!
//! use breakwater::{Breaker, BreakerOptions, MemoryStorage};
//! use tick::Clock;
//!
//! # fn call_remote_service() -> Result<(), std::io::Error> { Ok(()) }
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), breakwater::StorageError> {
//! // The clock must advance in real time, or an open circuit never recovers.
//! let clock = Clock::new_tokio();
//! let options = BreakerOptions::default()
//!     .max_failures(5)
//!     .open_cooldown(Duration::from_secs(30));
//! let (breaker, _) = Breaker::new(MemoryStorage::new(), options, &clock);
//!
//! match breaker.request_admission() {
//!     Ok(_admission) => match call_remote_service() {
//!         Ok(()) => breaker.report_success()?,
//!         Err(_) => breaker.report_failure()?,
//!     },
//!     Err(open) => println!("skipping the call: {open}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Degraded Storage
//!
//! A breaker never refuses to decide because its storage is unavailable. A state that cannot be
//! read is treated as closed and a failure count that cannot be read as zero, so a broken
//! backend keeps the circuit closed rather than blocking all traffic. The storage error is still
//! handed back to the caller: next to the breaker from [`Breaker::new`], inside the
//! [`Admission`] from [`Breaker::request_admission`], or as the error of the report methods.
//!
//! # Time
//!
//! Cooldowns are measured with a [`tick::Clock`]. Applications pass a clock that follows real
//! time, such as `Clock::new_tokio()`. Tests control time with `tick::ClockControl` instead of
//! sleeping; `Clock::new_frozen()` never advances and only suits tests that do not wait for a
//! cooldown.
//!
//! # Logging
//!
//! State transitions and swallowed storage errors are emitted as [`tracing`] events:
//!
//! | Event | Level |
//! |---|---|
//! | `breakwater.circuit.opened` | `WARN` |
//! | `breakwater.circuit.half_opened` | `INFO` |
//! | `breakwater.circuit.closed` | `INFO` |
//! | `breakwater.circuit.rejected` | `DEBUG` |
//! | `breakwater.storage.error` | `WARN` |
//!
//! # Features
//!
//! - `serde`: implements `Serialize` and `Deserialize` for [`BreakerOptions`] and
//!   [`CircuitState`].
//! - `test-util`: enables the `testing` module with storage doubles.

mod breaker;
mod breaker_id;
mod constants;
mod error;
mod options;
mod state;
mod storage;
mod variant;

#[cfg(any(feature = "test-util", test))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-util")))]
pub mod testing;

#[doc(inline)]
pub use breaker::{Admission, Breaker};
#[doc(inline)]
pub use breaker_id::BreakerId;
#[doc(inline)]
pub use error::{CircuitOpen, StorageError};
#[doc(inline)]
pub use options::BreakerOptions;
#[doc(inline)]
pub use state::{CircuitState, UnknownStateError};
#[doc(inline)]
pub use storage::{CounterStore, MemoryStorage, SharedStorage, Storage};
