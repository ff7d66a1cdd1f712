// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Tests against a real Redis server.
//!
//! Run with `REDIS_URL=redis://127.0.0.1/ cargo test -p breakwater_redis -- --ignored`.

use breakwater::{Breaker, BreakerId, BreakerOptions, CircuitOpen, CircuitState, Storage};
use breakwater_redis::{RedisCounterStore, redis_storage};
use tick::Clock;

fn connect() -> RedisCounterStore {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string());
    RedisCounterStore::open(&url).unwrap()
}

#[test]
#[ignore = "requires a running Redis server"]
fn record_is_shared_between_connections() {
    let id = BreakerId::random();
    let first = redis_storage(connect(), id.clone());
    let second = redis_storage(connect(), id);

    first.increment_failures().unwrap();
    second.increment_failures().unwrap();
    second.set_current_state(CircuitState::HalfOpen).unwrap();

    assert_eq!(first.failure_count().unwrap(), 2);
    assert_eq!(first.current_state().unwrap(), CircuitState::HalfOpen);
}

#[test]
#[ignore = "requires a running Redis server"]
fn breakers_trip_together() {
    let id = BreakerId::random();
    let options = BreakerOptions::default().max_failures(2);
    let clock = Clock::new_frozen();
    let (first, _) = Breaker::new(redis_storage(connect(), id.clone()), options, &clock);
    let (second, _) = Breaker::new(redis_storage(connect(), id.clone()), options, &clock);

    first.report_failure().unwrap();
    second.report_failure().unwrap();
    assert_eq!(first.request_admission().unwrap_err(), CircuitOpen);

    let (late, error) = Breaker::new(redis_storage(connect(), id), options, &clock);
    assert!(error.is_none());
    assert_eq!(late.state(), CircuitState::Open);
}
