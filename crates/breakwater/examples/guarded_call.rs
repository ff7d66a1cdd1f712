// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Guards a flaky service with a breaker:
//!
//! 1. The service fails during a simulated outage
//! 2. The first failure opens the circuit and further calls are skipped
//! 3. After the cooldown a probe is let through
//! 4. Once the outage is over the probe succeeds and the circuit closes

use std::time::Duration;

use breakwater::{Breaker, BreakerOptions, MemoryStorage, StorageError};
use tick::Clock;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), StorageError> {
    // Transitions are logged as tracing events
    tracing_subscriber::fmt().init();

    let clock = Clock::new_tokio();
    let options = BreakerOptions::default()
        .max_failures(1)
        .open_cooldown(Duration::from_millis(500));
    let (breaker, load_error) = Breaker::new(MemoryStorage::new(), options, &clock);

    if let Some(e) = load_error {
        println!("starting closed, breaker state could not be loaded: {e}");
    }

    for attempt in 0..40 {
        clock.delay(Duration::from_millis(50)).await;

        let admission = match breaker.request_admission() {
            Ok(admission) => admission,
            Err(open) => {
                println!("{attempt}: skipped, {open}");
                continue;
            }
        };

        if let Some(e) = admission.storage_error() {
            println!("{attempt}: storage degraded: {e}");
        }

        match call_service(attempt) {
            Ok(output) => {
                println!("{attempt}: {output}");
                breaker.report_success()?;
            }
            Err(e) => {
                println!("{attempt}: {e}");
                breaker.report_failure()?;
            }
        }
    }

    Ok(())
}

// The service is down between attempts 5 and 20.
fn call_service(attempt: u32) -> Result<String, String> {
    if (5..20).contains(&attempt) {
        Err(format!("service unavailable for '{attempt}'"))
    } else {
        Ok(format!("output-{attempt}"))
    }
}
