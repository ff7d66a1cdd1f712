// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The circuit breaker state machine.
//!
//! | Current | Condition | Next |
//! |---|---|---|
//! | Closed | failures < threshold | Closed |
//! | Closed | failures >= threshold | Open |
//! | Open | cooldown not elapsed | Open |
//! | Open | cooldown elapsed | Half-Open |
//! | Half-Open | failures == 0 | Closed |
//! | Half-Open | failures > 0 | Open |
//!
//! Transitions are evaluated lazily on admission checks. The failure count always comes from
//! storage; the open variant only remembers when it was entered.

use std::time::{Duration, Instant};

use ohno::EnrichableExt;
use tick::Clock;

use crate::{BreakerOptions, CircuitState, Storage, StorageError};

/// The active variant of a breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Variant {
    Closed,
    Open { opened_at: Instant, cooldown: Duration },
    HalfOpen,
}

/// Outcome of evaluating the next variant.
#[derive(Debug)]
pub(crate) struct Transition {
    pub next: Variant,
    pub error: Option<StorageError>,
}

impl Transition {
    fn to(next: Variant) -> Self {
        Self { next, error: None }
    }
}

impl Variant {
    /// Rebuilds a variant from its persisted tag.
    ///
    /// The open deadline is not persisted, so a restored open variant starts its cooldown at `now`.
    pub fn restore(state: CircuitState, now: Instant, options: &BreakerOptions) -> Self {
        match state {
            CircuitState::Closed => Self::Closed,
            CircuitState::Open => Self::open(now, options),
            CircuitState::HalfOpen => Self::HalfOpen,
        }
    }

    fn open(now: Instant, options: &BreakerOptions) -> Self {
        Self::Open {
            opened_at: now,
            cooldown: options.get_open_cooldown(),
        }
    }

    pub fn state(self) -> CircuitState {
        match self {
            Self::Closed => CircuitState::Closed,
            Self::Open { .. } => CircuitState::Open,
            Self::HalfOpen => CircuitState::HalfOpen,
        }
    }

    pub fn is_admitting(self) -> bool {
        match self {
            Self::Closed | Self::HalfOpen => true,
            Self::Open { .. } => false,
        }
    }

    /// Computes the variant that should be active now.
    ///
    /// The clock is read after the failure count, so a slow storage read does not shorten the
    /// cooldown of a freshly opened circuit. A failure count that cannot be read is treated as
    /// zero and reported alongside the result.
    pub fn next(self, storage: &impl Storage, clock: &Clock, options: &BreakerOptions) -> Transition {
        match self {
            Self::Closed => match storage.failure_count() {
                Ok(failures) if failures >= u64::from(options.get_max_failures()) => {
                    Transition::to(Self::open(clock.instant(), options))
                }
                Ok(_) => Transition::to(self),
                Err(e) => Transition {
                    next: self,
                    error: Some(e.enrich("Closed::next -> failure_count")),
                },
            },
            Self::Open { opened_at, cooldown } => {
                if clock.instant().saturating_duration_since(opened_at) >= cooldown {
                    Transition::to(Self::HalfOpen)
                } else {
                    Transition::to(self)
                }
            }
            Self::HalfOpen => match storage.failure_count() {
                Ok(0) => Transition::to(Self::Closed),
                Ok(_) => Transition::to(Self::open(clock.instant(), options)),
                Err(e) => Transition {
                    next: Self::Closed,
                    error: Some(e.enrich("HalfOpen::next -> failure_count")),
                },
            },
        }
    }

    /// Runs the entry action: persists the state tag and clears the failure count.
    ///
    /// Both writes are attempted; the first error is returned.
    pub fn on_entry(self, storage: &impl Storage) -> Result<(), StorageError> {
        let name = self.name();
        let persisted = storage
            .set_current_state(self.state())
            .map_err(|e| e.enrich(format!("{name}::on_entry -> set_current_state")));
        let cleared = storage.clear().map_err(|e| e.enrich(format!("{name}::on_entry -> clear")));

        persisted.and(cleared)
    }

    pub fn on_success(self, storage: &impl Storage) -> Result<(), StorageError> {
        match self {
            Self::Closed => match storage.failure_count() {
                Ok(0) => Ok(()),
                Ok(_) => storage.clear().map_err(|e| e.enrich("Closed::on_success -> clear")),
                Err(read) => {
                    storage.clear().map_err(|e| e.enrich("Closed::on_success -> clear"))?;
                    Err(read.enrich("Closed::on_success -> failure_count"))
                }
            },
            Self::Open { .. } | Self::HalfOpen => Ok(()),
        }
    }

    pub fn on_failure(self, storage: &impl Storage) -> Result<(), StorageError> {
        match self {
            Self::Closed | Self::HalfOpen => {
                let name = self.name();
                storage
                    .increment_failures()
                    .map_err(|e| e.enrich(format!("{name}::on_failure -> increment_failures")))
            }
            Self::Open { .. } => Ok(()),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Closed => "Closed",
            Self::Open { .. } => "Open",
            Self::HalfOpen => "HalfOpen",
        }
    }
}
