// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use ohno::EnrichableExt;
use parking_lot::Mutex;
use tick::Clock;

use crate::variant::{Transition, Variant};
use crate::{BreakerOptions, CircuitOpen, CircuitState, Storage, StorageError};

/// Guards an unreliable operation by tracking its failures.
///
/// Before each call of the guarded operation, ask for permission with
/// [`request_admission`](Self::request_admission). After the call, report the outcome with
/// [`report_success`](Self::report_success) or [`report_failure`](Self::report_failure).
///
/// - **Closed**: calls are admitted. Once the stored failure count reaches
///   [`max_failures`](BreakerOptions::max_failures), the next admission check opens the circuit.
/// - **Open**: calls are rejected with [`CircuitOpen`] until
///   [`open_cooldown`](BreakerOptions::open_cooldown) has elapsed. The first check after that
///   moves to half-open.
/// - **Half-open**: calls are admitted as probes. The next admission check closes the circuit if
///   no failure was reported in the meantime and opens it again otherwise.
///
/// Every transition persists the new state and resets the failure count through the
/// [`Storage`] backend. Storage errors never block a decision: the breaker falls back to a
/// closed circuit with zero failures and returns the error next to the decision.
///
/// All three operations serialize on an internal lock, so two threads sharing one breaker never
/// race the read-decide-persist sequence. Breakers in different processes sharing a
/// [`SharedStorage`][crate::SharedStorage] record are not serialized against each other.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use breakwater::{Breaker, BreakerOptions, CircuitOpen, MemoryStorage};
/// use tick::ClockControl;
///
/// let control = ClockControl::new();
/// let options = BreakerOptions::default()
///     .max_failures(1)
///     .open_cooldown(Duration::from_secs(1));
/// let (breaker, load_error) = Breaker::new(MemoryStorage::new(), options, &control.to_clock());
/// assert!(load_error.is_none());
///
/// // The first call fails...
/// breaker.request_admission().unwrap();
/// breaker.report_failure().unwrap();
///
/// // ...which opens the circuit.
/// assert_eq!(breaker.request_admission().unwrap_err(), CircuitOpen);
///
/// // After the cooldown a probe is admitted.
/// control.advance(Duration::from_secs(1));
/// assert!(breaker.request_admission().is_ok());
/// ```
#[derive(Debug)]
pub struct Breaker<S> {
    variant: Mutex<Variant>,
    storage: S,
    options: BreakerOptions,
    clock: Clock,
}

/// Permission to call the guarded operation.
///
/// The admission may carry a storage error that occurred while the breaker evaluated its state.
/// The error did not influence the decision; it is handed out so that it can be logged.
#[derive(Debug)]
pub struct Admission {
    state: CircuitState,
    storage_error: Option<StorageError>,
}

impl Admission {
    /// The state in which the call was admitted, either closed or half-open.
    pub fn state(&self) -> CircuitState {
        self.state
    }

    /// Returns `true` if the call is a probe of a half-open circuit.
    pub fn is_probe(&self) -> bool {
        self.state == CircuitState::HalfOpen
    }

    /// The storage error observed during the admission check, if any.
    pub fn storage_error(&self) -> Option<&StorageError> {
        self.storage_error.as_ref()
    }

    /// Consumes the admission, returning the storage error observed during the check, if any.
    pub fn into_storage_error(self) -> Option<StorageError> {
        self.storage_error
    }
}

impl<S: Storage> Breaker<S> {
    /// Creates a breaker whose initial state is loaded from `storage`.
    ///
    /// Construction never fails. If the state cannot be loaded, the breaker starts closed and
    /// the load error is returned next to it. A breaker that loads an open state times the
    /// cooldown from the moment of construction.
    pub fn new(storage: S, options: BreakerOptions, clock: &Clock) -> (Self, Option<StorageError>) {
        let (state, error) = match storage.current_state() {
            Ok(state) => (state, None),
            Err(e) => {
                let e = e.enrich("Breaker::new -> closed by default");
                log_storage_error("new", CircuitState::Closed, &e);
                (CircuitState::Closed, Some(e))
            }
        };

        let breaker = Self {
            variant: Mutex::new(Variant::restore(state, clock.instant(), &options)),
            storage,
            options,
            clock: clock.clone(),
        };

        (breaker, error)
    }

    /// Asks whether the guarded operation may be called now.
    ///
    /// Evaluates the pending transition first, so an open circuit whose cooldown elapsed
    /// is moved to half-open and admits the call as a probe.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitOpen`] when the circuit is open. The sentinel never carries a storage
    /// error; storage errors observed during a rejected check are logged instead.
    pub fn request_admission(&self) -> Result<Admission, CircuitOpen> {
        let mut variant = self.variant.lock();
        let current = *variant;

        let Transition { next, mut error } = current.next(&self.storage, &self.clock, &self.options);

        if next.state() != current.state() {
            *variant = next;
            log_transition(current.state(), next.state());

            if let Err(e) = next.on_entry(&self.storage) {
                match error {
                    Some(_) => log_storage_error("request_admission", next.state(), &e),
                    None => error = Some(e),
                }
            }
        }

        drop(variant);

        let error = error.map(|e| e.enrich("Breaker::request_admission"));

        if next.is_admitting() {
            Ok(Admission {
                state: next.state(),
                storage_error: error,
            })
        } else {
            if let Some(e) = &error {
                log_storage_error("request_admission", next.state(), e);
            }

            tracing::event!(
                name: "breakwater.circuit.rejected",
                tracing::Level::DEBUG,
                breaker.state = CircuitState::Open.as_str(),
            );

            Err(CircuitOpen)
        }
    }

    /// Reports that the guarded operation succeeded.
    ///
    /// In a closed circuit this resets the failure count. Open and half-open circuits ignore
    /// successes; a half-open circuit resolves on the next admission check.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the failure count could not be read or reset.
    pub fn report_success(&self) -> Result<(), StorageError> {
        let variant = self.variant.lock();

        variant
            .on_success(&self.storage)
            .map_err(|e| e.enrich("Breaker::report_success"))
    }

    /// Reports that the guarded operation failed.
    ///
    /// Closed and half-open circuits count the failure; an open circuit ignores it.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the failure could not be counted.
    pub fn report_failure(&self) -> Result<(), StorageError> {
        let variant = self.variant.lock();

        variant
            .on_failure(&self.storage)
            .map_err(|e| e.enrich("Breaker::report_failure"))
    }
}

impl<S> Breaker<S> {
    /// Returns the currently active state without evaluating pending transitions.
    ///
    /// An open circuit whose cooldown already elapsed still reports [`CircuitState::Open`] until
    /// the next admission check.
    pub fn state(&self) -> CircuitState {
        self.variant.lock().state()
    }

    /// Returns the effective options of this breaker.
    pub fn options(&self) -> &BreakerOptions {
        &self.options
    }

    /// Returns the storage backend of this breaker.
    pub fn storage(&self) -> &S {
        &self.storage
    }
}

fn log_transition(from: CircuitState, to: CircuitState) {
    match to {
        CircuitState::Open => tracing::event!(
            name: "breakwater.circuit.opened",
            tracing::Level::WARN,
            breaker.state = to.as_str(),
            breaker.previous_state = from.as_str(),
        ),
        CircuitState::HalfOpen => tracing::event!(
            name: "breakwater.circuit.half_opened",
            tracing::Level::INFO,
            breaker.state = to.as_str(),
            breaker.previous_state = from.as_str(),
        ),
        CircuitState::Closed => tracing::event!(
            name: "breakwater.circuit.closed",
            tracing::Level::INFO,
            breaker.state = to.as_str(),
            breaker.previous_state = from.as_str(),
        ),
    }
}

fn log_storage_error(operation: &'static str, state: CircuitState, error: &StorageError) {
    tracing::event!(
        name: "breakwater.storage.error",
        tracing::Level::WARN,
        breaker.operation = operation,
        breaker.state = state.as_str(),
        error = %error,
    );
}
