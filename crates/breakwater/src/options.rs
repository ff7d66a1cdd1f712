// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use crate::constants::{DEFAULT_MAX_FAILURES, DEFAULT_OPEN_COOLDOWN};

/// Configuration of a [`Breaker`][crate::Breaker].
///
/// Options are immutable once handed to the breaker. Zero values are treated as "not set" and
/// fall back to the defaults:
///
/// | Option | Default |
/// |---|---|
/// | [`max_failures`](Self::max_failures) | 10 |
/// | [`open_cooldown`](Self::open_cooldown) | 10 seconds |
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use breakwater::BreakerOptions;
///
/// let options = BreakerOptions::default()
///     .max_failures(3)
///     .open_cooldown(Duration::from_secs(30));
///
/// assert_eq!(options.get_max_failures(), 3);
/// assert_eq!(options.get_open_cooldown(), Duration::from_secs(30));
///
/// // Zero values keep the defaults.
/// let options = BreakerOptions::default().max_failures(0).open_cooldown(Duration::ZERO);
/// assert_eq!(options.get_max_failures(), 10);
/// assert_eq!(options.get_open_cooldown(), Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BreakerOptions {
    max_failures: u32,
    open_cooldown: Duration,
}

impl Default for BreakerOptions {
    fn default() -> Self {
        Self {
            max_failures: DEFAULT_MAX_FAILURES,
            open_cooldown: DEFAULT_OPEN_COOLDOWN,
        }
    }
}

impl BreakerOptions {
    /// Sets how many failures are tolerated in the closed state before the circuit opens.
    ///
    /// Zero keeps the default of 10.
    #[must_use]
    pub fn max_failures(mut self, max_failures: u32) -> Self {
        self.max_failures = max_failures;
        self
    }

    /// Sets how long the circuit stays open before a probe is admitted.
    ///
    /// A zero duration keeps the default of 10 seconds.
    #[must_use]
    pub fn open_cooldown(mut self, open_cooldown: Duration) -> Self {
        self.open_cooldown = open_cooldown;
        self
    }

    /// Returns the effective failure threshold.
    #[must_use]
    pub fn get_max_failures(&self) -> u32 {
        if self.max_failures == 0 {
            DEFAULT_MAX_FAILURES
        } else {
            self.max_failures
        }
    }

    /// Returns the effective open-state cooldown.
    #[must_use]
    pub fn get_open_cooldown(&self) -> Duration {
        if self.open_cooldown.is_zero() {
            DEFAULT_OPEN_COOLDOWN
        } else {
            self.open_cooldown
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = BreakerOptions::default();

        assert_eq!(options.get_max_failures(), 10);
        assert_eq!(options.get_open_cooldown(), Duration::from_secs(10));
    }

    #[test]
    fn explicit_values_are_kept() {
        let options = BreakerOptions::default().max_failures(1).open_cooldown(Duration::from_millis(250));

        assert_eq!(options.get_max_failures(), 1);
        assert_eq!(options.get_open_cooldown(), Duration::from_millis(250));
    }

    #[test]
    fn zero_values_fall_back_to_defaults() {
        let options = BreakerOptions::default().max_failures(0).open_cooldown(Duration::ZERO);

        assert_eq!(options.get_max_failures(), DEFAULT_MAX_FAILURES);
        assert_eq!(options.get_open_cooldown(), DEFAULT_OPEN_COOLDOWN);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let options: BreakerOptions = serde_json::from_str(r#"{ "max_failures": 4 }"#).unwrap();

        assert_eq!(options.get_max_failures(), 4);
        assert_eq!(options.get_open_cooldown(), DEFAULT_OPEN_COOLDOWN);
    }
}
