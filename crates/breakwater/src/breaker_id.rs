// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::fmt::Display;

/// Identifies the persisted record of one circuit breaker in a shared store.
///
/// The shared backend derives two keys from the identifier: `"{id}_STATE"` for the state tag and
/// `"{id}_FAILURES"` for the failure count. Breakers that should trip together (for example,
/// every instance of a service guarding the same downstream dependency) use the same identifier;
/// unrelated breakers must use distinct identifiers or they will interfere with each other.
///
/// # Examples
///
/// ```
/// use breakwater::BreakerId;
///
/// let id = BreakerId::from("payments-api");
/// assert_eq!(id.to_string(), "payments-api");
///
/// let id = BreakerId::from(42_u64);
/// assert_eq!(id.to_string(), "42");
///
/// // Unique per call, for breakers that must never share a record.
/// assert_ne!(BreakerId::random(), BreakerId::random());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BreakerId(Cow<'static, str>);

impl BreakerId {
    /// Creates a unique identifier from a random UUID.
    #[must_use]
    pub fn random() -> Self {
        Self(Cow::Owned(uuid::Uuid::new_v4().simple().to_string()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn key(&self, suffix: &str) -> String {
        format!("{}_{suffix}", self.0)
    }
}

impl Display for BreakerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for BreakerId {
    fn from(value: u64) -> Self {
        Self(Cow::Owned(value.to_string()))
    }
}

impl From<&'static str> for BreakerId {
    fn from(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }
}

impl From<String> for BreakerId {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use std::fmt::Debug;
    use std::hash::Hash;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(BreakerId: Send, Sync, Unpin, Clone, Hash, Display, Debug, PartialEq, Eq);

    #[test]
    fn from_static_str_and_string_are_equal() {
        let a: BreakerId = "orders".into();
        let b: BreakerId = String::from("orders").into();

        assert_eq!(a, b);
        assert_eq!(a.as_str(), "orders");
    }

    #[test]
    fn from_number() {
        assert_eq!(BreakerId::from(7_u64).as_str(), "7");
    }

    #[test]
    fn random_ids_are_unique_and_non_empty() {
        let a = BreakerId::random();
        let b = BreakerId::random();

        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn key_appends_suffix() {
        let id = BreakerId::from("orders");

        assert_eq!(id.key("STATE"), "orders_STATE");
        assert_eq!(id.key("FAILURES"), "orders_FAILURES");
    }
}
