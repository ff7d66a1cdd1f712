// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types reported by the breaker and its storage backends.

use std::fmt;

/// An error raised by a storage backend.
///
/// Every storage failure is enriched with the name of the operation that observed it,
/// so the rendered error reads as a chain from the backend call up to the breaker operation:
///
/// ```text
/// connection refused
/// > SharedStorage::failure_count (at src/storage/shared.rs:97)
/// > Breaker::request_admission (at src/breaker.rs:151)
/// ```
///
/// Storage errors never block the breaker. The breaker falls back to
/// [`CircuitState::Closed`][crate::CircuitState::Closed] and a failure count of zero and
/// hands the error back so that callers can log or alert on it.
///
/// # Examples
///
/// ```
/// use breakwater::StorageError;
/// use ohno::EnrichableExt;
///
/// let error = StorageError::backend("server not available").enrich("MyStorage::clear");
/// assert!(error.to_string().contains("server not available"));
/// assert!(error.to_string().contains("MyStorage::clear"));
/// ```
#[ohno::error]
pub struct StorageError {}

impl StorageError {
    /// Creates a storage error caused by a failure of the underlying backend.
    ///
    /// This is the constructor to use from storage implementations living in other crates.
    pub fn backend(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(cause)
    }

    /// Creates a storage error for persisted data that could not be converted.
    pub fn conversion(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(cause)
    }
}

/// Returned by [`Breaker::request_admission`][crate::Breaker::request_admission] when the
/// circuit is open and the guarded operation must not be attempted.
///
/// This is a sentinel: it never wraps another error, so callers can compare it directly.
///
/// ```
/// use breakwater::CircuitOpen;
///
/// let error: Result<(), CircuitOpen> = Err(CircuitOpen);
/// assert_eq!(error, Err(CircuitOpen));
/// assert_eq!(CircuitOpen.to_string(), "breaker: open circuit");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CircuitOpen;

impl fmt::Display for CircuitOpen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("breaker: open circuit")
    }
}

impl std::error::Error for CircuitOpen {}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use ohno::EnrichableExt;
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(StorageError: Send, Sync, std::error::Error);
    assert_impl_all!(CircuitOpen: Send, Sync, Copy, std::error::Error);

    #[test]
    fn storage_error_display_contains_cause() {
        let error = StorageError::backend("server not available");
        assert!(error.to_string().contains("server not available"));
    }

    #[test]
    fn storage_error_display_contains_every_enrichment() {
        let error = StorageError::conversion("invalid digit found in string")
            .enrich("SharedStorage::failure_count -> conversion")
            .enrich("Breaker::request_admission");

        let rendered = error.to_string();
        assert!(rendered.contains("invalid digit found in string"), "got: {rendered}");
        assert!(rendered.contains("SharedStorage::failure_count -> conversion"), "got: {rendered}");
        assert!(rendered.contains("Breaker::request_admission"), "got: {rendered}");
    }

    #[test]
    fn circuit_open_has_fixed_message_and_no_source() {
        assert_eq!(CircuitOpen.to_string(), "breaker: open circuit");
        assert!(CircuitOpen.source().is_none());
    }
}
