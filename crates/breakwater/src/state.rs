// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::str::FromStr;

/// The persisted tag of a circuit breaker state.
///
/// This is what storage backends read and write. The shared backend stores the tag as one of
/// three literal strings, see [`CircuitState::as_str`].
///
/// The default state is [`CircuitState::Closed`], which is also the state a breaker falls back
/// to whenever the stored tag cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum CircuitState {
    /// Calls are admitted and failures accumulate toward the threshold.
    #[default]
    Closed,

    /// Calls are rejected until the cooldown elapses.
    Open,

    /// Calls are admitted as probes to test whether the guarded operation recovered.
    HalfOpen,
}

impl CircuitState {
    /// Returns the literal identifier used to persist this state.
    ///
    /// ```
    /// use breakwater::CircuitState;
    ///
    /// assert_eq!(CircuitState::Closed.as_str(), "closed");
    /// assert_eq!(CircuitState::Open.as_str(), "open");
    /// assert_eq!(CircuitState::HalfOpen.as_str(), "half-open");
    /// ```
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half-open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The persisted tag is none of the known circuit states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStateError(String);

impl fmt::Display for UnknownStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown circuit state `{}`", self.0)
    }
}

impl std::error::Error for UnknownStateError {}

impl FromStr for CircuitState {
    type Err = UnknownStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "closed" => Ok(Self::Closed),
            "open" => Ok(Self::Open),
            "half-open" => Ok(Self::HalfOpen),
            other => Err(UnknownStateError(other.to_owned())),
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(CircuitState::Closed)]
    #[case(CircuitState::Open)]
    #[case(CircuitState::HalfOpen)]
    fn parses_its_own_tag(#[case] state: CircuitState) {
        assert_eq!(state.as_str().parse::<CircuitState>(), Ok(state));
        assert_eq!(state.to_string(), state.as_str());
    }

    #[test]
    fn default_is_closed() {
        assert_eq!(CircuitState::default(), CircuitState::Closed);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let error = "HALF_OPEN".parse::<CircuitState>().unwrap_err();
        assert_eq!(error.to_string(), "unknown circuit state `HALF_OPEN`");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_persisted_tag() {
        let json = serde_json::to_string(&CircuitState::HalfOpen).unwrap();
        assert_eq!(json, "\"half-open\"");
    }
}
