// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

/// Default number of failures tolerated before the circuit opens.
pub(crate) const DEFAULT_MAX_FAILURES: u32 = 10;

/// Default duration that the circuit stays open before probing for recovery.
pub(crate) const DEFAULT_OPEN_COOLDOWN: Duration = Duration::from_secs(10);

/// Suffix of the shared-store key that holds the failure count.
pub(crate) const FAILURES_KEY_SUFFIX: &str = "FAILURES";

/// Suffix of the shared-store key that holds the circuit state tag.
pub(crate) const STATE_KEY_SUFFIX: &str = "STATE";
