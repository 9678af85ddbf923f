// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Row options (typed builder) and their serialized form.

use std::num::NonZeroU64;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{RowError, Throttle};

/// Construction options for a [`Row`](crate::Row).
///
/// Exactly one throttle mode is active. Setters replace the mode wholesale,
/// so the last one applied wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowOptions {
    throttle: Throttle,
}

impl RowOptions {
    /// Default options: interval mode, [`DEFAULT_INTERVAL`](crate::DEFAULT_INTERVAL).
    pub fn new() -> Self {
        Self::default()
    }

    /// At most one effective rotation per `interval`; zero disables throttling.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.throttle = Throttle::Interval(interval);
        self
    }

    /// Like [`interval`](Self::interval) from a signed millisecond count.
    ///
    /// # Errors
    ///
    /// [`RowError::InvalidConfiguration`] if `millis` is negative.
    pub fn interval_millis(mut self, millis: i64) -> Result<Self, RowError> {
        self.throttle = Throttle::from_millis(millis)?;
        Ok(self)
    }

    /// Every `n`th rotate call is effective.
    pub fn every_nth(mut self, n: NonZeroU64) -> Self {
        self.throttle = Throttle::EveryNth(n);
        self
    }

    /// Every rotate call is effective.
    pub fn unthrottled(mut self) -> Self {
        self.throttle = Throttle::unthrottled();
        self
    }

    /// The throttle these options select.
    pub fn throttle(&self) -> Throttle {
        self.throttle
    }
}

impl From<Throttle> for RowOptions {
    fn from(throttle: Throttle) -> Self {
        Self { throttle }
    }
}

/// Serialized row configuration (JSON).
///
/// Missing fields fall back to defaults. When both fields are present,
/// `every_nth` is applied after `interval_ms` and wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RowConfig {
    /// Minimum milliseconds between effective rotations. Zero = unthrottled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_ms: Option<i64>,
    /// Count mode: every `n`th rotate call is effective.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub every_nth: Option<u64>,
}

impl RowConfig {
    /// Parse a JSON blob. An empty blob is the default config.
    pub fn from_json(bytes: &[u8]) -> Result<Self, RowError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> Result<Vec<u8>, RowError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// `true` if either throttle field is set.
    pub fn has_throttle(&self) -> bool {
        self.interval_ms.is_some() || self.every_nth.is_some()
    }

    /// Layer `overrides` on top of `self`.
    ///
    /// A throttle in `overrides` replaces both fields of `self`, so a command
    /// line `--interval-ms` is not shadowed by a file's `every_nth`.
    pub fn overlay(self, overrides: Self) -> Self {
        if overrides.has_throttle() {
            overrides
        } else {
            self
        }
    }

    /// Validate and convert into [`RowOptions`].
    ///
    /// # Errors
    ///
    /// [`RowError::InvalidConfiguration`] for a negative interval or a zero
    /// `every_nth`.
    pub fn options(&self) -> Result<RowOptions, RowError> {
        let mut options = RowOptions::new();
        if let Some(millis) = self.interval_ms {
            options = options.interval_millis(millis)?;
        }
        if let Some(n) = self.every_nth {
            options = Throttle::every_nth(n)?.into();
        }
        Ok(options)
    }
}
