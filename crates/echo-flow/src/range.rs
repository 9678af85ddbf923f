// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Integer range generators.

use std::iter::Rev;
use std::ops::{Range, RangeFrom};

/// Unbounded ascending integers starting at `start`.
///
/// Callers bound it with [`take`](crate::take) or an early `break`; stepping
/// past `i64::MAX` overflows.
pub fn since(start: i64) -> RangeFrom<i64> {
    start..
}

/// `[begin, end)` in ascending order. Empty when `begin >= end`.
pub fn forward(begin: i64, end: i64) -> Range<i64> {
    begin..end
}

/// `[begin, end)` in descending order. Empty when `begin >= end`.
pub fn backward(begin: i64, end: i64) -> Rev<Range<i64>> {
    (begin..end).rev()
}
