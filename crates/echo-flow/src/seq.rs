// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Sequence construction and trimming.

use std::iter::{Empty, Flatten, Once, Skip, Take};

/// A sequence that yields nothing.
///
/// Useful as the base case of a recursive [`chain`].
pub fn empty<V>() -> Empty<V> {
    std::iter::empty()
}

/// A sequence that yields exactly `value`.
pub fn pack<V>(value: V) -> Once<V> {
    std::iter::once(value)
}

/// A key/value sequence that yields exactly one pair.
pub fn pack_pair<K, V>(key: K, value: V) -> Once<(K, V)> {
    std::iter::once((key, value))
}

/// Concatenate `sequences` in order.
///
/// Items are pulled lazily: once the consumer stops, later sequences are
/// never touched. Sequences of different concrete types can be chained by
/// boxing them as `Box<dyn Iterator<Item = V>>`.
pub fn chain<S>(sequences: S) -> Flatten<S::IntoIter>
where
    S: IntoIterator,
    S::Item: IntoIterator,
{
    sequences.into_iter().flatten()
}

/// The first `count` items of `sequence`, or all of them if it is shorter.
pub fn take<I>(sequence: I, count: usize) -> Take<I::IntoIter>
where
    I: IntoIterator,
{
    sequence.into_iter().take(count)
}

/// Everything after the first `count` items; empty if `sequence` is shorter.
pub fn drop_first<I>(sequence: I, count: usize) -> Skip<I::IntoIter>
where
    I: IntoIterator,
{
    sequence.into_iter().skip(count)
}
