// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Short-circuit boolean folds.

/// `c1 || c2 || … || cn`. `false` for an empty sequence.
///
/// Stops pulling at the first `true`.
pub fn any<I>(conditions: I) -> bool
where
    I: IntoIterator<Item = bool>,
{
    conditions.into_iter().any(|condition| condition)
}

/// `c1 && c2 && … && cn`. `true` for an empty sequence.
///
/// Stops pulling at the first `false`.
pub fn all<I>(conditions: I) -> bool
where
    I: IntoIterator<Item = bool>,
{
    conditions.into_iter().all(|condition| condition)
}
