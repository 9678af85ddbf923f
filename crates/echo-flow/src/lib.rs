// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Lazy single-pass sequence helpers for Echo.
//!
//! Everything here is an [`Iterator`]: forward-only, pulled on demand, and
//! safe to abandon early. A consumer that stops before exhaustion simply stops
//! pulling; nothing upstream keeps running. Key/value sequences are plain
//! iterators over `(K, V)` tuples, so every helper works for both shapes.
//!
//! Mapping, filtering and folding are left to [`Iterator`] itself. The
//! helpers cover the pieces std spells awkwardly when building sequences
//! recursively:
//!
//! - [`empty`] and [`pack`] / [`pack_pair`] as base cases,
//! - [`chain`] to concatenate any number of sequences,
//! - [`take`] and [`drop_first`] for bounded trimming,
//! - [`since`], [`forward`] and [`backward`] for integer ranges,
//! - [`any`] and [`all`] for short-circuit boolean folds.
#![forbid(unsafe_code)]

mod logic;
mod range;
mod seq;

pub use logic::{all, any};
pub use range::{backward, forward, since};
pub use seq::{chain, drop_first, empty, pack, pack_pair, take};
