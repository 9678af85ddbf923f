// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Thread-safe rotating sequence for Echo.
//!
//! A [`Row`] owns a fixed, immutable list of items and a movable start
//! position (the pivot). Readers always see all items in rotation order
//! starting at the pivot; any number of callers may [`rotate`](Row::rotate)
//! concurrently, and a [`RateGate`] collapses redundant rotations so that at
//! most one takes effect per configured interval (or one per `n` calls).
//!
//! # Read Modes
//!
//! | Method | Shape | Memory | Use when |
//! |--------|-------|--------|----------|
//! | [`Row::to_vec`] | `Vec<T>` | O(N) | few items; fastest path |
//! | [`Row::items`] | owned iterator | O(N) | iterator plumbing over a snapshot |
//! | [`Row::takes`] | async [`Takes`] stream | O(1) | many items; consumer may stop early |
//!
//! All three snapshot the pivot once when called and agree on ordering:
//! output position `i` holds `items[(pivot + i) % N]`.
//!
//! # Rotation Invariants
//!
//! - The gate decides before the pivot lock is taken; a throttled rotate is a
//!   silent no-op, never an error.
//! - Effective rotations are linearizable: each advances the pivot by exactly
//!   one from the state left by the previous effective rotation.
//! - An empty row never touches its pivot; every read yields nothing.
//!
//! # Streaming Discipline
//!
//! [`Takes`] runs a producer task on the current Tokio runtime. The caller
//! owns its lifetime: cancel the token (or call [`Takes::close`]) when done.
//! Dropping a `Takes` cancels and aborts the producer, so scoped usage never
//! leaks it, but only `close().await` waits for the producer to wind down.
#![forbid(unsafe_code)]

mod config;
mod gate;
mod row;
mod takes;

pub use config::{RowConfig, RowOptions};
pub use gate::{RateGate, Throttle, DEFAULT_INTERVAL};
pub use row::Row;
pub use takes::{Takes, TAKES_BUFFER};
pub use tokio_util::sync::CancellationToken;

/// Errors raised while configuring a [`Row`].
///
/// Rotation and reads never fail; only building options can.
#[derive(Debug, thiserror::Error)]
pub enum RowError {
    /// A throttle setting is out of range (negative interval, `every_nth == 0`).
    #[error("[ROW_INVALID_CONFIG] {0}")]
    InvalidConfiguration(String),
    /// A serialized [`RowConfig`] could not be parsed or written.
    #[error("[ROW_CONFIG_SERDE] {0}")]
    Serde(#[from] serde_json::Error),
}
