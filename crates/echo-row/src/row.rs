// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The rotating sequence container.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::{RateGate, RowOptions, Takes, Throttle};

/// Fixed list of items read in rotation order from a movable pivot.
///
/// Items are owned by the row (copied or moved in at construction) and never
/// change afterwards; only the pivot moves. Share a row between threads or
/// tasks with `Arc<Row<T>>`.
///
/// # Invariants
///
/// - `items.len()` is fixed at construction.
/// - `pivot < items.len()`, or `pivot == 0` when the row is empty.
/// - Every read yields exactly `len()` items from a single pivot snapshot.
pub struct Row<T> {
    items: Arc<[T]>,
    pivot: Mutex<usize>,
    gate: RateGate,
}

impl<T> Row<T> {
    /// Build a row that takes ownership of `items`.
    pub fn new<I>(items: I, options: RowOptions) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let items: Arc<[T]> = items.into_iter().collect();
        debug!(len = items.len(), throttle = ?options.throttle(), "row created");
        Self {
            items,
            pivot: Mutex::new(0),
            gate: RateGate::new(options.throttle()),
        }
    }

    /// Number of items. Never changes.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the row holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The throttle policy applied to [`rotate`](Self::rotate).
    pub fn throttle(&self) -> Throttle {
        self.gate.throttle()
    }

    /// Advance the pivot by one, if the gate admits this attempt.
    ///
    /// A throttled attempt returns immediately with no effect. On an empty row
    /// the gate still counts the attempt but nothing else happens.
    pub fn rotate(&self) {
        if !self.gate.admit() {
            trace!("rotation throttled");
            return;
        }
        let len = self.items.len();
        if len == 0 {
            return;
        }
        let mut pivot = self.pivot.lock().unwrap_or_else(PoisonError::into_inner);
        *pivot = (*pivot + 1) % len;
        trace!("rotation applied");
    }

    fn pivot(&self) -> usize {
        *self.pivot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// `(items[pivot..], items[..pivot])` for one pivot snapshot.
    fn halves(&self) -> (&[T], &[T]) {
        let (head, tail) = self.items.split_at(self.pivot());
        (tail, head)
    }
}

impl<T: Clone> Row<T> {
    /// Build a row from a copy of `items` with default options.
    pub fn from_slice(items: &[T]) -> Self {
        Self::from_slice_with(items, RowOptions::default())
    }

    /// Build a row from a copy of `items`.
    ///
    /// The caller's slice may be mutated or dropped afterwards without
    /// affecting the row.
    pub fn from_slice_with(items: &[T], options: RowOptions) -> Self {
        Self::new(items.iter().cloned(), options)
    }

    /// All items in rotation order, materialized up front.
    pub fn items(&self) -> std::vec::IntoIter<T> {
        let (tail, head) = self.halves();
        echo_flow::chain([tail, head])
            .cloned()
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// All items in rotation order as a fresh `Vec`.
    ///
    /// Copies the two contiguous halves directly; the fastest read when the
    /// row is short.
    pub fn to_vec(&self) -> Vec<T> {
        let (tail, head) = self.halves();
        let mut out = Vec::with_capacity(self.items.len());
        out.extend_from_slice(tail);
        out.extend_from_slice(head);
        out
    }
}

impl<T> Row<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Stream the items in rotation order without buffering them all.
    ///
    /// The pivot is fixed when this is called. Production runs on a Tokio
    /// task and stops as soon as `cancel` (or the returned stream's own
    /// token) is cancelled. The caller must cancel or [`close`](Takes::close)
    /// the stream once done with it; dropping it also cancels.
    ///
    /// # Panics
    ///
    /// If the row is non-empty and no Tokio runtime is running.
    pub fn takes(&self, cancel: &CancellationToken) -> Takes<T> {
        Takes::spawn(Arc::clone(&self.items), self.pivot(), cancel.child_token())
    }
}

impl<T> FromIterator<T> for Row<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter, RowOptions::default())
    }
}

impl<T> fmt::Debug for Row<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Row")
            .field("len", &self.items.len())
            .field("throttle", &self.gate.throttle())
            .finish_non_exhaustive()
    }
}
