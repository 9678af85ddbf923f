// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Cancellable bounded-memory stream over one pivot snapshot.
//!
//! A producer task walks the snapshot and hands items over a bounded channel
//! of depth [`TAKES_BUFFER`], so it never runs more than that far ahead of the
//! consumer. Before each item it checks the stream's cancellation token
//! (biased, so cancellation beats a free slot).

use std::future::poll_fn;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Items the producer may run ahead of the consumer.
pub const TAKES_BUFFER: usize = 1;

/// One-shot stream returned by [`Row::takes`](crate::Row::takes).
///
/// Yields the row's items in rotation order, then ends. Once cancellation is
/// observed the stream ends for good, even if an item was already buffered.
///
/// # Lifetime
///
/// The producer task lives until the stream is exhausted, cancelled, closed or
/// dropped. [`close`](Self::close) is the only way to also wait for it to
/// finish; dropping cancels and aborts it without waiting.
#[derive(Debug)]
pub struct Takes<T> {
    rx: mpsc::Receiver<T>,
    cancel: CancellationToken,
    producer: Option<JoinHandle<()>>,
}

impl<T> Takes<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn spawn(items: Arc<[T]>, pivot: usize, cancel: CancellationToken) -> Self {
        let (tx, rx) = mpsc::channel(TAKES_BUFFER);
        // An empty snapshot needs no producer: `tx` drops here and `rx` ends.
        let producer = (!items.is_empty())
            .then(|| tokio::spawn(produce(items, pivot, tx, cancel.clone())));
        Self {
            rx,
            cancel,
            producer,
        }
    }
}

impl<T> Takes<T> {
    /// Signal the producer to stop. Does not wait for it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns `true` once this stream (or the token it was derived from) is
    /// cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn poll_item(&mut self, cx: &mut Context<'_>) -> Poll<Option<T>> {
        if self.cancel.is_cancelled() {
            self.rx.close();
            return Poll::Ready(None);
        }
        self.rx.poll_recv(cx)
    }
}

impl<T: Send> Takes<T> {
    /// Next item, or `None` once exhausted or cancelled.
    pub async fn next(&mut self) -> Option<T> {
        poll_fn(|cx| self.poll_item(cx)).await
    }

    /// Cancel and wait until the producer task has fully stopped.
    ///
    /// After this returns no item of this stream is produced anymore. A panic
    /// inside the producer (from `T::clone`) is resumed here.
    pub async fn close(mut self) {
        self.cancel.cancel();
        self.rx.close();
        if let Some(producer) = self.producer.take() {
            if let Err(err) = producer.await {
                if err.is_panic() {
                    std::panic::resume_unwind(err.into_panic());
                }
            }
        }
    }
}

impl<T> Stream for Takes<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.get_mut().poll_item(cx)
    }
}

impl<T> Drop for Takes<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
    }
}

async fn produce<T: Clone + Send + Sync>(
    items: Arc<[T]>,
    pivot: usize,
    tx: mpsc::Sender<T>,
    cancel: CancellationToken,
) {
    let (head, tail) = items.split_at(pivot);
    trace!(len = items.len(), "takes producer started");
    for (produced, item) in echo_flow::chain([tail, head]).enumerate() {
        let permit = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(produced, "takes producer cancelled");
                return;
            }
            permit = tx.reserve() => match permit {
                Ok(permit) => permit,
                Err(_) => {
                    debug!(produced, "takes consumer gone");
                    return;
                }
            },
        };
        if cancel.is_cancelled() {
            debug!(produced, "takes producer cancelled");
            return;
        }
        permit.send(item.clone());
    }
    trace!("takes producer drained");
}
