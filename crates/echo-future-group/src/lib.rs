// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Run a batch of fallible async jobs together.
//!
//! A [`FutureGroup`] collects jobs with [`go`](FutureGroup::go) and launches
//! them all on [`wait`](FutureGroup::wait). Every job receives the same
//! [`CancellationToken`]; the first job to fail cancels it so the others can
//! bail out early. `wait` always returns after *every* job has finished, so
//! no job outlives the group.
//!
//! # Results
//!
//! Slot `i` of [`Joined::results`] belongs to the `i`th registered job,
//! regardless of completion order. Failed jobs leave their slot empty. Only
//! the first failure is kept, untouched; later failures are dropped and
//! nothing is retried.
//!
//! Register jobs and call `wait` from the same task; the group is consumed by
//! `wait`.
#![forbid(unsafe_code)]

use std::fmt;
use std::future::Future;

use futures_core::future::BoxFuture;
use tokio::task::JoinSet;
use tracing::{debug, instrument};

pub use tokio_util::sync::CancellationToken;

type Job<T, E> = Box<dyn FnOnce(CancellationToken) -> BoxFuture<'static, Result<T, E>> + Send>;

/// Outcome of [`FutureGroup::wait`].
#[derive(Debug)]
pub struct Joined<T, E> {
    /// One slot per registered job, in registration order. `None` for jobs
    /// that failed.
    pub results: Vec<Option<T>>,
    /// The first failure observed, if any.
    pub error: Option<E>,
}

impl<T, E> Joined<T, E> {
    /// Returns `true` if no job failed.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// All values in registration order, or the first failure.
    pub fn into_result(self) -> Result<Vec<T>, E> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.results.into_iter().flatten().collect()),
        }
    }
}

/// A batch of async jobs producing `Result<T, E>`.
pub struct FutureGroup<T, E> {
    jobs: Vec<Job<T, E>>,
}

impl<T, E> FutureGroup<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Create an empty group.
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    /// Register a job. It does not start until [`wait`](Self::wait).
    ///
    /// The job is handed the group's cancellation token, which fires when any
    /// job fails, when the parent token passed to `wait` fires, or once the
    /// group finishes.
    pub fn go<F, Fut>(&mut self, job: F)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.jobs.push(Box::new(move |cancel| Box::pin(job(cancel))));
    }

    /// Number of registered jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Returns `true` if no job is registered.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Launch every job on the current Tokio runtime and wait for all of them.
    ///
    /// The group token is a child of `parent`. With zero jobs this returns
    /// immediately with no results and no error.
    ///
    /// # Panics
    ///
    /// If a job panics, the group is cancelled, the remaining jobs are aborted
    /// and the panic is resumed on the caller.
    #[instrument(skip_all, fields(jobs = self.jobs.len()))]
    pub async fn wait(self, parent: &CancellationToken) -> Joined<T, E> {
        let token = parent.child_token();
        let _scope = token.clone().drop_guard();

        let mut results: Vec<Option<T>> = std::iter::repeat_with(|| None)
            .take(self.jobs.len())
            .collect();
        let mut error = None;

        let mut set = JoinSet::new();
        for (index, job) in self.jobs.into_iter().enumerate() {
            let fut = job(token.clone());
            set.spawn(async move { (index, fut.await) });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, Ok(value))) => {
                    if let Some(slot) = results.get_mut(index) {
                        *slot = Some(value);
                    }
                }
                Ok((index, Err(err))) => {
                    if error.is_none() {
                        debug!(index, "job failed, cancelling group");
                        token.cancel();
                        error = Some(err);
                    }
                }
                Err(err) if err.is_panic() => {
                    token.cancel();
                    std::panic::resume_unwind(err.into_panic());
                }
                // Only aborted tasks land here, and the group never aborts.
                Err(_) => {}
            }
        }
        Joined { results, error }
    }
}

impl<T, E> Default for FutureGroup<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for FutureGroup<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FutureGroup")
            .field("jobs", &self.jobs.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn into_result_prefers_error() {
        let joined: Joined<u8, &str> = Joined {
            results: vec![Some(1), None],
            error: Some("boom"),
        };
        assert!(!joined.is_ok());
        assert_eq!(joined.into_result(), Err("boom"));
    }

    #[test]
    fn into_result_collects_in_order() {
        let joined: Joined<u8, &str> = Joined {
            results: vec![Some(3), Some(1), Some(2)],
            error: None,
        };
        assert_eq!(joined.into_result().unwrap(), vec![3, 1, 2]);
    }

    #[test]
    fn registration_counts_jobs() {
        let mut group = FutureGroup::<u8, ()>::new();
        assert!(group.is_empty());
        group.go(|_| async { Ok(1) });
        group.go(|_| async { Err(()) });
        assert_eq!(group.len(), 2);
        assert_eq!(format!("{group:?}"), "FutureGroup { jobs: 2 }");
    }
}
