// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use echo_future_group::{CancellationToken, FutureGroup};
use tokio::time::sleep;

#[tokio::test]
async fn results_follow_registration_order() {
    let mut group = FutureGroup::<u32, anyhow::Error>::new();
    for (value, delay_ms) in [(1, 30), (2, 10), (3, 0)] {
        group.go(move |_| async move {
            sleep(Duration::from_millis(delay_ms)).await;
            Ok(value)
        });
    }

    let joined = group.wait(&CancellationToken::new()).await;
    assert!(joined.error.is_none());
    assert_eq!(joined.results, vec![Some(1), Some(2), Some(3)]);
}

#[tokio::test]
async fn zero_jobs_succeed_immediately() {
    let group = FutureGroup::<String, anyhow::Error>::new();
    let joined = group.wait(&CancellationToken::new()).await;
    assert!(joined.results.is_empty());
    assert!(joined.error.is_none());
    assert!(joined.into_result().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failure_cancels_slow_job_before_wait_returns() {
    let saw_cancel = Arc::new(AtomicBool::new(false));
    let mut group = FutureGroup::<u32, anyhow::Error>::new();

    group.go(|_| async { Err(anyhow!("some-error")) });
    let flag = Arc::clone(&saw_cancel);
    group.go(move |cancel| async move {
        tokio::select! {
            () = cancel.cancelled() => {
                flag.store(true, Ordering::SeqCst);
                Ok(0)
            }
            () = sleep(Duration::from_secs(10)) => Ok(2),
        }
    });

    let started = Instant::now();
    let joined = group.wait(&CancellationToken::new()).await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(saw_cancel.load(Ordering::SeqCst));
    let err = joined.error.expect("first failure surfaces");
    assert_eq!(err.to_string(), "some-error");
    assert_eq!(joined.results[0], None);
}

#[tokio::test]
async fn only_first_failure_is_kept() {
    let mut group = FutureGroup::<(), anyhow::Error>::new();
    group.go(|_| async {
        sleep(Duration::from_millis(40)).await;
        Err(anyhow!("second"))
    });
    group.go(|_| async { Err(anyhow!("first")) });
    group.go(|_| async { Ok(()) });

    let joined = group.wait(&CancellationToken::new()).await;
    assert_eq!(joined.error.unwrap().to_string(), "first");
    assert_eq!(joined.results, vec![None, None, Some(())]);
}

#[tokio::test]
async fn partial_error_fails_into_result() {
    let mut group = FutureGroup::<Option<u8>, anyhow::Error>::new();
    group.go(|_| async { Ok(None) });
    group.go(|_| async { Err(anyhow!("some-error")) });
    assert!(group.wait(&CancellationToken::new()).await.into_result().is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn parent_cancellation_reaches_jobs() {
    let parent = CancellationToken::new();
    let mut group = FutureGroup::<bool, anyhow::Error>::new();
    for _ in 0..3 {
        group.go(|cancel| async move {
            tokio::select! {
                () = cancel.cancelled() => Ok(true),
                () = sleep(Duration::from_secs(10)) => Ok(false),
            }
        });
    }

    let trigger = parent.clone();
    tokio::spawn(async move {
        sleep(Duration::from_millis(10)).await;
        trigger.cancel();
    });

    let joined = group.wait(&parent).await;
    assert_eq!(joined.into_result().unwrap(), vec![true, true, true]);
}

#[tokio::test]
async fn group_token_fires_once_group_is_done() {
    let parent = CancellationToken::new();
    let mut group = FutureGroup::<CancellationToken, anyhow::Error>::new();
    group.go(|cancel| async move { Ok(cancel) });

    let tokens = group.wait(&parent).await.into_result().unwrap();
    assert!(tokens[0].is_cancelled());
    assert!(!parent.is_cancelled());
}

#[tokio::test]
#[should_panic(expected = "job exploded")]
#[allow(clippy::panic)]
async fn job_panic_is_resumed_on_waiter() {
    let mut group = FutureGroup::<(), anyhow::Error>::new();
    group.go(|_| async {
        if group_should_explode() {
            panic!("job exploded");
        }
        Ok(())
    });
    let _ = group.wait(&CancellationToken::new()).await;
}

fn group_should_explode() -> bool {
    true
}
