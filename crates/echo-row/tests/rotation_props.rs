// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]
use proptest::prelude::*;

use echo_row::{CancellationToken, Row, RowOptions};
use futures::StreamExt;

// For any N and any number R of effective rotations, every read mode yields
// items[(R mod N + i) mod N] for i in 0..N.

fn expected(items: &[u16], rotations: usize) -> Vec<u16> {
    let n = items.len();
    if n == 0 {
        return Vec::new();
    }
    (0..n).map(|i| items[(rotations % n + i) % n]).collect()
}

proptest! {
    #[test]
    fn reads_follow_rotation_count(
        items in prop::collection::vec(any::<u16>(), 0..24),
        rotations in 0usize..80,
    ) {
        let row = Row::from_slice_with(&items, RowOptions::new().unthrottled());
        for _ in 0..rotations {
            row.rotate();
        }
        let want = expected(&items, rotations);
        prop_assert_eq!(row.to_vec(), want.clone());
        prop_assert_eq!(row.items().collect::<Vec<_>>(), want.clone());
        // Idempotent: a second read without rotation is identical.
        prop_assert_eq!(row.to_vec(), want);
    }

    #[test]
    fn drained_stream_agrees_with_to_vec(
        items in prop::collection::vec(any::<u16>(), 0..24),
        rotations in 0usize..30,
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");
        let row = Row::from_slice_with(&items, RowOptions::new().unthrottled());
        for _ in 0..rotations {
            row.rotate();
        }
        let streamed: Vec<u16> = runtime.block_on(async {
            let token = CancellationToken::new();
            let streamed: Vec<u16> = row.takes(&token).collect().await;
            token.cancel();
            streamed
        });
        prop_assert_eq!(streamed, row.to_vec());
    }

    #[test]
    fn every_nth_counts_calls(
        len in 1usize..10,
        n in 1u64..6,
        calls in 0u64..40,
    ) {
        let items: Vec<u16> = (0..u16::try_from(len).unwrap()).collect();
        let row = Row::from_slice_with(
            &items,
            RowOptions::new().every_nth(std::num::NonZeroU64::new(n).unwrap()),
        );
        for _ in 0..calls {
            row.rotate();
        }
        // Calls 0, n, 2n, … are admitted: ceil(calls / n) in total.
        let admitted = usize::try_from(calls.div_ceil(n)).unwrap();
        prop_assert_eq!(row.to_vec(), expected(&items, admitted));
    }
}
