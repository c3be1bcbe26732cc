#![cfg(feature = "schedule")]
//! Property-based tests for `async_map`.
//!
//! - Order: outputs follow input order for any concurrency limit
//! - Partition: every element lands in exactly one of `results` or `errors`
//! - Agreement: with no failure, fail-fast and collect produce the same values

use asyncfx::schedule::{AsyncMapOptions, async_map};
use proptest::prelude::*;
use std::future::{self, Ready};
use std::time::Duration;

fn halve_even(value: &i32, _: usize, _: &[i32]) -> Ready<Result<i32, i32>> {
    if value % 2 == 0 {
        future::ready(Ok(value / 2))
    } else {
        future::ready(Err(*value))
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Outputs are in input order even when completion order is scrambled.
    #[test]
    fn prop_async_map_preserves_order(
        delays in prop::collection::vec(0u64..5, 0..20),
        limit in 1usize..8,
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();

        let result = runtime.block_on(async {
            async_map(
                &delays,
                |delay: &u64, index, _| {
                    let delay = *delay;
                    async move {
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        Ok::<_, ()>(index)
                    }
                },
                AsyncMapOptions::new().concurrent(limit),
            )
            .await
        });

        prop_assert_eq!(result.results, (0..delays.len()).collect::<Vec<_>>());
        prop_assert!(result.errors.is_empty());
    }

    /// Every element is reported once, either as a result or as an error.
    #[test]
    fn prop_async_map_partitions_input(
        data in prop::collection::vec(-100i32..100, 0..30),
        limit in 1usize..8,
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();

        let result = runtime.block_on(async {
            async_map(&data, halve_even, AsyncMapOptions::new().concurrent(limit).with_source_indexes()).await
        });

        let mut seen: Vec<usize> = result
            .results
            .iter()
            .map(|(index, _)| *index)
            .chain(result.errors.iter().map(|(index, _)| *index))
            .collect();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..data.len()).collect::<Vec<_>>());

        for (index, error) in &result.errors {
            prop_assert_eq!(data[*index], *error);
        }
    }

    /// Without failures both modes yield the same values.
    #[test]
    fn prop_async_map_modes_agree_on_success(
        data in prop::collection::vec((-50i32..50).prop_map(|n| n * 2), 0..30),
        limit in 1usize..8,
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();

        let (collected, fail_fast) = runtime.block_on(async {
            let collected = async_map(&data, halve_even, AsyncMapOptions::new().concurrent(limit)).await;
            let fail_fast = async_map(&data, halve_even, AsyncMapOptions::new().concurrent(limit).fail_fast()).await;
            (collected, fail_fast)
        });

        prop_assert_eq!(collected.into_result(), fail_fast);
    }
}
