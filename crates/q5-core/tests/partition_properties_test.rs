//! Property tests for orders partitioning

use proptest::prelude::*;
use q5_core::partition;

proptest! {
    #[test]
    fn partitions_cover_range_exactly(total in 0usize..50_000, threads in 1usize..256) {
        let parts = partition(total, threads).unwrap();
        prop_assert_eq!(parts.len(), threads);

        // Contiguous and ordered: each starts where the previous ended.
        let mut cursor = 0;
        for (i, part) in parts.iter().enumerate() {
            prop_assert_eq!(part.index, i);
            prop_assert_eq!(part.start, cursor);
            prop_assert!(part.start <= part.end);
            cursor = part.end;
        }
        prop_assert_eq!(cursor, total);
        prop_assert_eq!(parts.iter().map(|p| p.len()).sum::<usize>(), total);
    }

    #[test]
    fn only_last_partition_takes_remainder(total in 0usize..50_000, threads in 1usize..256) {
        let parts = partition(total, threads).unwrap();
        let chunk = total / threads;
        let (last, rest) = parts.split_last().unwrap();
        prop_assert!(rest.iter().all(|p| p.len() == chunk));
        prop_assert_eq!(last.len(), chunk + total % threads);
    }
}

#[test]
fn zero_threads_is_rejected() {
    assert!(partition(100, 0).is_err());
}
