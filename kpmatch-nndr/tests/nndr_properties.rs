use kpmatch_core::{DescriptorSet, Keypoint};
use kpmatch_nndr::CandidateMatcher;
use proptest::prelude::*;

fn set_from(rows: &[Vec<u8>]) -> DescriptorSet {
    let kps = (0..rows.len())
        .map(|i| Keypoint::new(i as f32 * 3.0, i as f32 * 7.0))
        .collect();
    DescriptorSet::from_binary_rows(kps, rows, 8).unwrap()
}

fn float_from(rows: &[Vec<f32>]) -> DescriptorSet {
    let kps = (0..rows.len()).map(|i| Keypoint::new(i as f32, 0.5)).collect();
    DescriptorSet::from_float_rows(kps, rows, 6).unwrap()
}

proptest! {
    #[test]
    fn lower_ratio_never_accepts_more(
        rows_a in prop::collection::vec(prop::collection::vec(any::<u8>(), 8), 1..40),
        rows_b in prop::collection::vec(prop::collection::vec(any::<u8>(), 8), 0..40),
        low in 0.05f32..0.95,
        delta in 0.0f32..0.5,
    ) {
        let high = (low + delta).min(0.99);
        let a = set_from(&rows_a);
        let b = set_from(&rows_b);
        let strict = CandidateMatcher::new(low).unwrap().match_sets(&a, &b).unwrap();
        let loose = CandidateMatcher::new(high).unwrap().match_sets(&a, &b).unwrap();
        prop_assert!(strict.len() <= loose.len());
        // Every strict candidate is also accepted by the looser test
        for c in &strict {
            prop_assert!(loose.iter().any(|l| l.query_idx == c.query_idx && l.train_idx == c.train_idx));
        }
    }

    #[test]
    fn float_matching_is_deterministic(
        rows_a in prop::collection::vec(prop::collection::vec(-1.0f32..1.0, 6), 0..30),
        rows_b in prop::collection::vec(prop::collection::vec(-1.0f32..1.0, 6), 0..30),
    ) {
        let a = float_from(&rows_a);
        let b = float_from(&rows_b);
        let matcher = CandidateMatcher::new(0.8).unwrap();
        let first = matcher.match_sets(&a, &b).unwrap();
        let second = matcher.match_sets(&a, &b).unwrap();
        let threaded = matcher.clone().with_parallel(true).with_threads(3).match_sets(&a, &b).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&first, &threaded);
        for pair in first.windows(2) {
            prop_assert!(pair[0].query_idx < pair[1].query_idx);
        }
    }
}
