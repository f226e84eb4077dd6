//! Candidate correspondences between two descriptor sets.
//!
//! For each descriptor of the query image the two nearest descriptors of the
//! train image are found; the best one is kept only when it is clearly closer
//! than the runner-up (nearest-neighbour distance ratio test).

pub mod distance;
pub mod error;
pub mod matcher;

pub use distance::{hamming_distance, squared_euclidean};
pub use error::{MatchError, MatchResult};
pub use matcher::{CandidateMatcher, Neighbours, two_nearest};

#[cfg(test)]
mod tests {
    use super::*;
    use kpmatch_core::{DescriptorSet, Keypoint};

    fn keypoints(n: usize, offset: f32) -> Vec<Keypoint> {
        (0..n)
            .map(|i| Keypoint::new(offset + 10.0 * i as f32, offset + 5.0 * i as f32))
            .collect()
    }

    fn binary_set(rows: &[Vec<u8>], offset: f32) -> DescriptorSet {
        let len = rows.first().map_or(4, |r| r.len());
        DescriptorSet::from_binary_rows(keypoints(rows.len(), offset), rows, len).unwrap()
    }

    fn float_set(rows: &[Vec<f32>], offset: f32) -> DescriptorSet {
        let len = rows.first().map_or(2, |r| r.len());
        DescriptorSet::from_float_rows(keypoints(rows.len(), offset), rows, len).unwrap()
    }

    #[test]
    fn test_invalid_ratio() {
        assert!(matches!(CandidateMatcher::new(0.0), Err(MatchError::InvalidRatio(_))));
        assert!(matches!(CandidateMatcher::new(1.0), Err(MatchError::InvalidRatio(_))));
        assert!(matches!(CandidateMatcher::new(f32::NAN), Err(MatchError::InvalidRatio(_))));
        assert!(CandidateMatcher::new(0.8).is_ok());
    }

    #[test]
    fn test_unambiguous_binary_match() {
        let a = binary_set(&[vec![0b0000_0000, 0, 0, 0]], 0.0);
        let b = binary_set(
            &[
                vec![0xff, 0xff, 0xff, 0xff],
                vec![0b0000_0001, 0, 0, 0],
                vec![0xff, 0x00, 0xff, 0x00],
            ],
            100.0,
        );
        let matcher = CandidateMatcher::new(0.8).unwrap();
        let out = matcher.match_sets(&a, &b).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].query_idx, 0);
        assert_eq!(out[0].train_idx, 1);
        assert_eq!(out[0].source, a.keypoints()[0]);
        assert_eq!(out[0].target, b.keypoints()[1]);
        // d1 = 1, d2 = 16
        assert!((out[0].ratio - 1.0 / 16.0).abs() < 1e-6);
    }

    #[test]
    fn test_ambiguous_match_rejected() {
        let a = float_set(&[vec![0.0, 0.0]], 0.0);
        // Both neighbours at distance 1
        let b = float_set(&[vec![1.0, 0.0], vec![0.0, 1.0], vec![9.0, 9.0]], 0.0);
        let matcher = CandidateMatcher::new(0.8).unwrap();
        assert!(matcher.match_sets(&a, &b).unwrap().is_empty());
    }

    #[test]
    fn test_euclidean_ratio_uses_l2_distance() {
        let a = float_set(&[vec![0.0, 0.0]], 0.0);
        // d1 = 3, d2 = 4: ratio 0.75 on L2, 0.5625 on squared distances
        let b = float_set(&[vec![3.0, 0.0], vec![0.0, 4.0]], 0.0);
        let strict = CandidateMatcher::new(0.7).unwrap();
        assert!(strict.match_sets(&a, &b).unwrap().is_empty());

        let loose = CandidateMatcher::new(0.8).unwrap();
        let out = loose.match_sets(&a, &b).unwrap();
        assert_eq!(out.len(), 1);
        assert!((out[0].ratio - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_single_train_descriptor_is_skipped() {
        let a = float_set(&[vec![0.0, 0.0], vec![1.0, 1.0]], 0.0);
        let b = float_set(&[vec![0.0, 0.0]], 0.0);
        let matcher = CandidateMatcher::new(0.8).unwrap();
        assert!(matcher.match_sets(&a, &b).unwrap().is_empty());
    }

    #[test]
    fn test_empty_sets() {
        let empty = DescriptorSet::from_float_rows(Vec::new(), &[], 2).unwrap();
        let b = float_set(&[vec![0.0, 0.0], vec![1.0, 1.0]], 0.0);
        let matcher = CandidateMatcher::new(0.8).unwrap();
        assert!(matcher.match_sets(&empty, &b).unwrap().is_empty());
        assert!(matcher.match_sets(&b, &empty).unwrap().is_empty());
    }

    #[test]
    fn test_input_mismatch() {
        let a = float_set(&[vec![0.0, 0.0]], 0.0);
        let b = binary_set(&[vec![0, 0], vec![1, 1]], 0.0);
        let matcher = CandidateMatcher::new(0.8).unwrap();
        assert!(matches!(
            matcher.match_sets(&a, &b),
            Err(MatchError::InputMismatch { .. })
        ));

        let c = float_set(&[vec![0.0, 0.0, 0.0], vec![1.0, 1.0, 1.0]], 0.0);
        assert!(matches!(
            matcher.match_sets(&a, &c),
            Err(MatchError::InputMismatch { length_a: 2, length_b: 3, .. })
        ));
    }

    #[test]
    fn test_order_follows_query_set() {
        let a = binary_set(&[vec![0x00, 0x00], vec![0xff, 0xff], vec![0x0f, 0x0f]], 0.0);
        let b = binary_set(&[vec![0x0f, 0x0f], vec![0xff, 0xff], vec![0x00, 0x00]], 50.0);
        let matcher = CandidateMatcher::new(0.8).unwrap();
        let out = matcher.match_sets(&a, &b).unwrap();
        let pairs: Vec<(usize, usize)> = out.iter().map(|c| (c.query_idx, c.train_idx)).collect();
        assert_eq!(pairs, vec![(0, 2), (1, 1), (2, 0)]);
    }

    #[test]
    fn test_tie_prefers_lowest_index() {
        let a = binary_set(&[vec![0x00]], 0.0);
        let b = binary_set(&[vec![0x01], vec![0x02], vec![0xff]], 0.0);
        let nn = two_nearest(&a, 0, &b).unwrap();
        assert_eq!(nn.best, 0);
        assert_eq!(nn.second, 1);
        assert!(!nn.passes_ratio(0.8));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let rows_a: Vec<Vec<u8>> = (0..64u32).map(|i| vec![(i * 37 % 251) as u8, (i * 11) as u8, i as u8, 0xa5]).collect();
        let rows_b: Vec<Vec<u8>> = (0..80u32).map(|i| vec![(i * 37 % 251) as u8, (i * 13) as u8, i as u8, 0x5a]).collect();
        let a = binary_set(&rows_a, 0.0);
        let b = binary_set(&rows_b, 0.0);

        let sequential = CandidateMatcher::new(0.9).unwrap();
        let parallel = CandidateMatcher::new(0.9).unwrap().with_parallel(true).with_threads(4);
        assert_eq!(
            sequential.match_sets(&a, &b).unwrap(),
            parallel.match_sets(&a, &b).unwrap()
        );
    }
}
