use kpmatch_core::{CandidateMatch, DescriptorData, DescriptorSet, build_thread_pool};
use rayon::prelude::*;
use tracing::debug;

use crate::distance::{hamming_distance, squared_euclidean};
use crate::error::{MatchError, MatchResult};

/// Best and second-best neighbours of one query descriptor.
///
/// Distances are in the metric's native unit: L2 norm for float
/// descriptors, bit count for binary ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbours {
    pub best: usize,
    pub best_distance: f32,
    pub second: usize,
    pub second_distance: f32,
}

impl Neighbours {
    /// NNDR acceptance: the best match must be strictly closer than
    /// `ratio` times the second-best one.
    pub fn passes_ratio(&self, ratio: f32) -> bool {
        self.best_distance < ratio * self.second_distance
    }
}

/// Brute-force two-nearest-neighbour matcher with the NNDR filter.
///
/// The search is O(|A|·|B|·L). For descriptor sets well beyond a few
/// thousand entries an indexed search (k-d tree for float descriptors,
/// multi-index hashing for binary ones) would be the next step.
#[derive(Debug, Clone)]
pub struct CandidateMatcher {
    ratio: f32,
    parallel: bool,
    n_threads: usize,
}

impl CandidateMatcher {
    /// Creates a matcher with the given NNDR ratio, validated to lie in (0, 1)
    pub fn new(ratio: f32) -> MatchResult<Self> {
        if !ratio.is_finite() || ratio <= 0.0 || ratio >= 1.0 {
            return Err(MatchError::InvalidRatio(ratio));
        }
        Ok(Self {
            ratio,
            parallel: false,
            n_threads: 1,
        })
    }

    /// Run the per-query search on a Rayon pool
    pub fn with_parallel(mut self, enable: bool) -> Self {
        self.parallel = enable;
        self
    }

    /// Number of worker threads used when parallel search is enabled
    pub fn with_threads(mut self, n_threads: usize) -> Self {
        self.n_threads = n_threads.max(1);
        self
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    /// Match every descriptor of `a` against `b`.
    ///
    /// Returns one candidate per accepted query, in `a`'s order. Empty input
    /// yields an empty list; a `b` with fewer than two descriptors cannot pass
    /// the ambiguity test, so every query is skipped.
    pub fn match_sets(&self, a: &DescriptorSet, b: &DescriptorSet) -> MatchResult<Vec<CandidateMatch>> {
        if a.is_empty() || b.is_empty() {
            return Ok(Vec::new());
        }
        if !a.is_compatible(b) {
            return Err(MatchError::InputMismatch {
                metric_a: a.metric(),
                metric_b: b.metric(),
                length_a: a.length(),
                length_b: b.length(),
            });
        }

        let per_query: Vec<Option<CandidateMatch>> = if self.parallel && self.n_threads > 1 {
            let pool = build_thread_pool(self.n_threads)?;
            pool.install(|| {
                (0..a.len())
                    .into_par_iter()
                    .map(|i| self.match_query(a, i, b))
                    .collect()
            })
        } else {
            (0..a.len()).map(|i| self.match_query(a, i, b)).collect()
        };

        let candidates: Vec<CandidateMatch> = per_query.into_iter().flatten().collect();
        debug!(
            queries = a.len(),
            train = b.len(),
            accepted = candidates.len(),
            ratio = self.ratio,
            "NNDR matching finished"
        );
        Ok(candidates)
    }

    fn match_query(&self, a: &DescriptorSet, i: usize, b: &DescriptorSet) -> Option<CandidateMatch> {
        let nn = two_nearest(a, i, b)?;
        if !nn.passes_ratio(self.ratio) {
            return None;
        }
        Some(CandidateMatch {
            query_idx: i,
            train_idx: nn.best,
            source: a.keypoints()[i],
            target: b.keypoints()[nn.best],
            ratio: nn.best_distance / nn.second_distance,
        })
    }
}

/// Two nearest neighbours in `b` of descriptor `i` of `a`.
///
/// `None` when `b` holds fewer than two descriptors, when the row is out of
/// range, or when the sets use different storage.
pub fn two_nearest(a: &DescriptorSet, i: usize, b: &DescriptorSet) -> Option<Neighbours> {
    match (a.data(), b.data()) {
        (DescriptorData::Float(_), DescriptorData::Float(_)) => {
            let q = a.float_row(i)?;
            let nn = scan(b.len(), |j| {
                b.float_row(j)
                    .map_or(f32::INFINITY, |row| squared_euclidean(q, row))
            })?;
            Some(Neighbours {
                best_distance: nn.best_distance.sqrt(),
                second_distance: nn.second_distance.sqrt(),
                ..nn
            })
        }
        (DescriptorData::Binary(_), DescriptorData::Binary(_)) => {
            let q = a.binary_row(i)?;
            scan(b.len(), |j| {
                b.binary_row(j)
                    .map_or(f32::INFINITY, |row| hamming_distance(q, row) as f32)
            })
        }
        _ => None,
    }
}

// Lowest index wins among equal distances.
fn scan<F: Fn(usize) -> f32>(n: usize, dist: F) -> Option<Neighbours> {
    if n < 2 {
        return None;
    }
    let mut best = (usize::MAX, f32::INFINITY);
    let mut second = (usize::MAX, f32::INFINITY);
    for j in 0..n {
        let d = dist(j);
        if d < best.1 {
            second = best;
            best = (j, d);
        } else if d < second.1 {
            second = (j, d);
        }
    }
    // All distances infinite: nothing comparable
    if best.0 == usize::MAX || second.0 == usize::MAX {
        return None;
    }
    Some(Neighbours {
        best: best.0,
        best_distance: best.1,
        second: second.0,
        second_distance: second.1,
    })
}
