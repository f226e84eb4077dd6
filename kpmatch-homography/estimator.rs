//! RANSAC search for the homography with the largest consensus.

use kpmatch_core::CandidateMatch;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use crate::config::RansacConfig;
use crate::degeneracy::is_degenerate_sample;
use crate::dlt::{MIN_CORRESPONDENCES, fit_homography};
use crate::error::{EstimateError, EstimateResult};
use crate::sampler::{RandomSource, draw_sample};
use crate::types::{Estimate, Homography, InlierSet};

/// A model together with the candidates it explains
#[derive(Debug, Clone)]
pub struct Consensus {
    pub homography: Homography,
    /// Inlier positions in candidate order
    pub indices: Vec<usize>,
    /// Sum of inlier errors in pixels
    pub total_error: f64,
}

impl Consensus {
    /// More inliers wins; equal counts fall back to the lower total error
    pub fn is_better_than(&self, other: &Consensus) -> bool {
        self.indices.len() > other.indices.len()
            || (self.indices.len() == other.indices.len() && self.total_error < other.total_error)
    }
}

/// Trials needed to draw one all-inlier sample of four with probability
/// `confidence`, given the inlier ratio seen so far.
///
/// Clamped to `[trials_so_far, max_trials]`.
pub fn adaptive_trial_bound(confidence: f64, inlier_ratio: f64, trials_so_far: usize, max_trials: usize) -> usize {
    if inlier_ratio <= 0.0 || confidence <= 0.0 {
        return max_trials;
    }
    let denom = (1.0 - inlier_ratio.min(1.0).powi(MIN_CORRESPONDENCES as i32))
        .max(1e-12)
        .ln();
    if denom >= 0.0 {
        return max_trials;
    }
    let needed = ((1.0 - confidence).ln() / denom).ceil();
    let needed = if needed.is_finite() && needed >= 0.0 { needed as usize } else { max_trials };
    needed.clamp(trials_so_far.min(max_trials), max_trials)
}

/// Robust homography fit over a list of candidate matches
#[derive(Debug, Clone)]
pub struct HomographyEstimator {
    config: RansacConfig,
}

impl HomographyEstimator {
    /// Creates an estimator after validating the configuration
    pub fn new(config: RansacConfig) -> EstimateResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RansacConfig {
        &self.config
    }

    /// Run RANSAC with a `StdRng` seeded from the configuration.
    ///
    /// Identical candidates and seed give identical results.
    pub fn estimate(&self, candidates: &[CandidateMatch]) -> EstimateResult<Estimate> {
        let mut rng = StdRng::seed_from_u64(self.config.core.seed);
        self.estimate_with(candidates, &mut rng)
    }

    /// Run RANSAC drawing samples from `rng`.
    ///
    /// Fails with `InsufficientCorrespondences` below four candidates and with
    /// `DegenerateGeometry` when no trial produced a model. A model that
    /// explains no candidate is returned with an empty inlier set.
    pub fn estimate_with<S: RandomSource + ?Sized>(
        &self,
        candidates: &[CandidateMatch],
        rng: &mut S,
    ) -> EstimateResult<Estimate> {
        let n = candidates.len();
        if n < MIN_CORRESPONDENCES {
            return Err(EstimateError::InsufficientCorrespondences {
                found: n,
                required: MIN_CORRESPONDENCES,
            });
        }

        let cfg = &self.config;
        let mut pool = vec![0usize; n];
        let mut best: Option<Consensus> = None;
        let mut bound = cfg.max_trials;
        let mut trials = 0;

        while trials < bound {
            trials += 1;

            let Some(homography) = self.draw_minimal_model(candidates, &mut pool, rng) else {
                continue;
            };

            let consensus = self.score(homography, candidates);
            if best.as_ref().is_none_or(|b| consensus.is_better_than(b)) {
                let ratio = consensus.indices.len() as f64 / n as f64;
                bound = adaptive_trial_bound(cfg.confidence, ratio, trials, cfg.max_trials);
                debug!(
                    trial = trials,
                    inliers = consensus.indices.len(),
                    total_error = consensus.total_error,
                    bound,
                    "New best homography"
                );
                best = Some(consensus);
            }
        }

        let Some(mut best) = best else {
            return Err(EstimateError::DegenerateGeometry { trials });
        };

        let mut refinements = 0;
        if cfg.core.refine && best.indices.len() >= MIN_CORRESPONDENCES {
            for iteration in 0..cfg.max_refine_iterations {
                let (src, dst) = point_arrays(candidates, &best.indices);
                let Some(homography) = fit_homography(&src, &dst) else {
                    break;
                };
                let refit = self.score(homography, candidates);
                if refit.indices.len() < best.indices.len() {
                    debug!(iteration, before = best.indices.len(), after = refit.indices.len(), "Refit rejected");
                    break;
                }
                let converged = refit.indices == best.indices;
                best = refit;
                refinements += 1;
                if converged {
                    break;
                }
            }
        }

        let count = best.indices.len();
        let mean_error = if count > 0 { best.total_error / count as f64 } else { 0.0 };
        debug!(
            candidates = n,
            inliers = count,
            trials,
            refinements,
            mean_error,
            "RANSAC finished"
        );

        Ok(Estimate {
            homography: best.homography,
            inliers: InlierSet::from_indices(candidates, best.indices),
            trials,
            refinements,
            mean_error,
        })
    }

    /// Error of one candidate under `homography`, using the configured metric.
    ///
    /// `inverse` is only consulted for symmetric scoring.
    pub fn candidate_error(&self, homography: &Homography, inverse: Option<&Homography>, m: &CandidateMatch) -> f64 {
        let forward = homography.forward_error(m);
        if !self.config.core.symmetric_error {
            return forward;
        }
        match inverse {
            Some(inv) => forward.max(Homography::backward_error(inv, m)),
            None => f64::INFINITY,
        }
    }

    /// Classify every candidate against `homography`
    pub fn score(&self, homography: Homography, candidates: &[CandidateMatch]) -> Consensus {
        let inverse = if self.config.core.symmetric_error {
            homography.inverse()
        } else {
            None
        };
        let threshold = self.config.core.error_threshold;

        let mut indices = Vec::new();
        let mut total_error = 0.0;
        for (i, m) in candidates.iter().enumerate() {
            let err = self.candidate_error(&homography, inverse.as_ref(), m);
            if err < threshold {
                indices.push(i);
                total_error += err;
            }
        }
        Consensus {
            homography,
            indices,
            total_error,
        }
    }

    /// Inlier set of `candidates` under a given homography
    pub fn classify(&self, homography: Homography, candidates: &[CandidateMatch]) -> InlierSet {
        let consensus = self.score(homography, candidates);
        InlierSet::from_indices(candidates, consensus.indices)
    }

    /// Minimal-sample fit for one trial. Degenerate samples and near-singular
    /// fits are redrawn up to `max_resample_attempts` times.
    fn draw_minimal_model<S: RandomSource + ?Sized>(
        &self,
        candidates: &[CandidateMatch],
        pool: &mut [usize],
        rng: &mut S,
    ) -> Option<Homography> {
        for _ in 0..self.config.max_resample_attempts {
            let sample = draw_sample::<S, MIN_CORRESPONDENCES>(pool, rng)?;
            if is_degenerate_sample(
                candidates,
                &sample,
                self.config.collinearity_tolerance,
                self.config.orientation_check,
            ) {
                continue;
            }
            let (src, dst) = point_arrays(candidates, &sample);
            if let Some(homography) = fit_homography(&src, &dst) {
                return Some(homography);
            }
        }
        None
    }
}

fn point_arrays(candidates: &[CandidateMatch], indices: &[usize]) -> (Vec<[f64; 2]>, Vec<[f64; 2]>) {
    indices
        .iter()
        .map(|&i| {
            let m = &candidates[i];
            (
                [m.source.x as f64, m.source.y as f64],
                [m.target.x as f64, m.target.y as f64],
            )
        })
        .unzip()
}
