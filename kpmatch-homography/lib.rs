//! Robust planar homography estimation over candidate matches.
//!
//! [`HomographyEstimator`] runs RANSAC with an adaptive trial budget on top of
//! a normalized four-point DLT, screens degenerate samples, and optionally
//! refits on the consensus set until it stops changing. Samples come from any
//! [`RandomSource`], so runs are reproducible under a fixed seed.

pub mod builder;
pub mod config;
pub mod degeneracy;
pub mod dlt;
pub mod error;
pub mod estimator;
pub mod sampler;
pub mod synthetic;
pub mod types;

pub use builder::EstimatorBuilder;
pub use config::RansacConfig;
pub use degeneracy::is_degenerate_sample;
pub use dlt::{MIN_CORRESPONDENCES, fit_homography, normalize_points};
pub use error::{EstimateError, EstimateResult};
pub use estimator::{Consensus, HomographyEstimator, adaptive_trial_bound};
pub use sampler::{RandomSource, draw_sample};
pub use synthetic::{SyntheticData, SyntheticScene};
pub use types::{Estimate, Homography, InlierSet};
