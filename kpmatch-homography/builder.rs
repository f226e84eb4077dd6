use kpmatch_core::MatchConfig;

use crate::config::RansacConfig;
use crate::error::EstimateResult;
use crate::estimator::HomographyEstimator;

/// Builder for creating a `HomographyEstimator`
#[derive(Debug, Clone)]
pub struct EstimatorBuilder {
    config: MatchConfig,
    confidence: f64,
    max_trials: usize,
    max_resample_attempts: usize,
    max_refine_iterations: usize,
    collinearity_tolerance: f64,
    orientation_check: bool,
}

impl Default for EstimatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EstimatorBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::from_config(RansacConfig::default())
    }

    /// Set the inlier reprojection threshold in pixels
    pub fn error_threshold(mut self, pixels: f64) -> Self {
        self.config.error_threshold = pixels;
        self
    }

    /// Score with the worse of forward and backward transfer error
    pub fn symmetric_error(mut self, enable: bool) -> Self {
        self.config.symmetric_error = enable;
        self
    }

    /// Enable or disable the least-squares refit on the inliers
    pub fn refine(mut self, enable: bool) -> Self {
        self.config.refine = enable;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Set the NNDR ratio carried along in the configuration
    pub fn nndr_ratio(mut self, ratio: f32) -> Self {
        self.config.nndr_ratio = ratio;
        self
    }

    /// Set the number of threads for parallel matching
    pub fn threads(mut self, n_threads: usize) -> Self {
        self.config.n_threads = n_threads;
        self
    }

    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn max_trials(mut self, trials: usize) -> Self {
        self.max_trials = trials;
        self
    }

    pub fn max_resample_attempts(mut self, attempts: usize) -> Self {
        self.max_resample_attempts = attempts;
        self
    }

    pub fn max_refine_iterations(mut self, iterations: usize) -> Self {
        self.max_refine_iterations = iterations;
        self
    }

    pub fn collinearity_tolerance(mut self, tolerance: f64) -> Self {
        self.collinearity_tolerance = tolerance;
        self
    }

    /// Enable or disable the triangle orientation test on samples
    pub fn orientation_check(mut self, enable: bool) -> Self {
        self.orientation_check = enable;
        self
    }

    /// Apply the fast preset
    pub fn preset_fast(self) -> Self {
        self.apply_preset(RansacConfig::fast_preset())
    }

    /// Apply the precise preset
    pub fn preset_precise(self) -> Self {
        self.apply_preset(RansacConfig::precise_preset())
    }

    // Seed survives preset changes
    fn apply_preset(self, preset: RansacConfig) -> Self {
        let seed = self.config.seed;
        let mut next = Self::from_config(preset);
        next.config.seed = seed;
        next
    }

    /// Build the `HomographyEstimator`
    pub fn build(self) -> EstimateResult<HomographyEstimator> {
        HomographyEstimator::new(self.to_config())
    }

    /// Generate a summary of the builder's configuration
    pub fn summary(&self) -> String {
        self.clone().to_config().summary()
    }

    /// Create a builder from an existing `RansacConfig`
    pub fn from_config(config: RansacConfig) -> Self {
        Self {
            config: config.core,
            confidence: config.confidence,
            max_trials: config.max_trials,
            max_resample_attempts: config.max_resample_attempts,
            max_refine_iterations: config.max_refine_iterations,
            collinearity_tolerance: config.collinearity_tolerance,
            orientation_check: config.orientation_check,
        }
    }

    /// Convert the builder into a `RansacConfig`
    pub fn to_config(self) -> RansacConfig {
        RansacConfig {
            core: self.config,
            confidence: self.confidence,
            max_trials: self.max_trials,
            max_resample_attempts: self.max_resample_attempts,
            max_refine_iterations: self.max_refine_iterations,
            collinearity_tolerance: self.collinearity_tolerance,
            orientation_check: self.orientation_check,
            name: None,
            description: None,
        }
    }
}
