use kpmatch_core::MatchConfig;

use crate::builder::EstimatorBuilder;
use crate::error::{EstimateError, EstimateResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Complete estimator configuration with all settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RansacConfig {
    /// Matching and scoring settings shared with the NNDR stage
    pub core: MatchConfig,
    /// Probability of drawing at least one all-inlier sample
    pub confidence: f64,
    /// Hard cap on RANSAC trials
    pub max_trials: usize,
    /// Redraws allowed per trial when a sample is degenerate
    pub max_resample_attempts: usize,
    pub max_refine_iterations: usize,
    /// Twice the triangle area over the squared longest side below which
    /// three points count as collinear
    pub collinearity_tolerance: f64,
    /// Reject samples whose triangles change orientation between images
    pub orientation_check: bool,
    /// Metadata
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub name: Option<String>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub description: Option<String>,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RansacConfig {
    /// Create new configuration with default settings
    pub fn new() -> Self {
        Self {
            core: MatchConfig::default(),
            confidence: 0.995,
            max_trials: 2000,
            max_resample_attempts: 300,
            max_refine_iterations: 10,
            collinearity_tolerance: 1e-4,
            orientation_check: true,
            name: None,
            description: None,
        }
    }

    /// Fewer trials and a single refit, for interactive use
    pub fn fast_preset() -> Self {
        Self {
            core: MatchConfig {
                refine: true,
                n_threads: num_cpus::get().max(1),
                ..MatchConfig::default()
            },
            confidence: 0.99,
            max_trials: 500,
            max_resample_attempts: 100,
            max_refine_iterations: 1,
            collinearity_tolerance: 1e-4,
            orientation_check: true,
            name: Some("Fast".to_string()),
            description: Some("Reduced trial budget with a single least-squares refit".to_string()),
        }
    }

    /// Tighter threshold, symmetric scoring and a large trial budget
    pub fn precise_preset() -> Self {
        Self {
            core: MatchConfig {
                error_threshold: 1.5,
                symmetric_error: true,
                refine: true,
                n_threads: num_cpus::get().max(1),
                ..MatchConfig::default()
            },
            confidence: 0.999,
            max_trials: 10_000,
            max_resample_attempts: 1000,
            max_refine_iterations: 20,
            collinearity_tolerance: 1e-3,
            orientation_check: true,
            name: Some("Precise".to_string()),
            description: Some("Symmetric transfer error with an extended trial budget".to_string()),
        }
    }

    /// Add metadata to configuration
    pub fn with_metadata(mut self, name: &str, description: &str) -> Self {
        self.name = Some(name.to_string());
        self.description = Some(description.to_string());
        self
    }

    /// Convert to EstimatorBuilder for further customization
    pub fn to_builder(self) -> EstimatorBuilder {
        EstimatorBuilder::from_config(self)
    }

    /// Generate human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "RansacConfig: ratio={:.2}, threshold={:.2}px, confidence={}, max_trials={}, flags=[symmetric:{}, refine:{}, orientation:{}], seed={}",
            self.core.nndr_ratio,
            self.core.error_threshold,
            self.confidence,
            self.max_trials,
            self.core.symmetric_error,
            self.core.refine,
            self.orientation_check,
            self.core.seed
        )
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> EstimateResult<()> {
        let ratio = self.core.nndr_ratio;
        if !ratio.is_finite() || ratio <= 0.0 || ratio >= 1.0 {
            return Err(EstimateError::InvalidConfig(format!(
                "nndr_ratio must lie in (0, 1), got {ratio}"
            )));
        }
        let threshold = self.core.error_threshold;
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(EstimateError::InvalidConfig(format!(
                "error_threshold must be positive, got {threshold}"
            )));
        }
        if !self.confidence.is_finite() || self.confidence <= 0.0 || self.confidence >= 1.0 {
            return Err(EstimateError::InvalidConfig(format!(
                "confidence must lie in (0, 1), got {}",
                self.confidence
            )));
        }
        if self.max_trials == 0 {
            return Err(EstimateError::InvalidConfig("max_trials must be at least 1".to_string()));
        }
        if self.max_resample_attempts == 0 {
            return Err(EstimateError::InvalidConfig(
                "max_resample_attempts must be at least 1".to_string(),
            ));
        }
        if !self.collinearity_tolerance.is_finite() || self.collinearity_tolerance < 0.0 {
            return Err(EstimateError::InvalidConfig(format!(
                "collinearity_tolerance must be non-negative, got {}",
                self.collinearity_tolerance
            )));
        }
        Ok(())
    }

    /// Save configuration to JSON file
    #[cfg(feature = "serde")]
    pub fn save_json<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from JSON file
    #[cfg(feature = "serde")]
    pub fn load_json<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save configuration to TOML file
    #[cfg(feature = "serde")]
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Load configuration from TOML file
    #[cfg(feature = "serde")]
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Serialize to JSON string
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML string
    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserialize from TOML string
    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }
}
