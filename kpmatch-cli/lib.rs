use std::path::Path;

use kpmatch_core::{CandidateMatch, DescriptorSet};
use kpmatch_homography::{Estimate, EstimateError, HomographyEstimator, RansacConfig};
use kpmatch_nndr::{CandidateMatcher, MatchError};
use tracing::{info, warn};

pub mod loader;
pub mod writer;

pub use kpmatch_core::{self, DescriptorType, Keypoint, MatchConfig};
pub use kpmatch_homography::{self, EstimatorBuilder, InlierSet, SyntheticScene};
pub use kpmatch_nndr;
pub use loader::{LoadError, load_descriptor_set, save_descriptor_set};
pub use writer::{InlierReport, InlierWriter, PersistenceError, read_inlier_report};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Matching error: {0}")]
    Match(#[from] MatchError),
    #[error("Estimation error: {0}")]
    Estimate(#[from] EstimateError),
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("Load error: {0}")]
    Load(#[from] LoadError),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result of one matching run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Candidates that passed the ratio test
    pub candidates: usize,
    pub estimate: Estimate,
}

impl PipelineOutput {
    /// Persist the inliers. The output stays usable when the write fails.
    pub fn save(&self, writer: &InlierWriter) -> Result<(), PersistenceError> {
        writer.write(&self.estimate.inliers)
    }
}

/// Load a `RansacConfig` from a `.toml` or `.json` file
pub fn load_config<P: AsRef<Path>>(path: P) -> PipelineResult<RansacConfig> {
    let path = path.as_ref();
    let loaded = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => RansacConfig::load_toml(path),
        Some("json") => RansacConfig::load_json(path),
        _ => {
            return Err(PipelineError::Config(format!(
                "unsupported config format: {}",
                path.display()
            )));
        }
    };
    loaded.map_err(|e| PipelineError::Config(format!("{}: {e}", path.display())))
}

/// NNDR matching followed by RANSAC verification, configured from one place
pub struct MatchPipeline {
    matcher: CandidateMatcher,
    estimator: HomographyEstimator,
}

impl MatchPipeline {
    /// Create a pipeline; the configuration is validated up front
    pub fn new(config: RansacConfig) -> PipelineResult<Self> {
        let n_threads = config.core.n_threads.max(1);
        let matcher = CandidateMatcher::new(config.core.nndr_ratio)?
            .with_parallel(n_threads > 1)
            .with_threads(n_threads);
        let estimator = HomographyEstimator::new(config)?;
        Ok(Self { matcher, estimator })
    }

    pub fn config(&self) -> &RansacConfig {
        self.estimator.config()
    }

    pub fn matcher(&self) -> &CandidateMatcher {
        &self.matcher
    }

    pub fn estimator(&self) -> &HomographyEstimator {
        &self.estimator
    }

    /// Candidate correspondences between the two sets
    pub fn candidates(&self, a: &DescriptorSet, b: &DescriptorSet) -> PipelineResult<Vec<CandidateMatch>> {
        Ok(self.matcher.match_sets(a, b)?)
    }

    /// Homography and inliers for a candidate list
    pub fn estimate(&self, candidates: &[CandidateMatch]) -> PipelineResult<Estimate> {
        Ok(self.estimator.estimate(candidates)?)
    }

    /// Match and verify
    pub fn run(&self, a: &DescriptorSet, b: &DescriptorSet) -> PipelineResult<PipelineOutput> {
        let candidates = self.candidates(a, b)?;
        let estimate = self.estimate(&candidates)?;
        info!(
            features_a = a.len(),
            features_b = b.len(),
            candidates = candidates.len(),
            inliers = estimate.inliers.len(),
            trials = estimate.trials,
            mean_error = estimate.mean_error,
            "Matching finished"
        );
        Ok(PipelineOutput {
            candidates: candidates.len(),
            estimate,
        })
    }

    /// Run and persist the inliers.
    ///
    /// Degenerate geometry and too few candidates still produce a report
    /// with no points; the error is returned after it is written.
    /// A failed write discards the results; use [`MatchPipeline::run`] and
    /// [`PipelineOutput::save`] to keep them.
    pub fn run_and_save(
        &self,
        a: &DescriptorSet,
        b: &DescriptorSet,
        writer: &InlierWriter,
    ) -> PipelineResult<PipelineOutput> {
        match self.run(a, b) {
            Ok(output) => {
                output.save(writer)?;
                Ok(output)
            }
            Err(PipelineError::Estimate(
                err @ (EstimateError::DegenerateGeometry { .. } | EstimateError::InsufficientCorrespondences { .. }),
            )) => {
                warn!(error = %err, path = %writer.path().display(), "No homography; writing empty report");
                writer.write_empty()?;
                Err(err.into())
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kpmatch_core::Keypoint;

    fn binary_set(points: &[(f32, f32)], rows: &[Vec<u8>]) -> DescriptorSet {
        let kps = points.iter().map(|&(x, y)| Keypoint::new(x, y)).collect();
        DescriptorSet::from_binary_rows(kps, rows, rows[0].len()).unwrap()
    }

    #[test]
    fn test_pipeline_rejects_bad_ratio() {
        let mut cfg = RansacConfig::default();
        cfg.core.nndr_ratio = 1.5;
        assert!(matches!(MatchPipeline::new(cfg), Err(PipelineError::Match(MatchError::InvalidRatio(_)))));
    }

    #[test]
    fn test_mismatched_sets_surface_input_mismatch() {
        let pipeline = MatchPipeline::new(RansacConfig::default()).unwrap();
        let a = binary_set(&[(0.0, 0.0)], &[vec![0, 0]]);
        let b = binary_set(&[(0.0, 0.0), (1.0, 1.0)], &[vec![0, 0, 0], vec![1, 1, 1]]);
        assert!(matches!(
            pipeline.run(&a, &b),
            Err(PipelineError::Match(MatchError::InputMismatch { .. }))
        ));
    }

    #[test]
    fn test_too_few_candidates_write_empty_report() {
        let dir = std::env::temp_dir().join(format!("kpmatch-pipeline-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let writer = InlierWriter::new(dir.join("inliers.json"));

        let pipeline = MatchPipeline::new(RansacConfig::default()).unwrap();
        let a = binary_set(&[(0.0, 0.0), (5.0, 5.0)], &[vec![0x00], vec![0xff]]);
        let b = binary_set(&[(1.0, 1.0), (6.0, 6.0), (9.0, 9.0)], &[vec![0x00], vec![0xff], vec![0x0f]]);
        let err = pipeline.run_and_save(&a, &b, &writer).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Estimate(EstimateError::InsufficientCorrespondences { found: 2, .. })
        ));
        assert!(read_inlier_report(writer.path()).unwrap().is_empty());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_failed_save_keeps_results() {
        let dir = std::env::temp_dir().join(format!("kpmatch-pipeline-save-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let pipeline = MatchPipeline::new(RansacConfig::default()).unwrap();
        let data = SyntheticScene::default().with_counts(40, 10).with_seed(5).generate();
        let output = PipelineOutput {
            candidates: data.candidates.len(),
            estimate: pipeline.estimate(&data.candidates).unwrap(),
        };

        let missing = InlierWriter::new(dir.join("no_such_dir").join("inliers.json"));
        assert!(matches!(output.save(&missing), Err(PersistenceError::Io { .. })));

        let writer = InlierWriter::new(dir.join("inliers.json"));
        output.save(&writer).unwrap();
        assert_eq!(read_inlier_report(writer.path()).unwrap().len(), output.estimate.inliers.len());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_unknown_config_extension() {
        assert!(matches!(load_config("settings.yaml"), Err(PipelineError::Config(_))));
    }
}
