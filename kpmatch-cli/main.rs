//! kpmatch: match two descriptor sets and save the homography inliers.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use kpmatch_cli::{InlierWriter, MatchPipeline, PipelineError, load_config, load_descriptor_set};
use kpmatch_homography::{EstimateError, RansacConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kpmatch")]
#[command(about = "Match keypoint descriptors between two images and keep homography inliers")]
#[command(version)]
struct Cli {
    /// Descriptor file of the first (pattern) image
    descriptors_a: PathBuf,

    /// Descriptor file of the second image
    descriptors_b: PathBuf,

    /// Path of the inlier report
    #[arg(long, short, default_value = "./inliers.json")]
    output: PathBuf,

    /// Configuration file (.toml or .json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Nearest-neighbour distance ratio
    #[arg(long)]
    ratio: Option<f32>,

    /// Maximum reprojection error in pixels for an inlier
    #[arg(long)]
    error_threshold: Option<f64>,

    /// Score with the worse of forward and backward transfer error
    #[arg(long)]
    symmetric: bool,

    /// Skip the least-squares refit on the inliers
    #[arg(long)]
    no_refine: bool,

    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads for descriptor matching
    #[arg(long)]
    threads: Option<usize>,

    /// Debug-level logging
    #[arg(long, short)]
    verbose: bool,
}

impl Cli {
    fn ransac_config(&self) -> Result<RansacConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => RansacConfig::default(),
        };
        if let Some(ratio) = self.ratio {
            config.core.nndr_ratio = ratio;
        }
        if let Some(threshold) = self.error_threshold {
            config.core.error_threshold = threshold;
        }
        if self.symmetric {
            config.core.symmetric_error = true;
        }
        if self.no_refine {
            config.core.refine = false;
        }
        if let Some(seed) = self.seed {
            config.core.seed = seed;
        }
        if let Some(threads) = self.threads {
            config.core.n_threads = threads;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config = cli.ransac_config()?;
    tracing::debug!("{}", config.summary());
    let pipeline = MatchPipeline::new(config)?;

    let a = load_descriptor_set(&cli.descriptors_a)
        .with_context(|| format!("loading {}", cli.descriptors_a.display()))?;
    let b = load_descriptor_set(&cli.descriptors_b)
        .with_context(|| format!("loading {}", cli.descriptors_b.display()))?;
    tracing::info!("Features: {} in first set, {} in second", a.len(), b.len());

    let writer = InlierWriter::new(&cli.output);
    let t0 = Instant::now();
    match pipeline.run_and_save(&a, &b, &writer) {
        Ok(output) => {
            tracing::info!(
                "{} candidates, {} inliers, mean error {:.3}px in {:.2?}",
                output.candidates,
                output.estimate.inliers.len(),
                output.estimate.mean_error,
                t0.elapsed()
            );
            tracing::info!("Inliers written to {}", writer.path().display());
            Ok(())
        }
        // Empty report already written
        Err(PipelineError::Estimate(
            err @ (EstimateError::DegenerateGeometry { .. } | EstimateError::InsufficientCorrespondences { .. }),
        )) => {
            tracing::warn!("{err}; empty report written to {}", writer.path().display());
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "kpmatch",
            "a.json",
            "b.json",
            "--ratio",
            "0.7",
            "--error-threshold",
            "3.5",
            "--symmetric",
            "--no-refine",
            "--seed",
            "9",
            "--threads",
            "2",
        ]);
        let cfg = cli.ransac_config().unwrap();
        assert_eq!(cfg.core.nndr_ratio, 0.7);
        assert_eq!(cfg.core.error_threshold, 3.5);
        assert!(cfg.core.symmetric_error);
        assert!(!cfg.core.refine);
        assert_eq!(cfg.core.seed, 9);
        assert_eq!(cfg.core.n_threads, 2);
        assert_eq!(cli.output, PathBuf::from("./inliers.json"));
    }

    #[test]
    fn test_defaults_without_flags() {
        let cli = Cli::parse_from(["kpmatch", "a.json", "b.json", "-o", "out.json"]);
        let cfg = cli.ransac_config().unwrap();
        assert_eq!(cfg, RansacConfig::default());
        assert_eq!(cli.output, PathBuf::from("out.json"));
    }
}
