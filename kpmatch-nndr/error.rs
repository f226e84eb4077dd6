use kpmatch_core::DescriptorMetric;

#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error(
        "Descriptor sets differ: {metric_a:?}/{length_a} vs {metric_b:?}/{length_b} (metric/length)"
    )]
    InputMismatch {
        metric_a: DescriptorMetric,
        metric_b: DescriptorMetric,
        length_a: usize,
        length_b: usize,
    },
    #[error("Invalid NNDR ratio: {0} (must be in (0, 1))")]
    InvalidRatio(f32),
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type MatchResult<T> = Result<T, MatchError>;
