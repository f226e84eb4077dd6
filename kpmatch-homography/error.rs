#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EstimateError {
    #[error("Insufficient correspondences: found {found}, need at least {required}")]
    InsufficientCorrespondences { found: usize, required: usize },
    #[error("Degenerate geometry: no usable sample in {trials} trials")]
    DegenerateGeometry { trials: usize },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type EstimateResult<T> = Result<T, EstimateError>;
