#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Keypoint location in image pixel coordinates (subpixel precision)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Distance used to compare two descriptors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DescriptorMetric {
    /// L2 distance between floating-point descriptors
    Euclidean,
    /// Bit count of the XOR of packed binary descriptors
    Hamming,
}

/// Descriptor families produced by the AKAZE extractor.
///
/// The order matters: everything before `MldbUpright` is a gradient-based
/// float descriptor, the MLDB variants are packed binary strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DescriptorType {
    SurfUpright,
    Surf,
    MsurfUpright,
    Msurf,
    MldbUpright,
    Mldb,
}

impl DescriptorType {
    pub fn metric(self) -> DescriptorMetric {
        if self < DescriptorType::MldbUpright {
            DescriptorMetric::Euclidean
        } else {
            DescriptorMetric::Hamming
        }
    }
}

/// Row-major descriptor storage, one row per keypoint
#[derive(Debug, Clone, PartialEq)]
pub enum DescriptorData {
    Float(Vec<f32>),
    Binary(Vec<u8>),
}

impl DescriptorData {
    pub fn metric(&self) -> DescriptorMetric {
        match self {
            DescriptorData::Float(_) => DescriptorMetric::Euclidean,
            DescriptorData::Binary(_) => DescriptorMetric::Hamming,
        }
    }

    fn raw_len(&self) -> usize {
        match self {
            DescriptorData::Float(v) => v.len(),
            DescriptorData::Binary(v) => v.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DescriptorError {
    #[error("Descriptor length must be > 0")]
    ZeroLength,
    #[error("Descriptor data length mismatch: expected {expected}, got {actual}")]
    DataLength { expected: usize, actual: usize },
}

/// Keypoints of one image together with their descriptors.
///
/// `length` is the number of elements per descriptor row: floats for
/// Euclidean descriptors, bytes for binary ones.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorSet {
    keypoints: Vec<Keypoint>,
    data: DescriptorData,
    length: usize,
}

impl DescriptorSet {
    pub fn new(keypoints: Vec<Keypoint>, data: DescriptorData, length: usize) -> Result<Self, DescriptorError> {
        if length == 0 {
            return Err(DescriptorError::ZeroLength);
        }
        let expected = keypoints.len() * length;
        if data.raw_len() != expected {
            return Err(DescriptorError::DataLength {
                expected,
                actual: data.raw_len(),
            });
        }
        Ok(Self { keypoints, data, length })
    }

    /// Build a float descriptor set from per-keypoint rows
    pub fn from_float_rows(keypoints: Vec<Keypoint>, rows: &[Vec<f32>], length: usize) -> Result<Self, DescriptorError> {
        let data = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Self::new(keypoints, DescriptorData::Float(data), length)
    }

    /// Build a binary descriptor set from per-keypoint rows
    pub fn from_binary_rows(keypoints: Vec<Keypoint>, rows: &[Vec<u8>], length: usize) -> Result<Self, DescriptorError> {
        let data = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Self::new(keypoints, DescriptorData::Binary(data), length)
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    pub fn metric(&self) -> DescriptorMetric {
        self.data.metric()
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn data(&self) -> &DescriptorData {
        &self.data
    }

    /// Float row `i`, or `None` for binary sets
    pub fn float_row(&self, i: usize) -> Option<&[f32]> {
        match &self.data {
            DescriptorData::Float(v) => v.get(i * self.length..(i + 1) * self.length),
            DescriptorData::Binary(_) => None,
        }
    }

    /// Binary row `i`, or `None` for float sets
    pub fn binary_row(&self, i: usize) -> Option<&[u8]> {
        match &self.data {
            DescriptorData::Binary(v) => v.get(i * self.length..(i + 1) * self.length),
            DescriptorData::Float(_) => None,
        }
    }

    /// Two sets can be matched when they share metric and row length
    pub fn is_compatible(&self, other: &DescriptorSet) -> bool {
        self.metric() == other.metric() && self.length == other.length
    }
}

/// Candidate correspondence accepted by the NNDR test
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CandidateMatch {
    /// Index of the keypoint in the first (query) set
    pub query_idx: usize,
    /// Index of the keypoint in the second (train) set
    pub train_idx: usize,
    pub source: Keypoint,
    pub target: Keypoint,
    /// Best distance divided by second-best distance
    pub ratio: f32,
}

/// Settings shared by every stage of a matching run
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatchConfig {
    /// NNDR threshold in (0, 1)
    pub nndr_ratio: f32,
    /// Maximum reprojection error in pixels for an inlier
    pub error_threshold: f64,
    /// Score candidates by the worse of forward and inverse reprojection error
    pub symmetric_error: bool,
    /// Least-squares refit on all inliers after the trial loop
    pub refine: bool,
    /// Seed of the RANSAC random sequence
    pub seed: u64,
    pub n_threads: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            nndr_ratio: 0.80,
            error_threshold: 2.50,
            symmetric_error: false,
            refine: true,
            seed: 42,
            n_threads: num_cpus::get().max(1),
        }
    }
}

/// Build a dedicated Rayon thread pool with the specified number of threads
pub fn build_thread_pool(n_threads: usize) -> Result<rayon::ThreadPool, rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads.max(1))
        .build()
}
