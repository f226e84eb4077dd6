//! Descriptor-set files produced by an external feature extractor.
//!
//! ```json
//! {"descriptor_type": "mldb", "length": 61,
//!  "features": [{"x": 10.5, "y": 20.0, "descriptor": [12, 255, ...]}]}
//! ```
//!
//! Binary descriptor types carry byte values, float types carry floats.

use std::fs;
use std::path::{Path, PathBuf};

use kpmatch_core::{DescriptorData, DescriptorError, DescriptorMetric, DescriptorSet, DescriptorType, Keypoint};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed descriptor file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Feature {row}: descriptor has {actual} entries, expected {expected}")]
    RowLength { row: usize, expected: usize, actual: usize },
    #[error("Feature {row}: value {value} is not a byte")]
    InvalidByte { row: usize, value: f64 },
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

pub type LoadResult<T> = Result<T, LoadError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub x: f32,
    pub y: f32,
    pub descriptor: Vec<f64>,
}

/// On-disk form of a descriptor set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptorFile {
    pub descriptor_type: DescriptorType,
    pub length: usize,
    pub features: Vec<FeatureRecord>,
}

impl DescriptorFile {
    /// Snapshot of an in-memory set. The stored type must agree with the
    /// set's metric; a mismatching one is replaced by the default of the metric.
    pub fn from_set(set: &DescriptorSet, descriptor_type: DescriptorType) -> Self {
        let descriptor_type = match (set.metric(), descriptor_type.metric()) {
            (a, b) if a == b => descriptor_type,
            (DescriptorMetric::Euclidean, _) => DescriptorType::Msurf,
            (DescriptorMetric::Hamming, _) => DescriptorType::Mldb,
        };
        let features = set
            .keypoints()
            .iter()
            .enumerate()
            .map(|(i, kp)| FeatureRecord {
                x: kp.x,
                y: kp.y,
                descriptor: match set.data() {
                    DescriptorData::Float(_) => set
                        .float_row(i)
                        .map(|r| r.iter().map(|&v| v as f64).collect())
                        .unwrap_or_default(),
                    DescriptorData::Binary(_) => set
                        .binary_row(i)
                        .map(|r| r.iter().map(|&v| v as f64).collect())
                        .unwrap_or_default(),
                },
            })
            .collect();
        Self {
            descriptor_type,
            length: set.length(),
            features,
        }
    }

    /// Validate rows and build the in-memory set
    pub fn into_set(self) -> LoadResult<DescriptorSet> {
        let length = self.length;
        for (row, f) in self.features.iter().enumerate() {
            if f.descriptor.len() != length {
                return Err(LoadError::RowLength {
                    row,
                    expected: length,
                    actual: f.descriptor.len(),
                });
            }
        }

        let keypoints: Vec<Keypoint> = self.features.iter().map(|f| Keypoint::new(f.x, f.y)).collect();
        let data = match self.descriptor_type.metric() {
            DescriptorMetric::Euclidean => DescriptorData::Float(
                self.features
                    .iter()
                    .flat_map(|f| f.descriptor.iter().map(|&v| v as f32))
                    .collect(),
            ),
            DescriptorMetric::Hamming => {
                let mut bytes = Vec::with_capacity(self.features.len() * length);
                for (row, f) in self.features.iter().enumerate() {
                    for &value in &f.descriptor {
                        if value.fract() != 0.0 || !(0.0..=255.0).contains(&value) {
                            return Err(LoadError::InvalidByte { row, value });
                        }
                        bytes.push(value as u8);
                    }
                }
                DescriptorData::Binary(bytes)
            }
        };
        Ok(DescriptorSet::new(keypoints, data, length)?)
    }
}

/// Read and validate a descriptor-set file
pub fn load_descriptor_set<P: AsRef<Path>>(path: P) -> LoadResult<DescriptorSet> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: DescriptorFile = serde_json::from_str(&content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let set = file.into_set()?;
    tracing::debug!(path = %path.display(), features = set.len(), length = set.length(), "Descriptor set loaded");
    Ok(set)
}

/// Write a descriptor set in the format read by [`load_descriptor_set`]
pub fn save_descriptor_set<P: AsRef<Path>>(
    path: P,
    set: &DescriptorSet,
    descriptor_type: DescriptorType,
) -> LoadResult<()> {
    let path = path.as_ref();
    let file = DescriptorFile::from_set(set, descriptor_type);
    let json = serde_json::to_string(&file).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("kpmatch-loader-{tag}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_load_binary_file() {
        let dir = scratch_dir("binary");
        let path = dir.join("binary.json");
        fs::write(
            &path,
            r#"{"descriptor_type": "mldb", "length": 3,
                "features": [{"x": 1.5, "y": 2.0, "descriptor": [0, 128, 255]},
                             {"x": 4.0, "y": 8.25, "descriptor": [1, 2, 3]}]}"#,
        )
        .unwrap();
        let set = load_descriptor_set(&path).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.metric(), DescriptorMetric::Hamming);
        assert_eq!(set.binary_row(0), Some(&[0u8, 128, 255][..]));
        assert_eq!(set.keypoints()[1], Keypoint::new(4.0, 8.25));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_float_file() {
        let dir = scratch_dir("float");
        let path = dir.join("float.json");
        fs::write(
            &path,
            r#"{"descriptor_type": "surf_upright", "length": 2,
                "features": [{"x": 0.0, "y": 0.0, "descriptor": [0.25, -1.5]}]}"#,
        )
        .unwrap();
        let set = load_descriptor_set(&path).unwrap();
        assert_eq!(set.metric(), DescriptorMetric::Euclidean);
        assert_eq!(set.float_row(0), Some(&[0.25f32, -1.5][..]));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_rejects_bad_rows() {
        let file = DescriptorFile {
            descriptor_type: DescriptorType::Mldb,
            length: 2,
            features: vec![FeatureRecord { x: 0.0, y: 0.0, descriptor: vec![1.0] }],
        };
        assert!(matches!(
            file.into_set(),
            Err(LoadError::RowLength { row: 0, expected: 2, actual: 1 })
        ));

        let file = DescriptorFile {
            descriptor_type: DescriptorType::MldbUpright,
            length: 2,
            features: vec![FeatureRecord { x: 0.0, y: 0.0, descriptor: vec![1.0, 300.0] }],
        };
        assert!(matches!(file.into_set(), Err(LoadError::InvalidByte { row: 0, .. })));

        let file = DescriptorFile {
            descriptor_type: DescriptorType::Mldb,
            length: 0,
            features: Vec::new(),
        };
        assert!(matches!(file.into_set(), Err(LoadError::Descriptor(DescriptorError::ZeroLength))));
    }

    #[test]
    fn test_missing_and_malformed_files() {
        let dir = scratch_dir("malformed");
        assert!(matches!(
            load_descriptor_set(dir.join("does_not_exist.json")),
            Err(LoadError::Io { .. })
        ));
        let path = dir.join("garbage.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(load_descriptor_set(&path), Err(LoadError::Parse { .. })));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_save_then_load() {
        let kps = vec![Keypoint::new(3.0, 4.0), Keypoint::new(5.5, 6.5)];
        let set = DescriptorSet::from_binary_rows(kps, &[vec![9, 8], vec![7, 6]], 2).unwrap();
        let dir = scratch_dir("saved");
        let path = dir.join("saved.json");
        save_descriptor_set(&path, &set, DescriptorType::Mldb).unwrap();
        assert_eq!(load_descriptor_set(&path).unwrap(), set);
        fs::remove_dir_all(&dir).unwrap();
    }
}
