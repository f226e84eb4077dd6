//! JSON inlier report.
//!
//! ```json
//! {"points": [{"pattern_point": {"x": 12, "y": 40}, "image_point": {"x": 57, "y": 61}}]}
//! ```
//!
//! `pattern_point` is the keypoint of the first image, `image_point` its
//! match in the second. The file is replaced atomically: readers see either
//! the previous content or the complete new report.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use kpmatch_core::Keypoint;
use kpmatch_homography::InlierSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Report serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Round half up to the nearest pixel
pub fn round_pixel(v: f32) -> i32 {
    (v as f64 + 0.5).floor() as i32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl From<Keypoint> for PixelPoint {
    fn from(kp: Keypoint) -> Self {
        Self {
            x: round_pixel(kp.x),
            y: round_pixel(kp.y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointRecord {
    pub pattern_point: PixelPoint,
    pub image_point: PixelPoint,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlierReport {
    pub points: Vec<PointRecord>,
}

impl InlierReport {
    pub fn empty() -> Self {
        Self::default()
    }

    /// One record per inlier, in inlier order
    pub fn from_inliers(inliers: &InlierSet) -> Self {
        let points = inliers
            .iter()
            .map(|m| PointRecord {
                pattern_point: m.source.into(),
                image_point: m.target.into(),
            })
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Writes inlier reports to a fixed destination
#[derive(Debug, Clone)]
pub struct InlierWriter {
    path: PathBuf,
}

impl InlierWriter {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist `inliers`; on failure the destination is left untouched
    pub fn write(&self, inliers: &InlierSet) -> PersistenceResult<()> {
        self.write_report(&InlierReport::from_inliers(inliers))
    }

    /// Persist a report with no points
    pub fn write_empty(&self) -> PersistenceResult<()> {
        self.write_report(&InlierReport::empty())
    }

    pub fn write_report(&self, report: &InlierReport) -> PersistenceResult<()> {
        let json = serde_json::to_string_pretty(report)?;
        let tmp = self.temp_path();

        if let Err(source) = write_synced(&tmp, json.as_bytes()) {
            let _ = fs::remove_file(&tmp);
            return Err(PersistenceError::Io { path: tmp, source });
        }
        if let Err(source) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(PersistenceError::Io {
                path: self.path.clone(),
                source,
            });
        }

        tracing::debug!(path = %self.path.display(), points = report.len(), "Inlier report written");
        Ok(())
    }

    // Sibling of the destination so the final rename stays on one filesystem
    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "inliers.json".to_string());
        self.path
            .with_file_name(format!(".{name}.{}.tmp", std::process::id()))
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.write_all(b"\n")?;
    file.sync_all()
}

/// Parse a report written by [`InlierWriter`]
pub fn read_inlier_report<P: AsRef<Path>>(path: P) -> PersistenceResult<InlierReport> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}
