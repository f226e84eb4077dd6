use kpmatch_core::{CandidateMatch, Keypoint};
use nalgebra::{Matrix3, Vector3};

/// Projective transform `x' ~ H x` between the two image planes.
///
/// Stored with `H[2,2] == 1` whenever that entry is not vanishingly small,
/// otherwise with unit Frobenius norm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography(Matrix3<f64>);

impl Homography {
    /// Wrap a matrix, fixing its scale. `None` for non-finite or zero input.
    pub fn from_matrix(m: Matrix3<f64>) -> Option<Self> {
        if m.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let norm = m.norm();
        if norm < f64::EPSILON {
            return None;
        }
        let scale = m[(2, 2)];
        let h = if scale.abs() > 1e-12 * norm { m / scale } else { m / norm };
        Some(Self(h))
    }

    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.0
    }

    /// Map a point; `None` when it lands on the line at infinity
    pub fn map(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let p = self.0 * Vector3::new(x, y, 1.0);
        if p[2].abs() < 1e-12 {
            return None;
        }
        Some((p[0] / p[2], p[1] / p[2]))
    }

    pub fn apply(&self, kp: Keypoint) -> Option<(f64, f64)> {
        self.map(kp.x as f64, kp.y as f64)
    }

    pub fn inverse(&self) -> Option<Homography> {
        self.0.try_inverse().and_then(Self::from_matrix)
    }

    /// Distance between `H·source` and `target`, infinite if unmappable
    pub fn forward_error(&self, m: &CandidateMatch) -> f64 {
        transfer_error(self, m.source, m.target)
    }

    /// Distance between `H⁻¹·target` and `source`; `inverse` must be `self.inverse()`
    pub fn backward_error(inverse: &Homography, m: &CandidateMatch) -> f64 {
        transfer_error(inverse, m.target, m.source)
    }
}

fn transfer_error(h: &Homography, from: Keypoint, to: Keypoint) -> f64 {
    match h.apply(from) {
        Some((u, v)) => {
            let du = u - to.x as f64;
            let dv = v - to.y as f64;
            (du * du + dv * dv).sqrt()
        }
        None => f64::INFINITY,
    }
}

/// Candidates consistent with the selected homography, in candidate order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlierSet {
    /// Positions in the candidate list
    pub indices: Vec<usize>,
    pub matches: Vec<CandidateMatch>,
}

impl InlierSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Stable filter of `candidates` by ascending `indices`.
    ///
    /// Indices past the end of `candidates` are dropped.
    pub fn from_indices(candidates: &[CandidateMatch], mut indices: Vec<usize>) -> Self {
        indices.retain(|&i| i < candidates.len());
        let matches = indices.iter().map(|&i| candidates[i]).collect();
        Self { indices, matches }
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CandidateMatch> {
        self.matches.iter()
    }

    /// (pattern point, image point) pairs
    pub fn point_pairs(&self) -> Vec<(Keypoint, Keypoint)> {
        self.matches.iter().map(|m| (m.source, m.target)).collect()
    }
}

/// Outcome of a successful RANSAC run
#[derive(Debug, Clone)]
pub struct Estimate {
    pub homography: Homography,
    pub inliers: InlierSet,
    /// Trials actually performed
    pub trials: usize,
    /// Accepted least-squares refits
    pub refinements: usize,
    /// Mean inlier reprojection error in pixels (0 when there are no inliers)
    pub mean_error: f64,
}
