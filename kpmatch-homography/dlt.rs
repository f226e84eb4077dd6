//! Normalized Direct Linear Transform.
//!
//! Points are conditioned with Hartley normalization (centroid at the origin,
//! mean distance √2) before the linear solve and the result is mapped back to
//! pixel coordinates. With four correspondences this is the exact minimal
//! solve; with more it is the algebraic least-squares fit.

use nalgebra::{DMatrix, Matrix3, SymmetricEigen};

use crate::types::Homography;

/// Minimal number of correspondences for a homography
pub const MIN_CORRESPONDENCES: usize = 4;

/// Smallest admissible |det| of the fitted matrix in normalized coordinates
const MIN_NORMALIZED_DET: f64 = 1e-8;

/// Normalizing transform `T` and the transformed points.
///
/// `None` for empty input or when all points coincide.
pub fn normalize_points(points: &[[f64; 2]]) -> Option<(Matrix3<f64>, Vec<[f64; 2]>)> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy = points.iter().map(|p| p[1]).sum::<f64>() / n;

    let mean_dist = points
        .iter()
        .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    if !mean_dist.is_finite() || mean_dist < 1e-12 {
        return None;
    }

    let s = std::f64::consts::SQRT_2 / mean_dist;
    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let normalized = points
        .iter()
        .map(|p| [s * (p[0] - cx), s * (p[1] - cy)])
        .collect();
    Some((t, normalized))
}

/// Fit `H` with `dst ≈ H·src` from at least four correspondences.
///
/// Returns `None` when the input is too small, the point configuration cannot
/// be normalized, or the solution is numerically singular.
pub fn fit_homography(src: &[[f64; 2]], dst: &[[f64; 2]]) -> Option<Homography> {
    let n = src.len();
    if n < MIN_CORRESPONDENCES || dst.len() != n {
        return None;
    }

    let (t_src, src_n) = normalize_points(src)?;
    let (t_dst, dst_n) = normalize_points(dst)?;

    let mut a = DMatrix::<f64>::zeros(2 * n, 9);
    for (i, (s, d)) in src_n.iter().zip(dst_n.iter()).enumerate() {
        let (x, y) = (s[0], s[1]);
        let (u, v) = (d[0], d[1]);
        let r0 = 2 * i;
        let r1 = r0 + 1;

        a[(r0, 0)] = -x;
        a[(r0, 1)] = -y;
        a[(r0, 2)] = -1.0;
        a[(r0, 6)] = u * x;
        a[(r0, 7)] = u * y;
        a[(r0, 8)] = u;

        a[(r1, 3)] = -x;
        a[(r1, 4)] = -y;
        a[(r1, 5)] = -1.0;
        a[(r1, 6)] = v * x;
        a[(r1, 7)] = v * y;
        a[(r1, 8)] = v;
    }

    // Null vector of A = eigenvector of AᵀA with the smallest eigenvalue.
    // Works for the 8×9 minimal system without padding.
    let ata = a.transpose() * &a;
    let eig = SymmetricEigen::new(ata);
    let min_idx = eig
        .eigenvalues
        .iter()
        .enumerate()
        .min_by(|(_, l), (_, r)| l.abs().total_cmp(&r.abs()))
        .map(|(i, _)| i)?;
    let h = eig.eigenvectors.column(min_idx);
    let h_norm = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]);

    let frob = h_norm.norm();
    if frob < f64::EPSILON || (h_norm / frob).determinant().abs() < MIN_NORMALIZED_DET {
        return None;
    }

    let t_dst_inv = t_dst.try_inverse()?;
    Homography::from_matrix(t_dst_inv * h_norm * t_src)
}
