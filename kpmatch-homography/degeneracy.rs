use kpmatch_core::{CandidateMatch, Keypoint};

/// Triangles of a four-point sample
const TRIANGLES: [[usize; 3]; 4] = [[0, 1, 2], [1, 2, 3], [0, 2, 3], [0, 1, 3]];

/// Twice the signed area of the triangle (a, b, c)
fn signed_area2(a: Keypoint, b: Keypoint, c: Keypoint) -> f64 {
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (bx, by) = (b.x as f64, b.y as f64);
    let (cx, cy) = (c.x as f64, c.y as f64);
    (bx - ax) * (cy - ay) - (by - ay) * (cx - ax)
}

/// Three points are treated as collinear when the triangle height over its
/// longest side, relative to that side, is at most `tolerance`.
/// Coincident points are always collinear.
pub fn is_collinear(a: Keypoint, b: Keypoint, c: Keypoint, tolerance: f64) -> bool {
    let d2 = |p: Keypoint, q: Keypoint| {
        let dx = (p.x - q.x) as f64;
        let dy = (p.y - q.y) as f64;
        dx * dx + dy * dy
    };
    let longest = d2(a, b).max(d2(b, c)).max(d2(a, c));
    if longest <= f64::EPSILON {
        return true;
    }
    signed_area2(a, b, c).abs() <= tolerance * longest
}

/// True when any three of the four points are collinear
pub fn has_collinear_triple(points: &[Keypoint; 4], tolerance: f64) -> bool {
    TRIANGLES
        .iter()
        .any(|t| is_collinear(points[t[0]], points[t[1]], points[t[2]], tolerance))
}

/// The four triangles must keep (or all flip) their orientation from the
/// source to the target image; a mix means no homography can relate them.
pub fn orientation_consistent(src: &[Keypoint; 4], dst: &[Keypoint; 4]) -> bool {
    let flipped = TRIANGLES
        .iter()
        .filter(|t| {
            let s = signed_area2(src[t[0]], src[t[1]], src[t[2]]);
            let d = signed_area2(dst[t[0]], dst[t[1]], dst[t[2]]);
            s * d < 0.0
        })
        .count();
    flipped == 0 || flipped == TRIANGLES.len()
}

/// Sample screening applied before the minimal fit.
///
/// A sample referring past the end of `candidates` counts as degenerate.
pub fn is_degenerate_sample(
    candidates: &[CandidateMatch],
    sample: &[usize; 4],
    tolerance: f64,
    orientation_check: bool,
) -> bool {
    if sample.iter().any(|&i| i >= candidates.len()) {
        return true;
    }
    let src = sample.map(|i| candidates[i].source);
    let dst = sample.map(|i| candidates[i].target);
    if has_collinear_triple(&src, tolerance) || has_collinear_triple(&dst, tolerance) {
        return true;
    }
    orientation_check && !orientation_consistent(&src, &dst)
}
