//! Projective transforms between the frame and the rectified puzzle square.
//!
//! Coordinates follow the area convention: pixel `(i, j)` covers
//! `[i, i+1) × [j, j+1)` and its center sits at `(i + 0.5, j + 0.5)`.

use crate::{sample_bilinear_u8, Corners, GrayImage, GrayImageView};
use nalgebra::{DMatrix, Matrix3, Point2, SMatrix, SVector, Vector3};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let v = self.h * Vector3::new(p.x as f64, p.y as f64, 1.0);
        let w = v[2];
        Point2::new((v[0] / w) as f32, (v[1] / w) as f32)
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }

    /// Composition `self ∘ other`: apply `other` first.
    pub fn then_after(&self, other: &Homography) -> Homography {
        Homography::new(self.h * other.h)
    }

    /// Local linear scale of the mapping around `p` (length ratio of a unit
    /// step along x and y, averaged).
    pub fn local_scale(&self, p: Point2<f32>) -> f32 {
        let o = self.apply(p);
        let dx = self.apply(Point2::new(p.x + 1.0, p.y)) - o;
        let dy = self.apply(Point2::new(p.x, p.y + 1.0)) - o;
        0.5 * (dx.norm() + dy.norm())
    }
}

// Hartley normalization: translate to centroid, scale so mean distance = sqrt(2).
fn normalize_points(pts: &[Point2<f32>]) -> (Vec<Point2<f64>>, Matrix3<f64>) {
    let n = pts.len().max(1) as f64;
    let (sx, sy) = pts
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x as f64, sy + p.y as f64));
    let (cx, cy) = (sx / n, sy / n);

    let mean_dist = pts
        .iter()
        .map(|p| ((p.x as f64 - cx).powi(2) + (p.y as f64 - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    let s = if mean_dist > 1e-12 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };
    let t = Matrix3::<f64>::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);

    let out = pts
        .iter()
        .map(|p| {
            let v = t * Vector3::new(p.x as f64, p.y as f64, 1.0);
            Point2::new(v[0], v[1])
        })
        .collect();
    (out, t)
}

// H = T_dst^{-1} * Hn * T_src, scaled so that h33 = 1.
fn denormalize(hn: Matrix3<f64>, t_src: Matrix3<f64>, t_dst: Matrix3<f64>) -> Option<Homography> {
    let h = t_dst.try_inverse()? * hn * t_src;
    let s = h[(2, 2)];
    if s.abs() < 1e-12 || !h.iter().all(|v| v.is_finite()) {
        return None;
    }
    Some(Homography::new(h / s))
}

// Any three of four normalized points (nearly) collinear.
fn has_collinear_triple(p: &[Point2<f64>]) -> bool {
    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    TRIPLES.iter().any(|&[a, b, c]| {
        let cr = (p[b].x - p[a].x) * (p[c].y - p[a].y) - (p[b].y - p[a].y) * (p[c].x - p[a].x);
        cr.abs() < 1e-6
    })
}

/// Compute H such that `dst ~ H * src` from exactly four correspondences.
///
/// Returns `None` when three or more points are collinear.
pub fn homography_from_4pt(src: &[Point2<f32>; 4], dst: &[Point2<f32>; 4]) -> Option<Homography> {
    // Unknowns: [h11 h12 h13 h21 h22 h23 h31 h32], with h33 = 1
    let (src_n, t_src) = normalize_points(src);
    let (dst_n, t_dst) = normalize_points(dst);
    if has_collinear_triple(&src_n) || has_collinear_triple(&dst_n) {
        return None;
    }

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for k in 0..4 {
        let (x, y) = (src_n[k].x, src_n[k].y);
        let (u, v) = (dst_n[k].x, dst_n[k].y);

        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        let r1 = r0 + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let x = a.lu().solve(&b)?;
    let hn = Matrix3::<f64>::new(
        x[0], x[1], x[2], //
        x[3], x[4], x[5], //
        x[6], x[7], 1.0,
    );
    denormalize(hn, t_src, t_dst)
}

/// Least-squares DLT for `dst ~ H * src` with four or more correspondences.
pub fn estimate_homography(src: &[Point2<f32>], dst: &[Point2<f32>]) -> Option<Homography> {
    if src.len() != dst.len() || src.len() < 4 {
        return None;
    }
    if src.len() == 4 {
        let s: &[Point2<f32>; 4] = src.try_into().ok()?;
        let d: &[Point2<f32>; 4] = dst.try_into().ok()?;
        return homography_from_4pt(s, d);
    }

    let (s, ts) = normalize_points(src);
    let (d, td) = normalize_points(dst);

    let mut a = DMatrix::<f64>::zeros(2 * src.len(), 9);
    for k in 0..src.len() {
        let (x, y) = (s[k].x, s[k].y);
        let (u, v) = (d[k].x, d[k].y);
        let r = 2 * k;
        a[(r, 0)] = -x;
        a[(r, 1)] = -y;
        a[(r, 2)] = -1.0;
        a[(r, 6)] = u * x;
        a[(r, 7)] = u * y;
        a[(r, 8)] = u;
        a[(r + 1, 3)] = -x;
        a[(r + 1, 4)] = -y;
        a[(r + 1, 5)] = -1.0;
        a[(r + 1, 6)] = v * x;
        a[(r + 1, 7)] = v * y;
        a[(r + 1, 8)] = v;
    }

    // Null vector of A: last row of V^T.
    let svd = a.svd(false, true);
    let vt = svd.v_t?;
    let h = vt.row(vt.nrows().checked_sub(1)?);
    let hn = Matrix3::<f64>::from_row_slice(&[h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]]);
    denormalize(hn, ts, td)
}

/// Corners of the `[0, side] × [0, side]` square, labeled like [`Corners`].
pub fn square_corners(side: f32) -> Corners {
    Corners::new(
        Point2::new(0.0, 0.0),
        Point2::new(side, 0.0),
        Point2::new(0.0, side),
        Point2::new(side, side),
    )
}

/// Warp into an `out_w × out_h` image: every destination pixel center is
/// mapped through `h_src_from_dst` and sampled bilinearly from `src`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(src, h_src_from_dst), fields(out_w, out_h))
)]
pub fn warp_perspective_gray(
    src: &GrayImageView<'_>,
    h_src_from_dst: &Homography,
    out_w: usize,
    out_h: usize,
) -> GrayImage {
    let mut data = Vec::with_capacity(out_w * out_h);
    for y in 0..out_h {
        for x in 0..out_w {
            let p = h_src_from_dst.apply(Point2::new(x as f32 + 0.5, y as f32 + 0.5));
            data.push(sample_bilinear_u8(src, p.x - 0.5, p.y - 0.5));
        }
    }
    GrayImage {
        width: out_w,
        height: out_h,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Point2<f32>, b: Point2<f32>, tol: f32) {
        assert!(
            (a.x - b.x).abs() < tol && (a.y - b.y).abs() < tol,
            "expected ({:.4},{:.4}) ~ ({:.4},{:.4}) within {}",
            a.x,
            a.y,
            b.x,
            b.y,
            tol
        );
    }

    fn skewed() -> Homography {
        Homography::new(Matrix3::new(
            0.9, 0.12, 140.0, //
            -0.08, 1.05, 60.0, //
            0.0007, -0.0003, 1.0,
        ))
    }

    #[test]
    fn four_points_recover_known_mapping() {
        let gt = skewed();
        let sq = square_corners(252.0).ring();
        let img = sq.map(|p| gt.apply(p));
        let h = homography_from_4pt(&sq, &img).expect("non-degenerate");
        for p in [
            Point2::new(0.0_f32, 0.0),
            Point2::new(126.0, 126.0),
            Point2::new(14.0, 238.0),
        ] {
            assert_close(h.apply(p), gt.apply(p), 1e-2);
        }
    }

    #[test]
    fn collinear_points_fail() {
        let src = [
            Point2::new(0.0_f32, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(2.0, 2.0),
            Point2::new(3.0, 3.0),
        ];
        let dst = square_corners(10.0).ring();
        assert!(homography_from_4pt(&src, &dst).is_none());
    }

    #[test]
    fn dlt_matches_four_point_solution() {
        let gt = skewed();
        let src: Vec<Point2<f32>> = (0..4)
            .flat_map(|j| (0..4).map(move |i| Point2::new(i as f32 * 84.0, j as f32 * 84.0)))
            .collect();
        let dst: Vec<_> = src.iter().map(|&p| gt.apply(p)).collect();
        let h = estimate_homography(&src, &dst).expect("estimate");
        assert_close(h.apply(Point2::new(40.0, 200.0)), gt.apply(Point2::new(40.0, 200.0)), 1e-2);
        assert!(estimate_homography(&src[..3], &dst[..3]).is_none());
    }

    #[test]
    fn inverse_round_trips_points() {
        let h = skewed();
        let inv = h.inverse().expect("invertible");
        for p in [Point2::new(3.0_f32, 7.0), Point2::new(250.0, 10.0)] {
            assert_close(inv.apply(h.apply(p)), p, 1e-3);
        }
        let id = inv.then_after(&h);
        assert_close(id.apply(Point2::new(11.0, 12.0)), Point2::new(11.0, 12.0), 1e-3);
    }

    #[test]
    fn local_scale_of_uniform_zoom() {
        let h = Homography::new(Matrix3::new(2.0, 0.0, 5.0, 0.0, 2.0, 1.0, 0.0, 0.0, 1.0));
        assert!((h.local_scale(Point2::new(10.0, 10.0)) - 2.0).abs() < 1e-5);
    }

    #[test]
    fn identity_warp_copies_image() {
        let data: Vec<u8> = (0..64).map(|v| (v * 3) as u8).collect();
        let src = GrayImage::from_raw(8, 8, data).unwrap();
        let out = warp_perspective_gray(&src.view(), &Homography::identity(), 8, 8);
        assert_eq!(out, src);
    }
}
