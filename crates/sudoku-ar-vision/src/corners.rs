use crate::{Component, CornerParams, Labeling};
use nalgebra::Point2;
use sudoku_ar_core::{Corners, QuadDefect};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Why a component did not yield a usable outline.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum CornerReject {
    #[error("component has no boundary pixels")]
    Empty,
    #[error("bounding box covers {fraction:.3} of the frame (min {min:.3})")]
    BoundingBoxTooSmall { fraction: f32, min: f32 },
    #[error("fitted outline rejected: {0}")]
    Outline(QuadDefect),
}

/// Fits the four outer corners of a grid component.
#[derive(Clone, Debug, Default)]
pub struct CornerDetector {
    params: CornerParams,
}

impl CornerDetector {
    pub fn new(params: CornerParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &CornerParams {
        &self.params
    }

    /// Extremal boundary points under `x+y`, `x−y`, `−x+y`, `−x−y`.
    ///
    /// Those four projections peak at the corners of any convex
    /// quadrilateral rotated by less than 45°, which keeps the labels stable
    /// from frame to frame.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, labeling, component), fields(label = component.label))
    )]
    pub fn detect(
        &self,
        labeling: &Labeling,
        component: &Component,
    ) -> Result<Corners, CornerReject> {
        let frame_area = (labeling.width * labeling.height).max(1) as f32;
        let fraction = component.bbox_area() as f32 / frame_area;
        if fraction < self.params.min_area_fraction {
            log::trace!(
                "component {} covers {fraction:.3} of the frame, below {:.3}",
                component.label,
                self.params.min_area_fraction
            );
            return Err(CornerReject::BoundingBoxTooSmall {
                fraction,
                min: self.params.min_area_fraction,
            });
        }

        let boundary = labeling.boundary_pixels(component);
        let corners = extremal_corners(&boundary).ok_or(CornerReject::Empty)?;

        corners
            .validate(
                self.params.min_area_fraction * frame_area,
                self.params.min_angle_deg,
            )
            .map_err(|defect| {
                log::debug!("component {} outline rejected: {defect}", component.label);
                CornerReject::Outline(defect)
            })?;
        Ok(corners)
    }
}

/// Corner estimate from a set of pixel positions; `None` when empty.
///
/// Returned points are pixel centers.
pub(crate) fn extremal_corners(pixels: &[(usize, usize)]) -> Option<Corners> {
    let first = *pixels.first()?;
    let score = |p: (usize, usize), sx: i64, sy: i64| sx * p.0 as i64 + sy * p.1 as i64;

    // (sx, sy) pairs for TL, TR, BL, BR: the corner minimises -(sx*x + sy*y).
    let dirs = [(-1i64, -1i64), (1, -1), (-1, 1), (1, 1)];
    let mut best = [first; 4];
    for &p in pixels {
        for (k, &(sx, sy)) in dirs.iter().enumerate() {
            if score(p, sx, sy) > score(best[k], sx, sy) {
                best[k] = p;
            }
        }
    }

    let center = |p: (usize, usize)| Point2::new(p.0 as f32 + 0.5, p.1 as f32 + 0.5);
    Some(Corners::new(
        center(best[0]),
        center(best[1]),
        center(best[2]),
        center(best[3]),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{label_components, BinaryMask};

    fn fill_quad(mask: &mut BinaryMask, c: &Corners) {
        // Rasterise the outline edges thickly enough to stay connected.
        let r = c.ring();
        for i in 0..4 {
            let (a, b) = (r[i], r[(i + 1) % 4]);
            let steps = ((b - a).norm() * 2.0) as usize + 1;
            for s in 0..=steps {
                let t = s as f32 / steps as f32;
                let p = a + (b - a) * t;
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        let x = p.x as i32 + dx;
                        let y = p.y as i32 + dy;
                        if x >= 0 && y >= 0 && (x as usize) < mask.width && (y as usize) < mask.height {
                            mask.set(x as usize, y as usize, true);
                        }
                    }
                }
            }
        }
    }

    fn detect_on(mask: &BinaryMask, params: CornerParams) -> Result<Corners, CornerReject> {
        let l = label_components(mask);
        let c = l.components.first().expect("one component").clone();
        CornerDetector::new(params).detect(&l, &c)
    }

    #[test]
    fn finds_corners_of_tilted_square() {
        let theta = 15f32.to_radians();
        let (cx, cy, half) = (100.0f32, 90.0f32, 50.0f32);
        let rot = |x: f32, y: f32| {
            Point2::new(
                cx + x * theta.cos() - y * theta.sin(),
                cy + x * theta.sin() + y * theta.cos(),
            )
        };
        let truth = Corners::new(
            rot(-half, -half),
            rot(half, -half),
            rot(-half, half),
            rot(half, half),
        );
        let mut mask = BinaryMask::empty(200, 180);
        fill_quad(&mut mask, &truth);

        let found = detect_on(&mask, CornerParams::default()).expect("grid outline");
        for (a, b) in found.ring().iter().zip(truth.ring().iter()) {
            assert!((a - b).norm() < 4.0, "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn small_component_is_not_a_grid() {
        let mut mask = BinaryMask::empty(300, 300);
        let c = Corners::new(
            Point2::new(10.0, 10.0),
            Point2::new(40.0, 10.0),
            Point2::new(10.0, 40.0),
            Point2::new(40.0, 40.0),
        );
        fill_quad(&mut mask, &c);
        assert!(matches!(
            detect_on(&mask, CornerParams::default()),
            Err(CornerReject::BoundingBoxTooSmall { .. })
        ));
    }

    #[test]
    fn near_straight_corner_is_rejected() {
        // The top-right corner sits almost on the TL–BR diagonal, so the
        // outline is effectively a triangle with a ~180° vertex.
        let mut mask = BinaryMask::empty(220, 220);
        let c = Corners::new(
            Point2::new(10.0, 10.0),
            Point2::new(105.0, 100.0),
            Point2::new(10.0, 200.0),
            Point2::new(200.0, 200.0),
        );
        fill_quad(&mut mask, &c);
        let res = detect_on(&mask, CornerParams::default());
        assert!(
            matches!(
                res,
                Err(CornerReject::Outline(QuadDefect::DegenerateAngle { .. }))
            ),
            "unexpected {res:?}"
        );
    }

    #[test]
    fn extremal_corners_of_empty_set() {
        assert!(extremal_corners(&[]).is_none());
    }
}
