//! Quadrilateral outline of a detected puzzle and the ruling derived from it.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Four outer corners of the puzzle in frame pixel coordinates.
///
/// Field order is fixed (top-left, top-right, bottom-left, bottom-right) and
/// always refers to the same physical corner of an upright grid, so consumers
/// can draw the outline without re-sorting.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Corners {
    pub top_left: Point2<f32>,
    pub top_right: Point2<f32>,
    pub bottom_left: Point2<f32>,
    pub bottom_right: Point2<f32>,
}

/// One straight ruling segment in frame coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridLine {
    pub p1: Point2<f32>,
    pub p2: Point2<f32>,
}

/// Why a quadrilateral was rejected as a puzzle outline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum QuadDefect {
    /// Area below the required minimum (pixels²).
    TooSmall { area: f32, min_area: f32 },
    /// Edges cross or the winding flips between vertices.
    NotConvex,
    /// An interior angle is too close to 0° or 180°.
    DegenerateAngle { angle_deg: f32 },
}

impl std::fmt::Display for QuadDefect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuadDefect::TooSmall { area, min_area } => {
                write!(f, "area {area:.0} px² below minimum {min_area:.0} px²")
            }
            QuadDefect::NotConvex => write!(f, "quadrilateral is not simple and convex"),
            QuadDefect::DegenerateAngle { angle_deg } => {
                write!(f, "implausible interior angle {angle_deg:.1}°")
            }
        }
    }
}

fn cross(o: Point2<f32>, a: Point2<f32>, b: Point2<f32>) -> f32 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

impl Corners {
    pub fn new(
        top_left: Point2<f32>,
        top_right: Point2<f32>,
        bottom_left: Point2<f32>,
        bottom_right: Point2<f32>,
    ) -> Self {
        Self {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
        }
    }

    /// Corners in winding order: TL, TR, BR, BL.
    #[inline]
    pub fn ring(&self) -> [Point2<f32>; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Apply `f` to every corner, keeping the labels.
    pub fn map(&self, f: impl Fn(Point2<f32>) -> Point2<f32>) -> Self {
        Self {
            top_left: f(self.top_left),
            top_right: f(self.top_right),
            bottom_left: f(self.bottom_left),
            bottom_right: f(self.bottom_right),
        }
    }

    /// Shoelace area of the outline (absolute value).
    pub fn area(&self) -> f32 {
        let r = self.ring();
        let mut twice = 0.0f32;
        for i in 0..4 {
            let a = r[i];
            let b = r[(i + 1) % 4];
            twice += a.x * b.y - b.x * a.y;
        }
        0.5 * twice.abs()
    }

    /// Interior angles in degrees at TL, TR, BR, BL.
    pub fn interior_angles_deg(&self) -> [f32; 4] {
        let r = self.ring();
        let mut out = [0.0f32; 4];
        for (i, angle) in out.iter_mut().enumerate() {
            let prev = r[(i + 3) % 4];
            let cur = r[i];
            let next = r[(i + 1) % 4];
            let u = prev - cur;
            let v = next - cur;
            let denom = u.norm() * v.norm();
            *angle = if denom <= f32::EPSILON {
                0.0
            } else {
                (u.dot(&v) / denom).clamp(-1.0, 1.0).acos().to_degrees()
            };
        }
        out
    }

    /// True when every turn along the ring has the same sign.
    ///
    /// A convex ring cannot self-intersect, so this covers both conditions.
    pub fn is_convex(&self) -> bool {
        let r = self.ring();
        let mut sign = 0.0f32;
        for i in 0..4 {
            let c = cross(r[i], r[(i + 1) % 4], r[(i + 2) % 4]);
            if c.abs() <= f32::EPSILON {
                return false;
            }
            if sign == 0.0 {
                sign = c.signum();
            } else if c.signum() != sign {
                return false;
            }
        }
        true
    }

    /// Check that the outline is usable for rectification.
    pub fn validate(&self, min_area: f32, min_angle_deg: f32) -> Result<(), QuadDefect> {
        let area = self.area();
        if area < min_area {
            return Err(QuadDefect::TooSmall { area, min_area });
        }
        if !self.is_convex() {
            return Err(QuadDefect::NotConvex);
        }
        for angle_deg in self.interior_angles_deg() {
            if angle_deg < min_angle_deg || angle_deg > 180.0 - min_angle_deg {
                return Err(QuadDefect::DegenerateAngle { angle_deg });
            }
        }
        Ok(())
    }

    /// Orientation of the grid's horizontal edges in radians.
    ///
    /// Top and bottom edge directions are summed as vectors before taking the
    /// angle, so mild perspective on one edge does not dominate. Measured from
    /// +x toward +y (clockwise on screen).
    pub fn horizontal_angle(&self) -> f32 {
        let top = self.top_right - self.top_left;
        let bottom = self.bottom_right - self.bottom_left;
        let t = top / top.norm().max(f32::EPSILON);
        let b = bottom / bottom.norm().max(f32::EPSILON);
        let s = t + b;
        s.y.atan2(s.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(x0: f32, y0: f32, s: f32) -> Corners {
        Corners::new(
            Point2::new(x0, y0),
            Point2::new(x0 + s, y0),
            Point2::new(x0, y0 + s),
            Point2::new(x0 + s, y0 + s),
        )
    }

    #[test]
    fn square_is_valid() {
        let c = square(10.0, 20.0, 100.0);
        assert_relative_eq!(c.area(), 10_000.0, epsilon = 1e-2);
        for a in c.interior_angles_deg() {
            assert_relative_eq!(a, 90.0, epsilon = 1e-3);
        }
        assert!(c.validate(1000.0, 20.0).is_ok());
        assert_relative_eq!(c.horizontal_angle(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn bow_tie_is_rejected() {
        let mut c = square(0.0, 0.0, 100.0);
        std::mem::swap(&mut c.bottom_left, &mut c.bottom_right);
        assert!(!c.is_convex());
        assert_eq!(c.validate(0.0, 10.0), Err(QuadDefect::NotConvex));
    }

    #[test]
    fn flat_corner_is_rejected() {
        // Top-right pushed onto the diagonal: the angle there approaches 180°.
        let c = Corners::new(
            Point2::new(0.0, 0.0),
            Point2::new(99.0, 98.0),
            Point2::new(0.0, 200.0),
            Point2::new(200.0, 200.0),
        );
        let res = c.validate(0.0, 15.0);
        match res {
            Err(QuadDefect::DegenerateAngle { angle_deg }) => assert!(angle_deg > 165.0),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn small_outline_is_rejected() {
        let c = square(0.0, 0.0, 10.0);
        assert!(matches!(
            c.validate(500.0, 10.0),
            Err(QuadDefect::TooSmall { .. })
        ));
    }

    #[test]
    fn rotated_square_reports_its_angle() {
        let theta = 15f32.to_radians();
        let rot = |p: Point2<f32>| {
            Point2::new(
                p.x * theta.cos() - p.y * theta.sin() + 200.0,
                p.x * theta.sin() + p.y * theta.cos() + 100.0,
            )
        };
        let c = square(0.0, 0.0, 100.0).map(rot);
        assert_relative_eq!(c.horizontal_angle(), theta, epsilon = 1e-5);
    }
}
