//! Point and ray primitives shared across the workspace.

use nalgebra::{Point3, Vector3};

/// A point in 3-space.
pub type Point = Point3<f64>;

/// A direction-significant ordered pair of points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub tail: Point,
    pub head: Point,
}

impl Ray {
    #[inline]
    pub fn new(tail: Point, head: Point) -> Self {
        Self { tail, head }
    }

    /// `head - tail`.
    #[inline]
    pub fn vector(&self) -> Vector3<f64> {
        self.head - self.tail
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.vector().norm()
    }

    /// Unit vector along `tail -> head`. `None` if the ray is degenerate.
    pub fn unit(&self) -> Option<Vector3<f64>> {
        let v = self.vector();
        let len = v.norm();
        if len == 0.0 {
            None
        } else {
            Some(v / len)
        }
    }

    /// The shortest ray connecting two (possibly skew) rays, i.e. the
    /// mutual-perpendicular segment between the two lines each ray lies on.
    ///
    /// Two parallel rays have no unique mutual perpendicular, so the
    /// (still well defined) separation between them is found instead by
    /// projecting the displacement between their midpoints onto the
    /// direction perpendicular to both. `None` only for truly degenerate
    /// input (coincident or zero-length rays).
    pub fn pitch(r1: &Ray, r2: &Ray) -> Option<Ray> {
        let d1 = r1.vector();
        let d2 = r2.vector();
        let r = r1.tail - r2.tail;

        let a = d1.dot(&d1);
        let b = d1.dot(&d2);
        let c = d2.dot(&d2);
        let d = d1.dot(&r);
        let e = d2.dot(&r);

        let denom = a * c - b * b;
        if denom.abs() < 1e-9 * (a * c).max(1e-300) {
            return pitch_projection(r1, r2);
        }
        let s = (b * e - c * d) / denom;
        let t = (a * e - b * d) / denom;

        let p1 = r1.tail + d1 * s;
        let p2 = r2.tail + d2 * t;
        Some(Ray::new(p2, p1))
    }
}

/// Separation between two (near-)parallel rays: the component of the
/// displacement between their midpoints perpendicular to `r1`'s direction.
fn pitch_projection(r1: &Ray, r2: &Ray) -> Option<Ray> {
    let c1 = nalgebra::center(&r1.tail, &r1.head);
    let c2 = nalgebra::center(&r2.tail, &r2.head);
    let d21 = c2 - c1;

    let v1 = r1.vector();
    let ecks = unit(v1.cross(&d21))?;
    let pdir = unit(ecks.cross(&v1))?;
    let pitch = d21.dot(&pdir);
    Some(Ray::new(c1, c1 + pdir * pitch))
}

fn unit(v: Vector3<f64>) -> Option<Vector3<f64>> {
    let n = v.norm();
    if n == 0.0 {
        None
    } else {
        Some(v / n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_between_perpendicular_skew_rays() {
        // x-axis at z=0, y-axis at z=1: the shortest connector is z-directed.
        let r1 = Ray::new(Point::new(-1.0, 0.0, 0.0), Point::new(1.0, 0.0, 0.0));
        let r2 = Ray::new(Point::new(0.0, -1.0, 1.0), Point::new(0.0, 1.0, 1.0));
        let pitch = Ray::pitch(&r1, &r2).unwrap();
        assert!((pitch.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pitch_projects_for_parallel_rays() {
        let r1 = Ray::new(Point::new(0.0, 0.0, 0.0), Point::new(1.0, 0.0, 0.0));
        let r2 = Ray::new(Point::new(0.0, 1.0, 0.0), Point::new(1.0, 1.0, 0.0));
        let pitch = Ray::pitch(&r1, &r2).unwrap();
        assert!((pitch.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pitch_none_for_coincident_rays() {
        let r1 = Ray::new(Point::new(0.0, 0.0, 0.0), Point::new(1.0, 0.0, 0.0));
        let r2 = Ray::new(Point::new(2.0, 0.0, 0.0), Point::new(3.0, 0.0, 0.0));
        assert!(Ray::pitch(&r1, &r2).is_none());
    }
}
