//! Axis-aligned box / ray intersection, used by wire generation and by
//! ray-grid tiling to clip activity against a bounding volume.

use nalgebra::Vector3;

use crate::geom::{Point, Ray};

/// Intersect the line through `point` with direction `dir` against the two
/// planes of `bounds` perpendicular to `axis0` (0=x, 1=y, 2=z).
///
/// Returns a hitmask (bit 0: near-side hit, bit 1: far-side hit, both set
/// only if both intercepts also land inside the other two axes' extents)
/// and the two intercept points, ordered so their difference points along
/// `dir`.
pub fn box_intersection_axis(axis0: usize, bounds: &Ray, point: Point, dir: Vector3<f64>) -> (u8, Ray) {
    let mut hits = Ray::new(point, point);
    if dir[axis0] == 0.0 {
        return (0, hits);
    }

    let mut bmin = bounds.tail;
    let mut bmax = bounds.head;
    for axis in 0..3 {
        if bmin[axis] > bmax[axis] {
            std::mem::swap(&mut bmin[axis], &mut bmax[axis]);
        }
    }

    let axis1 = (axis0 + 1) % 3;
    let axis2 = (axis1 + 1) % 3;
    let mut hitmask = 0u8;

    {
        let intercept = bmin[axis0];
        let scale = (intercept - point[axis0]) / dir[axis0];
        let one = point[axis1] + scale * dir[axis1];
        let two = point[axis2] + scale * dir[axis2];
        if bmin[axis1] <= one && one <= bmax[axis1] && bmin[axis2] <= two && two <= bmax[axis2] {
            hitmask |= 1;
            hits.tail[axis0] = intercept;
            hits.tail[axis1] = one;
            hits.tail[axis2] = two;
        }
    }
    {
        let intercept = bmax[axis0];
        let scale = (intercept - point[axis0]) / dir[axis0];
        let one = point[axis1] + scale * dir[axis1];
        let two = point[axis2] + scale * dir[axis2];
        if bmin[axis1] <= one && one <= bmax[axis1] && bmin[axis2] <= two && two <= bmax[axis2] {
            hitmask |= 2;
            hits.head[axis0] = intercept;
            hits.head[axis1] = one;
            hits.head[axis2] = two;
        }
    }

    let hdir = hits.head - hits.tail;
    if hdir.dot(&dir) < 0.0 {
        std::mem::swap(&mut hits.tail, &mut hits.head);
        hitmask = ((hitmask & 0x1) << 1) | ((hitmask & 0x2) >> 1);
    }
    (hitmask, hits)
}

/// Intersect the line through `point` with direction `dir` against all six
/// faces of the axis-aligned box `bounds`, returning the (at most two)
/// distinct entry/exit points ordered along `dir`.
pub fn box_intersection(bounds: &Ray, point: Point, dir: Vector3<f64>) -> (u8, Ray) {
    let mut found: Vec<Point> = Vec::with_capacity(2);
    for axis0 in 0..3 {
        let (mask, hits) = box_intersection_axis(axis0, bounds, point, dir);
        if mask & 1 != 0 {
            push_unique(&mut found, hits.tail);
        }
        if mask & 2 != 0 {
            push_unique(&mut found, hits.head);
        }
    }

    let mut hits = Ray::new(point, point);
    let mut hitmask = 0u8;
    if let Some(&p) = found.first() {
        hits.tail = p;
        hitmask |= 1;
    }
    if let Some(&p) = found.get(1) {
        hits.head = p;
        hitmask |= 2;
    }

    let hdir = hits.head - hits.tail;
    if hdir.dot(&dir) < 0.0 {
        std::mem::swap(&mut hits.tail, &mut hits.head);
        hitmask = ((hitmask & 0x1) << 1) | ((hitmask & 0x2) >> 1);
    }
    (hitmask, hits)
}

fn push_unique(found: &mut Vec<Point>, p: Point) {
    const EPS: f64 = 1e-9;
    if !found.iter().any(|q| (q - p).norm() < EPS) {
        found.push(p);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_through_unit_box_hits_two_faces() {
        let bounds = Ray::new(Point::new(0.0, 0.0, 0.0), Point::new(1.0, 1.0, 1.0));
        let point = Point::new(-1.0, 0.5, 0.5);
        let dir = Vector3::new(1.0, 0.0, 0.0);
        let (mask, hits) = box_intersection(&bounds, point, dir);
        assert_eq!(mask, 3);
        assert!((hits.tail.x - 0.0).abs() < 1e-9);
        assert!((hits.head.x - 1.0).abs() < 1e-9);
    }

    #[test]
    fn ray_missing_box_hits_nothing() {
        let bounds = Ray::new(Point::new(0.0, 0.0, 0.0), Point::new(1.0, 1.0, 1.0));
        let point = Point::new(-1.0, 5.0, 5.0);
        let dir = Vector3::new(1.0, 0.0, 0.0);
        let (mask, _) = box_intersection(&bounds, point, dir);
        assert_eq!(mask, 0);
    }
}
