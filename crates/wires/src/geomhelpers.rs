//! Small geometric helpers used only by validation and ray-pair construction.

use nalgebra::Vector3;
use wirecell_core::Ray;

use crate::types::{Plane, Store};

/// Cheap estimate of the pitch between two (assumed roughly parallel,
/// coplanar) rays: the component of the displacement between their
/// midpoints that is perpendicular to the first ray's direction.
///
/// Unlike [`wirecell_core::Ray::pitch`] (the exact mutual perpendicular of
/// two possibly-skew lines), this assumes `r1` and `r2` already lie in one
/// plane and just need their separation along that plane's pitch axis.
pub fn ray_pitch_approx(r1: Ray, r2: Ray) -> Option<Ray> {
    let c1 = nalgebra::center(&r1.tail, &r1.head);
    let c2 = nalgebra::center(&r2.tail, &r2.head);
    let d21 = c2 - c1;

    let v1 = r1.vector();
    let ecks = v1.cross(&d21);
    let ecks = normalize(ecks)?;
    let pdir = normalize(ecks.cross(&v1))?;
    let pitch = d21.dot(&pdir);
    Some(Ray::new(c1, c1 + pdir * pitch))
}

fn normalize(v: Vector3<f64>) -> Option<Vector3<f64>> {
    let n = v.norm();
    if n == 0.0 {
        None
    } else {
        Some(v / n)
    }
}

/// Average pitch vector between successive wires of `plane` (not normalized).
pub fn mean_pitch(store: &Store, plane: &Plane) -> Vector3<f64> {
    let mut total = Vector3::new(0.0, 0.0, 0.0);
    let mut prev: Option<Ray> = None;
    let n = plane.wires.len();
    for &wi in &plane.wires {
        let w = &store.wires[wi];
        let next = Ray::new(w.tail, w.head);
        if let Some(p) = prev {
            if let Some(pitch) = ray_pitch_approx(p, next) {
                total += pitch.vector();
            }
        }
        prev = Some(next);
    }
    if n > 1 {
        total / (n as f64 - 1.0)
    } else {
        total
    }
}

/// Average wire vector over `plane` (not normalized).
pub fn mean_wire(store: &Store, plane: &Plane) -> Vector3<f64> {
    let mut total = Vector3::new(0.0, 0.0, 0.0);
    for &wi in &plane.wires {
        let w = &store.wires[wi];
        total += Ray::new(w.tail, w.head).vector();
    }
    if plane.wires.is_empty() {
        total
    } else {
        total / plane.wires.len() as f64
    }
}
