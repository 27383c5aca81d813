//! Build the ordered ray-pairs (layer 0 = horizontal bounds, layer 1 =
//! vertical bounds, layers 2.. = wire planes) that seed a ray-grid
//! coordinate system for one face.

use wirecell_core::{Point, Ray};

use crate::geomhelpers::mean_pitch;
use crate::types::{Face, Store};

/// The Y/Z extent (in the X=0 plane) covering every wire endpoint of the
/// face's planes.
fn bounding_box(store: &Store, face: &Face) -> (f64, f64, f64, f64) {
    let (mut ylo, mut yhi, mut zlo, mut zhi) = (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY);
    for &ipl in &face.planes {
        let plane = &store.planes[ipl];
        for &iw in &plane.wires {
            let w = &store.wires[iw];
            for p in [w.tail, w.head] {
                ylo = ylo.min(p.y);
                yhi = yhi.max(p.y);
                zlo = zlo.min(p.z);
                zhi = zhi.max(p.z);
            }
        }
    }
    (ylo, yhi, zlo, zhi)
}

/// Layers 0 (horizontal bounds) and 1 (vertical bounds) only.
pub fn ray_pairs_active(store: &Store, face: &Face) -> Vec<(Ray, Ray)> {
    let (ylo, yhi, zlo, zhi) = bounding_box(store, face);
    let ll = Point::new(0.0, ylo, zlo);
    let lr = Point::new(0.0, ylo, zhi);
    let ul = Point::new(0.0, yhi, zlo);
    let ur = Point::new(0.0, yhi, zhi);

    let h1 = Ray::new(ll, ul);
    let h2 = Ray::new(lr, ur);

    let v1 = Ray::new(lr, ll);
    let v2 = Ray::new(ur, ul);

    vec![(h1, h2), (v1, v2)]
}

/// Full ray-pair sequence for the face: bounds layers plus one pair per
/// wire plane, each taken from the plane's first wire offset by half its
/// mean pitch (when `region` is true) so the pair brackets a "wire-0
/// region" rather than coinciding with the wire itself.
pub fn ray_pairs(store: &Store, face: &Face, region: bool) -> Vec<(Ray, Ray)> {
    let mut pairs = ray_pairs_active(store, face);

    for &ipl in &face.planes {
        let plane = &store.planes[ipl];
        if plane.wires.is_empty() {
            continue;
        }
        let phalf = if region {
            0.5 * mean_pitch(store, plane)
        } else {
            nalgebra::Vector3::new(0.0, 0.0, 0.0)
        };
        let w = &store.wires[plane.wires[0]];
        let r1 = Ray::new(w.tail - phalf, w.head - phalf);
        let r2 = Ray::new(w.tail + phalf, w.head + phalf);
        pairs.push((r1, r2));
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correct::{fix_direction, fix_order, fix_pitch};
    use crate::types::{Anode, Detector, Plane, Wire};

    fn simple_face_store() -> Store {
        let mut wires = Vec::new();
        for i in 0..5 {
            let z = i as f64 * 3.0;
            wires.push(Wire {
                ident: i,
                channel: i,
                segment: 0,
                tail: Point::new(0.0, -10.0, z),
                head: Point::new(0.0, 10.0, z),
            });
        }
        let mut store = Store {
            detectors: vec![Detector { ident: 0, anodes: vec![0] }],
            anodes: vec![Anode { ident: 0, faces: vec![0] }],
            faces: vec![crate::types::Face { ident: 0, planes: vec![0] }],
            planes: vec![Plane { ident: 0, wires: (0..5).map(|i| i as usize).collect() }],
            wires,
        };
        fix_order(&mut store).unwrap();
        fix_direction(&mut store).unwrap();
        fix_pitch(&mut store).unwrap();
        store
    }

    #[test]
    fn produces_bounds_plus_one_pair_per_plane() {
        let store = simple_face_store();
        let pairs = ray_pairs(&store, &store.faces[0], true);
        assert_eq!(pairs.len(), 3);
    }
}
