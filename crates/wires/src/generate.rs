//! Synthesize a plane of equally pitched wires spanning a bounding box —
//! the inverse of correction: build an already-regular geometry instead of
//! regularizing a loaded one.

use nalgebra::Vector3;
use wirecell_core::{box_intersection, Error, Point, Ray, Result};

use crate::types::{Plane, Store, Wire};

/// Fill `plane` with wires spaced by `pitch` (a ray whose direction and
/// length give the pitch direction and magnitude) clipped to `bounds`,
/// starting wire idents at `wid0`. Returns the number of wires generated.
///
/// `pitch` must be orthogonal to the drift (x) axis: both its endpoints
/// must share an x coordinate.
pub fn generate(store: &mut Store, plane: &mut Plane, pitch: &Ray, bounds: &Ray, wid0: i64) -> Result<i64> {
    if (pitch.tail.x - pitch.head.x).abs() > 1e-6 {
        return Err(Error::Value("pitch not orthogonal to drift".into()));
    }

    let pvec = pitch.vector();
    let pdir = pvec / pvec.norm();

    // WCT convention: W = P x X
    let wdir: Vector3<f64> = pdir.cross(&Vector3::new(1.0, 0.0, 0.0));

    let mut wip: i64 = 0;
    loop {
        let cen = pitch.tail + pvec * wip as f64;
        let (hitmask, hits) = box_intersection(bounds, cen, wdir);
        if hitmask != 3 {
            break;
        }

        plane.wires.push(store.wires.len());
        store.wires.push(Wire {
            ident: wip + wid0,
            channel: 0,
            segment: 0,
            tail: hits.tail,
            head: hits.head,
        });

        wip += 1;
    }

    Ok(wip)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_box_with_equally_pitched_wires() {
        let mut store = Store::default();
        let mut plane = Plane { ident: 0, wires: Vec::new() };
        let bounds = Ray::new(Point::new(0.0, -5.0, -5.0), Point::new(1.0, 5.0, 5.0));
        // Pitch along Z, one unit apart, starting below the box.
        let pitch = Ray::new(Point::new(0.5, 0.0, -4.5), Point::new(0.5, 0.0, -3.5));

        let n = generate(&mut store, &mut plane, &pitch, &bounds, 0).unwrap();
        assert_eq!(n as usize, plane.wires.len());
        assert!(n > 5);
        for &wi in &plane.wires {
            let w = &store.wires[wi];
            assert!((w.tail.y).abs() <= 5.0 + 1e-9 || (w.head.y).abs() <= 5.0 + 1e-9);
        }
    }

    #[test]
    fn rejects_pitch_not_orthogonal_to_drift() {
        let mut store = Store::default();
        let mut plane = Plane { ident: 0, wires: Vec::new() };
        let bounds = Ray::new(Point::new(0.0, -5.0, -5.0), Point::new(1.0, 5.0, 5.0));
        let pitch = Ray::new(Point::new(0.0, 0.0, -4.5), Point::new(0.5, 0.0, -3.5));
        assert!(generate(&mut store, &mut plane, &pitch, &bounds, 0).is_err());
    }
}
