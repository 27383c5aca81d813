//! Self-consistency checks for a corrected [`Store`]: index bounds, sign
//! conventions, and the tolerance-bounded pitch/direction regularity a
//! correctly ordered/corrected geometry must exhibit.

use std::collections::HashSet;

use wirecell_core::{Error, Ray, Result};

use crate::geomhelpers::{mean_pitch, mean_wire, ray_pitch_approx};
use crate::types::Store;

const NEAR_UNITY: f64 = 0.9999;

/// Accumulates violation messages, either failing on the first one
/// (`fail_fast`) or collecting every one found over the whole walk.
struct Ctx {
    fail_fast: bool,
    errors: Vec<String>,
}

impl Ctx {
    fn fail(&mut self, context: &str, what: &str) -> Result<()> {
        let message = format!("{context}{what}");
        if self.fail_fast {
            return Err(Error::Value(message));
        }
        self.errors.push(message);
        Ok(())
    }

    fn positive_count(&mut self, n: usize, context: &str, what: &str) -> Result<()> {
        if n == 0 {
            self.fail(context, &format!("{what} must be non-empty"))?;
        }
        Ok(())
    }

    fn nonneg_ident(&mut self, ident: i64, context: &str, what: &str) -> Result<()> {
        if ident < 0 {
            self.fail(context, &format!("{what} ident {ident} must be non-negative"))?;
        }
        Ok(())
    }

    fn near(&mut self, a: f64, b: f64, eps: f64, context: &str, what: &str) -> Result<()> {
        if (a - b).abs() > eps {
            self.fail(context, &format!("{what}: {a} not within {eps} of {b}"))?;
        }
        Ok(())
    }

    fn positive_value(&mut self, v: f64, context: &str, what: &str) -> Result<()> {
        if !(v > 0.0) {
            self.fail(context, &format!("{what} must be positive, got {v}"))?;
        }
        Ok(())
    }

    fn equal_usize(&mut self, a: usize, b: usize, context: &str, what: &str) -> Result<()> {
        if a != b {
            self.fail(context, &format!("{what}: {a} != {b}"))?;
        }
        Ok(())
    }

    fn finish(self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Value(self.errors.join("\n")))
        }
    }
}

/// Walk the full detector hierarchy, checking identifiers, membership
/// indices, and the geometric regularity (direction sign, wire-pitch
/// orthogonality, equal pitch spacing) a fully corrected store must satisfy.
///
/// `repsilon` is a relative tolerance applied to the direction-cosine and
/// pitch-magnitude comparisons below. `fail_fast` selects between returning
/// on the first violation and aggregating every violation found.
pub fn validate(store: &Store, repsilon: f64, fail_fast: bool) -> Result<()> {
    let mut ctx = Ctx {
        fail_fast,
        errors: Vec::new(),
    };

    ctx.positive_count(store.detectors.len(), "", "detector count")?;

    for detector in &store.detectors {
        ctx.nonneg_ident(detector.ident, "", "detector")?;
        let dctx = format!("detID={}: ", detector.ident);
        ctx.positive_count(detector.anodes.len(), &dctx, "anode count")?;

        for &ianode in &detector.anodes {
            let Some(anode) = store.anodes.get(ianode) else {
                ctx.fail(&dctx, "anode index out of range")?;
                continue;
            };
            ctx.nonneg_ident(anode.ident, &dctx, "anode")?;
            let actx = format!("{dctx}anodeID={}: ", anode.ident);
            ctx.positive_count(anode.faces.len(), &actx, "face count")?;

            for &iface in &anode.faces {
                let Some(face) = store.faces.get(iface) else {
                    ctx.fail(&actx, "face index out of range")?;
                    continue;
                };
                ctx.nonneg_ident(face.ident, &actx, "face")?;
                let fctx = format!("{actx}faceID={}: ", face.ident);
                ctx.positive_count(face.planes.len(), &fctx, "plane count")?;

                let mut face_plane_idents = HashSet::new();

                for &iplane in &face.planes {
                    let Some(plane) = store.planes.get(iplane) else {
                        ctx.fail(&fctx, "plane index out of range")?;
                        continue;
                    };
                    ctx.nonneg_ident(plane.ident, &fctx, "plane")?;
                    let pctx = format!("{fctx}planeID={}: ", plane.ident);
                    face_plane_idents.insert(plane.ident);

                    ctx.positive_count(plane.wires.len(), &pctx, "wire count")?;

                    let wmean = mean_wire(store, plane);
                    let wmdir = unit_or_zero(wmean);
                    let pmean = mean_pitch(store, plane);
                    let pmmag = pmean.norm();
                    let pmdir = unit_or_zero(pmean);
                    ctx.near(wmdir.dot(&pmdir), 0.0, repsilon, &pctx, "wire/pitch orthogonality")?;

                    let mut prev: Option<Ray> = None;
                    for &iwire in &plane.wires {
                        let Some(wire) = store.wires.get(iwire) else {
                            ctx.fail(&pctx, "wire index out of range")?;
                            continue;
                        };
                        ctx.nonneg_ident(wire.ident, &pctx, "wire")?;
                        let wctx = format!("{pctx}wireID={}: ", wire.ident);

                        let wray = Ray::new(wire.tail, wire.head);
                        let wdir = unit_or_zero(wray.vector());

                        if wdir.z.abs() > NEAR_UNITY {
                            ctx.near(wdir.y, -1.0, repsilon, &wctx, "wire direction y")?;
                        } else {
                            ctx.positive_value(wdir.y, &wctx, "wire direction y")?;
                        }
                        ctx.near(wdir.dot(&wmdir), 1.0, repsilon, &wctx, "wire/plane-mean parallelism")?;

                        if let Some(p) = prev {
                            if let Some(pitch_ray) = ray_pitch_approx(p, wray) {
                                let pvec = pitch_ray.vector();
                                let pmag = pvec.norm();
                                if pmag > 0.0 {
                                    let pdir = pvec / pmag;
                                    ctx.near(pmag, pmmag, repsilon * pmmag.max(1.0), &wctx, "neighbor pitch magnitude")?;
                                    let ldir = unit_or_zero(p.vector());
                                    ctx.near(ldir.dot(&pdir), 0.0, repsilon, &wctx, "neighbor wire/pitch orthogonality")?;
                                    if wdir.z.abs() > NEAR_UNITY {
                                        ctx.near(pdir.z, 1.0, repsilon, &wctx, "pitch direction z")?;
                                    } else {
                                        ctx.positive_value(pdir.z, &wctx, "pitch direction z")?;
                                    }
                                }
                            }
                        }
                        prev = Some(wray);
                    }
                }

                ctx.equal_usize(face_plane_idents.len(), face.planes.len(), &fctx, "unique plane idents")?;
            }
        }
    }

    ctx.finish()
}

fn unit_or_zero(v: nalgebra::Vector3<f64>) -> nalgebra::Vector3<f64> {
    let n = v.norm();
    if n == 0.0 {
        v
    } else {
        v / n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correct::{fix_direction, fix_order, fix_pitch};
    use crate::types::{Plane, Wire};
    use wirecell_core::Point;

    fn grid_store() -> Store {
        // Wires run along Y (the common case, not the near_unity-Z branch);
        // planes are spaced out along Z.
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
        Store {
            detectors: vec![crate::types::Detector { ident: 0, anodes: vec![0] }],
            anodes: vec![crate::types::Anode { ident: 0, faces: vec![0] }],
            faces: vec![crate::types::Face { ident: 0, planes: vec![0] }],
            planes: vec![Plane { ident: 0, wires: (0..5).map(|i| i as usize).collect() }],
            wires,
        }
    }

    #[test]
    fn corrected_regular_grid_validates() {
        let mut store = grid_store();
        fix_order(&mut store).unwrap();
        fix_direction(&mut store).unwrap();
        fix_pitch(&mut store).unwrap();
        validate(&store, 1e-6, true).unwrap();
    }

    #[test]
    fn dangling_plane_index_is_reported() {
        let mut store = grid_store();
        store.faces[0].planes.push(99);
        let err = validate(&store, 1e-6, true).unwrap_err();
        assert!(err.to_string().contains("plane index out of range"));
    }

    #[test]
    fn aggregate_mode_collects_every_violation() {
        let mut store = grid_store();
        store.faces[0].planes.push(99);
        store.anodes[0].faces.push(42);
        let err = validate(&store, 1e-6, false).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("plane index out of range"));
        assert!(msg.contains("face index out of range"));
    }
}
