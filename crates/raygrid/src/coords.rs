//! Ray-Grid Coordinates: O(1) geometric queries for one anode face's set of
//! overlapping ray layers, built once from N >= 3 ray-pairs.

use nalgebra::Vector3;
use wirecell_core::{Error, Point, Ray, Result};

pub type LayerIndex = usize;
pub type GridIndex = i64;

/// Address of one ray: its layer and pitch index within that layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub layer: LayerIndex,
    pub grid: GridIndex,
}

impl Coordinate {
    pub fn new(layer: LayerIndex, grid: GridIndex) -> Self {
        Self { layer, grid }
    }
}

/// Two ray addresses whose rays cross at one point.
pub type Crossing = (Coordinate, Coordinate);

/// Precomputed, read-only geometry for one face's ray layers.
///
/// Layers 0 and 1 are the face's horizontal/vertical active-area bounds;
/// layers 2.. are wire planes. Queries reduce to table lookups plus one
/// multiply-add, per the precomputed per-layer pitch data and the
/// pairwise "jump" (step-by-one-grid-index Cartesian displacement) table.
#[derive(Clone, Debug)]
pub struct Coordinates {
    pitch_dir: Vec<Vector3<f64>>,
    pitch_mag: Vec<f64>,
    wire_dir: Vec<Vector3<f64>>,
    center: Vec<Point>,
    // zero_crossing[l1][l2]: where ray(l1,0) crosses ray(l2,0), in the Y-Z
    // plane (x formally zero).
    zero_crossing: Vec<Vec<(f64, f64)>>,
    // jump[l1][l2]: the (y,z) displacement of the crossing point of ray
    // (l1,0) with ray (l2,g) as g increments by one.
    jump: Vec<Vec<(f64, f64)>>,
}

impl Coordinates {
    pub fn nlayers(&self) -> usize {
        self.pitch_dir.len()
    }

    pub fn pitch_dirs(&self) -> &[Vector3<f64>] {
        &self.pitch_dir
    }

    pub fn pitch_mags(&self) -> &[f64] {
        &self.pitch_mag
    }

    pub fn centers(&self) -> &[Point] {
        &self.center
    }

    /// Build coordinates from one ray-pair per layer: `(ray at grid index
    /// 0, ray at grid index 1)`. Requires at least 3 layers and no two
    /// layers sharing an (exactly) parallel wire direction, other than by
    /// coincidence of the bounds layers' perpendicular construction.
    pub fn new(ray_pairs: &[(Ray, Ray)]) -> Result<Self> {
        let n = ray_pairs.len();
        if n < 3 {
            return Err(Error::Value(format!("need at least 3 ray-grid layers, got {n}")));
        }

        let mut pitch_dir = Vec::with_capacity(n);
        let mut pitch_mag = Vec::with_capacity(n);
        let mut wire_dir = Vec::with_capacity(n);
        let mut center = Vec::with_capacity(n);

        for (r0, r1) in ray_pairs {
            let d = r0
                .unit()
                .ok_or_else(|| Error::Value("degenerate (zero-length) layer ray".into()))?;
            let pitch_ray = Ray::pitch(r0, r1)
                .ok_or_else(|| Error::Value("could not determine pitch between layer rays".into()))?;
            let pvec = pitch_ray.vector();
            let pmag = pvec.norm();
            if pmag == 0.0 {
                return Err(Error::Value("zero pitch magnitude between layer rays".into()));
            }
            wire_dir.push(d);
            pitch_dir.push(pvec / pmag);
            pitch_mag.push(pmag);
            center.push(r0.tail);
        }

        let mut zero_crossing = vec![vec![(0.0, 0.0); n]; n];
        let mut jump = vec![vec![(0.0, 0.0); n]; n];

        for l1 in 0..n {
            let p1 = yz(center[l1]);
            let d1 = yz_vec(wire_dir[l1]);
            for l2 in 0..n {
                if l1 == l2 {
                    continue;
                }
                let p2 = yz(center[l2]);
                let d2 = yz_vec(wire_dir[l2]);
                let pitch2 = (pitch_dir[l2].y * pitch_mag[l2], pitch_dir[l2].z * pitch_mag[l2]);

                let x0 = intersect_2d(p1, d1, p2, d2)
                    .ok_or_else(|| Error::Value(format!("layers {l1} and {l2} have parallel rays")))?;
                let p2b = (p2.0 + pitch2.0, p2.1 + pitch2.1);
                let x1 = intersect_2d(p1, d1, p2b, d2)
                    .ok_or_else(|| Error::Value(format!("layers {l1} and {l2} have parallel rays")))?;

                zero_crossing[l1][l2] = x0;
                jump[l1][l2] = (x1.0 - x0.0, x1.1 - x0.1);
            }
        }

        Ok(Self {
            pitch_dir,
            pitch_mag,
            wire_dir,
            center,
            zero_crossing,
            jump,
        })
    }

    /// Where ray `a` crosses ray `b`, as a 3-D point (x formally zero).
    pub fn ray_crossing(&self, a: Coordinate, b: Coordinate) -> Point {
        let (l1, l2) = (a.layer, b.layer);
        let (zy, zz) = self.zero_crossing[l1][l2];
        let (jy1, jz1) = self.jump[l2][l1]; // step of l1 seen via l2
        let (jy2, jz2) = self.jump[l1][l2]; // step of l2 seen via l1
        let g1 = a.grid as f64;
        let g2 = b.grid as f64;
        Point::new(0.0, zy + g1 * jy1 + g2 * jy2, zz + g1 * jz1 + g2 * jz2)
    }

    /// The signed pitch coordinate, in layer `l3`'s pitch basis, of the
    /// crossing of ray `a` with ray `b`.
    pub fn pitch_location(&self, a: Coordinate, b: Coordinate, l3: LayerIndex) -> f64 {
        let p = self.ray_crossing(a, b);
        let rel = p - self.center[l3];
        self.pitch_dir[l3].dot(&rel)
    }

    /// `pitch_value` as a (fractional) number of pitch bins in `layer`.
    pub fn pitch_relative(&self, pitch_value: f64, layer: LayerIndex) -> f64 {
        pitch_value / self.pitch_mag[layer]
    }

    /// `floor(pitch_relative(...))`.
    pub fn pitch_index(&self, pitch_value: f64, layer: LayerIndex) -> GridIndex {
        self.pitch_relative(pitch_value, layer).floor() as GridIndex
    }

    /// Order `corners` into the convex ring obtained by sorting their
    /// crossing points by angle around their centroid (in the Y-Z plane).
    pub fn ring_points(&self, corners: &[Crossing]) -> Vec<Point> {
        let mut points: Vec<Point> = corners.iter().map(|&(a, b)| self.ray_crossing(a, b)).collect();
        if points.len() < 3 {
            return points;
        }
        let (cy, cz) = {
            let n = points.len() as f64;
            let sy: f64 = points.iter().map(|p| p.y).sum();
            let sz: f64 = points.iter().map(|p| p.z).sum();
            (sy / n, sz / n)
        };
        points.sort_by(|a, b| {
            let angle = |p: &Point| (p.z - cz).atan2(p.y - cy);
            angle(a).partial_cmp(&angle(b)).unwrap_or(std::cmp::Ordering::Equal)
        });
        points
    }
}

fn yz(p: Point) -> (f64, f64) {
    (p.y, p.z)
}

fn yz_vec(v: Vector3<f64>) -> (f64, f64) {
    (v.y, v.z)
}

/// Intersection of infinite 2-D lines `p + s*d` and `q + t*e`.
fn intersect_2d(p: (f64, f64), d: (f64, f64), q: (f64, f64), e: (f64, f64)) -> Option<(f64, f64)> {
    let denom = d.0 * e.1 - d.1 * e.0;
    if denom.abs() < 1e-12 {
        return None;
    }
    let t = ((q.0 - p.0) * d.1 - (q.1 - p.1) * d.0) / denom;
    Some((q.0 + t * e.0, q.1 + t * e.1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_grid_coords() -> Coordinates {
        // layer0: horizontal rays along +Y, pitch (spacing) along +Z
        let h1 = Ray::new(Point::new(0.0, 0.0, 0.0), Point::new(0.0, 1.0, 0.0));
        let h2 = Ray::new(Point::new(0.0, 0.0, 1.0), Point::new(0.0, 1.0, 1.0));
        // layer1: vertical rays along +Z, pitch along +Y
        let v1 = Ray::new(Point::new(0.0, 0.0, 0.0), Point::new(0.0, 0.0, 1.0));
        let v2 = Ray::new(Point::new(0.0, 1.0, 0.0), Point::new(0.0, 1.0, 1.0));
        // layer2: wires at 45 degrees, pitch sqrt(2)/2 apart along (1,1)/sqrt2
        let w1 = Ray::new(Point::new(0.0, 0.0, 0.0), Point::new(0.0, 1.0, 1.0));
        let w2 = Ray::new(Point::new(0.0, 1.0, 0.0), Point::new(0.0, 2.0, 1.0));
        Coordinates::new(&[(h1, h2), (v1, v2), (w1, w2)]).unwrap()
    }

    #[test]
    fn ray_crossing_recovers_grid_intersections() {
        let c = unit_grid_coords();
        let p = c.ray_crossing(Coordinate::new(0, 0), Coordinate::new(1, 0));
        assert!((p.y - 0.0).abs() < 1e-9 && (p.z - 0.0).abs() < 1e-9);
        let p = c.ray_crossing(Coordinate::new(0, 2), Coordinate::new(1, 3));
        assert!((p.y - 3.0).abs() < 1e-9 && (p.z - 2.0).abs() < 1e-9);
    }

    #[test]
    fn pitch_index_matches_layer_spacing() {
        let c = unit_grid_coords();
        let p = c.ray_crossing(Coordinate::new(0, 0), Coordinate::new(1, 5));
        let loc = c.pitch_location(Coordinate::new(0, 0), Coordinate::new(1, 0), 1);
        assert!((loc - 0.0).abs() < 1e-9);
        let _ = p;
        let loc5 = c.pitch_location(Coordinate::new(0, 0), Coordinate::new(1, 5), 1);
        assert_eq!(c.pitch_index(loc5, 1), 5);
    }
}
