//! Blob sampling (spec §4.5): turn each geometric [`Blob`] into a cloud of
//! `(x, y, z, t)` points plus bookkeeping columns, ready to append to a
//! point-cloud [`Dataset`].
//!
//! Grounded in `BlobSampler.cxx`'s common `Sampler` base (the time/drift
//! transform, `crossing_point`/`center_point`, `make_dataset`/`intern`) and
//! its five point-placement strategies (`center`, `corner`, `edge`, `grid`,
//! `bounds`).

use wirecell_core::pointcloud::{Array, Dataset};
use wirecell_core::{Binning, Error, Point, Result};
use wirecell_raygrid::{Blob, Coordinate, Coordinates, Crossing};

/// Settings shared by every sampling strategy.
#[derive(Clone, Debug)]
pub struct CommonConfig {
    /// Prefix prepended to every emitted column name, e.g. `"3d_"`.
    pub prefix: String,
    pub time_offset: f64,
    pub drift_speed: f64,
    /// Sign of the collection plane's drift axis relative to its pimpos
    /// origin. The original infers this from the plane's wire geometry;
    /// here it is an explicit, required field rather than derived, since
    /// that derivation depends on anode/pimpos plumbing out of this
    /// crate's scope.
    pub x_sign: f64,
    /// Constant offset added after the `x_sign·(t+time_offset)/drift_speed`
    /// term, placing the drift origin at a plane other than `x=0`.
    pub x_origin: f64,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            time_offset: 0.0,
            drift_speed: 1.0,
            x_sign: 1.0,
            x_origin: 0.0,
        }
    }
}

/// Strategy codes stored in the `strategy` column.
pub const STRATEGY_CENTER: i32 = 0;
pub const STRATEGY_CORNER: i32 = 1;
pub const STRATEGY_EDGE: i32 = 2;
pub const STRATEGY_GRID: i32 = 3;
pub const STRATEGY_BOUNDS: i32 = 4;

#[derive(Clone, Debug)]
pub struct GridConfig {
    /// Lattice spacing in units of pitch; 1.0 aligns exactly to the two
    /// chosen layers' own pitch grid, letting membership be tested purely
    /// with `pitch_index`.
    pub step: f64,
    /// Plane-local indices (0..=2) of the two layers the lattice is built
    /// from; the third plane is the one not named here.
    pub planes: [usize; 2],
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { step: 1.0, planes: [0, 1] }
    }
}

#[derive(Clone, Debug)]
pub struct BoundsConfig {
    /// Spacing along each ring edge, in units of the blob's mean wire
    /// pitch.
    pub step: f64,
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self { step: 1.0 }
    }
}

#[derive(Clone, Debug)]
pub enum Strategy {
    Center,
    Corner,
    Edge,
    Grid(GridConfig),
    Bounds(BoundsConfig),
}

/// Samples blobs into point clouds.
#[derive(Clone, Debug)]
pub struct Sampler {
    pub cc: CommonConfig,
}

impl Sampler {
    pub fn new(cc: CommonConfig) -> Self {
        Self { cc }
    }

    /// `x` coordinate a drift `time` (relative to the frame) corresponds
    /// to on the collection plane.
    pub fn time2drift(&self, time: f64) -> f64 {
        self.cc.x_origin + self.cc.x_sign * (time + self.cc.time_offset) / self.cc.drift_speed
    }

    pub fn crossing_point(&self, coords: &Coordinates, c: Crossing) -> Point {
        coords.ray_crossing(c.0, c.1)
    }

    pub fn center_point(&self, coords: &Coordinates, blob: &Blob) -> Point {
        let corners = blob.corners();
        if corners.is_empty() {
            return Point::new(0.0, 0.0, 0.0);
        }
        let n = corners.len() as f64;
        let (mut sy, mut sz) = (0.0, 0.0);
        for &c in corners {
            let p = self.crossing_point(coords, c);
            sy += p.y;
            sz += p.z;
        }
        Point::new(0.0, sy / n, sz / n)
    }

    /// Sample `blob` with `strategy`, producing one point-cloud row per
    /// `(point, time bin)` pair.
    ///
    /// `tmin`/`tmax` are fractions of the blob's own slice interval
    /// `[slice_start, slice_start+slice_span)` — e.g. the default
    /// `(0.0, 1.0)` covers the whole slice, `(0.0, 0.5)` its first half —
    /// split into `tbins` equal absolute-time bins.
    pub fn sample(
        &self,
        coords: &Coordinates,
        blob: &Blob,
        blobid: i64,
        strategy: &Strategy,
        slice_start: f64,
        slice_span: f64,
        tmin: f64,
        tmax: f64,
        tbins: usize,
    ) -> Result<Dataset> {
        let (points, code) = match strategy {
            Strategy::Center => (vec![self.center_point(coords, blob)], STRATEGY_CENTER),
            Strategy::Corner => (
                blob.corners().iter().map(|&c| self.crossing_point(coords, c)).collect(),
                STRATEGY_CORNER,
            ),
            Strategy::Edge => (sample_edge(coords, blob), STRATEGY_EDGE),
            Strategy::Grid(cfg) => (sample_grid(coords, blob, cfg)?, STRATEGY_GRID),
            Strategy::Bounds(cfg) => (sample_bounds(coords, blob, cfg), STRATEGY_BOUNDS),
        };
        let abs_tmin = slice_start + tmin * slice_span;
        let abs_tmax = slice_start + tmax * slice_span;
        Ok(self.intern(&points, code, blobid, abs_tmin, abs_tmax, tbins))
    }

    fn intern(&self, points: &[Point], strategy: i32, blobid: i64, tmin: f64, tmax: f64, tbins: usize) -> Dataset {
        let binning = Binning::new(tbins.max(1), tmin, tmax.max(tmin + 1e-9));

        let total = points.len() * binning.nbins();
        let mut xs = Vec::with_capacity(total);
        let mut ys = Vec::with_capacity(total);
        let mut zs = Vec::with_capacity(total);
        let mut ts = Vec::with_capacity(total);
        let mut strategies = Vec::with_capacity(total);
        let mut blobids = Vec::with_capacity(total);

        for p in points {
            for ibin in 0..binning.nbins() {
                let t = binning.center(ibin);
                xs.push(self.time2drift(t));
                ys.push(p.y);
                zs.push(p.z);
                ts.push(t);
                strategies.push(strategy);
                blobids.push(blobid as i32);
            }
        }

        let mut ds = Dataset::new();
        let p = &self.cc.prefix;
        ds.add(format!("{p}x"), Array::from_f64(xs)).expect("equal-length columns");
        ds.add(format!("{p}y"), Array::from_f64(ys)).expect("equal-length columns");
        ds.add(format!("{p}z"), Array::from_f64(zs)).expect("equal-length columns");
        ds.add(format!("{p}t"), Array::from_f64(ts)).expect("equal-length columns");
        ds.add(format!("{p}strategy"), Array::from_i4(strategies)).expect("equal-length columns");
        ds.add(format!("{p}blobid"), Array::from_i4(blobids)).expect("equal-length columns");
        ds
    }
}

fn sample_edge(coords: &Coordinates, blob: &Blob) -> Vec<Point> {
    let ring = coords.ring_points(blob.corners());
    let n = ring.len();
    if n < 2 {
        return ring;
    }
    (0..n)
        .map(|i| {
            let a = ring[i];
            let b = ring[(i + 1) % n];
            Point::new(0.0, 0.5 * (a.y + b.y), 0.5 * (a.z + b.z))
        })
        .collect()
}

fn wire_layers(planes: &[usize; 2]) -> Result<(usize, usize, usize)> {
    if planes[0] == planes[1] || planes[0] > 2 || planes[1] > 2 {
        return Err(Error::Value(format!("invalid grid-strategy plane pair {planes:?}")));
    }
    let other = 3 - (planes[0] + planes[1]);
    Ok((planes[0] + 2, planes[1] + 2, other + 2))
}

fn strip_for<'a>(blob: &'a Blob, layer: usize) -> Result<&'a wirecell_raygrid::Strip> {
    blob.strips()
        .iter()
        .find(|s| s.layer == layer)
        .ok_or_else(|| Error::Value(format!("blob has no strip in layer {layer}")))
}

fn sample_grid(coords: &Coordinates, blob: &Blob, cfg: &GridConfig) -> Result<Vec<Point>> {
    let (l1, l2, l3) = wire_layers(&cfg.planes)?;
    let s1 = strip_for(blob, l1)?;
    let s2 = strip_for(blob, l2)?;
    let s3 = strip_for(blob, l3)?;

    if (cfg.step - 1.0).abs() < 1e-9 {
        let mut points = Vec::new();
        for i1 in s1.lo..s1.hi {
            for i2 in s2.lo..s2.hi {
                let a = Coordinate::new(l1, i1);
                let b = Coordinate::new(l2, i2);
                let ploc = coords.pitch_location(a, b, l3);
                if s3.contains(coords.pitch_index(ploc, l3)) {
                    points.push(coords.ray_crossing(a, b));
                }
            }
        }
        return Ok(points);
    }

    // Non-aligned step: walk a lattice in Cartesian space spaced by
    // `step` pitch units along each of the two chosen layers' pitch
    // directions, starting from their strips' common low corner, testing
    // membership against the third layer's strip at every lattice point.
    let origin = coords.ray_crossing(Coordinate::new(l1, s1.lo), Coordinate::new(l2, s2.lo));
    let step1 = coords.pitch_dirs()[l1] * (coords.pitch_mags()[l1] * cfg.step);
    let step2 = coords.pitch_dirs()[l2] * (coords.pitch_mags()[l2] * cfg.step);
    let n1 = (s1.width() as f64 / cfg.step).ceil() as i64 + 1;
    let n2 = (s2.width() as f64 / cfg.step).ceil() as i64 + 1;
    let center3 = coords.centers()[l3];
    let pdir3 = coords.pitch_dirs()[l3];

    let mut points = Vec::new();
    for i in 0..n1 {
        for j in 0..n2 {
            let p = origin + step1 * (i as f64) + step2 * (j as f64);
            let ploc = pdir3.dot(&(p - center3));
            if s3.contains(coords.pitch_index(ploc, l3)) {
                points.push(p);
            }
        }
    }
    Ok(points)
}

fn sample_bounds(coords: &Coordinates, blob: &Blob, cfg: &BoundsConfig) -> Vec<Point> {
    let ring = coords.ring_points(blob.corners());
    let n = ring.len();
    if n < 2 {
        return Vec::new();
    }

    let wire_mags: Vec<f64> = coords.pitch_mags().iter().skip(2).copied().collect();
    let pitch = if wire_mags.is_empty() {
        1.0
    } else {
        wire_mags.iter().sum::<f64>() / wire_mags.len() as f64
    };
    let spacing = (cfg.step * pitch).max(1e-9);

    let mut points = Vec::new();
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        let (dy, dz) = (b.y - a.y, b.z - a.z);
        let len = (dy * dy + dz * dz).sqrt();
        if len == 0.0 {
            continue;
        }
        let steps = (len / spacing).floor() as i64;
        for s in 1..steps {
            let t = s as f64 * spacing / len;
            points.push(Point::new(0.0, a.y + t * dy, a.z + t * dz));
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use wirecell_core::Ray;
    use wirecell_raygrid::{make_blobs, Activity};

    fn grid_coords() -> Coordinates {
        let h1 = Ray::new(Point::new(0.0, 0.0, 0.0), Point::new(0.0, 1.0, 0.0));
        let h2 = Ray::new(Point::new(0.0, 0.0, 10.0), Point::new(0.0, 1.0, 10.0));
        let v1 = Ray::new(Point::new(0.0, 0.0, 0.0), Point::new(0.0, 0.0, 1.0));
        let v2 = Ray::new(Point::new(0.0, 10.0, 0.0), Point::new(0.0, 10.0, 1.0));
        let w1 = Ray::new(Point::new(0.0, 0.0, 0.0), Point::new(0.0, 1.0, 0.0));
        let w2 = Ray::new(Point::new(0.0, 0.0, 1.0), Point::new(0.0, 1.0, 1.0));
        Coordinates::new(&[(h1, h2), (v1, v2), (w1, w2)]).unwrap()
    }

    fn one_blob() -> Blob {
        let coords = grid_coords();
        let bounds0 = Activity::bound(0);
        let bounds1 = Activity::bound(1);
        let plane = Activity::new(2, &[1.0, 1.0, 1.0], 2, 0.0);
        make_blobs(&coords, &[bounds0, bounds1, plane], 1e-3).unwrap().remove(0)
    }

    #[test]
    fn center_strategy_yields_one_point_per_time_bin() {
        let coords = grid_coords();
        let blob = one_blob();
        let sampler = Sampler::new(CommonConfig {
            prefix: "3d_".to_string(),
            drift_speed: 1.0,
            ..Default::default()
        });
        let ds = sampler.sample(&coords, &blob, 0, &Strategy::Center, 0.0, 10.0, 0.0, 1.0, 5).unwrap();
        assert_eq!(ds.size_major(), 5);
        assert_eq!(ds.get("3d_strategy").unwrap().as_i32().unwrap(), vec![STRATEGY_CENTER; 5]);
    }

    #[test]
    fn corner_strategy_yields_a_point_per_corner() {
        let coords = grid_coords();
        let blob = one_blob();
        let sampler = Sampler::new(CommonConfig::default());
        let ds = sampler.sample(&coords, &blob, 0, &Strategy::Corner, 5.0, 2.0, 0.0, 1.0, 1).unwrap();
        assert_eq!(ds.size_major(), blob.corners().len());
    }

    #[test]
    fn sample_tmin_tmax_are_fractions_of_the_slice_interval() {
        let coords = grid_coords();
        let blob = one_blob();
        let sampler = Sampler::new(CommonConfig {
            prefix: "3d_".to_string(),
            ..Default::default()
        });
        // slice covers t in [100, 110); requesting the fractional range
        // [0.25, 0.75) should land on absolute times [102.5, 107.5).
        let ds = sampler
            .sample(&coords, &blob, 0, &Strategy::Center, 100.0, 10.0, 0.25, 0.75, 2)
            .unwrap();
        let ts = ds.get("3d_t").unwrap().as_f64().unwrap();
        assert!(ts.iter().all(|&t| t >= 102.5 && t < 107.5));
    }

    fn three_plane_coords() -> Coordinates {
        let h1 = Ray::new(Point::new(0.0, 0.0, 0.0), Point::new(0.0, 1.0, 0.0));
        let h2 = Ray::new(Point::new(0.0, 0.0, 10.0), Point::new(0.0, 1.0, 10.0));
        let v1 = Ray::new(Point::new(0.0, 0.0, 0.0), Point::new(0.0, 0.0, 1.0));
        let v2 = Ray::new(Point::new(0.0, 10.0, 0.0), Point::new(0.0, 10.0, 1.0));
        // U: horizontal wires (pitch along z), V: vertical wires (pitch along y),
        // W: 45-degree wires (pitch along (1,1)/sqrt2)
        let u1 = Ray::new(Point::new(0.0, 0.0, 0.0), Point::new(0.0, 1.0, 0.0));
        let u2 = Ray::new(Point::new(0.0, 0.0, 1.0), Point::new(0.0, 1.0, 1.0));
        let w1 = Ray::new(Point::new(0.0, 0.0, 0.0), Point::new(0.0, 0.0, 1.0));
        let w2 = Ray::new(Point::new(0.0, 1.0, 0.0), Point::new(0.0, 1.0, 1.0));
        let x1 = Ray::new(Point::new(0.0, 0.0, 0.0), Point::new(0.0, 1.0, 1.0));
        let x2 = Ray::new(Point::new(0.0, 1.0, 0.0), Point::new(0.0, 2.0, 1.0));
        Coordinates::new(&[(h1, h2), (v1, v2), (u1, u2), (w1, w2), (x1, x2)]).unwrap()
    }

    fn three_plane_blob() -> Blob {
        let coords = three_plane_coords();
        let bounds0 = Activity::bound(0);
        let bounds1 = Activity::bound(1);
        let u = Activity::new(2, &[1.0, 1.0, 1.0], 2, 0.0);
        let v = Activity::new(3, &[1.0, 1.0, 1.0], 2, 0.0);
        let w = Activity::new(4, &[1.0, 1.0, 1.0, 1.0], 1, 0.0);
        make_blobs(&coords, &[bounds0, bounds1, u, v, w], 1e-3)
            .unwrap()
            .into_iter()
            .find(|b| b.valid())
            .expect("at least one valid blob")
    }

    #[test]
    fn aligned_grid_matches_strip_extent() {
        let coords = three_plane_coords();
        let blob = three_plane_blob();
        let cfg = GridConfig { step: 1.0, planes: [0, 1] };
        let pts = sample_grid(&coords, &blob, &cfg).unwrap();
        assert!(!pts.is_empty());
    }

    #[test]
    fn unaligned_grid_runs_without_panicking() {
        let coords = three_plane_coords();
        let blob = three_plane_blob();
        let cfg = GridConfig { step: 0.5, planes: [0, 1] };
        let pts = sample_grid(&coords, &blob, &cfg).unwrap();
        let _ = pts;
    }

    #[test]
    fn bounds_strategy_steps_along_ring_edges() {
        let coords = three_plane_coords();
        let blob = three_plane_blob();
        let cfg = BoundsConfig { step: 0.25 };
        let pts = sample_bounds(&coords, &blob, &cfg);
        assert!(!pts.is_empty());
    }

    #[test]
    fn grid_strategy_rejects_duplicate_planes() {
        let cfg = GridConfig { step: 1.0, planes: [0, 0] };
        assert!(wire_layers(&cfg.planes).is_err());
    }
}
