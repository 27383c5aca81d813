//! Ray-Grid Tiling: turn per-layer Activities into the set of geometrically
//! valid Blobs, via an iterative layer sweep.

use std::collections::HashMap;

use wirecell_core::{Error, Result};

use crate::coords::{Coordinate, Coordinates, Crossing, LayerIndex};

/// The pitch-index range `[lo, hi)` a strip covers in its layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Strip {
    pub layer: LayerIndex,
    pub lo: i64,
    pub hi: i64,
}

impl Strip {
    pub fn addresses(&self) -> Crossing {
        (Coordinate::new(self.layer, self.lo), Coordinate::new(self.layer, self.hi))
    }

    pub fn contains(&self, pitch_index: i64) -> bool {
        self.lo <= pitch_index && pitch_index < self.hi
    }

    pub fn width(&self) -> i64 {
        self.hi - self.lo
    }
}

/// A sparse span of per-pitch-index activity values in one layer.
#[derive(Clone, Debug)]
pub struct Activity {
    layer: LayerIndex,
    span: Vec<f64>,
    offset: i64,
    threshold: f64,
}

impl Activity {
    pub fn layer(&self) -> LayerIndex {
        self.layer
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn empty(&self) -> bool {
        self.span.is_empty()
    }

    /// Build an activity from values `span[0..]` starting at absolute
    /// pitch index `offset`, trimming values at or below `threshold` from
    /// both ends (so the kept span always starts/ends strictly above it).
    pub fn new(layer: LayerIndex, span: &[f64], offset: i64, threshold: f64) -> Self {
        let mut b = 0usize;
        while b < span.len() && span[b] <= threshold {
            b += 1;
        }
        let mut e = span.len();
        while e > b && span[e - 1] <= threshold {
            e -= 1;
        }
        Activity {
            layer,
            span: span[b..e].to_vec(),
            offset: offset + b as i64,
            threshold,
        }
    }

    /// A length-1 "always active" activity, used for the two bounds layers.
    pub fn bound(layer: LayerIndex) -> Self {
        Activity {
            layer,
            span: vec![1.0],
            offset: 0,
            threshold: 0.0,
        }
    }

    fn pitch_index_at(&self, local: usize) -> i64 {
        self.offset + local as i64
    }

    /// Absolute pitch index of the activity's first element.
    pub fn begin_index(&self) -> i64 {
        self.offset
    }

    /// Absolute pitch index one past the activity's last element.
    pub fn end_index(&self) -> i64 {
        self.offset + self.span.len() as i64
    }

    fn active_ranges(&self) -> Vec<(usize, usize)> {
        let mut ranges = Vec::new();
        let mut start: Option<usize> = None;
        for (i, &v) in self.span.iter().enumerate() {
            if start.is_none() && v > self.threshold {
                start = Some(i);
                continue;
            }
            if let Some(s) = start {
                if v <= 0.0 {
                    ranges.push((s, i));
                    start = None;
                }
            }
        }
        if let Some(s) = start {
            ranges.push((s, self.span.len()));
        }
        ranges
    }

    pub fn make_strips(&self) -> Vec<Strip> {
        self.active_ranges()
            .into_iter()
            .map(|(s, e)| Strip {
                layer: self.layer,
                lo: self.pitch_index_at(s),
                hi: self.pitch_index_at(e),
            })
            .collect()
    }

    /// Subspan covering absolute pitch indices `[abs_begin, abs_end)`.
    /// Out-of-range requests produce an empty activity.
    pub fn subspan(&self, abs_begin: i64, abs_end: i64) -> Activity {
        let rel_begin = abs_begin - self.offset;
        let rel_end = abs_end - self.offset;
        if rel_begin < 0 || rel_begin >= rel_end || rel_end > self.span.len() as i64 {
            return Activity {
                layer: self.layer,
                span: Vec::new(),
                offset: 0,
                threshold: self.threshold,
            };
        }
        Activity::new(self.layer, &self.span[rel_begin as usize..rel_end as usize], abs_begin, self.threshold)
    }
}

/// A candidate geometric cell: one strip per contributing layer, plus the
/// corner crossings surviving all of them.
#[derive(Clone, Debug, Default)]
pub struct Blob {
    strips: Vec<Strip>,
    corners: Vec<Crossing>,
}

impl Blob {
    pub fn strips(&self) -> &[Strip] {
        &self.strips
    }

    pub fn corners(&self) -> &[Crossing] {
        &self.corners
    }

    pub fn valid(&self) -> bool {
        if self.strips.is_empty() {
            return false;
        }
        if self.strips.iter().any(|s| s.width() == 0) {
            return false;
        }
        if self.strips.len() == 1 {
            return true;
        }
        self.corners.len() >= 3
    }

    /// Fold `strip` into the blob, updating its corner set per the
    /// nudge-aware containment test.
    pub fn add(&mut self, coords: &Coordinates, strip: Strip, nudge: f64) {
        let nstrips = self.strips.len();

        if nstrips == 0 {
            self.strips.push(strip);
            return;
        }
        if nstrips == 1 {
            self.corners = find_corners(&self.strips[0], &strip);
            self.strips.push(strip);
            return;
        }

        let center_in_new = mean_pitch_location(coords, &self.corners, strip.layer);

        let mut surviving: Vec<Crossing> = self
            .corners
            .iter()
            .copied()
            .filter(|&c| in_strip(coords, c, &strip, center_in_new, nudge).is_some())
            .collect();

        let mut center_in_old: HashMap<LayerIndex, f64> = HashMap::new();
        for old_strip in &self.strips {
            center_in_old
                .entry(old_strip.layer)
                .or_insert_with(|| mean_pitch_location(coords, &self.corners, old_strip.layer));
        }

        for si1 in 0..nstrips {
            for c in find_corners(&self.strips[si1], &strip) {
                let mut miss = false;
                for (si2, s2) in self.strips.iter().enumerate() {
                    if si1 == si2 {
                        continue;
                    }
                    let center = center_in_old[&s2.layer];
                    if in_strip(coords, c, s2, center, nudge).is_none() {
                        miss = true;
                        break;
                    }
                }
                if !miss {
                    surviving.push(c);
                }
            }
        }

        self.corners = surviving;
        self.strips.push(strip);
    }
}

fn find_corners(one: &Strip, two: &Strip) -> Vec<Crossing> {
    let (a0, a1) = one.addresses();
    let (b0, b1) = two.addresses();
    vec![(a0, b0), (a0, b1), (a1, b0), (a1, b1)]
}

fn mean_pitch_location(coords: &Coordinates, corners: &[Crossing], layer: LayerIndex) -> f64 {
    if corners.is_empty() {
        return 0.0;
    }
    let sum: f64 = corners.iter().map(|&(a, b)| coords.pitch_location(a, b, layer)).sum();
    sum / corners.len() as f64
}

/// Nudge `c`'s projection into `strip`'s layer toward `center` by `nudge`
/// pitch before testing containment; only wire-plane layers (>= 2) are
/// nudged. Returns the pitch index if contained.
fn in_strip(coords: &Coordinates, c: Crossing, strip: &Strip, center: f64, nudge: f64) -> Option<i64> {
    let pitch = coords.pitch_location(c.0, c.1, strip.layer);
    let mut find = coords.pitch_relative(pitch, strip.layer);
    if strip.layer >= 2 {
        if pitch < center {
            find += nudge;
        } else {
            find -= nudge;
        }
    }
    let pind = find.floor() as i64;
    if strip.contains(pind) {
        Some(pind)
    } else {
        None
    }
}

/// Drives the layer-by-layer sweep that accumulates Blobs from per-layer
/// Activities.
pub struct Tiling<'a> {
    coords: &'a Coordinates,
    nudge: f64,
}

impl<'a> Tiling<'a> {
    pub fn new(coords: &'a Coordinates, nudge: f64) -> Self {
        Self { coords, nudge }
    }

    /// Seed blobs directly from the first layer's activity: one blob per
    /// strip, no corners yet.
    pub fn seed(&self, activity: &Activity) -> Vec<Blob> {
        activity
            .make_strips()
            .into_iter()
            .map(|s| {
                let mut b = Blob::default();
                b.add(self.coords, s, self.nudge);
                b
            })
            .collect()
    }

    /// The subspan of `activity` that a blob's corners could possibly
    /// fall within, given the blob's extent projected into `activity`'s
    /// layer.
    pub fn projection(&self, blob: &Blob, activity: &Activity) -> Activity {
        if blob.strips.len() == 1 {
            return activity.clone();
        }
        if blob.corners.is_empty() {
            return Activity::new(activity.layer, &[], 0, 0.0);
        }

        let pitch_mag = self.coords.pitch_mags()[activity.layer];
        let pitches: Vec<f64> = blob
            .corners
            .iter()
            .map(|&(a, b)| self.coords.pitch_location(a, b, activity.layer))
            .collect();

        let pmin = pitches.iter().cloned().fold(f64::INFINITY, f64::min);
        let pmax = pitches.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let mut pind1 = (pmin / pitch_mag).floor() as i64;
        let mut pind2 = (pmax / pitch_mag).ceil() as i64;

        let abegin = activity.begin_index();
        let aend = activity.end_index();
        if pind2 <= abegin || pind1 >= aend {
            return Activity::new(activity.layer, &[], 0, 0.0);
        }
        pind1 = pind1.max(abegin);
        pind2 = pind2.min(aend);

        activity.subspan(pind1, pind2)
    }

    /// Extend each current blob with strips from `activity`, discarding
    /// any blob whose projection misses it entirely.
    pub fn refine(&self, prior: &[Blob], activity: &Activity) -> Vec<Blob> {
        let mut out = Vec::new();
        for blob in prior {
            let proj = self.projection(blob, activity);
            if proj.empty() {
                continue;
            }
            for strip in proj.make_strips() {
                let mut nb = blob.clone();
                nb.add(self.coords, strip, self.nudge);
                if nb.corners.is_empty() {
                    continue;
                }
                out.push(nb);
            }
        }
        out
    }
}

pub fn drop_invalid(blobs: &mut Vec<Blob>) -> usize {
    let before = blobs.len();
    blobs.retain(|b| b.valid());
    before - blobs.len()
}

/// Tighten each blob's strip bounds to the corners' own projected extent,
/// snapping near-integer bounds (within `nudge`) to the integer.
pub fn prune(coords: &Coordinates, blobs: &mut [Blob], nudge: f64) {
    for blob in blobs.iter_mut() {
        let nlayers = blob.strips.len();
        let mut mins_maxes: Vec<Vec<f64>> = vec![Vec::new(); nlayers];

        for &(a, b) in &blob.corners {
            for (idx, strip) in blob.strips.iter().enumerate() {
                if strip.layer == a.layer || strip.layer == b.layer {
                    if strip.layer == a.layer {
                        mins_maxes[idx].push(a.grid as f64);
                    } else {
                        mins_maxes[idx].push(b.grid as f64);
                    }
                    continue;
                }
                let ploc = coords.pitch_location(a, b, strip.layer);
                let prel = coords.pitch_relative(ploc, strip.layer);
                mins_maxes[idx].push(prel);
            }
        }

        for (idx, strip) in blob.strips.iter_mut().enumerate() {
            if strip.layer < 2 {
                continue;
            }
            let vals = &mins_maxes[idx];
            if vals.is_empty() {
                continue;
            }
            let pmin = vals.iter().cloned().fold(f64::INFINITY, f64::min);
            let pmax = vals.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

            let imin = if (pmin - pmin.round()).abs() < nudge {
                pmin.round() as i64
            } else {
                pmin.floor() as i64
            };
            let imax = if (pmax - pmax.round()).abs() < nudge {
                pmax.round() as i64
            } else {
                pmax.ceil() as i64
            };
            strip.lo = imin;
            strip.hi = imax;
        }
    }
}

/// The tiler's per-slice output: every Blob tiled from one Slice's
/// activities, plus a non-owning back-reference to that Slice.
///
/// `slice_ident` names the originating Slice by its `ident` rather than
/// holding a reference to it, since Blobs/BlobSets reference their Slice
/// for context only, not ownership (`img::Slice` owns its activity map;
/// `BlobSet` owns its Blobs).
#[derive(Clone, Debug, Default)]
pub struct BlobSet {
    pub ident: i64,
    pub slice_ident: i64,
    pub blobs: Vec<Blob>,
}

impl BlobSet {
    pub fn new(ident: i64, slice_ident: i64, blobs: Vec<Blob>) -> Self {
        Self { ident, slice_ident, blobs }
    }
}

/// Tile `activities` (one per layer, layers 0/1 typically [`Activity::bound`])
/// into the full set of valid Blobs.
pub fn make_blobs(coords: &Coordinates, activities: &[Activity], nudge: f64) -> Result<Vec<Blob>> {
    if activities.len() < 3 {
        return Err(Error::Value(format!("need at least 3 activities, got {}", activities.len())));
    }
    let tiling = Tiling::new(coords, nudge);
    let mut blobs: Vec<Blob> = Vec::new();

    for (i, activity) in activities.iter().enumerate() {
        if i == 0 {
            blobs = tiling.seed(activity);
        } else {
            blobs = tiling.refine(&blobs, activity);
            if blobs.is_empty() {
                return Ok(Vec::new());
            }
        }
        drop_invalid(&mut blobs);
    }

    prune(coords, &mut blobs, nudge);
    drop_invalid(&mut blobs);
    Ok(blobs)
}

/// Tile one Slice's activities into a [`BlobSet`] carrying that Slice's
/// identity alongside its Blobs.
pub fn make_blob_set(
    coords: &Coordinates,
    slice_ident: i64,
    blob_set_ident: i64,
    activities: &[Activity],
    nudge: f64,
) -> Result<BlobSet> {
    let blobs = make_blobs(coords, activities, nudge)?;
    Ok(BlobSet::new(blob_set_ident, slice_ident, blobs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Coordinates;
    use wirecell_core::{Point, Ray};

    fn grid_coords() -> Coordinates {
        let h1 = Ray::new(Point::new(0.0, 0.0, 0.0), Point::new(0.0, 1.0, 0.0));
        let h2 = Ray::new(Point::new(0.0, 0.0, 10.0), Point::new(0.0, 1.0, 10.0));
        let v1 = Ray::new(Point::new(0.0, 0.0, 0.0), Point::new(0.0, 0.0, 1.0));
        let v2 = Ray::new(Point::new(0.0, 10.0, 0.0), Point::new(0.0, 10.0, 1.0));
        let w1 = Ray::new(Point::new(0.0, 0.0, 0.0), Point::new(0.0, 1.0, 0.0));
        let w2 = Ray::new(Point::new(0.0, 0.0, 1.0), Point::new(0.0, 1.0, 1.0));
        Coordinates::new(&[(h1, h2), (v1, v2), (w1, w2)]).unwrap()
    }

    #[test]
    fn single_active_strip_per_layer_yields_one_blob() {
        let coords = grid_coords();
        let bounds0 = Activity::bound(0);
        let bounds1 = Activity::bound(1);
        let plane = Activity::new(2, &[1.0, 1.0, 1.0], 2, 0.0);
        let blobs = make_blobs(&coords, &[bounds0, bounds1, plane], 1e-3).unwrap();
        assert_eq!(blobs.len(), 1);
        assert!(blobs[0].valid());
        assert!(blobs[0].corners().len() >= 3);
    }

    #[test]
    fn empty_activity_yields_no_blobs() {
        let coords = grid_coords();
        let bounds0 = Activity::bound(0);
        let bounds1 = Activity::bound(1);
        let plane = Activity::new(2, &[], 0, 0.0);
        let blobs = make_blobs(&coords, &[bounds0, bounds1, plane], 1e-3).unwrap();
        assert!(blobs.is_empty());
    }

    #[test]
    fn too_few_layers_is_rejected() {
        let coords = grid_coords();
        let bounds0 = Activity::bound(0);
        assert!(make_blobs(&coords, &[bounds0], 1e-3).is_err());
    }

    #[test]
    fn make_blob_set_carries_slice_and_set_identity() {
        let coords = grid_coords();
        let bounds0 = Activity::bound(0);
        let bounds1 = Activity::bound(1);
        let plane = Activity::new(2, &[1.0, 1.0, 1.0], 2, 0.0);
        let set = make_blob_set(&coords, 42, 7, &[bounds0, bounds1, plane], 1e-3).unwrap();
        assert_eq!(set.ident, 7);
        assert_eq!(set.slice_ident, 42);
        assert_eq!(set.blobs.len(), 1);
    }

    #[test]
    fn prune_snaps_within_nudge_but_not_beyond_it() {
        let coords = grid_coords();
        let activities = || {
            [Activity::bound(0), Activity::bound(1), Activity::new(2, &[1.0, 1.0, 1.0], 2, 0.0)]
        };
        let tight = make_blobs(&coords, &activities(), 1e-9).unwrap();
        let loose = make_blobs(&coords, &activities(), 0.5).unwrap();
        assert_eq!(tight.len(), 1);
        assert_eq!(loose.len(), 1);
        assert_eq!(tight[0].strips()[2].lo, loose[0].strips()[2].lo);
        assert_eq!(tight[0].strips()[2].hi, loose[0].strips()[2].hi);
    }
}
