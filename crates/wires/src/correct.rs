//! The monotonic `order -> direction -> pitch` correction pipeline and the
//! per-(path, level) loader cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use nalgebra::Vector3;
use wirecell_core::{Error, Ray, Result};

use crate::fileio;
use crate::json;
use crate::types::{Level, Store};

fn wire_center(w: &crate::types::Wire) -> wirecell_core::Point {
    nalgebra::center(&w.tail, &w.head)
}

/// Step 1: decide each plane's sort axis and put its wires in canonical
/// ascending-pitch, tail->head order.
pub fn fix_order(store: &mut Store) -> Result<()> {
    for plane in &mut store.planes {
        if plane.wires.is_empty() {
            continue;
        }
        // Sort axis is decided from the plane's first wire (in on-disk
        // order), not a mean over the whole plane.
        let first = &store.wires[plane.wires[0]];
        let first_dir = Ray::new(first.tail, first.head)
            .unit()
            .unwrap_or(Vector3::new(0.0, 0.0, 1.0));
        // wire nearly parallel to z -> sort by y, else sort by z
        let sort_by_y = first_dir.z.abs() > 0.9999;

        let wires = &store.wires;
        plane.wires.sort_by(|&a, &b| {
            let ca = if sort_by_y {
                wire_center(&wires[a]).y
            } else {
                wire_center(&wires[a]).z
            };
            let cb = if sort_by_y {
                wire_center(&wires[b]).y
            } else {
                wire_center(&wires[b]).z
            };
            ca.partial_cmp(&cb).unwrap_or(std::cmp::Ordering::Equal)
        });

        for &wi in &plane.wires {
            let w = &mut store.wires[wi];
            let ok = if sort_by_y {
                w.head.z < w.tail.z
            } else {
                w.head.y > w.tail.y
            };
            if !ok {
                std::mem::swap(&mut w.head, &mut w.tail);
            }
        }
    }
    Ok(())
}

/// Step 2: rotate every wire in a plane to the plane's mean direction,
/// keeping each wire's length and center fixed.
pub fn fix_direction(store: &mut Store) -> Result<()> {
    for plane in &store.planes.clone() {
        if plane.wires.is_empty() {
            continue;
        }
        // Sum raw (not unit) wire vectors, so longer wires weigh more,
        // then zero the drift-axis component and renormalize.
        let mut sum = Vector3::new(0.0, 0.0, 0.0);
        let mut half_lengths = Vec::with_capacity(plane.wires.len());
        for &wi in &plane.wires {
            let w = &store.wires[wi];
            let v = w.head - w.tail;
            sum += v;
            half_lengths.push(0.5 * v.norm());
        }
        sum.x = 0.0;
        let norm = sum.norm();
        if norm == 0.0 {
            continue;
        }
        let mean_dir = sum / norm;

        for (&wi, half_len) in plane.wires.iter().zip(half_lengths) {
            let w = &mut store.wires[wi];
            let center = wire_center(w);
            let half = mean_dir * half_len;
            w.tail = center - half;
            w.head = center + half;
        }
    }
    Ok(())
}

/// Step 3: collapse the plane onto one x value, then slide each wire along
/// the mean pitch direction so centers are equispaced about the middle wire.
pub fn fix_pitch(store: &mut Store) -> Result<()> {
    for plane in &store.planes.clone() {
        let wire_idxs = &plane.wires;
        let n = wire_idxs.len();
        if n == 0 {
            continue;
        }

        let xmean: f64 = wire_idxs
            .iter()
            .map(|&wi| wire_center(&store.wires[wi]).x)
            .sum::<f64>()
            / n as f64;
        for &wi in wire_idxs {
            let w = &mut store.wires[wi];
            w.tail.x = xmean;
            w.head.x = xmean;
        }

        if n < 2 {
            continue;
        }

        let nhalf = n / 2;
        let mut ptot = Vector3::new(0.0, 0.0, 0.0);
        let mut prev: Option<Ray> = None;
        let mut midway: Option<Ray> = None;
        for (wind, &wi) in wire_idxs.iter().enumerate() {
            let w = &store.wires[wi];
            let next = Ray::new(w.tail, w.head);
            if wind == nhalf {
                midway = Some(next);
            }
            if let Some(p) = prev {
                if let Some(pitch_ray) = Ray::pitch(&p, &next) {
                    ptot += pitch_ray.vector();
                }
            }
            prev = Some(next);
        }
        let pmean = ptot / (n as f64 - 1.0);
        let pmag = pmean.norm();
        if pmag == 0.0 {
            continue;
        }
        let pdir = pmean / pmag;

        let midway = midway.unwrap();
        let origin = nalgebra::center(&midway.tail, &midway.head);

        for (wind, &wi) in wire_idxs.iter().enumerate() {
            if wind == nhalf {
                continue;
            }
            let w = &mut store.wires[wi];
            let center = wire_center(w);
            let wcen = center - origin;
            let have_pitch = pdir.dot(&wcen);
            let want_pitch = (wind as f64 - nhalf as f64) * pmag;
            let delta = want_pitch - have_pitch;
            let diff = pdir * delta;
            w.tail += diff;
            w.head += diff;
        }
    }
    Ok(())
}

fn apply_level(store: &mut Store, level: Level) -> Result<()> {
    match level {
        Level::Order => fix_order(store),
        Level::Direction => fix_direction(store),
        Level::Pitch => fix_pitch(store),
        Level::Empty | Level::Load => Ok(()),
    }
}

fn next_level(level: Level) -> Level {
    match level {
        Level::Empty => Level::Load,
        Level::Load => Level::Order,
        Level::Order => Level::Direction,
        Level::Direction => Level::Pitch,
        Level::Pitch => Level::Pitch,
    }
}

/// Initialize-once, read-many context object owning the per-(path, level)
/// store cache. Per Design Note §9, this replaces the original's process-wide
/// singleton cache: callers construct and hold their own `Loader`.
#[derive(Default)]
pub struct Loader {
    cache: Mutex<HashMap<(PathBuf, u8), Arc<Store>>>,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load (or promote an already-cached lower level of) the geometry file
    /// at `path`, up to `level`. Only ever upgrades a cached store, never
    /// downgrades.
    pub fn load(&self, path: &Path, level: Level) -> Result<Arc<Store>> {
        if level == Level::Empty {
            return Ok(Arc::new(Store::default()));
        }

        let canon = path
            .canonicalize()
            .map_err(|e| Error::Io(format!("{}: {e}", path.display())))?;
        let mut cache = self.cache.lock().unwrap();

        if let Some(s) = cache.get(&(canon.clone(), level as u8)) {
            return Ok(s.clone());
        }

        let mut found: Option<(Level, Store)> = None;
        for l in [Level::Pitch, Level::Direction, Level::Order, Level::Load] {
            if l < level {
                if let Some(s) = cache.get(&(canon.clone(), l as u8)) {
                    found = Some((l, (**s).clone()));
                    break;
                }
            }
        }

        let (mut cur_level, mut store) = match found {
            Some(pair) => pair,
            None => {
                let text = fileio::read_text(&canon)?;
                let store = json::from_json(&text)?;
                cache.insert((canon.clone(), Level::Load as u8), Arc::new(store.clone()));
                (Level::Load, store)
            }
        };

        while cur_level < level {
            let next = next_level(cur_level);
            apply_level(&mut store, next)?;
            cur_level = next;
            cache.insert((canon.clone(), cur_level as u8), Arc::new(store.clone()));
        }

        Ok(cache.get(&(canon, level as u8)).unwrap().clone())
    }

    /// Serialize `store` back to the geometry JSON shape at `path`, choosing
    /// a compression envelope by filename suffix.
    pub fn dump(&self, path: &Path, store: &Store) -> Result<()> {
        let text = json::to_json(store)?;
        fileio::write_text(path, &text)
    }
}
