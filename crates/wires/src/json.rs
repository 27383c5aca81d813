//! `{"Store": {...}}` geometry file shape (§6) and its conversion to/from [`Store`].

use serde::{Deserialize, Serialize};
use wirecell_core::{Error, Point, Result};

use crate::types::{Anode, Detector, Face, Plane, Store, Wire};

#[derive(Deserialize, Serialize, Clone, Debug)]
struct RawPoint {
    x: f64,
    y: f64,
    z: f64,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
struct RawWire {
    ident: i64,
    channel: i64,
    segment: i64,
    tail: usize,
    head: usize,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
struct RawPlane {
    ident: i64,
    wires: Vec<usize>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
struct RawFace {
    ident: i64,
    planes: Vec<usize>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
struct RawAnode {
    ident: i64,
    faces: Vec<usize>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
struct RawDetector {
    ident: i64,
    anodes: Vec<usize>,
}

// Serde's default external tagging of a single-field tuple variant produces
// exactly the spec's `{"Point": {...}}` single-key wrapper.
#[derive(Deserialize, Serialize, Clone, Debug)]
enum PointEntry {
    Point(RawPoint),
}
#[derive(Deserialize, Serialize, Clone, Debug)]
enum WireEntry {
    Wire(RawWire),
}
#[derive(Deserialize, Serialize, Clone, Debug)]
enum PlaneEntry {
    Plane(RawPlane),
}
#[derive(Deserialize, Serialize, Clone, Debug)]
enum FaceEntry {
    Face(RawFace),
}
#[derive(Deserialize, Serialize, Clone, Debug)]
enum AnodeEntry {
    Anode(RawAnode),
}
#[derive(Deserialize, Serialize, Clone, Debug)]
enum DetectorEntry {
    Detector(RawDetector),
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
struct RawStore {
    points: Vec<PointEntry>,
    wires: Vec<WireEntry>,
    planes: Vec<PlaneEntry>,
    faces: Vec<FaceEntry>,
    anodes: Vec<AnodeEntry>,
    #[serde(default)]
    detectors: Vec<DetectorEntry>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
struct Document {
    #[serde(rename = "Store")]
    store: RawStore,
}

/// Parse a wire geometry JSON document into a [`Store`].
pub fn from_json(text: &str) -> Result<Store> {
    let doc: Document = serde_json::from_str(text).map_err(|e| Error::Value(e.to_string()))?;
    let raw = doc.store;

    let points: Vec<Point> = raw
        .points
        .iter()
        .map(|PointEntry::Point(p)| Point::new(p.x, p.y, p.z))
        .collect();

    let wires = raw
        .wires
        .iter()
        .map(|WireEntry::Wire(w)| {
            let tail = *points
                .get(w.tail)
                .ok_or_else(|| Error::Index(format!("wire {} references missing point {}", w.ident, w.tail)))?;
            let head = *points
                .get(w.head)
                .ok_or_else(|| Error::Index(format!("wire {} references missing point {}", w.ident, w.head)))?;
            Ok(Wire {
                ident: w.ident,
                channel: w.channel,
                segment: w.segment,
                tail,
                head,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let planes = raw
        .planes
        .iter()
        .map(|PlaneEntry::Plane(p)| Plane {
            ident: p.ident,
            wires: p.wires.clone(),
        })
        .collect();

    let faces = raw
        .faces
        .iter()
        .map(|FaceEntry::Face(f)| Face {
            ident: f.ident,
            planes: f.planes.clone(),
        })
        .collect();

    let anodes = raw
        .anodes
        .iter()
        .map(|AnodeEntry::Anode(a)| Anode {
            ident: a.ident,
            faces: a.faces.clone(),
        })
        .collect();

    let detectors = raw
        .detectors
        .iter()
        .map(|DetectorEntry::Detector(d)| Detector {
            ident: d.ident,
            anodes: d.anodes.clone(),
        })
        .collect();

    Ok(Store {
        detectors,
        anodes,
        faces,
        planes,
        wires,
    })
}

/// Serialize a [`Store`] to a wire geometry JSON document. Each wire re-emits
/// its own two point entries; point sharing is not attempted (see `SPEC_FULL.md` §4.1).
pub fn to_json(store: &Store) -> Result<String> {
    let mut points = Vec::with_capacity(store.wires.len() * 2);
    let mut wires = Vec::with_capacity(store.wires.len());
    for w in &store.wires {
        let tail_idx = points.len();
        points.push(PointEntry::Point(RawPoint {
            x: w.tail.x,
            y: w.tail.y,
            z: w.tail.z,
        }));
        let head_idx = points.len();
        points.push(PointEntry::Point(RawPoint {
            x: w.head.x,
            y: w.head.y,
            z: w.head.z,
        }));
        wires.push(WireEntry::Wire(RawWire {
            ident: w.ident,
            channel: w.channel,
            segment: w.segment,
            tail: tail_idx,
            head: head_idx,
        }));
    }

    let planes = store
        .planes
        .iter()
        .map(|p| {
            PlaneEntry::Plane(RawPlane {
                ident: p.ident,
                wires: p.wires.clone(),
            })
        })
        .collect();
    let faces = store
        .faces
        .iter()
        .map(|f| {
            FaceEntry::Face(RawFace {
                ident: f.ident,
                planes: f.planes.clone(),
            })
        })
        .collect();
    let anodes = store
        .anodes
        .iter()
        .map(|a| {
            AnodeEntry::Anode(RawAnode {
                ident: a.ident,
                faces: a.faces.clone(),
            })
        })
        .collect();
    let detectors = store
        .detectors
        .iter()
        .map(|d| {
            DetectorEntry::Detector(RawDetector {
                ident: d.ident,
                anodes: d.anodes.clone(),
            })
        })
        .collect();

    let doc = Document {
        store: RawStore {
            points,
            wires,
            planes,
            faces,
            anodes,
            detectors,
        },
    };
    serde_json::to_string_pretty(&doc).map_err(|e| Error::Value(e.to_string()))
}
