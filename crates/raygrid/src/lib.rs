//! Ray-Grid: O(1) ray-layer coordinate queries (§4.2) and the iterative
//! layer-sweep tiling algorithm that turns per-layer activity into blobs
//! (§4.3).

pub mod coords;
pub mod tiling;

pub use coords::{Coordinate, Coordinates, Crossing, GridIndex, LayerIndex};
pub use tiling::{drop_invalid, make_blob_set, make_blobs, prune, Activity, Blob, BlobSet, Strip, Tiling};
