//! Named columnar point cloud storage and k-d tree indexing.

mod array;
mod dataset;
mod dtype;
mod kdtree;

pub use array::Array;
pub use dataset::Dataset;
pub use dtype::Dtype;
pub use kdtree::{MultiQuery, Neighbor, Query};
