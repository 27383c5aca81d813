//! Shared primitives for the `wirecell-*` workspace: points/rays, binning,
//! the error type, and point-cloud/k-d-tree support.

pub mod binning;
pub mod error;
pub mod geom;
pub mod intersection;
pub mod pointcloud;

pub use binning::Binning;
pub use error::{Error, Result};
pub use geom::{Point, Ray};
pub use intersection::{box_intersection, box_intersection_axis};

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
