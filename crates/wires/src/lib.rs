//! Wire geometry: the hierarchical detector/anode/face/plane/wire schema,
//! its JSON file format, the monotonic correction ladder, validation, and
//! synthetic generation.

pub mod correct;
pub mod fileio;
pub mod generate;
pub mod geomhelpers;
pub mod json;
pub mod raypairs;
pub mod types;
pub mod validate;

pub use correct::Loader;
pub use generate::generate;
pub use raypairs::{ray_pairs, ray_pairs_active};
pub use types::{Anode, Detector, Face, Level, Plane, Store, Wire};
pub use validate::validate;
