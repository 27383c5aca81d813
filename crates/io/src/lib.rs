//! Tensor-set archive I/O (spec §6): suffix-selected `.tar`/`.tar.gz`/
//! `.tar.bz2`/`.zip` envelopes holding named `.npy` entries, plus the
//! frame- and point-cloud-specific naming conventions built on top.

pub mod archive;
pub mod dataset;
pub mod frame_sink;
pub mod npy;

pub use archive::Archive;
pub use dataset::write_dataset;
pub use frame_sink::{write_frame, FrameSinkConfig};
