//! Frame slicing (§4.4) and blob sampling (§4.5): turns digitized frames
//! into per-time-slice channel activity, and geometric blobs into
//! point-cloud samples.

pub mod frame;
pub mod sampler;

pub use frame::{mask_slice, sum_slice, Channel, ChannelPlanes, Frame, MaskSlicerConfig, Slice, SumSlicerConfig, Trace};
pub use sampler::{BoundsConfig, CommonConfig, GridConfig, Sampler, Strategy};
