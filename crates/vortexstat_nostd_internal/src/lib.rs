//! Low-level reduction machinery shared by the `vortexstat` crate.
//!
//! Nothing in here allocates; the crate only provides the folding logic
//! ([`Reducer`] and friends), views over externally owned accumulator
//! storage ([`ChannelPackViewMut`]) and index bookkeeping for voxel
//! volumes ([`VolumeLayout`]).
#![no_std]
mod layout;
mod misc;
mod reducer;
mod state;

pub use layout::{VolumeLayout, group_time_row};
pub use misc::{aspect_ratio, divide_if_nonzero, squared_distance_2d};
pub use reducer::{Extremum, Max, Min, Reducer, Scalar, Sum};
pub use state::ChannelPackViewMut;
