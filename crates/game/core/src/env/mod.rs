//! Environment the decision tier runs inside: simulation time and seeded
//! randomness. Nothing here reads the wall clock or operating-system entropy.
mod rng;
mod time;

pub use rng::{PcgStream, derive_stream_seed};
pub use time::{SimTime, TimeSource, stream_tag};
