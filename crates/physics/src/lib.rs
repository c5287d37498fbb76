//! Ground collision for walkers on generated terrain.

pub mod collision;
pub mod grounding;

pub use collision::*;
pub use grounding::*;
