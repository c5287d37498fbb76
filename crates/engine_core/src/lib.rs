//! Core engine types shared by the terrain, physics and game crates.
//!
//! This crate provides the seams between the terrain core and its consumers:
//! - The `Renderable` capability (vertex streams, index buffer, shader hint)
//! - The `HeightSampler` query used by per-frame collision

pub mod render;
pub mod sampling;

pub use render::*;
pub use sampling::*;

// Re-export commonly used types
pub use glam::{DVec3, Vec2, Vec3};
