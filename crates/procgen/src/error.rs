//! Terrain generation errors.

use thiserror::Error;

/// Invalid generation input. Generation either fails with one of these up
/// front or produces a complete terrain.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TerrainError {
    #[error("terrain extent must be positive and finite, got {size_x} x {size_z} m")]
    NonPositiveExtent { size_x: f64, size_z: f64 },

    #[error("resolution must be positive and finite meters per vertex, got {0}")]
    NonPositiveResolution(f64),

    #[error("grid needs at least 2x2 vertices, got {vertices_x}x{vertices_z}")]
    DegenerateGrid { vertices_x: usize, vertices_z: usize },

    #[error("grid of {vertices_x}x{vertices_z} vertices exceeds 32-bit indexing")]
    GridTooLarge { vertices_x: usize, vertices_z: usize },

    #[error("invalid height profile: {0}")]
    InvalidProfile(String),

    #[error("biome table has no bands")]
    EmptyBiomeTable,

    #[error("map skip factor must be at least 1")]
    InvalidSkipFactor,

    #[error("region {x0},{z0} +{nx}x{nz} lies outside the {vertices_x}x{vertices_z} grid")]
    RegionOutOfBounds {
        x0: usize,
        z0: usize,
        nx: usize,
        nz: usize,
        vertices_x: usize,
        vertices_z: usize,
    },

    #[error("heightmap image is empty")]
    EmptyHeightmap,

    #[error("heightmap image has {actual} pixels, expected {expected}")]
    HeightmapSizeMismatch { expected: usize, actual: usize },
}
