//! Procedural terrain: seeded noise, heightfield synthesis, chunk tiles,
//! biome classification, meshes and height queries.

pub mod biome;
pub mod chunk;
pub mod error;
pub mod grid;
pub mod heightmap;
pub mod map;
pub mod noise_field;
pub mod normals;
pub mod quad_terrain;
pub mod rng;
pub mod terrain;
pub mod triangle;

pub use biome::*;
pub use chunk::{BandShape, Chunk, ChunkBand, ChunkGenerator, ChunkParams};
pub use error::TerrainError;
pub use grid::{build_indices, line_indices, GridDims};
pub use heightmap::HeightMap;
pub use map::MapMesh;
pub use noise_field::{fbm, NoiseField, NoiseLayer};
pub use normals::compute_normals;
pub use quad_terrain::{QuadTerrain, QuadTerrainConfig};
pub use rng::SeededRandom;
pub use terrain::*;
pub use triangle::{Quad, QuadDiagonal, Triangle};
