//! Chunked terrain: square tiles of heights sampled in absolute world
//! coordinates, so neighbouring chunks meet without seams.
//!
//! Unlike the map synthesizer, the biome signal picks a height *shape* (octave
//! count plus a linear or power curve) and the small-scale biome table then
//! classifies the resulting heights.

use serde::{Deserialize, Serialize};

use crate::biome::{BiomeKind, BiomeTable};
use crate::error::TerrainError;
use crate::noise_field::{fbm, NoiseField, NoiseLayer};

/// How a band turns base fBm `v` into meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BandShape {
    /// `v · scale + offset`.
    Linear { scale: f64, offset: f64 },
    /// `|v|^exponent · scale + offset`; ridged, never below `offset`.
    Power { exponent: f64, scale: f64, offset: f64 },
}

impl BandShape {
    #[inline]
    pub fn apply(self, v: f64) -> f64 {
        match self {
            Self::Linear { scale, offset } => v * scale + offset,
            Self::Power { exponent, scale, offset } => v.abs().powf(exponent) * scale + offset,
        }
    }
}

/// One interval of the raw biome value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChunkBand {
    /// Exclusive upper bound on the biome value. The last band also takes
    /// everything above its bound.
    pub until: f64,
    /// Octaves of base noise.
    pub octaves: u32,
    pub shape: BandShape,
}

impl ChunkBand {
    pub const fn linear(until: f64, octaves: u32, scale: f64, offset: f64) -> Self {
        Self {
            until,
            octaves,
            shape: BandShape::Linear { scale, offset },
        }
    }

    pub const fn power(until: f64, octaves: u32, exponent: f64, scale: f64, offset: f64) -> Self {
        Self {
            until,
            octaves,
            shape: BandShape::Power { exponent, scale, offset },
        }
    }
}

fn default_bands() -> Vec<ChunkBand> {
    vec![
        ChunkBand::linear(-0.4, 2, 20.0, -35.0),
        ChunkBand::linear(-0.2, 2, 10.0, -12.0),
        ChunkBand::linear(-0.05, 2, 5.0, -2.0),
        ChunkBand::linear(0.2, 3, 12.0, 5.0),
        ChunkBand::linear(0.4, 4, 25.0, 20.0),
        ChunkBand::power(0.6, 5, 1.5, 70.0, 30.0),
        ChunkBand::power(f64::INFINITY, 6, 1.2, 100.0, 50.0),
    ]
}

/// Tunables of the chunk generator. Defaults are the reference constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkParams {
    /// Samples per chunk edge; one sample per meter.
    pub chunk_size: usize,
    /// Meters per noise unit.
    pub noise_scale: f64,
    pub base_seed_offset: i64,
    pub biome_layer: NoiseLayer,
    pub detail_layer: NoiseLayer,
    /// Ascending by `until`.
    pub bands: Vec<ChunkBand>,
    pub biomes: BiomeTable,
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self {
            chunk_size: 32,
            noise_scale: 100.0,
            base_seed_offset: 0,
            biome_layer: NoiseLayer::new(1000, 0.3, 3, 1.0),
            detail_layer: NoiseLayer::new(2000, 4.0, 2, 3.0),
            bands: default_bands(),
            biomes: BiomeTable::small_scale(),
        }
    }
}

impl ChunkParams {
    pub fn validate(&self) -> Result<(), TerrainError> {
        if self.chunk_size == 0 {
            return Err(TerrainError::DegenerateGrid {
                vertices_x: 0,
                vertices_z: 0,
            });
        }
        if !(self.noise_scale > 0.0 && self.noise_scale.is_finite()) {
            return Err(TerrainError::InvalidProfile(format!(
                "chunk noise scale must be positive, got {}",
                self.noise_scale
            )));
        }
        if self.bands.is_empty() {
            return Err(TerrainError::InvalidProfile("chunk generator has no bands".into()));
        }
        if self.bands.windows(2).any(|w| !(w[0].until < w[1].until)) {
            return Err(TerrainError::InvalidProfile(
                "chunk band bounds must be strictly ascending".into(),
            ));
        }
        if self.biomes.bands().is_empty() {
            return Err(TerrainError::EmptyBiomeTable);
        }
        Ok(())
    }

    /// Band for a raw biome value.
    pub fn band_for(&self, biome_value: f64) -> &ChunkBand {
        let last = self.bands.len() - 1;
        self.bands
            .iter()
            .find(|b| biome_value < b.until)
            .unwrap_or(&self.bands[last])
    }
}

/// One generated chunk. Samples are row-major, Z outer, X inner.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub chunk_x: i32,
    pub chunk_z: i32,
    pub size: usize,
    pub heights: Vec<f64>,
    pub biomes: Vec<BiomeKind>,
}

impl Chunk {
    /// World position of sample `(0, 0)`.
    pub fn origin(&self) -> (i64, i64) {
        (
            self.chunk_x as i64 * self.size as i64,
            self.chunk_z as i64 * self.size as i64,
        )
    }

    pub fn height(&self, x: usize, z: usize) -> Option<f64> {
        (x < self.size && z < self.size).then(|| self.heights[z * self.size + x])
    }

    pub fn biome(&self, x: usize, z: usize) -> Option<BiomeKind> {
        (x < self.size && z < self.size).then(|| self.biomes[z * self.size + x])
    }
}

/// Seeded chunk generator. Every chunk is a pure function of the seed,
/// the parameters and the chunk coordinates.
#[derive(Debug, Clone)]
pub struct ChunkGenerator {
    seed: i32,
    params: ChunkParams,
    height_noise: NoiseField,
    biome_noise: NoiseField,
    detail_noise: NoiseField,
}

impl ChunkGenerator {
    pub fn new(seed: i32, params: ChunkParams) -> Result<Self, TerrainError> {
        params.validate()?;
        let s = seed as i64;
        Ok(Self {
            seed,
            height_noise: NoiseField::new(s + params.base_seed_offset),
            biome_noise: params.biome_layer.field(s),
            detail_noise: params.detail_layer.field(s),
            params,
        })
    }

    pub fn seed(&self) -> i32 {
        self.seed
    }

    pub fn params(&self) -> &ChunkParams {
        &self.params
    }

    /// Raw biome value (roughly `[-1, 1]`) at integer world coordinates.
    pub fn biome_value(&self, world_x: i64, world_z: i64) -> f64 {
        let p = &self.params;
        let nx = world_x as f64 / p.noise_scale;
        let nz = world_z as f64 / p.noise_scale;
        p.biome_layer.eval(&self.biome_noise, nx, nz)
    }

    /// Height at integer world coordinates.
    pub fn height_at(&self, world_x: i64, world_z: i64) -> f64 {
        let p = &self.params;
        let nx = world_x as f64 / p.noise_scale;
        let nz = world_z as f64 / p.noise_scale;

        let band = p.band_for(p.biome_layer.eval(&self.biome_noise, nx, nz));
        let base = fbm(&self.height_noise, nx, nz, band.octaves, 0.5);
        band.shape.apply(base) + p.detail_layer.eval(&self.detail_noise, nx, nz)
    }

    /// Heights and biome kinds for chunk `(chunk_x, chunk_z)`.
    pub fn generate_chunk(&self, chunk_x: i32, chunk_z: i32) -> Chunk {
        let size = self.params.chunk_size;
        let x0 = chunk_x as i64 * size as i64;
        let z0 = chunk_z as i64 * size as i64;

        let mut heights = Vec::with_capacity(size * size);
        let mut biomes = Vec::with_capacity(size * size);
        for z in 0..size as i64 {
            for x in 0..size as i64 {
                let h = self.height_at(x0 + x, z0 + z);
                heights.push(h);
                biomes.push(self.params.biomes.classify(h).kind);
            }
        }
        log::debug!("Chunk ({}, {}): {} samples", chunk_x, chunk_z, heights.len());

        Chunk {
            chunk_x,
            chunk_z,
            size,
            heights,
            biomes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> ChunkGenerator {
        ChunkGenerator::new(12345, ChunkParams::default()).unwrap()
    }

    #[test]
    fn origin_chunk_matches_reference() {
        let chunk = generator().generate_chunk(0, 0);
        assert_eq!(chunk.heights.len(), 32 * 32);
        assert_eq!(chunk.origin(), (0, 0));
        // Every noise field is zero on the lattice origin.
        assert_eq!(chunk.heights[0], 5.0);
        let expected = [
            (1, 5.2043482482285714, BiomeKind::Plains),
            (31, -1.9565674240159998, BiomeKind::Beach),
            (32, 5.158271057129142, BiomeKind::Plains),
            (500, -1.5577783131400003, BiomeKind::Beach),
            (1023, -3.859613745223609, BiomeKind::Beach),
        ];
        for (i, h, kind) in expected {
            assert!((chunk.heights[i] - h).abs() < 1e-9, "height[{i}] = {}", chunk.heights[i]);
            assert_eq!(chunk.biomes[i], kind, "biome[{i}]");
        }
    }

    #[test]
    fn negative_chunk_matches_reference() {
        let chunk = generator().generate_chunk(-3, 5);
        assert_eq!(chunk.origin(), (-96, 160));
        assert!((chunk.heights[1] - 3.9003680596114267).abs() < 1e-9);
        assert!((chunk.heights[31] - -0.47950540576000134).abs() < 1e-9);
        assert_eq!(chunk.biome(31, 0), Some(BiomeKind::Beach));
        assert_eq!(chunk.biome(0, 0), Some(BiomeKind::Plains));
    }

    #[test]
    fn ridged_and_deep_bands_match_reference() {
        let g = generator();
        // Biome value just above 0.4: the 5-octave power curve.
        let ridge = g.generate_chunk(-35, -38);
        assert!((ridge.heights[220] - 31.598108850761566).abs() < 1e-9);
        assert_eq!(ridge.biomes[220], BiomeKind::Forest);
        assert!(g.biome_value(-35 * 32 + 28, -38 * 32 + 6) >= 0.4);

        // Biome value just below -0.4: deep ocean.
        let deep = g.generate_chunk(-40, -27);
        assert!((deep.heights[620] - -33.58457218303535).abs() < 1e-9);
        assert_eq!(deep.biomes[620], BiomeKind::DeepOcean);
    }

    #[test]
    fn neighbouring_chunks_share_world_samples() {
        let g = generator();
        let a = g.generate_chunk(2, -1);
        let b = g.generate_chunk(3, -1);
        for z in 0..32 {
            // Column 31 of `a` and column 0 of `b` are one meter apart.
            assert_eq!(a.height(31, z), Some(g.height_at(95, -32 + z as i64)));
            assert_eq!(b.height(0, z), Some(g.height_at(96, -32 + z as i64)));
        }
        assert_eq!(a.height(32, 0), None);
    }

    #[test]
    fn deterministic_per_seed() {
        let a = generator().generate_chunk(4, 4);
        let b = generator().generate_chunk(4, 4);
        assert_eq!(a, b);
        let other = ChunkGenerator::new(54321, ChunkParams::default()).unwrap();
        assert_ne!(other.generate_chunk(4, 4).heights, a.heights);
    }

    #[test]
    fn band_selection_and_shapes() {
        let p = ChunkParams::default();
        assert_eq!(p.band_for(-0.9).octaves, 2);
        assert_eq!(p.band_for(-0.4).shape, BandShape::Linear { scale: 10.0, offset: -12.0 });
        assert_eq!(p.band_for(0.19).octaves, 3);
        assert_eq!(p.band_for(0.6).octaves, 6);
        assert_eq!(p.band_for(5.0).octaves, 6);

        let high = p.band_for(0.7).shape;
        assert!((high.apply(-0.5) - (0.5f64.powf(1.2) * 100.0 + 50.0)).abs() < 1e-12);
        assert_eq!(high.apply(0.0), 50.0);
    }

    #[test]
    fn rejects_bad_params() {
        let bad = |f: fn(&mut ChunkParams)| {
            let mut p = ChunkParams::default();
            f(&mut p);
            ChunkGenerator::new(1, p).is_err()
        };
        assert!(bad(|p| p.chunk_size = 0));
        assert!(bad(|p| p.noise_scale = 0.0));
        assert!(bad(|p| p.bands.clear()));
        assert!(bad(|p| p.bands.swap(0, 1)));
        assert!(!bad(|p| p.chunk_size = 8));
    }
}
