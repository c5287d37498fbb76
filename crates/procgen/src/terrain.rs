//! Procedural heightfield synthesis.
//!
//! **Seed-based determinism:** every noise layer is built from `config.seed`
//! plus a fixed offset, and each vertex height is a pure function of the seed,
//! its position and the generation parameters. Rows are synthesised in
//! parallel without changing a single bit of output.
//!
//! Per vertex: a low-frequency biome signal picks a point on a seven-segment
//! height profile, a base noise textures each segment, two jitter layers make
//! the segment floors irregular, a detail layer adds surface grain, and a
//! border warp raises the map edges into walls.

use std::time::{Duration, Instant};

use engine_core::{HeightSampler, IndexBuffer, Renderable, ShaderHint, VertexStreams};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::biome::{Biome, BiomeTable};
use crate::error::TerrainError;
use crate::grid::{self, GridDims};
use crate::heightmap::HeightMap;
use crate::map::MapMesh;
use crate::noise_field::{NoiseField, NoiseLayer};
use crate::normals::compute_normals;

/// How a segment moves from its floor to its ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Easing {
    Linear,
    /// Cubic `t²(3 − 2t)`.
    Smoothstep,
}

impl Easing {
    #[inline]
    pub fn apply(self, t: f64) -> f64 {
        match self {
            Self::Linear => t,
            Self::Smoothstep => smoothstep(t),
        }
    }
}

#[inline]
fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

/// Which jitter layer offsets a segment's floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Jitter {
    Threshold,
    SnowThreshold,
}

/// One piece of the height profile, covering biome signal `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeightSegment {
    pub start: f64,
    pub end: f64,
    /// Height at `start` before jitter and noise, in meters.
    pub base: f64,
    /// Height gained across the segment.
    pub rise: f64,
    /// Scale of the base noise within this segment.
    pub noise_multiplier: f64,
    pub easing: Easing,
    pub jitter: Jitter,
}

impl HeightSegment {
    const fn new(
        start: f64,
        end: f64,
        base: f64,
        rise: f64,
        noise_multiplier: f64,
        easing: Easing,
        jitter: Jitter,
    ) -> Self {
        Self {
            start,
            end,
            base,
            rise,
            noise_multiplier,
            easing,
            jitter,
        }
    }

    #[inline]
    fn height(&self, t: f64, base_noise: f64, jitter: f64) -> f64 {
        let local_t = (t - self.start) / (self.end - self.start);
        (self.base + jitter) + self.easing.apply(local_t) * self.rise + base_noise * self.noise_multiplier
    }
}

/// Piecewise mapping from the normalised biome signal to meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeightProfile {
    segments: Vec<HeightSegment>,
}

impl Default for HeightProfile {
    /// Deep ocean → ocean → beach → plains → forest → hills → mountains → snow.
    fn default() -> Self {
        use Easing::*;
        use Jitter::*;
        Self {
            segments: vec![
                HeightSegment::new(0.0, 0.35, -50.0, 49.0, 5.0, Linear, Threshold),
                HeightSegment::new(0.35, 0.42, -1.0, 6.0, 2.0, Linear, Threshold),
                HeightSegment::new(0.42, 0.52, 5.0, 45.0, 8.0, Linear, Threshold),
                HeightSegment::new(0.52, 0.62, 50.0, 70.0, 15.0, Linear, Threshold),
                HeightSegment::new(0.62, 0.72, 120.0, 100.0, 25.0, Smoothstep, Threshold),
                HeightSegment::new(0.72, 0.85, 220.0, 130.0, 40.0, Smoothstep, Threshold),
                HeightSegment::new(0.85, 1.0, 350.0, 300.0, 60.0, Smoothstep, SnowThreshold),
            ],
        }
    }
}

impl HeightProfile {
    pub fn new(segments: Vec<HeightSegment>) -> Result<Self, TerrainError> {
        let profile = Self { segments };
        profile.validate()?;
        Ok(profile)
    }

    pub fn segments(&self) -> &[HeightSegment] {
        &self.segments
    }

    /// Segments must be non-empty, each with positive width, and contiguous.
    pub fn validate(&self) -> Result<(), TerrainError> {
        if self.segments.is_empty() {
            return Err(TerrainError::InvalidProfile("no segments".into()));
        }
        for (i, s) in self.segments.iter().enumerate() {
            if !(s.end > s.start) {
                return Err(TerrainError::InvalidProfile(format!(
                    "segment {i} has non-positive width ({} .. {})",
                    s.start, s.end
                )));
            }
        }
        for (i, w) in self.segments.windows(2).enumerate() {
            if w[0].end != w[1].start {
                return Err(TerrainError::InvalidProfile(format!(
                    "segment {} ends at {} but segment {} starts at {}",
                    i,
                    w[0].end,
                    i + 1,
                    w[1].start
                )));
            }
        }
        Ok(())
    }

    /// Segment for `t`: the first whose end lies above `t`, else the last.
    #[inline]
    pub fn segment_for(&self, t: f64) -> &HeightSegment {
        self.segments
            .iter()
            .find(|s| t < s.end)
            .unwrap_or_else(|| &self.segments[self.segments.len() - 1])
    }

    /// Height before detail and border warp.
    #[inline]
    pub fn height(&self, t: f64, base_noise: f64, threshold: f64, snow_threshold: f64) -> f64 {
        let segment = self.segment_for(t);
        let jitter = match segment.jitter {
            Jitter::Threshold => threshold,
            Jitter::SnowThreshold => snow_threshold,
        };
        segment.height(t, base_noise, jitter)
    }
}

/// Height boost toward the map edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BorderWarp {
    /// Fraction of the half-extent where the boost begins.
    pub start: f64,
    /// Boost at the very edge, in meters.
    pub max_height: f64,
}

impl Default for BorderWarp {
    fn default() -> Self {
        Self {
            start: 0.70,
            max_height: 300.0,
        }
    }
}

impl BorderWarp {
    /// Boost for normalised position `(nx, nz)` in `[-1, 1]²`.
    #[inline]
    pub fn boost(&self, nx: f64, nz: f64) -> f64 {
        let dist_to_border = nx.abs().max(nz.abs());
        let influence = ((dist_to_border - self.start) / (1.0 - self.start)).max(0.0);
        smoothstep(influence) * self.max_height
    }
}

/// Every tunable of the synthesizer. Defaults are the reference constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    /// Meters per noise-space unit.
    pub noise_scale: f64,
    /// Macro-region signal selecting the profile segment.
    pub biome_layer: NoiseLayer,
    /// Shared texture added within every segment.
    pub base_layer: NoiseLayer,
    /// Floor jitter for all but the top segment.
    pub threshold_layer: NoiseLayer,
    /// Floor jitter for the snow segment.
    pub snow_threshold_layer: NoiseLayer,
    /// Fine surface grain.
    pub detail_layer: NoiseLayer,
    pub profile: HeightProfile,
    pub border: BorderWarp,
    /// Keep every n-th vertex for the overview map.
    pub map_skip_factor: usize,
    pub biomes: BiomeTable,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            noise_scale: 100.0,
            biome_layer: NoiseLayer::new(1000, 0.3, 3, 1.0),
            base_layer: NoiseLayer::new(0, 0.5, 4, 1.0),
            threshold_layer: NoiseLayer::new(3000, 0.8, 2, 15.0),
            snow_threshold_layer: NoiseLayer::new(4000, 0.6, 3, 100.0),
            detail_layer: NoiseLayer::new(2000, 3.0, 3, 1.5),
            profile: HeightProfile::default(),
            border: BorderWarp::default(),
            map_skip_factor: 2,
            biomes: BiomeTable::large_scale(),
        }
    }
}

impl GenerationParams {
    pub fn validate(&self) -> Result<(), TerrainError> {
        self.profile.validate()?;
        if self.biomes.bands().is_empty() {
            return Err(TerrainError::EmptyBiomeTable);
        }
        if self.map_skip_factor == 0 {
            return Err(TerrainError::InvalidSkipFactor);
        }
        if !(self.noise_scale > 0.0) {
            return Err(TerrainError::InvalidProfile(format!(
                "noise scale must be positive, got {}",
                self.noise_scale
            )));
        }
        Ok(())
    }

    /// Lowest and highest heights the parameters can produce, assuming every
    /// fBm layer stays within `[-1, 1]`.
    pub fn envelope(&self) -> (f64, f64) {
        let threshold = self.threshold_layer.amplitude.abs();
        let snow = self.snow_threshold_layer.amplitude.abs();
        let detail = self.detail_layer.amplitude.abs();
        let mut low = f64::INFINITY;
        let mut high = f64::NEG_INFINITY;
        for s in self.profile.segments() {
            let jitter = match s.jitter {
                Jitter::Threshold => threshold,
                Jitter::SnowThreshold => snow,
            };
            let noise = s.noise_multiplier.abs();
            low = low.min(s.base + s.rise.min(0.0) - jitter - noise);
            high = high.max(s.base + s.rise.max(0.0) + jitter + noise);
        }
        (low - detail, high + detail + self.border.max_height.max(0.0))
    }
}

/// Construction-time description of one terrain instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub seed: i32,
    /// Extent along X in meters.
    pub size_x: f64,
    /// Extent along Z in meters.
    pub size_z: f64,
    /// Meters per vertex.
    pub resolution: f64,
    pub params: GenerationParams,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            size_x: 5000.0,
            size_z: 5000.0,
            resolution: 5.0,
            params: GenerationParams::default(),
        }
    }
}

/// The five noise fields of a terrain seed, ready to evaluate heights.
#[derive(Debug, Clone)]
pub struct TerrainGenerator {
    seed: i32,
    params: GenerationParams,
    height_noise: NoiseField,
    biome_noise: NoiseField,
    detail_noise: NoiseField,
    threshold_noise: NoiseField,
    snow_threshold_noise: NoiseField,
}

impl TerrainGenerator {
    pub fn new(seed: i32, params: GenerationParams) -> Result<Self, TerrainError> {
        params.validate()?;
        Ok(Self::from_valid(seed, params))
    }

    /// Generator with the reference parameters.
    pub fn with_seed(seed: i32) -> Self {
        let params = GenerationParams::default();
        debug_assert!(params.validate().is_ok());
        Self::from_valid(seed, params)
    }

    /// `params` must already have passed `validate`.
    fn from_valid(seed: i32, params: GenerationParams) -> Self {
        let s = seed as i64;
        Self {
            seed,
            height_noise: params.base_layer.field(s),
            biome_noise: params.biome_layer.field(s),
            detail_noise: params.detail_layer.field(s),
            threshold_noise: params.threshold_layer.field(s),
            snow_threshold_noise: params.snow_threshold_layer.field(s),
            params,
        }
    }

    pub fn seed(&self) -> i32 {
        self.seed
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// Normalised biome signal `t` in `[0, 1]` at a noise-space position.
    #[inline]
    pub fn biome_signal(&self, noise_x: f64, noise_z: f64) -> f64 {
        let value = self.params.biome_layer.eval(&self.biome_noise, noise_x, noise_z);
        (value + 1.0) / 2.0
    }

    /// Height at `(dx, dz)` meters from the centre of a map whose half-extents
    /// are `half_x, half_z`.
    pub fn height_at_offset(&self, dx: f64, dz: f64, half_x: f64, half_z: f64) -> f64 {
        let p = &self.params;
        let noise_x = dx / p.noise_scale;
        let noise_z = dz / p.noise_scale;

        let t = self.biome_signal(noise_x, noise_z);
        let base_noise = p.base_layer.eval(&self.height_noise, noise_x, noise_z);
        let threshold = p.threshold_layer.eval(&self.threshold_noise, noise_x, noise_z);
        let snow_threshold = p.snow_threshold_layer.eval(&self.snow_threshold_noise, noise_x, noise_z);

        let mut height = p.profile.height(t, base_noise, threshold, snow_threshold);
        height += p.detail_layer.eval(&self.detail_noise, noise_x, noise_z);
        height += p.border.boost(dx / half_x, dz / half_z);
        height
    }

    /// Synthesise a full terrain of `size_x × size_z` meters at `resolution`
    /// meters per vertex.
    pub fn generate(&self, size_x: f64, size_z: f64, resolution: f64) -> Result<TerrainData, TerrainError> {
        let started = Instant::now();
        let dims = GridDims::from_extent(size_x, size_z, resolution)?;
        let vertex_count = dims.vertex_count();

        log::info!(
            "Generating {}x{} m terrain at {} m/vertex (seed {})",
            size_x,
            size_z,
            resolution,
            self.seed
        );
        log::info!(
            "Vertices: {}x{} = {}",
            dims.vertices_x,
            dims.vertices_z,
            vertex_count
        );

        let half_x = size_x / 2.0;
        let half_z = size_z / 2.0;

        let mut heights = vec![0.0f64; vertex_count];
        heights
            .par_chunks_mut(dims.vertices_x)
            .enumerate()
            .for_each(|(z, row)| {
                let dz = z as f64 * resolution - half_z;
                for (x, h) in row.iter_mut().enumerate() {
                    let dx = x as f64 * resolution - half_x;
                    *h = self.height_at_offset(dx, dz, half_x, half_z);
                }
            });

        let mut height_values = Vec::with_capacity(vertex_count);
        let mut color_map = Vec::with_capacity(vertex_count * 3);
        let mut vertices = Vec::with_capacity(vertex_count * 3);
        for z in 0..dims.vertices_z {
            let vz = z as f64 * resolution - half_z;
            for x in 0..dims.vertices_x {
                let height = heights[dims.index(x, z)];
                height_values.push(height as f32);
                color_map.extend_from_slice(&self.params.biomes.classify(height).color);
                let vx = x as f64 * resolution - half_x;
                vertices.extend_from_slice(&[vx as f32, height as f32, vz as f32]);
            }
        }
        drop(heights);

        let normals = compute_normals(&vertices, dims);
        let indices = grid::build_indices(dims);
        let num_triangles = dims.triangle_count();

        let height_map = HeightMap::new(height_values, dims, size_x, size_z, resolution);
        let map = MapMesh::decimate(
            &vertices,
            &color_map,
            &normals,
            dims,
            self.params.map_skip_factor,
            num_triangles,
        )?;

        let generation_time = started.elapsed();
        log::info!(
            "Terrain generated: {} triangles in {:.2} ms",
            num_triangles,
            generation_time.as_secs_f64() * 1000.0
        );

        Ok(TerrainData {
            height_map,
            color_map,
            vertices,
            normals,
            indices,
            dims,
            num_triangles,
            metadata: TerrainMetadata {
                seed: self.seed,
                size_x,
                size_z,
                resolution,
                generation_time,
            },
            map,
        })
    }

    /// Heights for the `nx × nz` block of grid vertices starting at `(x0, z0)`
    /// of the map that [`generate`](Self::generate) would build for the same
    /// extents. Values are identical to the whole-map heights.
    pub fn generate_region(
        &self,
        size_x: f64,
        size_z: f64,
        resolution: f64,
        x0: usize,
        z0: usize,
        nx: usize,
        nz: usize,
    ) -> Result<HeightRegion, TerrainError> {
        let dims = GridDims::from_extent(size_x, size_z, resolution)?;
        if nx == 0 || nz == 0 || x0 + nx > dims.vertices_x || z0 + nz > dims.vertices_z {
            return Err(TerrainError::RegionOutOfBounds {
                x0,
                z0,
                nx,
                nz,
                vertices_x: dims.vertices_x,
                vertices_z: dims.vertices_z,
            });
        }

        let half_x = size_x / 2.0;
        let half_z = size_z / 2.0;
        let mut heights = vec![0.0f32; nx * nz];
        heights.par_chunks_mut(nx).enumerate().for_each(|(rz, row)| {
            let dz = (z0 + rz) as f64 * resolution - half_z;
            for (rx, h) in row.iter_mut().enumerate() {
                let dx = (x0 + rx) as f64 * resolution - half_x;
                *h = self.height_at_offset(dx, dz, half_x, half_z) as f32;
            }
        });

        log::debug!("Generated region {},{} +{}x{}", x0, z0, nx, nz);
        Ok(HeightRegion { x0, z0, nx, nz, heights })
    }
}

/// Heights of a rectangular block of the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightRegion {
    pub x0: usize,
    pub z0: usize,
    pub nx: usize,
    pub nz: usize,
    /// Row-major, `nx` per row.
    pub heights: Vec<f32>,
}

impl HeightRegion {
    /// Height at grid vertex `(x, z)` of the full map, if inside this region.
    pub fn get(&self, x: usize, z: usize) -> Option<f32> {
        if x < self.x0 || z < self.z0 || x >= self.x0 + self.nx || z >= self.z0 + self.nz {
            return None;
        }
        Some(self.heights[(z - self.z0) * self.nx + (x - self.x0)])
    }
}

/// What a terrain was generated from, and how long it took.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainMetadata {
    pub seed: i32,
    pub size_x: f64,
    pub size_z: f64,
    pub resolution: f64,
    pub generation_time: Duration,
}

/// Generated terrain. Immutable; regenerate to change it.
#[derive(Debug, Clone)]
pub struct TerrainData {
    pub height_map: HeightMap,
    /// RGB per vertex.
    pub color_map: Vec<f32>,
    /// World-space XYZ per vertex, centred on the origin.
    pub vertices: Vec<f32>,
    /// Unit normal per vertex.
    pub normals: Vec<f32>,
    pub indices: IndexBuffer,
    pub dims: GridDims,
    pub num_triangles: usize,
    pub metadata: TerrainMetadata,
    /// Decimated copy for the overview map.
    pub map: MapMesh,
}

impl TerrainData {
    /// Generate terrain from configuration.
    pub fn generate(config: &TerrainConfig) -> Result<Self, TerrainError> {
        TerrainGenerator::new(config.seed, config.params.clone())?.generate(
            config.size_x,
            config.size_z,
            config.resolution,
        )
    }

    pub fn vertices_x(&self) -> usize {
        self.dims.vertices_x
    }

    pub fn vertices_z(&self) -> usize {
        self.dims.vertices_z
    }

    /// Bilinear ground height; `0.0` outside the terrain.
    pub fn height_at(&self, world_x: f32, world_z: f32) -> f32 {
        self.height_map.height_at(world_x, world_z)
    }

    /// Height on the rendered triangle under a world position.
    pub fn height_at_exact(&self, world_x: f32, world_z: f32) -> f32 {
        self.height_map.height_at_exact(world_x, world_z)
    }

    /// Biome under a world position by interpolated height.
    pub fn biome_at<'a>(&self, biomes: &'a BiomeTable, world_x: f32, world_z: f32) -> &'a Biome {
        biomes.classify(self.height_map.height_at_f64(world_x as f64, world_z as f64))
    }

    /// Line list for the wireframe overlay.
    pub fn wireframe_indices(&self) -> Vec<u32> {
        grid::line_indices(&self.indices)
    }
}

impl HeightSampler for TerrainData {
    fn height_at(&self, world_x: f32, world_z: f32) -> f32 {
        self.height_map.height_at(world_x, world_z)
    }
}

impl Renderable for TerrainData {
    fn vertex_streams(&self) -> VertexStreams<'_> {
        VertexStreams {
            positions: &self.vertices,
            colors: &self.color_map,
            normals: Some(&self.normals),
            uvs: None,
        }
    }

    fn index_buffer(&self) -> &IndexBuffer {
        &self.indices
    }

    fn shader_hint(&self) -> ShaderHint {
        ShaderHint::LitTerrain
    }
}
