//! Small walkable terrain built from independent squares.
//!
//! Each square owns four vertices, a flat colour tinted by its mean height,
//! and two collision triangles split along the main diagonal. Heights come
//! from a seeded random field with box smoothing or from an image.

use engine_core::{HeightSampler, IndexBuffer, Renderable, ShaderHint, VertexStreams};
use glam::Vec3;
use image::DynamicImage;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::TerrainError;
use crate::grid::GridDims;
use crate::triangle::{QuadDiagonal, Triangle};

/// Average height that maps to the brightest tint.
const TINT_FULL_HEIGHT: f64 = 3.0;

/// Parameters for a randomly generated quad terrain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadTerrainConfig {
    pub width: f64,
    pub depth: f64,
    /// Square edge length in meters.
    pub resolution: f64,
    pub seed: u64,
    /// Raw heights are drawn from `[0, max_height)` before smoothing.
    pub max_height: f64,
    pub smoothing_passes: u32,
}

impl Default for QuadTerrainConfig {
    fn default() -> Self {
        Self {
            width: 50.0,
            depth: 20.0,
            resolution: 1.0,
            seed: 42,
            max_height: 3.0,
            smoothing_passes: 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QuadTerrain {
    width: f64,
    depth: f64,
    resolution: f64,
    /// Per-vertex heights, row-major.
    heights: Vec<f64>,
    dims: GridDims,
    positions: Vec<f32>,
    colors: Vec<f32>,
    uvs: Vec<f32>,
    indices: IndexBuffer,
    /// Two per square, first triangle first.
    triangles: Vec<Triangle>,
}

impl QuadTerrain {
    /// Random heights in `[0, max_height)` followed by box smoothing.
    pub fn random(config: &QuadTerrainConfig) -> Result<Self, TerrainError> {
        let dims = GridDims::from_extent(config.width, config.depth, config.resolution)?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut heights: Vec<f64> = (0..dims.vertex_count())
            .map(|_| rng.gen::<f64>() * config.max_height)
            .collect();
        for _ in 0..config.smoothing_passes {
            heights = smooth(&heights, dims);
        }
        Ok(Self::build(config.width, config.depth, config.resolution, dims, heights))
    }

    /// Heights from an 8-bit channel of `image_width × image_height` pixels,
    /// `0..=255` mapped to `0..=height_scale`. The image is sampled with
    /// nearest-lower lookup across the whole terrain.
    pub fn from_luminance(
        width: f64,
        depth: f64,
        resolution: f64,
        image_width: usize,
        image_height: usize,
        pixels: &[u8],
        height_scale: f64,
    ) -> Result<Self, TerrainError> {
        let dims = GridDims::from_extent(width, depth, resolution)?;
        if image_width == 0 || image_height == 0 {
            return Err(TerrainError::EmptyHeightmap);
        }
        let expected = image_width * image_height;
        if pixels.len() != expected {
            return Err(TerrainError::HeightmapSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }

        let mut heights = Vec::with_capacity(dims.vertex_count());
        for z in 0..dims.vertices_z {
            let img_y = (z as f64 / (dims.vertices_z - 1) as f64 * (image_height - 1) as f64).floor() as usize;
            for x in 0..dims.vertices_x {
                let img_x = (x as f64 / (dims.vertices_x - 1) as f64 * (image_width - 1) as f64).floor() as usize;
                let value = pixels[img_y * image_width + img_x];
                heights.push(value as f64 / 255.0 * height_scale);
            }
        }
        Ok(Self::build(width, depth, resolution, dims, heights))
    }

    /// Heights from the red channel of a decoded image.
    pub fn from_image(
        width: f64,
        depth: f64,
        resolution: f64,
        image: &DynamicImage,
        height_scale: f64,
    ) -> Result<Self, TerrainError> {
        let rgba = image.to_rgba8();
        let red: Vec<u8> = rgba.pixels().map(|p| p.0[0]).collect();
        Self::from_luminance(
            width,
            depth,
            resolution,
            rgba.width() as usize,
            rgba.height() as usize,
            &red,
            height_scale,
        )
    }

    fn build(width: f64, depth: f64, resolution: f64, dims: GridDims, heights: Vec<f64>) -> Self {
        let squares = dims.quad_count();
        let mut positions = Vec::with_capacity(squares * 12);
        let mut colors = Vec::with_capacity(squares * 12);
        let mut uvs = Vec::with_capacity(squares * 8);
        let mut indices = Vec::with_capacity(squares * 6);
        let mut triangles = Vec::with_capacity(squares * 2);

        let offset_x = -width / 2.0;
        let offset_z = -depth / 2.0;

        for z in 0..dims.vertices_z - 1 {
            for x in 0..dims.vertices_x - 1 {
                let x0 = offset_x + x as f64 * resolution;
                let z0 = offset_z + z as f64 * resolution;
                let x1 = x0 + resolution;
                let z1 = z0 + resolution;

                let [tl, tr, bl, br] = dims.quad_corners(x, z);
                let (y0, y1, y2, y3) = (heights[tl], heights[tr], heights[br], heights[bl]);

                // v0 -- v1
                // |  \  |
                // v3 -- v2
                let v0 = Vec3::new(x0 as f32, y0 as f32, z0 as f32);
                let v1 = Vec3::new(x1 as f32, y1 as f32, z0 as f32);
                let v2 = Vec3::new(x1 as f32, y2 as f32, z1 as f32);
                let v3 = Vec3::new(x0 as f32, y3 as f32, z1 as f32);

                let base = (positions.len() / 3) as u32;
                for v in [v0, v1, v2, v3] {
                    positions.extend_from_slice(&v.to_array());
                }

                let u0 = ((x0 - offset_x) / width) as f32;
                let u1 = ((x1 - offset_x) / width) as f32;
                let w0 = ((z0 - offset_z) / depth) as f32;
                let w1 = ((z1 - offset_z) / depth) as f32;
                uvs.extend_from_slice(&[u0, w0, u1, w0, u1, w1, u0, w1]);

                let tint = height_tint((y0 + y1 + y2 + y3) / 4.0);
                for _ in 0..4 {
                    colors.extend_from_slice(&tint);
                }

                indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);

                triangles.push(Triangle::new(v0, v1, v2));
                triangles.push(Triangle::new(v0, v2, v3));
            }
        }

        let vertex_count = positions.len() / 3;
        Self {
            width,
            depth,
            resolution,
            heights,
            dims,
            positions,
            colors,
            uvs,
            indices: IndexBuffer::from_u32(indices, vertex_count),
            triangles,
        }
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn squares_x(&self) -> usize {
        self.dims.vertices_x - 1
    }

    pub fn squares_z(&self) -> usize {
        self.dims.vertices_z - 1
    }

    /// Grid height at vertex `(x, z)`, `0.0` outside the grid.
    pub fn vertex_height(&self, x: usize, z: usize) -> f64 {
        if x < self.dims.vertices_x && z < self.dims.vertices_z {
            self.heights[self.dims.index(x, z)]
        } else {
            0.0
        }
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn uvs(&self) -> &[f32] {
        &self.uvs
    }

    /// Triangle-exact ground height; `0.0` outside the terrain.
    pub fn height_at(&self, world_x: f32, world_z: f32) -> f32 {
        let local_x = world_x as f64 + self.width / 2.0;
        let local_z = world_z as f64 + self.depth / 2.0;
        let grid_x = (local_x / self.resolution).floor();
        let grid_z = (local_z / self.resolution).floor();

        if !(grid_x >= 0.0
            && grid_z >= 0.0
            && grid_x < self.squares_x() as f64
            && grid_z < self.squares_z() as f64)
        {
            return 0.0;
        }

        let fx = (local_x / self.resolution - grid_x) as f32;
        let fz = (local_z / self.resolution - grid_z) as f32;
        let square = grid_z as usize * self.squares_x() + grid_x as usize;
        let half = if QuadDiagonal::Main.in_first(fx, fz) { 0 } else { 1 };
        self.triangles[square * 2 + half].height_at(world_x, world_z)
    }
}

/// Each vertex becomes the mean of itself and its in-grid 4-neighbours.
fn smooth(heights: &[f64], dims: GridDims) -> Vec<f64> {
    let (vx, vz) = (dims.vertices_x, dims.vertices_z);
    let mut out = Vec::with_capacity(heights.len());
    for z in 0..vz {
        for x in 0..vx {
            let mut sum = heights[dims.index(x, z)];
            let mut count = 1.0;
            if x > 0 {
                sum += heights[dims.index(x - 1, z)];
                count += 1.0;
            }
            if x < vx - 1 {
                sum += heights[dims.index(x + 1, z)];
                count += 1.0;
            }
            if z > 0 {
                sum += heights[dims.index(x, z - 1)];
                count += 1.0;
            }
            if z < vz - 1 {
                sum += heights[dims.index(x, z + 1)];
                count += 1.0;
            }
            out.push(sum / count);
        }
    }
    out
}

/// Green, lighter on higher ground.
fn height_tint(avg_height: f64) -> [f32; 3] {
    let f = (avg_height / TINT_FULL_HEIGHT).min(1.0);
    [
        (0.2 + f * 0.3) as f32,
        (0.5 + f * 0.3) as f32,
        (0.2 + f * 0.2) as f32,
    ]
}

impl HeightSampler for QuadTerrain {
    fn height_at(&self, world_x: f32, world_z: f32) -> f32 {
        QuadTerrain::height_at(self, world_x, world_z)
    }
}

impl Renderable for QuadTerrain {
    fn vertex_streams(&self) -> VertexStreams<'_> {
        VertexStreams {
            positions: &self.positions,
            colors: &self.colors,
            normals: None,
            uvs: Some(&self.uvs),
        }
    }

    fn index_buffer(&self) -> &IndexBuffer {
        &self.indices
    }

    fn shader_hint(&self) -> ShaderHint {
        ShaderHint::FlatColor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::IndexFormat;

    fn flat(height: u8, width: f64, depth: f64) -> QuadTerrain {
        QuadTerrain::from_luminance(width, depth, 1.0, 1, 1, &[height], 255.0).unwrap()
    }

    #[test]
    fn default_layout_counts() {
        let t = QuadTerrain::random(&QuadTerrainConfig::default()).unwrap();
        assert_eq!((t.squares_x(), t.squares_z()), (50, 20));
        assert_eq!(t.vertex_count(), 4000);
        assert_eq!(t.index_count(), 6000);
        assert_eq!(t.triangles().len(), 2000);
        assert_eq!(t.uvs().len(), 8000);
        assert_eq!(t.index_buffer().format(), IndexFormat::Uint16);
        assert_eq!(t.index_buffer().to_u32_vec()[..12], [0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7]);
    }

    #[test]
    fn random_heights_are_seeded_and_bounded() {
        let config = QuadTerrainConfig { seed: 7, ..Default::default() };
        let a = QuadTerrain::random(&config).unwrap();
        let b = QuadTerrain::random(&config).unwrap();
        assert_eq!(a.heights, b.heights);
        assert!(a.heights.iter().all(|&h| (0.0..3.0).contains(&h)));

        let c = QuadTerrain::random(&QuadTerrainConfig { seed: 8, ..config }).unwrap();
        assert_ne!(a.heights, c.heights);
    }

    #[test]
    fn smoothing_averages_neighbours() {
        let dims = GridDims { vertices_x: 3, vertices_z: 3 };
        let mut spike = vec![0.0; 9];
        spike[4] = 5.0;
        let out = smooth(&spike, dims);
        assert!((out[4] - 1.0).abs() < 1e-12);
        // Edge midpoint: itself + 3 neighbours, one of which is the spike.
        assert!((out[1] - 1.25).abs() < 1e-12);
        // Corner: itself + 2 neighbours, no spike.
        assert_eq!(out[0], 0.0);
    }

    #[test]
    fn tint_follows_average_height() {
        assert_eq!(height_tint(0.0), [0.2, 0.5, 0.2]);
        let top = height_tint(10.0);
        assert!((top[0] - 0.5).abs() < 1e-6 && (top[1] - 0.8).abs() < 1e-6 && (top[2] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn uvs_span_the_whole_terrain() {
        let t = flat(0, 4.0, 2.0);
        let uvs = t.uvs();
        assert_eq!(&uvs[..8], &[0.0, 0.0, 0.25, 0.0, 0.25, 0.5, 0.0, 0.5]);
        assert_eq!(&uvs[uvs.len() - 4..uvs.len() - 2], &[1.0, 1.0]);
    }

    #[test]
    fn flat_terrain_height_queries() {
        let t = flat(51, 10.0, 10.0);
        assert!((t.height_at(0.3, -2.7) - 51.0).abs() < 1e-4);
        assert_eq!(t.height_at(5.0, 0.0), 0.0);
        assert_eq!(t.height_at(-5.01, 0.0), 0.0);
        assert!((t.height_at(-5.0, -5.0) - 51.0).abs() < 1e-4);
    }

    #[test]
    fn query_uses_main_diagonal() {
        // 2x2 image with one bright corner at image (0, 1): bottom-left vertex.
        let t = QuadTerrain::from_luminance(1.0, 1.0, 1.0, 2, 2, &[0, 0, 255, 0], 10.0).unwrap();
        assert_eq!(t.vertex_height(0, 1), 10.0);
        // Above the main diagonal (fx < fz): triangle v0, v2, v3.
        assert!((t.height_at(-0.3, 0.2) - 5.0).abs() < 1e-4);
        // Below it: flat triangle v0, v1, v2.
        assert!(t.height_at(0.3, -0.2).abs() < 1e-4);
        // Exact at the raised vertex's neighbours on the diagonal.
        assert!(t.height_at(0.0, 0.0).abs() < 1e-4);
    }

    #[test]
    fn luminance_is_sampled_across_the_grid() {
        // 3 pixel ramp over 5 vertices: 0, 0, 1, 1, 2 by floor.
        let t = QuadTerrain::from_luminance(4.0, 1.0, 1.0, 3, 1, &[0, 51, 255], 5.0).unwrap();
        let expected = [0.0, 0.0, 1.0, 1.0, 5.0];
        for (x, e) in expected.iter().enumerate() {
            assert!((t.vertex_height(x, 0) - e).abs() < 1e-12, "vertex {x}");
        }
    }

    #[test]
    fn rejects_mismatched_images() {
        assert_eq!(
            QuadTerrain::from_luminance(4.0, 4.0, 1.0, 3, 3, &[0; 8], 1.0).unwrap_err(),
            TerrainError::HeightmapSizeMismatch { expected: 9, actual: 8 }
        );
        assert_eq!(
            QuadTerrain::from_luminance(4.0, 4.0, 1.0, 0, 3, &[], 1.0).unwrap_err(),
            TerrainError::EmptyHeightmap
        );
    }

    #[test]
    fn image_red_channel_drives_height() {
        let mut img = image::RgbaImage::new(2, 1);
        img.put_pixel(0, 0, image::Rgba([0, 200, 200, 255]));
        img.put_pixel(1, 0, image::Rgba([255, 0, 0, 255]));
        let t = QuadTerrain::from_image(1.0, 1.0, 1.0, &DynamicImage::ImageRgba8(img), 2.0).unwrap();
        assert_eq!(t.vertex_height(0, 0), 0.0);
        assert_eq!(t.vertex_height(1, 1), 2.0);
        assert_eq!(t.shader_hint(), ShaderHint::FlatColor);
    }
}
