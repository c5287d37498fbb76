//! Dense heightfield with bilinear world-space queries.

use engine_core::HeightSampler;
use glam::Vec3;

use crate::grid::GridDims;
use crate::triangle::{Quad, QuadDiagonal};

/// Row-major grid of heights (Z outer, X inner) centred on the world origin.
///
/// Vertex `(x, z)` sits at world `(x·resolution − size_x/2, z·resolution − size_z/2)`.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightMap {
    values: Vec<f32>,
    dims: GridDims,
    size_x: f64,
    size_z: f64,
    resolution: f64,
}

impl HeightMap {
    pub(crate) fn new(values: Vec<f32>, dims: GridDims, size_x: f64, size_z: f64, resolution: f64) -> Self {
        debug_assert_eq!(values.len(), dims.vertex_count());
        Self {
            values,
            dims,
            size_x,
            size_z,
            resolution,
        }
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Stored height at grid vertex `(x, z)`.
    pub fn get(&self, x: usize, z: usize) -> Option<f32> {
        if x < self.dims.vertices_x && z < self.dims.vertices_z {
            Some(self.values[self.dims.index(x, z)])
        } else {
            None
        }
    }

    /// World position of grid vertex `(x, z)` on the XZ plane.
    pub fn vertex_world(&self, x: usize, z: usize) -> (f64, f64) {
        (
            x as f64 * self.resolution - self.size_x / 2.0,
            z as f64 * self.resolution - self.size_z / 2.0,
        )
    }

    /// Bilinearly interpolated height, or `0.0` outside the grid.
    ///
    /// The far row and column are inclusive, so every grid vertex (edges
    /// included) returns exactly its stored height.
    pub fn height_at_f64(&self, world_x: f64, world_z: f64) -> f64 {
        let grid_x = (world_x + self.size_x / 2.0) / self.resolution;
        let grid_z = (world_z + self.size_z / 2.0) / self.resolution;

        let max_x = (self.dims.vertices_x - 1) as f64;
        let max_z = (self.dims.vertices_z - 1) as f64;
        if !(grid_x >= 0.0 && grid_x <= max_x && grid_z >= 0.0 && grid_z <= max_z) {
            return 0.0;
        }

        let x0 = (grid_x.floor() as usize).min(self.dims.vertices_x - 2);
        let z0 = (grid_z.floor() as usize).min(self.dims.vertices_z - 2);
        let fx = grid_x - x0 as f64;
        let fz = grid_z - z0 as f64;

        let vx = self.dims.vertices_x;
        let h00 = self.values[z0 * vx + x0] as f64;
        let h10 = self.values[z0 * vx + x0 + 1] as f64;
        let h01 = self.values[(z0 + 1) * vx + x0] as f64;
        let h11 = self.values[(z0 + 1) * vx + x0 + 1] as f64;

        let h0 = h00 * (1.0 - fx) + h10 * fx;
        let h1 = h01 * (1.0 - fx) + h11 * fx;
        h0 * (1.0 - fz) + h1 * fz
    }

    /// Height on the mesh triangle under `(x, z)`, or `0.0` outside the grid.
    ///
    /// Uses the same anti-diagonal split as the index buffer, so the result
    /// matches the rendered surface rather than the bilinear patch.
    pub fn height_at_exact(&self, world_x: f32, world_z: f32) -> f32 {
        let grid_x = (world_x as f64 + self.size_x / 2.0) / self.resolution;
        let grid_z = (world_z as f64 + self.size_z / 2.0) / self.resolution;

        let max_x = (self.dims.vertices_x - 1) as f64;
        let max_z = (self.dims.vertices_z - 1) as f64;
        if !(grid_x >= 0.0 && grid_x <= max_x && grid_z >= 0.0 && grid_z <= max_z) {
            return 0.0;
        }

        let x0 = (grid_x.floor() as usize).min(self.dims.vertices_x - 2);
        let z0 = (grid_z.floor() as usize).min(self.dims.vertices_z - 2);
        let corner = |x: usize, z: usize| {
            let (wx, wz) = self.vertex_world(x, z);
            Vec3::new(wx as f32, self.values[self.dims.index(x, z)], wz as f32)
        };
        let quad = Quad {
            top_left: corner(x0, z0),
            top_right: corner(x0 + 1, z0),
            bottom_left: corner(x0, z0 + 1),
            bottom_right: corner(x0 + 1, z0 + 1),
        };
        let fx = (grid_x - x0 as f64) as f32;
        let fz = (grid_z - z0 as f64) as f32;
        quad.height_at(QuadDiagonal::Anti, world_x, world_z, fx, fz)
    }
}

impl HeightSampler for HeightMap {
    fn height_at(&self, world_x: f32, world_z: f32) -> f32 {
        self.height_at_f64(world_x as f64, world_z as f64) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 3x3 vertices over 20x20 m: heights 0..8 in row-major order.
    fn ramp() -> HeightMap {
        let dims = GridDims { vertices_x: 3, vertices_z: 3 };
        let values = (0..9).map(|i| i as f32).collect();
        HeightMap::new(values, dims, 20.0, 20.0, 10.0)
    }

    #[test]
    fn grid_vertices_round_trip() {
        let map = ramp();
        for z in 0..3 {
            for x in 0..3 {
                let (wx, wz) = map.vertex_world(x, z);
                let expected = map.get(x, z).unwrap() as f64;
                assert!((map.height_at_f64(wx, wz) - expected).abs() < 1e-9, "vertex {x},{z}");
            }
        }
    }

    #[test]
    fn interpolates_inside_cell() {
        let map = ramp();
        // Centre of the first cell: mean of 0, 1, 3, 4.
        assert!((map.height_at_f64(-5.0, -5.0) - 2.0).abs() < 1e-9);
        // Quarter along x on the first row: 0.25.
        assert!((map.height_at_f64(-7.5, -10.0) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn outside_returns_zero() {
        let map = ramp();
        assert_eq!(map.height_at_f64(-10.001, 0.0), 0.0);
        assert_eq!(map.height_at_f64(0.0, 10.5), 0.0);
        assert_eq!(map.height_at_f64(1.0e9, -1.0e9), 0.0);
        assert_eq!(map.height_at_f64(f64::NAN, 0.0), 0.0);
        assert_eq!(map.height_at(25.0, 0.0), 0.0);
    }

    #[test]
    fn exact_query_follows_mesh_triangles() {
        // One 10 m cell, bottom-left corner raised to 4.
        let dims = GridDims { vertices_x: 2, vertices_z: 2 };
        let map = HeightMap::new(vec![0.0, 0.0, 4.0, 0.0], dims, 10.0, 10.0, 10.0);
        // fx 0.2, fz 0.3: first triangle, plane h = 4 fz.
        assert!((map.height_at_exact(-3.0, -2.0) - 1.2).abs() < 1e-4);
        // fx 0.8, fz 0.7: second triangle, plane h = 4 (1 - fx).
        assert!((map.height_at_exact(3.0, 2.0) - 0.8).abs() < 1e-4);
        // Bilinear differs inside the cell.
        assert!((map.height_at_f64(-3.0, -2.0) - 0.96).abs() < 1e-9);
        assert_eq!(map.height_at_exact(5.5, 0.0), 0.0);
    }

    #[test]
    fn exact_matches_bilinear_on_planar_grid() {
        let map = ramp();
        for (x, z) in [(-7.5, -2.5), (3.0, 9.0), (10.0, 10.0), (-10.0, 4.0)] {
            let exact = map.height_at_exact(x, z) as f64;
            assert!((exact - map.height_at_f64(x as f64, z as f64)).abs() < 1e-4, "{x},{z}");
        }
    }

    #[test]
    fn get_rejects_out_of_range() {
        let map = ramp();
        assert_eq!(map.get(2, 2), Some(8.0));
        assert_eq!(map.get(3, 0), None);
    }
}
