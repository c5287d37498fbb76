//! Regular vertex grid dimensions and index buffers over it.
//!
//! Vertices are row-major: Z outer, X inner. Each quad is split into
//! `top_left, bottom_left, top_right` and `top_right, bottom_left, bottom_right`,
//! so the shared diagonal runs from bottom-left to top-right.

use engine_core::IndexBuffer;

use crate::error::TerrainError;

/// Largest vertex count a `u32` index buffer can address.
const MAX_VERTICES: u64 = u32::MAX as u64 + 1;

/// Vertex counts of a heightfield grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDims {
    pub vertices_x: usize,
    pub vertices_z: usize,
}

impl GridDims {
    /// Grid covering `size_x × size_z` meters at `resolution` meters per vertex:
    /// `floor(size / resolution) + 1` vertices per axis.
    pub fn from_extent(size_x: f64, size_z: f64, resolution: f64) -> Result<Self, TerrainError> {
        let positive = |v: f64| v > 0.0 && v.is_finite();
        if !positive(size_x) || !positive(size_z) {
            return Err(TerrainError::NonPositiveExtent { size_x, size_z });
        }
        if !positive(resolution) {
            return Err(TerrainError::NonPositiveResolution(resolution));
        }
        let cells_x = (size_x / resolution).floor();
        let cells_z = (size_z / resolution).floor();
        // Saturating casts keep the reported counts meaningful.
        let dims = Self {
            vertices_x: (cells_x as usize).saturating_add(1),
            vertices_z: (cells_z as usize).saturating_add(1),
        };
        if !(cells_x < MAX_VERTICES as f64 && cells_z < MAX_VERTICES as f64) {
            return Err(TerrainError::GridTooLarge {
                vertices_x: dims.vertices_x,
                vertices_z: dims.vertices_z,
            });
        }
        dims.validate()?;
        Ok(dims)
    }

    /// At least one quad, and every vertex addressable by a `u32` index.
    pub fn validate(&self) -> Result<(), TerrainError> {
        if self.vertices_x < 2 || self.vertices_z < 2 {
            return Err(TerrainError::DegenerateGrid {
                vertices_x: self.vertices_x,
                vertices_z: self.vertices_z,
            });
        }
        let fits = self
            .vertices_x
            .checked_mul(self.vertices_z)
            .filter(|&n| n as u64 <= MAX_VERTICES)
            .and_then(|_| (self.vertices_x - 1).checked_mul(self.vertices_z - 1))
            .and_then(|quads| quads.checked_mul(6))
            .is_some();
        if !fits {
            return Err(TerrainError::GridTooLarge {
                vertices_x: self.vertices_x,
                vertices_z: self.vertices_z,
            });
        }
        Ok(())
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices_x * self.vertices_z
    }

    #[inline]
    pub fn quad_count(&self) -> usize {
        (self.vertices_x - 1) * (self.vertices_z - 1)
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.quad_count() * 2
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.triangle_count() * 3
    }

    #[inline]
    pub fn index(&self, x: usize, z: usize) -> usize {
        z * self.vertices_x + x
    }

    /// Corner vertex indices of the quad at `(x, z)`:
    /// `[top_left, top_right, bottom_left, bottom_right]`.
    #[inline]
    pub fn quad_corners(&self, x: usize, z: usize) -> [usize; 4] {
        let top_left = self.index(x, z);
        let bottom_left = self.index(x, z + 1);
        [top_left, top_left + 1, bottom_left, bottom_left + 1]
    }

    /// Both triangles of every quad, in index-buffer order.
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        (0..self.vertices_z - 1).flat_map(move |z| {
            (0..self.vertices_x - 1).flat_map(move |x| {
                let [tl, tr, bl, br] = self.quad_corners(x, z);
                [[tl, bl, tr], [tr, bl, br]]
            })
        })
    }
}

/// Triangle index buffer for the grid, 16-bit when the vertex count allows it.
pub fn build_indices(dims: GridDims) -> IndexBuffer {
    if IndexBuffer::needs_u32(dims.vertex_count()) {
        IndexBuffer::U32(fill_indices(dims, |i| i as u32))
    } else {
        IndexBuffer::U16(fill_indices(dims, |i| i as u16))
    }
}

fn fill_indices<T>(dims: GridDims, convert: impl Fn(usize) -> T) -> Vec<T> {
    let mut indices = Vec::with_capacity(dims.index_count());
    for [a, b, c] in dims.triangles() {
        indices.push(convert(a));
        indices.push(convert(b));
        indices.push(convert(c));
    }
    indices
}

/// Convert a triangle list into a line list (three edges per triangle) for
/// wireframe overlays.
pub fn line_indices(triangles: &IndexBuffer) -> Vec<u32> {
    let tris = triangles.to_u32_vec();
    let mut lines = Vec::with_capacity(tris.len() * 2);
    for t in tris.chunks_exact(3) {
        lines.extend_from_slice(&[t[0], t[1], t[1], t[2], t[2], t[0]]);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::IndexFormat;

    #[test]
    fn five_km_grid_sizes() {
        let dims = GridDims::from_extent(5000.0, 5000.0, 5.0).unwrap();
        assert_eq!(dims.vertices_x, 1001);
        assert_eq!(dims.vertices_z, 1001);
        assert_eq!(dims.vertex_count(), 1_002_001);
        assert_eq!(dims.triangle_count(), 2_000_000);
        assert_eq!(dims.index_count(), 6_000_000);
    }

    #[test]
    fn non_multiple_extent_floors() {
        let dims = GridDims::from_extent(300.0, 185.0, 6.0).unwrap();
        assert_eq!(dims.vertices_x, 51);
        assert_eq!(dims.vertices_z, 31);
    }

    #[test]
    fn rejects_bad_extents() {
        assert!(matches!(
            GridDims::from_extent(0.0, 10.0, 1.0),
            Err(TerrainError::NonPositiveExtent { .. })
        ));
        assert!(matches!(
            GridDims::from_extent(10.0, 10.0, -1.0),
            Err(TerrainError::NonPositiveResolution(_))
        ));
        assert!(matches!(
            GridDims::from_extent(10.0, 10.0, f64::NAN),
            Err(TerrainError::NonPositiveResolution(_))
        ));
        assert!(matches!(
            GridDims::from_extent(4.0, 10.0, 5.0),
            Err(TerrainError::DegenerateGrid { vertices_x: 1, .. })
        ));
    }

    #[test]
    fn rejects_non_finite_and_oversized_grids() {
        assert!(matches!(
            GridDims::from_extent(f64::INFINITY, 10.0, 1.0),
            Err(TerrainError::NonPositiveExtent { .. })
        ));
        assert!(matches!(
            GridDims::from_extent(10.0, f64::NAN, 1.0),
            Err(TerrainError::NonPositiveExtent { .. })
        ));
        assert!(matches!(
            GridDims::from_extent(10.0, 10.0, f64::INFINITY),
            Err(TerrainError::NonPositiveResolution(_))
        ));
        assert!(matches!(
            GridDims::from_extent(1e30, 10.0, 1.0),
            Err(TerrainError::GridTooLarge { vertices_z: 11, .. })
        ));
        // Each axis fits on its own, the product does not.
        assert!(matches!(
            GridDims::from_extent(5000.0, 5000.0, 1e-3),
            Err(TerrainError::GridTooLarge { .. })
        ));
        assert!(matches!(
            GridDims::from_extent(5000.0, 5000.0, 1e-9),
            Err(TerrainError::GridTooLarge { .. })
        ));
        assert!(GridDims { vertices_x: 65_536, vertices_z: 65_536 }.validate().is_ok());
        assert!(matches!(
            GridDims { vertices_x: 65_537, vertices_z: 65_536 }.validate(),
            Err(TerrainError::GridTooLarge { .. })
        ));
    }

    #[test]
    fn quad_winding() {
        let dims = GridDims { vertices_x: 3, vertices_z: 2 };
        let buf = build_indices(dims);
        assert_eq!(buf.format(), IndexFormat::Uint16);
        assert_eq!(
            buf.to_u32_vec(),
            vec![0, 3, 1, 1, 3, 4, 1, 4, 2, 2, 4, 5]
        );
    }

    #[test]
    fn wide_indices_past_u16() {
        let dims = GridDims { vertices_x: 300, vertices_z: 300 };
        let buf = build_indices(dims);
        assert_eq!(buf.format(), IndexFormat::Uint32);
        assert_eq!(buf.len(), dims.index_count());
        assert_eq!(buf.iter().max(), Some(89_999));
    }

    #[test]
    fn line_list_has_three_edges_per_triangle() {
        let dims = GridDims { vertices_x: 2, vertices_z: 2 };
        let lines = line_indices(&build_indices(dims));
        assert_eq!(lines, vec![0, 2, 2, 1, 1, 0, 1, 2, 2, 3, 3, 1]);
    }
}
