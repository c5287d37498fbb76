//! Decimated copy of the terrain for the overview map.

use engine_core::{IndexBuffer, Renderable, ShaderHint, VertexStreams};

use crate::error::TerrainError;
use crate::grid::{self, GridDims};

/// Every `skip`-th vertex of the terrain along each axis.
///
/// The map has `vertices / skip + 1` vertices per axis (at least 2), and a
/// sample index past the source grid is clamped to its last row or column.
/// Whether the last source row or column appears therefore depends on the
/// grid size: 5 columns at skip 2 keep column 4, 8 columns at skip 3 keep
/// 0, 3 and 6 and drop 7.
#[derive(Debug, Clone, PartialEq)]
pub struct MapMesh {
    pub positions: Vec<f32>,
    pub colors: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: IndexBuffer,
    pub dims: GridDims,
    pub skip: usize,
}

impl MapMesh {
    /// Sample the terrain buffers down by `skip`.
    ///
    /// `source_triangles` is only used for the reduction log line.
    pub fn decimate(
        positions: &[f32],
        colors: &[f32],
        normals: &[f32],
        source: GridDims,
        skip: usize,
        source_triangles: usize,
    ) -> Result<Self, TerrainError> {
        if skip == 0 {
            return Err(TerrainError::InvalidSkipFactor);
        }
        source.validate()?;

        let dims = GridDims {
            vertices_x: (source.vertices_x / skip + 1).max(2),
            vertices_z: (source.vertices_z / skip + 1).max(2),
        };
        let count = dims.vertex_count();
        let mut mesh = Self {
            positions: Vec::with_capacity(count * 3),
            colors: Vec::with_capacity(count * 3),
            normals: Vec::with_capacity(count * 3),
            indices: grid::build_indices(dims),
            dims,
            skip,
        };

        for mz in 0..dims.vertices_z {
            let sz = (mz * skip).min(source.vertices_z - 1);
            for mx in 0..dims.vertices_x {
                let sx = (mx * skip).min(source.vertices_x - 1);
                let i = source.index(sx, sz) * 3;
                mesh.positions.extend_from_slice(&positions[i..i + 3]);
                mesh.colors.extend_from_slice(&colors[i..i + 3]);
                mesh.normals.extend_from_slice(&normals[i..i + 3]);
            }
        }

        let triangles = dims.triangle_count();
        log::info!(
            "Map mesh: {} vertices, {} triangles ({:.1}% of terrain)",
            count,
            triangles,
            if source_triangles == 0 {
                0.0
            } else {
                triangles as f64 / source_triangles as f64 * 100.0
            }
        );
        Ok(mesh)
    }

    pub fn num_triangles(&self) -> usize {
        self.dims.triangle_count()
    }
}

impl Renderable for MapMesh {
    fn vertex_streams(&self) -> VertexStreams<'_> {
        VertexStreams {
            positions: &self.positions,
            colors: &self.colors,
            normals: Some(&self.normals),
            uvs: None,
        }
    }

    fn index_buffer(&self) -> &IndexBuffer {
        &self.indices
    }

    fn shader_hint(&self) -> ShaderHint {
        ShaderHint::OverviewMap
    }
}
