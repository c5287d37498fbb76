//! Render capability exposed by meshes that the external renderer uploads.
//!
//! Meshes never know about the graphics API. They hand out flat vertex streams,
//! an index buffer whose width matches the vertex count, and a hint telling the
//! renderer which pipeline to bind.

use bytemuck::{Pod, Zeroable};

/// Largest vertex count that can still be addressed with 16-bit indices.
pub const MAX_U16_VERTICES: usize = 65_535;

/// Index buffer whose element width scales with the vertex count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexBuffer {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

/// Element width of an [`IndexBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat {
    Uint16,
    Uint32,
}

impl IndexBuffer {
    /// Whether a mesh with `vertex_count` vertices needs 32-bit indices.
    #[inline]
    pub fn needs_u32(vertex_count: usize) -> bool {
        vertex_count > MAX_U16_VERTICES
    }

    /// Build a buffer of the right width for `vertex_count` from 32-bit indices.
    pub fn from_u32(indices: Vec<u32>, vertex_count: usize) -> Self {
        if Self::needs_u32(vertex_count) {
            Self::U32(indices)
        } else {
            Self::U16(indices.into_iter().map(|i| i as u16).collect())
        }
    }

    pub fn format(&self) -> IndexFormat {
        match self {
            Self::U16(_) => IndexFormat::Uint16,
            Self::U32(_) => IndexFormat::Uint32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index at position `i`, widened to `u32`.
    pub fn get(&self, i: usize) -> Option<u32> {
        match self {
            Self::U16(v) => v.get(i).map(|&x| x as u32),
            Self::U32(v) => v.get(i).copied(),
        }
    }

    /// Iterate all indices widened to `u32`.
    pub fn iter(&self) -> Box<dyn Iterator<Item = u32> + '_> {
        match self {
            Self::U16(v) => Box::new(v.iter().map(|&x| x as u32)),
            Self::U32(v) => Box::new(v.iter().copied()),
        }
    }

    pub fn to_u32_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }

    /// Raw bytes for buffer upload.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::U16(v) => bytemuck::cast_slice(v),
            Self::U32(v) => bytemuck::cast_slice(v),
        }
    }
}

/// Pipeline the renderer should use for a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderHint {
    /// Full-resolution terrain with per-vertex colour and lighting from normals.
    LitTerrain,
    /// Decimated terrain drawn in the overview/minimap pass.
    OverviewMap,
    /// Per-vertex colour only, no lighting. UVs, when present, may carry a texture.
    FlatColor,
}

/// Borrowed flat vertex streams, 3 floats per vertex (2 for UVs).
#[derive(Debug, Clone, Copy)]
pub struct VertexStreams<'a> {
    pub positions: &'a [f32],
    pub colors: &'a [f32],
    pub normals: Option<&'a [f32]>,
    pub uvs: Option<&'a [f32]>,
}

impl VertexStreams<'_> {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Pack the streams into one interleaved vertex array.
    /// Missing normals default to +Y, missing UVs to zero.
    pub fn interleave(&self) -> Vec<InterleavedVertex> {
        (0..self.vertex_count())
            .map(|i| {
                let v3 = |s: &[f32]| [s[i * 3], s[i * 3 + 1], s[i * 3 + 2]];
                InterleavedVertex {
                    position: v3(self.positions),
                    normal: self.normals.map(v3).unwrap_or([0.0, 1.0, 0.0]),
                    color: v3(self.colors),
                    uv: self
                        .uvs
                        .map(|uv| [uv[i * 2], uv[i * 2 + 1]])
                        .unwrap_or([0.0, 0.0]),
                }
            })
            .collect()
    }
}

/// Interleaved vertex for renderers that prefer a single vertex buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InterleavedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
    pub uv: [f32; 2],
}

/// Anything the external renderer can upload and draw.
pub trait Renderable {
    fn vertex_streams(&self) -> VertexStreams<'_>;

    fn index_buffer(&self) -> &IndexBuffer;

    fn shader_hint(&self) -> ShaderHint;

    fn vertex_count(&self) -> usize {
        self.vertex_streams().vertex_count()
    }

    fn index_count(&self) -> usize {
        self.index_buffer().len()
    }
}
