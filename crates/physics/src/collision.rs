//! Collider components and the triangle soup used for ground queries.

use engine_core::{HeightSampler, IndexBuffer, Renderable};
use glam::Vec3;
use procgen::Triangle;
use rapier3d::math::{Point, Real};
use rapier3d::parry::bounding_volume::Aabb;
use rapier3d::parry::shape::TriMesh;
use serde::{Deserialize, Serialize};

/// Collision shape of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColliderShape {
    Box,
    Sphere,
    /// Upright capsule; the only shape snapped to the ground.
    Capsule,
    Mesh,
}

/// Optional extents of a collider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ColliderBounds {
    pub height: Option<f32>,
    pub radius: Option<f32>,
}

/// Component describing how an entity collides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub shape: ColliderShape,
    pub bounds: Option<ColliderBounds>,
}

impl Collider {
    pub fn new(shape: ColliderShape) -> Self {
        Self { shape, bounds: None }
    }

    /// Upright capsule of total `height` and `radius`.
    pub fn capsule(height: f32, radius: f32) -> Self {
        Self {
            shape: ColliderShape::Capsule,
            bounds: Some(ColliderBounds {
                height: Some(height),
                radius: Some(radius),
            }),
        }
    }

    /// Height of the bounds, if known.
    pub fn height(&self) -> Option<f32> {
        self.bounds.and_then(|b| b.height)
    }
}

/// Padding around the vertical query column, in meters. Candidates are
/// filtered exactly afterwards, so this only has to cover AABB rounding.
const QUERY_PAD: Real = 1e-3;

/// Explicit triangles indexed by a parry triangle mesh for point queries.
///
/// The mesh's QBVH narrows a vertical column to candidate triangles; the
/// height itself comes from the candidate's supporting plane.
#[derive(Debug, Clone)]
pub struct CollisionMesh {
    triangles: Vec<Triangle>,
    /// `None` when there are no triangles; parry rejects empty meshes.
    shape: Option<TriMesh>,
    min_y: Real,
    max_y: Real,
}

impl CollisionMesh {
    /// Build from a flat XYZ position stream and a triangle-list index buffer.
    pub fn from_indexed(positions: &[f32], indices: &IndexBuffer) -> Self {
        let vertex = |i: u32| {
            let i = i as usize * 3;
            Vec3::new(positions[i], positions[i + 1], positions[i + 2])
        };
        let ids: Vec<[u32; 3]> = indices
            .to_u32_vec()
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect();
        let triangles = ids
            .iter()
            .map(|t| Triangle::new(vertex(t[0]), vertex(t[1]), vertex(t[2])))
            .collect();
        let points = positions
            .chunks_exact(3)
            .map(|p| Point::new(p[0], p[1], p[2]))
            .collect();
        Self::build(triangles, points, ids)
    }

    /// Build from any renderable mesh.
    pub fn from_renderable<R: Renderable + ?Sized>(mesh: &R) -> Self {
        Self::from_indexed(mesh.vertex_streams().positions, mesh.index_buffer())
    }

    /// Build from unshared triangles, as quad terrains produce them.
    pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
        let points = triangles
            .iter()
            .flat_map(|t| [t.v0, t.v1, t.v2])
            .map(|v| Point::new(v.x, v.y, v.z))
            .collect();
        let ids = (0..triangles.len() as u32)
            .map(|i| [i * 3, i * 3 + 1, i * 3 + 2])
            .collect();
        Self::build(triangles, points, ids)
    }

    fn build(triangles: Vec<Triangle>, points: Vec<Point<Real>>, ids: Vec<[u32; 3]>) -> Self {
        let (min_y, max_y) = points
            .iter()
            .fold((Real::INFINITY, Real::NEG_INFINITY), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));
        let shape = if ids.is_empty() {
            None
        } else {
            Some(TriMesh::new(points, ids))
        };
        log::debug!("Collision mesh: {} triangles, y in [{}, {}]", triangles.len(), min_y, max_y);
        Self {
            triangles,
            shape,
            min_y,
            max_y,
        }
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Lowest-indexed triangle whose footprint contains `(x, z)`.
    pub fn triangle_at(&self, x: f32, z: f32) -> Option<&Triangle> {
        let shape = self.shape.as_ref()?;
        if !(x.is_finite() && z.is_finite()) {
            return None;
        }
        let column = Aabb::new(
            Point::new(x - QUERY_PAD, self.min_y - QUERY_PAD, z - QUERY_PAD),
            Point::new(x + QUERY_PAD, self.max_y + QUERY_PAD, z + QUERY_PAD),
        );
        let mut candidates: Vec<u32> = Vec::new();
        shape.qbvh().intersect_aabb(&column, &mut candidates);
        candidates
            .into_iter()
            .filter(|&i| self.triangles[i as usize].contains_xz(x, z))
            .min()
            .map(|i| &self.triangles[i as usize])
    }

    /// Height of the covering triangle's plane, or `0.0` when none covers it.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        self.triangle_at(x, z).map_or(0.0, |t| t.height_at(x, z))
    }
}

impl HeightSampler for CollisionMesh {
    fn height_at(&self, world_x: f32, world_z: f32) -> f32 {
        CollisionMesh::height_at(self, world_x, world_z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procgen::{QuadDiagonal, QuadTerrain, QuadTerrainConfig, TerrainGenerator};

    #[test]
    fn capsule_carries_height() {
        let c = Collider::capsule(1.8, 0.4);
        assert_eq!(c.shape, ColliderShape::Capsule);
        assert_eq!(c.height(), Some(1.8));
        assert_eq!(Collider::new(ColliderShape::Box).height(), None);
    }

    #[test]
    fn sloped_plane_is_exact() {
        // Two triangles covering [0, 4]² with y = 2x + z.
        let p = |x: f32, z: f32| Vec3::new(x, 2.0 * x + z, z);
        let tris = vec![
            Triangle::new(p(0.0, 0.0), p(4.0, 0.0), p(4.0, 4.0)),
            Triangle::new(p(0.0, 0.0), p(4.0, 4.0), p(0.0, 4.0)),
        ];
        let mesh = CollisionMesh::from_triangles(tris);
        for (x, z) in [(0.5, 0.5), (3.9, 0.1), (0.1, 3.9), (2.0, 2.0), (4.0, 4.0)] {
            assert!((mesh.height_at(x, z) - (2.0 * x + z)).abs() < 1e-4, "({x}, {z})");
        }
        assert_eq!(mesh.height_at(4.5, 1.0), 0.0);
        assert_eq!(mesh.height_at(-0.1, 1.0), 0.0);
    }

    #[test]
    fn matches_quad_terrain_queries() {
        let terrain = QuadTerrain::random(&QuadTerrainConfig {
            width: 12.0,
            depth: 8.0,
            seed: 3,
            ..Default::default()
        })
        .unwrap();
        let mesh = CollisionMesh::from_triangles(terrain.triangles().to_vec());
        for i in 0..200 {
            let x = -5.93 + (i % 20) as f32 * 0.59;
            let z = -3.91 + (i / 20) as f32 * 0.77;
            let expected = terrain.height_at(x, z);
            assert!((mesh.height_at(x, z) - expected).abs() < 1e-4, "({x}, {z})");
        }
    }

    #[test]
    fn indexed_terrain_hits_grid_vertices() {
        let terrain = TerrainGenerator::with_seed(12345).generate(200.0, 200.0, 10.0).unwrap();
        let mesh = CollisionMesh::from_renderable(&terrain);
        assert_eq!(mesh.len(), terrain.num_triangles);
        for z in (0..21).step_by(5) {
            for x in (0..21).step_by(4) {
                let i = terrain.dims.index(x, z);
                let (wx, wz) = (terrain.vertices[i * 3], terrain.vertices[i * 3 + 2]);
                let stored = terrain.height_map.values()[i];
                assert!((mesh.height_at(wx, wz) - stored).abs() < 1e-3, "vertex {x},{z}");
            }
        }
    }

    #[test]
    fn indexed_terrain_uses_anti_diagonal_split() {
        let terrain = TerrainGenerator::with_seed(99).generate(100.0, 100.0, 10.0).unwrap();
        let mesh = CollisionMesh::from_renderable(&terrain);
        let v = |x: usize, z: usize| {
            let i = terrain.dims.index(x, z) * 3;
            Vec3::new(terrain.vertices[i], terrain.vertices[i + 1], terrain.vertices[i + 2])
        };
        let quad = procgen::Quad {
            top_left: v(3, 4),
            top_right: v(4, 4),
            bottom_left: v(3, 5),
            bottom_right: v(4, 5),
        };
        for (fx, fz) in [(0.2f32, 0.3f32), (0.8, 0.7), (0.1, 0.85)] {
            let x = quad.top_left.x + fx * 10.0;
            let z = quad.top_left.z + fz * 10.0;
            let expected = quad.height_at(QuadDiagonal::Anti, x, z, fx, fz);
            assert!((mesh.height_at(x, z) - expected).abs() < 1e-3);
        }
    }

    #[test]
    fn empty_mesh_answers_zero() {
        let mesh = CollisionMesh::from_triangles(Vec::new());
        assert!(mesh.is_empty());
        assert_eq!(mesh.height_at(0.0, 0.0), 0.0);
        assert!(mesh.triangle_at(0.0, 0.0).is_none());
    }

    #[test]
    fn overlapping_footprints_resolve_to_first_triangle() {
        // Two stacked copies of the same footprint at different heights.
        let flat = |y: f32| {
            Triangle::new(Vec3::new(0.0, y, 0.0), Vec3::new(2.0, y, 0.0), Vec3::new(0.0, y, 2.0))
        };
        let mesh = CollisionMesh::from_triangles(vec![flat(7.0), flat(-3.0)]);
        assert_eq!(mesh.height_at(0.5, 0.5), 7.0);
        assert_eq!(mesh.height_at(f32::NAN, 0.5), 0.0);
        assert_eq!(mesh.height_at(1.5, 1.5), 0.0);
    }

    #[test]
    fn every_indexed_triangle_is_reachable() {
        let terrain = TerrainGenerator::with_seed(7).generate(60.0, 40.0, 10.0).unwrap();
        let mesh = CollisionMesh::from_renderable(&terrain);
        for t in mesh.triangles() {
            let cx = (t.v0.x + t.v1.x + t.v2.x) / 3.0;
            let cz = (t.v0.z + t.v1.z + t.v2.z) / 3.0;
            assert_eq!(mesh.triangle_at(cx, cz), Some(t));
        }
    }
}
