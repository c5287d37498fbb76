//! Triangle-exact height queries.
//!
//! Every quad-based surface resolves heights the same way: pick the half of
//! the quad that contains the point, then intersect a vertical line with that
//! triangle's supporting plane.

use glam::{DVec3, Vec3};
use serde::{Deserialize, Serialize};

/// Below this |n.y| the supporting plane is treated as vertical.
pub const VERTICAL_EPSILON: f64 = 1e-4;

/// Three world-space vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub v0: Vec3,
    pub v1: Vec3,
    pub v2: Vec3,
}

impl Triangle {
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { v0, v1, v2 }
    }

    /// Height of the supporting plane at `(x, z)`, solving `n·(P − v0) = 0` for y.
    ///
    /// A near-vertical plane falls back to the mean vertex height.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let v0 = self.v0.as_dvec3();
        let n = (self.v1.as_dvec3() - v0).cross(self.v2.as_dvec3() - v0);
        if n.y.abs() < VERTICAL_EPSILON {
            return ((self.v0.y as f64 + self.v1.y as f64 + self.v2.y as f64) / 3.0) as f32;
        }
        let y = v0.y - (n.x * (x as f64 - v0.x) + n.z * (z as f64 - v0.z)) / n.y;
        y as f32
    }

    /// Whether the XZ footprint of the triangle contains `(x, z)`, edges included.
    pub fn contains_xz(&self, x: f32, z: f32) -> bool {
        let p = DVec3::new(x as f64, 0.0, z as f64);
        let edge = |a: Vec3, b: Vec3| {
            let (a, b) = (a.as_dvec3(), b.as_dvec3());
            (b.x - a.x) * (p.z - a.z) - (b.z - a.z) * (p.x - a.x)
        };
        let d0 = edge(self.v0, self.v1);
        let d1 = edge(self.v1, self.v2);
        let d2 = edge(self.v2, self.v0);
        let has_neg = d0 < 0.0 || d1 < 0.0 || d2 < 0.0;
        let has_pos = d0 > 0.0 || d1 > 0.0 || d2 > 0.0;
        !(has_neg && has_pos)
    }
}

/// Which diagonal splits a quad into its two triangles.
///
/// Corners are named by grid position: `(x0, z0)` top-left, `(x1, z0)`
/// top-right, `(x0, z1)` bottom-left, `(x1, z1)` bottom-right. `fx, fz` are
/// the fractional coordinates of a point inside the quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuadDiagonal {
    /// Top-left to bottom-right. First triangle `TL, TR, BR` holds `fx >= fz`.
    Main,
    /// Bottom-left to top-right. First triangle `TL, BL, TR` holds `fx + fz <= 1`.
    Anti,
}

impl QuadDiagonal {
    /// Whether the point lies in the first triangle of the split.
    /// Points on the diagonal belong to the first triangle.
    #[inline]
    pub fn in_first(self, fx: f32, fz: f32) -> bool {
        match self {
            Self::Main => fx >= fz,
            Self::Anti => fx + fz <= 1.0,
        }
    }
}

/// Four quad corners in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub top_left: Vec3,
    pub top_right: Vec3,
    pub bottom_left: Vec3,
    pub bottom_right: Vec3,
}

impl Quad {
    /// The two triangles of the quad for a diagonal, first triangle first.
    pub fn triangles(&self, diagonal: QuadDiagonal) -> [Triangle; 2] {
        let (tl, tr, bl, br) = (self.top_left, self.top_right, self.bottom_left, self.bottom_right);
        match diagonal {
            QuadDiagonal::Main => [Triangle::new(tl, tr, br), Triangle::new(tl, br, bl)],
            QuadDiagonal::Anti => [Triangle::new(tl, bl, tr), Triangle::new(tr, bl, br)],
        }
    }

    /// Triangle-exact height at world `(x, z)` with fractional quad coordinates `(fx, fz)`.
    pub fn height_at(&self, diagonal: QuadDiagonal, x: f32, z: f32, fx: f32, fz: f32) -> f32 {
        let [first, second] = self.triangles(diagonal);
        if diagonal.in_first(fx, fz) {
            first.height_at(x, z)
        } else {
            second.height_at(x, z)
        }
    }
}
