//! Smooth per-vertex normals for a grid mesh.

use glam::DVec3;

use crate::grid::GridDims;

/// Accumulate the face normals of both triangles of every quad into their
/// corner vertices, then normalise.
///
/// Face normals are not normalised before accumulation, so larger faces weigh
/// more. Cross products are taken in double precision and summed into `f32`
/// slots. A vertex whose sum has zero length keeps a zero normal.
pub fn compute_normals(positions: &[f32], dims: GridDims) -> Vec<f32> {
    debug_assert_eq!(positions.len(), dims.vertex_count() * 3);

    let mut normals = vec![0.0f32; positions.len()];
    let position = |i: usize| {
        DVec3::new(
            positions[i * 3] as f64,
            positions[i * 3 + 1] as f64,
            positions[i * 3 + 2] as f64,
        )
    };

    for [i0, i1, i2] in dims.triangles() {
        let v0 = position(i0);
        let n = (position(i1) - v0).cross(position(i2) - v0);
        for i in [i0, i1, i2] {
            let slot = &mut normals[i * 3..i * 3 + 3];
            slot[0] = (slot[0] as f64 + n.x) as f32;
            slot[1] = (slot[1] as f64 + n.y) as f32;
            slot[2] = (slot[2] as f64 + n.z) as f32;
        }
    }

    for n in normals.chunks_exact_mut(3) {
        let v = DVec3::new(n[0] as f64, n[1] as f64, n[2] as f64);
        let length = v.length();
        if length > 0.0 {
            n[0] = (v.x / length) as f32;
            n[1] = (v.y / length) as f32;
            n[2] = (v.z / length) as f32;
        }
    }

    normals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_grid(dims: GridDims, spacing: f32, height: impl Fn(usize, usize) -> f32) -> Vec<f32> {
        let mut positions = Vec::with_capacity(dims.vertex_count() * 3);
        for z in 0..dims.vertices_z {
            for x in 0..dims.vertices_x {
                positions.extend_from_slice(&[x as f32 * spacing, height(x, z), z as f32 * spacing]);
            }
        }
        positions
    }

    #[test]
    fn flat_grid_points_up() {
        let dims = GridDims { vertices_x: 4, vertices_z: 3 };
        let normals = compute_normals(&flat_grid(dims, 2.0, |_, _| 7.0), dims);
        for n in normals.chunks_exact(3) {
            assert!((n[0]).abs() < 1e-6);
            assert!((n[1] - 1.0).abs() < 1e-6);
            assert!((n[2]).abs() < 1e-6);
        }
    }

    #[test]
    fn slope_tilts_against_gradient() {
        // Height rises with x, so normals lean toward -x.
        let dims = GridDims { vertices_x: 5, vertices_z: 5 };
        let normals = compute_normals(&flat_grid(dims, 1.0, |x, _| x as f32), dims);
        let centre = dims.index(2, 2) * 3;
        let expected = 1.0 / 2.0f32.sqrt();
        assert!((normals[centre] + expected).abs() < 1e-5);
        assert!((normals[centre + 1] - expected).abs() < 1e-5);
        assert!(normals[centre + 2].abs() < 1e-5);
    }

    #[test]
    fn every_normal_is_unit_length() {
        let dims = GridDims { vertices_x: 9, vertices_z: 7 };
        let positions = flat_grid(dims, 3.0, |x, z| ((x * 7 + z * 13) % 5) as f32 * 1.7);
        let normals = compute_normals(&positions, dims);
        for n in normals.chunks_exact(3) {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert!((len - 1.0).abs() < 1e-5, "length {len}");
        }
    }

    #[test]
    fn degenerate_vertices_stay_zero() {
        // All vertices collapsed onto one point: every face has zero area.
        let dims = GridDims { vertices_x: 2, vertices_z: 2 };
        let positions = vec![0.0f32; 12];
        let normals = compute_normals(&positions, dims);
        assert!(normals.iter().all(|&c| c == 0.0));
    }
}
