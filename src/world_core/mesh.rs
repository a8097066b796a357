use glam::Vec3;

use crate::world_core::culling::Aabb;

/// A named, indexed triangle mesh living in world space.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    /// Per-vertex normals; empty when the mesh only has face normals.
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl TriangleMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangle_indices(&self, triangle: usize) -> [usize; 3] {
        let base = triangle * 3;
        [
            self.indices[base] as usize,
            self.indices[base + 1] as usize,
            self.indices[base + 2] as usize,
        ]
    }

    pub fn triangle(&self, triangle: usize) -> [Vec3; 3] {
        let [a, b, c] = self.triangle_indices(triangle);
        [self.positions[a], self.positions[b], self.positions[c]]
    }

    pub fn has_vertex_normals(&self) -> bool {
        !self.normals.is_empty() && self.normals.len() == self.positions.len()
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.positions.iter().copied())
    }
}

pub fn triangle_area(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    (b - a).cross(c - a).length() * 0.5
}

pub fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a).normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::{face_normal, triangle_area, TriangleMesh};
    use glam::Vec3;

    #[test]
    fn ccw_triangle_seen_from_above_faces_up() {
        let n = face_normal(Vec3::ZERO, Vec3::Z, Vec3::X);
        assert!((n - Vec3::Y).length() < 1e-6);
        assert!((triangle_area(Vec3::ZERO, Vec3::Z, Vec3::X) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn empty_mesh_has_no_bounds() {
        assert!(TriangleMesh::default().bounds().is_none());
    }
}
