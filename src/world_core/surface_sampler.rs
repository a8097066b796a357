use glam::Vec3;
use rand::Rng;

use crate::world_core::mesh::{face_normal, triangle_area, TriangleMesh};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    pub position: Vec3,
    pub normal: Vec3,
}

/// Anything that can scatter points over a surface.
pub trait SurfaceSampler {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> SurfacePoint;
}

/// Area-weighted sampler over a [`TriangleMesh`].
pub struct MeshSurfaceSampler<'a> {
    mesh: &'a TriangleMesh,
    cumulative_area: Vec<f32>,
    total_area: f32,
}

impl<'a> MeshSurfaceSampler<'a> {
    /// Returns `None` when the mesh has no triangles with area.
    pub fn new(mesh: &'a TriangleMesh) -> Option<Self> {
        let mut total = 0.0f32;
        let cumulative_area: Vec<f32> = (0..mesh.triangle_count())
            .map(|i| {
                let [a, b, c] = mesh.triangle(i);
                total += triangle_area(a, b, c);
                total
            })
            .collect();

        if !(total.is_finite() && total > 0.0) {
            return None;
        }

        Some(Self {
            mesh,
            cumulative_area,
            total_area: total,
        })
    }

    #[cfg(test)]
    pub fn total_area(&self) -> f32 {
        self.total_area
    }

    /// Zero-area triangles share their predecessor's cumulative value and
    /// are never picked.
    fn pick_triangle(&self, r: f32) -> usize {
        let target = r * self.total_area;
        let index = self.cumulative_area.partition_point(|&c| c <= target);
        if index < self.cumulative_area.len() {
            return index;
        }
        // `r * total` rounded up to the total: last triangle with area.
        self.cumulative_area.partition_point(|&c| c < self.total_area)
    }

    fn sample_triangle<R: Rng + ?Sized>(&self, triangle: usize, rng: &mut R) -> SurfacePoint {
        let mut u: f32 = rng.random();
        let mut v: f32 = rng.random();
        if u + v > 1.0 {
            u = 1.0 - u;
            v = 1.0 - v;
        }
        let w = 1.0 - (u + v);

        let [ia, ib, ic] = self.mesh.triangle_indices(triangle);
        let [a, b, c] = self.mesh.triangle(triangle);
        let position = a * u + b * v + c * w;

        let normal = if self.mesh.has_vertex_normals() {
            let n = &self.mesh.normals;
            (n[ia] * u + n[ib] * v + n[ic] * w)
                .try_normalize()
                .unwrap_or_else(|| face_normal(a, b, c))
        } else {
            face_normal(a, b, c)
        };

        SurfacePoint { position, normal }
    }
}

impl SurfaceSampler for MeshSurfaceSampler<'_> {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> SurfacePoint {
        let triangle = self.pick_triangle(rng.random());
        self.sample_triangle(triangle, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::{MeshSurfaceSampler, SurfaceSampler};
    use crate::world_core::mesh::TriangleMesh;
    use glam::Vec3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Two unit-height quads side by side: x in [0,1] and x in [1,4].
    fn uneven_strip() -> TriangleMesh {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, 1.0),
        ];
        let indices = vec![0, 2, 1, 1, 2, 3, 1, 3, 4, 4, 3, 5];
        TriangleMesh {
            name: "strip".into(),
            positions,
            normals: Vec::new(),
            indices,
        }
    }

    #[test]
    fn samples_lie_on_the_surface_with_face_normals() {
        let mesh = uneven_strip();
        let sampler = MeshSurfaceSampler::new(&mesh).unwrap();
        assert!((sampler.total_area() - 4.0).abs() < 1e-5);

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let p = sampler.sample(&mut rng);
            assert!(p.position.y.abs() < 1e-6);
            assert!((-1e-5..=4.0 + 1e-5).contains(&p.position.x));
            assert!((-1e-5..=1.0 + 1e-5).contains(&p.position.z));
            assert!((p.normal - Vec3::Y).length() < 1e-5);
        }
    }

    #[test]
    fn sampling_is_weighted_by_area() {
        let mesh = uneven_strip();
        let sampler = MeshSurfaceSampler::new(&mesh).unwrap();
        let mut rng = StdRng::seed_from_u64(99);

        let n = 20_000;
        let small = (0..n)
            .filter(|_| sampler.sample(&mut rng).position.x < 1.0)
            .count();
        let fraction = small as f32 / n as f32;
        // Left quad is a quarter of the total area.
        assert!((fraction - 0.25).abs() < 0.02, "fraction was {fraction}");
    }

    #[test]
    fn interpolates_vertex_normals_when_present() {
        let mut mesh = uneven_strip();
        let tilted = Vec3::new(0.0, 1.0, 1.0).normalize();
        mesh.normals = vec![tilted; mesh.positions.len()];
        let sampler = MeshSurfaceSampler::new(&mesh).unwrap();

        let p = sampler.sample(&mut StdRng::seed_from_u64(1));
        assert!((p.normal - tilted).length() < 1e-5);
    }

    #[test]
    fn zero_area_triangles_are_never_picked() {
        let mut mesh = uneven_strip();
        // Collinear along x: one in the middle of the list, one at the end.
        mesh.indices = vec![0, 2, 1, 1, 2, 3, 0, 1, 4, 1, 3, 4, 4, 3, 5, 0, 1, 4];
        let sampler = MeshSurfaceSampler::new(&mesh).unwrap();

        assert_eq!(sampler.pick_triangle(0.0), 0);
        assert_eq!(sampler.pick_triangle(0.25), 3);
        assert_eq!(sampler.pick_triangle(1.0), 4);
        for i in 0..=1000 {
            let picked = sampler.pick_triangle(i as f32 / 1000.0);
            assert!(picked != 2 && picked != 5, "r={} picked {picked}", i as f32 / 1000.0);
        }

        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..2000 {
            let p = sampler.sample(&mut rng);
            assert!((p.normal - Vec3::Y).length() < 1e-5);
        }
    }

    #[test]
    fn degenerate_mesh_has_no_sampler() {
        let mesh = TriangleMesh {
            name: "line".into(),
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::X * 2.0],
            normals: Vec::new(),
            indices: vec![0, 1, 2],
        };
        assert!(MeshSurfaceSampler::new(&mesh).is_none());
        assert!(MeshSurfaceSampler::new(&TriangleMesh::default()).is_none());
    }
}
