use glam::Vec3;

use crate::world_core::config::{TerrainConfig, TerrainPatchConfig};
use crate::world_core::heightmap::Heightmap;
use crate::world_core::mesh::TriangleMesh;

/// The ground, split into named sub-meshes that tiles look up by name.
pub struct TerrainScene {
    meshes: Vec<TriangleMesh>,
}

impl TerrainScene {
    pub fn generate(config: &TerrainConfig) -> Self {
        let heightmap = Heightmap::new(config.seed, config.heightmap.clone());
        let meshes = config
            .patches
            .iter()
            .filter_map(|patch| {
                let mesh = build_patch(&heightmap, patch);
                if mesh.indices.is_empty() {
                    log::warn!("terrain patch {} produced no triangles", patch.name);
                    None
                } else {
                    Some(mesh)
                }
            })
            .collect();
        Self::from_meshes(meshes)
    }

    pub fn from_meshes(meshes: Vec<TriangleMesh>) -> Self {
        Self { meshes }
    }

    #[cfg(test)]
    pub fn mesh_by_name(&self, name: &str) -> Option<&TriangleMesh> {
        self.meshes.iter().find(|m| m.name == name)
    }

    pub fn meshes(&self) -> &[TriangleMesh] {
        &self.meshes
    }
}

fn build_patch(heightmap: &Heightmap, patch: &TerrainPatchConfig) -> TriangleMesh {
    let z_min = patch.z_range[0].min(patch.z_range[1]);
    let z_max = patch.z_range[0].max(patch.z_range[1]);
    let width = patch.half_width.max(0.0) * 2.0;
    let depth = z_max - z_min;
    let cell = patch.cell_size.max(0.1);

    let cols = ((width / cell).ceil() as usize).max(1) + 1;
    let rows = ((depth / cell).ceil() as usize).max(1) + 1;
    if width <= 0.0 || depth <= 0.0 {
        return TriangleMesh {
            name: patch.name.clone(),
            ..Default::default()
        };
    }

    let step_x = width / (cols - 1) as f32;
    let step_z = depth / (rows - 1) as f32;
    let origin_x = -patch.half_width;
    let total = cols * rows;

    let positions: Vec<Vec3> = par_map_collect!(0..total, |idx| {
        let x = origin_x + (idx % cols) as f32 * step_x;
        let z = z_min + (idx / cols) as f32 * step_z;
        Vec3::new(x, heightmap.sample_height(x, z), z)
    });

    // Central differences against the heightmap so normals match across
    // patch seams.
    let normals: Vec<Vec3> = positions
        .iter()
        .map(|p| {
            let d = step_x.min(step_z);
            let h_l = heightmap.sample_height(p.x - d, p.z);
            let h_r = heightmap.sample_height(p.x + d, p.z);
            let h_d = heightmap.sample_height(p.x, p.z - d);
            let h_u = heightmap.sample_height(p.x, p.z + d);
            Vec3::new(h_l - h_r, d * 2.0, h_d - h_u).normalize()
        })
        .collect();

    let mut indices = Vec::with_capacity((cols - 1) * (rows - 1) * 6);
    for z in 0..(rows - 1) {
        for x in 0..(cols - 1) {
            let i0 = (z * cols + x) as u32;
            let i1 = i0 + 1;
            let i2 = i0 + cols as u32;
            let i3 = i2 + 1;
            indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
        }
    }

    TriangleMesh {
        name: patch.name.clone(),
        positions,
        normals,
        indices,
    }
}

#[cfg(test)]
mod tests {
    use super::TerrainScene;
    use crate::world_core::config::{TerrainConfig, TerrainPatchConfig};
    use crate::world_core::mesh::face_normal;
    use glam::Vec3;

    #[test]
    fn default_terrain_exposes_every_named_patch() {
        let config = TerrainConfig::default();
        let scene = TerrainScene::generate(&config);
        for patch in &config.patches {
            let mesh = scene
                .mesh_by_name(&patch.name)
                .unwrap_or_else(|| panic!("missing {}", patch.name));
            assert!(mesh.triangle_count() > 0);
            assert_eq!(mesh.normals.len(), mesh.positions.len());
        }
        assert!(scene.mesh_by_name("grassfield_nowhere").is_none());
    }

    #[test]
    fn patch_spans_its_configured_extent_and_faces_up() {
        let config = TerrainConfig {
            patches: vec![TerrainPatchConfig {
                name: "strip".into(),
                z_range: [10.0, -10.0],
                half_width: 30.0,
                cell_size: 4.0,
            }],
            ..TerrainConfig::default()
        };
        let scene = TerrainScene::generate(&config);
        let mesh = scene.mesh_by_name("strip").unwrap();
        let bounds = mesh.bounds().unwrap();

        assert!((bounds.min.x + 30.0).abs() < 1e-4);
        assert!((bounds.max.x - 30.0).abs() < 1e-4);
        assert!((bounds.min.z + 10.0).abs() < 1e-4);
        assert!((bounds.max.z - 10.0).abs() < 1e-4);

        for t in 0..mesh.triangle_count() {
            let [a, b, c] = mesh.triangle(t);
            assert!(face_normal(a, b, c).dot(Vec3::Y) > 0.0);
        }
    }

    #[test]
    fn zero_sized_patch_is_dropped() {
        let config = TerrainConfig {
            patches: vec![TerrainPatchConfig {
                name: "flat".into(),
                z_range: [5.0, 5.0],
                half_width: 10.0,
                cell_size: 1.0,
            }],
            ..TerrainConfig::default()
        };
        assert!(TerrainScene::generate(&config).meshes().is_empty());
    }
}
