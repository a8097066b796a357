use glam::Mat4;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::world_core::backdrop::Backdrop;
use crate::world_core::color::Color;
use crate::world_core::config::{SceneConfig, TileConfig, VegetationConfig};
use crate::world_core::culling::Aabb;
use crate::world_core::particles::{scatter_particles, Particle};
use crate::world_core::placement::{build_transforms, placement_rng, PlacementOptions};
use crate::world_core::surface_sampler::MeshSurfaceSampler;
use crate::world_core::terrain::TerrainScene;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VegetationKind {
    Grass,
    Poppy,
    Everlasting,
    Periwinkle,
}

impl VegetationKind {
    pub const ALL: [Self; 4] = [Self::Grass, Self::Poppy, Self::Everlasting, Self::Periwinkle];

    pub fn label(self) -> &'static str {
        match self {
            Self::Grass => "grass",
            Self::Poppy => "poppy",
            Self::Everlasting => "everlasting",
            Self::Periwinkle => "periwinkle",
        }
    }
}

/// One instanced draw: a kind, a size and where each copy stands.
#[derive(Debug, Clone)]
pub struct VegetationGroup {
    pub kind: VegetationKind,
    pub size: f32,
    pub requested: usize,
    pub options: PlacementOptions,
    pub transforms: Vec<Mat4>,
}

impl VegetationGroup {
    fn from_config(config: &VegetationConfig) -> Self {
        Self {
            kind: config.kind,
            size: config.size,
            requested: config.instances,
            options: PlacementOptions {
                alignment: config.alignment,
                tilt: config.tilt_degrees.to_radians(),
            },
            transforms: Vec::new(),
        }
    }
}

pub struct Tile {
    pub node: String,
    pub color: Color,
    pub hidden: bool,
    /// Index into the terrain meshes; `None` when the node was not found.
    pub mesh: Option<usize>,
    pub bounds: Option<Aabb>,
    pub groups: Vec<VegetationGroup>,
}

impl Tile {
    fn new(config: &TileConfig, terrain: &TerrainScene) -> Self {
        let mesh = terrain.meshes().iter().position(|m| m.name == config.node);
        if mesh.is_none() {
            log::error!("mesh with name {} not found in the scene", config.node);
        }
        let bounds = mesh.and_then(|i| terrain.meshes()[i].bounds());

        Self {
            node: config.node.clone(),
            color: config.color,
            hidden: config.hide,
            mesh,
            bounds,
            groups: config
                .vegetation
                .iter()
                .map(VegetationGroup::from_config)
                .collect(),
        }
    }

    /// Recomputes every group's transforms from scratch.
    fn scatter(&mut self, terrain: &TerrainScene, density: f32, rng: &mut StdRng) {
        let sampler = self
            .mesh
            .and_then(|i| MeshSurfaceSampler::new(&terrain.meshes()[i]));
        if self.mesh.is_some() && sampler.is_none() {
            log::warn!("mesh {} has no surface area, skipping vegetation", self.node);
        }

        for group in &mut self.groups {
            let count = scaled_count(group.requested, density);
            group.transforms = build_transforms(sampler.as_ref(), count, &group.options, rng);
        }
    }

    pub fn instance_count(&self) -> usize {
        self.groups.iter().map(|g| g.transforms.len()).sum()
    }
}

fn scaled_count(requested: usize, density: f32) -> usize {
    (requested as f32 * density.max(0.0)).round() as usize
}

pub struct Scene {
    pub terrain: TerrainScene,
    pub tiles: Vec<Tile>,
    pub backdrop: Backdrop,
    pub particles: Vec<Particle>,
    density: f32,
    rng: StdRng,
}

impl Scene {
    /// `seed` overrides the config's placement seed.
    pub fn build(config: &SceneConfig, seed: Option<u64>) -> Self {
        let seed = seed.or(config.seed);
        match seed {
            Some(seed) => log::info!("placement seed: {seed}"),
            None => log::info!("placement seed: random"),
        }
        let mut rng = placement_rng(seed);

        let terrain = TerrainScene::generate(&config.terrain);
        let mut tiles: Vec<Tile> = config
            .tiles
            .iter()
            .map(|tile| Tile::new(tile, &terrain))
            .collect();
        for tile in &mut tiles {
            tile.scatter(&terrain, 1.0, &mut rng);
            log::debug!("tile {}: {} instances", tile.node, tile.instance_count());
        }

        let backdrop = Backdrop::new(&config.backdrop, &mut rng);
        let particles = if config.particles.enabled {
            scatter_particles(&config.particles, &mut rng)
        } else {
            Vec::new()
        };

        Self {
            terrain,
            tiles,
            backdrop,
            particles,
            density: 1.0,
            rng,
        }
    }

    pub fn density(&self) -> f32 {
        self.density
    }

    /// Rescales every group's instance count and re-places all of them.
    /// Returns `false` when the density did not change.
    pub fn set_density(&mut self, density: f32) -> bool {
        let density = density.clamp(0.0, 8.0);
        if (density - self.density).abs() < f32::EPSILON {
            return false;
        }
        self.density = density;
        for tile in &mut self.tiles {
            tile.scatter(&self.terrain, density, &mut self.rng);
        }
        log::info!(
            "vegetation density {:.2}: {} instances",
            density,
            self.instance_count()
        );
        true
    }

    pub fn instance_count(&self) -> usize {
        self.tiles.iter().map(Tile::instance_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::{Scene, VegetationKind};
    use crate::world_core::config::{SceneConfig, TileConfig, VegetationConfig};

    fn small_config() -> SceneConfig {
        let mut config = SceneConfig::default();
        config.tiles = vec![
            TileConfig {
                node: "grassfield_near".into(),
                vegetation: vec![
                    VegetationConfig {
                        kind: VegetationKind::Grass,
                        instances: 120,
                        ..VegetationConfig::default()
                    },
                    VegetationConfig {
                        kind: VegetationKind::Poppy,
                        instances: 15,
                        ..VegetationConfig::default()
                    },
                ],
                ..TileConfig::default()
            },
            TileConfig {
                node: "grassfield_missing".into(),
                vegetation: vec![VegetationConfig {
                    instances: 40,
                    ..VegetationConfig::default()
                }],
                ..TileConfig::default()
            },
        ];
        config
    }

    #[test]
    fn tiles_get_the_requested_instances() {
        let scene = Scene::build(&small_config(), Some(1));
        let near = &scene.tiles[0];
        assert_eq!(near.groups[0].transforms.len(), 120);
        assert_eq!(near.groups[1].transforms.len(), 15);

        let bounds = near.bounds.expect("near tile has bounds");
        for t in &near.groups[0].transforms {
            let p = t.w_axis.truncate();
            assert!(p.x >= bounds.min.x - 1e-3 && p.x <= bounds.max.x + 1e-3);
            assert!(p.z >= bounds.min.z - 1e-3 && p.z <= bounds.max.z + 1e-3);
        }
    }

    #[test]
    fn missing_node_renders_nothing() {
        let scene = Scene::build(&small_config(), Some(1));
        let missing = &scene.tiles[1];
        assert!(missing.mesh.is_none());
        assert!(missing.bounds.is_none());
        assert_eq!(missing.instance_count(), 0);
    }

    #[test]
    fn seed_makes_layout_reproducible() {
        let a = Scene::build(&small_config(), Some(5));
        let b = Scene::build(&small_config(), Some(5));
        assert_eq!(
            a.tiles[0].groups[0].transforms,
            b.tiles[0].groups[0].transforms
        );
    }

    #[test]
    fn density_change_rebuilds_counts() {
        let mut scene = Scene::build(&small_config(), Some(2));
        assert!(!scene.set_density(1.0));
        assert!(scene.set_density(0.5));
        assert_eq!(scene.tiles[0].groups[0].transforms.len(), 60);
        assert_eq!(scene.tiles[0].groups[1].transforms.len(), 8);
        assert!(scene.set_density(0.0));
        assert_eq!(scene.instance_count(), 0);
    }
}
