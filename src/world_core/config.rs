use serde::{Deserialize, Serialize};

use crate::world_core::color::Color;
use crate::world_core::keyframes::{default_keyframes, Keyframe, DEFAULT_KEYFRAME_DURATION};
use crate::world_core::placement::Alignment;
use crate::world_core::scene::VegetationKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Placement seed. Unset means a fresh layout on every launch.
    pub seed: Option<u64>,
    pub camera: CameraConfig,
    pub lighting: LightingConfig,
    pub terrain: TerrainConfig,
    pub tiles: Vec<TileConfig>,
    pub grass: GrassMaterialConfig,
    pub sway: SwayMaterialConfig,
    pub backdrop: BackdropConfig,
    pub particles: ParticleConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            seed: None,
            camera: CameraConfig::default(),
            lighting: LightingConfig::default(),
            terrain: TerrainConfig::default(),
            tiles: default_tiles(),
            grass: GrassMaterialConfig::default(),
            sway: SwayMaterialConfig::default(),
            backdrop: BackdropConfig::default(),
            particles: ParticleConfig::default(),
        }
    }
}

impl SceneConfig {
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &std::path::Path) -> Self {
        if !path.exists() {
            log::info!("no {} found, using defaults", path.display());
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                log::warn!("failed to parse {}: {e}, using defaults", path.display());
                Self::default()
            }),
            Err(e) => {
                log::warn!("failed to read {}: {e}, using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        let mut config: Self = serde_json::from_str(contents)?;
        config.lighting.sanitize();
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub look_at: [f32; 3],
    /// How far the pointer can push the camera away from `position`.
    pub max_offset: [f32; 2],
    /// Fraction of the remaining distance covered each frame.
    pub smoothing: f32,
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 5.0, 100.0],
            look_at: [0.0, 0.0, 0.0],
            max_offset: [5.0, 1.2],
            smoothing: 0.08,
            fov_y_degrees: 50.0,
            near: 0.1,
            far: 2000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub keyframe_duration: f32,
    pub keyframes: Vec<Keyframe>,
    /// The directional light shines from here towards the origin.
    pub light_position: [f32; 3],
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            keyframe_duration: DEFAULT_KEYFRAME_DURATION,
            keyframes: default_keyframes(),
            light_position: [5.0, 5.0, 5.0],
        }
    }
}

impl LightingConfig {
    fn sanitize(&mut self) {
        if self.keyframes.is_empty() {
            log::warn!("lighting.keyframes is empty, using the default day cycle");
            self.keyframes = default_keyframes();
        }
        if !(self.keyframe_duration.is_finite() && self.keyframe_duration > 0.0) {
            log::warn!(
                "lighting.keyframe_duration {} is not positive, using {DEFAULT_KEYFRAME_DURATION}",
                self.keyframe_duration
            );
            self.keyframe_duration = DEFAULT_KEYFRAME_DURATION;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NoiseLayer {
    pub frequency: f64,
    pub amplitude: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightmapConfig {
    pub rolling: NoiseLayer,
    pub detail: NoiseLayer,
    pub hills: NoiseLayer,
    /// Hills start rising beyond this z (towards -Z).
    pub hills_start_z: f32,
    /// Distance over which hills reach full amplitude.
    pub hills_ramp: f32,
}

impl Default for HeightmapConfig {
    fn default() -> Self {
        Self {
            rolling: NoiseLayer {
                frequency: 0.02,
                amplitude: 1.2,
            },
            detail: NoiseLayer {
                frequency: 0.09,
                amplitude: 0.25,
            },
            hills: NoiseLayer {
                frequency: 0.008,
                amplitude: 45.0,
            },
            hills_start_z: -30.0,
            hills_ramp: 200.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainPatchConfig {
    pub name: String,
    pub z_range: [f32; 2],
    pub half_width: f32,
    pub cell_size: f32,
}

impl Default for TerrainPatchConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            z_range: [0.0, 0.0],
            half_width: 50.0,
            cell_size: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub seed: u32,
    pub heightmap: HeightmapConfig,
    pub patches: Vec<TerrainPatchConfig>,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        let patch = |name: &str, z_range: [f32; 2], half_width: f32, cell_size: f32| {
            TerrainPatchConfig {
                name: name.to_string(),
                z_range,
                half_width,
                cell_size,
            }
        };
        Self {
            seed: 42,
            heightmap: HeightmapConfig::default(),
            patches: vec![
                patch("grassfield_verynear", [55.0, 95.0], 60.0, 2.0),
                patch("grassfield_near", [20.0, 55.0], 90.0, 2.5),
                patch("grassfield_medium", [-40.0, 20.0], 140.0, 4.0),
                patch("grassfield_far", [-140.0, -40.0], 220.0, 6.0),
                patch("grassfield_far001", [-300.0, -140.0], 360.0, 10.0),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VegetationConfig {
    pub kind: VegetationKind,
    pub instances: usize,
    /// Uniform scale applied to the prototype mesh.
    pub size: f32,
    pub alignment: Alignment,
    pub tilt_degrees: f32,
}

impl Default for VegetationConfig {
    fn default() -> Self {
        Self {
            kind: VegetationKind::Grass,
            instances: 0,
            size: 1.0,
            alignment: Alignment::SurfaceNormal,
            tilt_degrees: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TileConfig {
    /// Terrain sub-mesh this tile decorates.
    pub node: String,
    pub color: Color,
    pub hide: bool,
    pub vegetation: Vec<VegetationConfig>,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            node: String::new(),
            color: Color::WHITE,
            hide: false,
            vegetation: Vec::new(),
        }
    }
}

fn default_tiles() -> Vec<TileConfig> {
    let ground = Color::parse("#17640f").unwrap_or(Color::WHITE);
    let group = |kind, instances, size| VegetationConfig {
        kind,
        instances,
        size,
        ..VegetationConfig::default()
    };
    let tile = |node: &str, vegetation| TileConfig {
        node: node.to_string(),
        color: ground,
        hide: false,
        vegetation,
    };

    use VegetationKind::{Everlasting, Grass, Periwinkle, Poppy};
    vec![
        tile(
            "grassfield_verynear",
            vec![
                group(Grass, 500, 1.0),
                group(Poppy, 50, 0.5),
                group(Everlasting, 50, 0.4),
                group(Periwinkle, 50, 0.4),
            ],
        ),
        tile(
            "grassfield_near",
            vec![
                group(Grass, 500, 1.0),
                group(Poppy, 100, 0.5),
                group(Everlasting, 100, 0.4),
                group(Periwinkle, 100, 0.4),
            ],
        ),
        tile(
            "grassfield_medium",
            vec![
                group(Grass, 500, 1.5),
                group(Poppy, 50, 0.6),
                group(Everlasting, 50, 0.8),
                group(Periwinkle, 50, 0.8),
            ],
        ),
        tile(
            "grassfield_far",
            vec![
                group(Grass, 1000, 2.25),
                group(Poppy, 50, 1.0),
                group(Everlasting, 50, 1.2),
                group(Periwinkle, 50, 1.2),
            ],
        ),
        tile("grassfield_far001", vec![group(Grass, 800, 2.5)]),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrassMaterialConfig {
    pub base_color: Color,
    pub tip_color: Color,
    pub wind_tip_color: Color,
    pub wind_strength: f32,
    pub noise_scale: f32,
    pub max_distance: f32,
    pub max_displacement_distance: f32,
    /// Added to the time uniform once per frame.
    pub time_step: f32,
}

impl Default for GrassMaterialConfig {
    fn default() -> Self {
        let color = |hex: &str| Color::parse(hex).unwrap_or(Color::WHITE);
        Self {
            base_color: color("#000000"),
            tip_color: color("#589941"),
            wind_tip_color: color("#2e5f36"),
            wind_strength: 0.6,
            noise_scale: 0.01,
            max_distance: 250.0,
            max_displacement_distance: 75.0,
            time_step: 0.01,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwayMaterialConfig {
    pub wind_direction: [f32; 2],
    pub wind_strength: f32,
    pub time_step: f32,
}

impl Default for SwayMaterialConfig {
    fn default() -> Self {
        Self {
            wind_direction: [1.0, 0.0],
            wind_strength: 1.0,
            time_step: 0.03,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    pub position: [f32; 3],
    pub scale: [f32; 2],
    /// Drives the drift parameters. Unset picks a random seed.
    pub seed: Option<f32>,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 50.0, -300.0],
            scale: [100.0, 50.0],
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MountainsConfig {
    pub position: [f32; 3],
    pub scale: f32,
    /// Width over height of the backdrop plane.
    pub aspect: f32,
    pub color: Color,
}

impl Default for MountainsConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 10.0, -300.0],
            scale: 200.0,
            aspect: 3.82,
            color: Color::parse("#5b6f8a").unwrap_or(Color::WHITE),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackdropConfig {
    pub clouds: Vec<CloudConfig>,
    pub mountains: Option<MountainsConfig>,
}

impl Default for BackdropConfig {
    fn default() -> Self {
        Self {
            clouds: vec![
                CloudConfig {
                    position: [-150.0, 45.0, -290.0],
                    scale: [100.0, 50.0],
                    seed: None,
                },
                CloudConfig {
                    position: [200.0, 70.0, -310.0],
                    scale: [125.0, 125.0],
                    seed: None,
                },
            ],
            mountains: Some(MountainsConfig::default()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    pub enabled: bool,
    pub position: [f32; 3],
    /// Requested particles; a third of them are spawned.
    pub count: usize,
    /// Full extents of the spawn box around `position`.
    pub limit: [f32; 3],
    pub min_distance: f32,
    pub size: f32,
    pub color: Color,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            position: [0.0, 5.0, 60.0],
            count: 40,
            limit: [60.0, 5.0, 50.0],
            min_distance: 5.0,
            size: 0.5,
            color: Color::parse("#f2c14e").unwrap_or(Color::WHITE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SceneConfig;
    use crate::world_core::scene::VegetationKind;

    #[test]
    fn empty_json_yields_defaults() {
        let config = SceneConfig::from_json("{}").unwrap();
        assert_eq!(config.tiles.len(), 5);
        assert_eq!(config.lighting.keyframes.len(), 4);
        assert_eq!(config.camera.position, [0.0, 5.0, 100.0]);
        assert!(config.seed.is_none());
    }

    #[test]
    fn partial_tile_config_fills_in_defaults() {
        let json = r##"{
            "seed": 9,
            "tiles": [
                { "node": "grassfield_near", "color": "#17640f",
                  "vegetation": [ { "kind": "poppy", "instances": 12 } ] }
            ]
        }"##;
        let config = SceneConfig::from_json(json).unwrap();
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.tiles.len(), 1);
        let group = &config.tiles[0].vegetation[0];
        assert_eq!(group.kind, VegetationKind::Poppy);
        assert_eq!(group.instances, 12);
        assert_eq!(group.size, 1.0);
        assert!(!config.tiles[0].hide);
    }

    #[test]
    fn empty_keyframes_fall_back_to_the_day_cycle() {
        let json = r#"{ "lighting": { "keyframes": [], "keyframe_duration": -1 } }"#;
        let config = SceneConfig::from_json(json).unwrap();
        assert_eq!(config.lighting.keyframes.len(), 4);
        assert_eq!(config.lighting.keyframe_duration, 20.0);
    }

    #[test]
    fn default_groups_stand_upright() {
        let config = SceneConfig::default();
        let everlasting = config
            .tiles
            .iter()
            .flat_map(|t| &t.vegetation)
            .filter(|g| g.kind == VegetationKind::Everlasting)
            .count();
        assert_eq!(everlasting, 4);
        for tile in &config.tiles {
            for group in &tile.vegetation {
                assert_eq!(
                    group.tilt_degrees, 0.0,
                    "{} {}",
                    tile.node,
                    group.kind.label()
                );
            }
        }
    }

    #[test]
    fn bad_color_is_a_parse_error() {
        let json = r#"{ "grass": { "tip_color": "greenish" } }"#;
        assert!(SceneConfig::from_json(json).is_err());
    }
}
