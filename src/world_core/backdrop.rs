use glam::{Vec2, Vec3};
use rand::Rng;

use crate::world_core::color::Color;
use crate::world_core::config::BackdropConfig;

/// `fract(sin(seed * k) * 43758.5453)`, always in [0, 1).
fn hash(seed: f32, k: f32) -> f32 {
    ((seed * k).sin() * 43758.5453).rem_euclid(1.0)
}

/// Horizontal sway of a cloud billboard, derived entirely from its seed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloudDrift {
    /// +1 or -1.
    pub direction: f32,
    pub speed: f32,
    pub amplitude: f32,
    pub phase: f32,
}

impl CloudDrift {
    pub fn from_seed(seed: f32) -> Self {
        let r1 = hash(seed, 12.9898);
        let r2 = hash(seed, 78.233);
        let r3 = hash(seed, 37.719);
        let r4 = hash(seed, 93.989);
        Self {
            direction: if r1 > 0.5 { 1.0 } else { -1.0 },
            speed: 0.3 + r2 * 0.8,
            amplitude: 50.0 + r3 * 150.0,
            phase: r4 * std::f32::consts::TAU,
        }
    }

    /// X offset from the cloud's resting position.
    pub fn offset(&self, elapsed: f64) -> f32 {
        let time = elapsed * self.speed as f64 + self.phase as f64;
        (time / 100.0).sin() as f32 * self.amplitude * self.direction
    }
}

#[derive(Debug, Clone)]
pub struct Cloud {
    pub position: Vec3,
    pub scale: Vec2,
    pub drift: CloudDrift,
}

impl Cloud {
    pub fn position_at(&self, elapsed: f64) -> Vec3 {
        self.position + Vec3::X * self.drift.offset(elapsed)
    }
}

#[derive(Debug, Clone)]
pub struct Mountains {
    pub position: Vec3,
    /// Width and height of the billboard.
    pub size: Vec2,
    pub color: Color,
}

#[derive(Debug, Clone, Default)]
pub struct Backdrop {
    pub clouds: Vec<Cloud>,
    pub mountains: Option<Mountains>,
}

impl Backdrop {
    /// Clouds without a configured seed draw one from `rng`.
    pub fn new<R: Rng + ?Sized>(config: &BackdropConfig, rng: &mut R) -> Self {
        let clouds = config
            .clouds
            .iter()
            .map(|cloud| Cloud {
                position: Vec3::from(cloud.position),
                scale: Vec2::from(cloud.scale),
                drift: CloudDrift::from_seed(cloud.seed.unwrap_or_else(|| rng.random())),
            })
            .collect();
        let mountains = config.mountains.as_ref().map(|m| Mountains {
            position: Vec3::from(m.position),
            size: Vec2::new(m.scale * m.aspect, m.scale),
            color: m.color,
        });
        Self { clouds, mountains }
    }
}

#[cfg(test)]
mod tests {
    use super::{hash, Backdrop, CloudDrift};
    use crate::world_core::config::{BackdropConfig, CloudConfig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn hash_stays_in_unit_interval() {
        for i in 0..500 {
            let seed = i as f32 * 0.013 - 2.0;
            let h = hash(seed, 12.9898);
            assert!((0.0..1.0).contains(&h), "seed {seed}: {h}");
        }
    }

    #[test]
    fn drift_parameters_fall_in_their_ranges() {
        for i in 0..200 {
            let drift = CloudDrift::from_seed(i as f32 / 200.0);
            assert!(drift.direction == 1.0 || drift.direction == -1.0);
            assert!((0.3..=1.1).contains(&drift.speed));
            assert!((50.0..=200.0).contains(&drift.amplitude));
            assert!((0.0..=std::f32::consts::TAU).contains(&drift.phase));
        }
    }

    #[test]
    fn offset_stays_within_amplitude() {
        let drift = CloudDrift::from_seed(0.42);
        for step in 0..2000 {
            let offset = drift.offset(step as f64 * 3.7);
            assert!(offset.abs() <= drift.amplitude + 1e-3);
        }
    }

    #[test]
    fn negative_sines_wrap_into_the_upper_half() {
        assert!((0.3f32 * 78.233).sin() < 0.0);
        let drift = CloudDrift::from_seed(0.3);
        assert!((drift.speed - 0.84375).abs() < 1e-3, "speed {}", drift.speed);
    }

    #[test]
    fn same_seed_same_drift() {
        assert_eq!(CloudDrift::from_seed(0.25), CloudDrift::from_seed(0.25));
    }

    #[test]
    fn mountains_size_follows_aspect() {
        let mut rng = StdRng::seed_from_u64(1);
        let backdrop = Backdrop::new(&BackdropConfig::default(), &mut rng);
        let mountains = backdrop.mountains.unwrap();
        assert!((mountains.size.x / mountains.size.y - 3.82).abs() < 1e-4);
        assert_eq!(backdrop.clouds.len(), 2);
    }

    #[test]
    fn configured_seed_wins_over_rng() {
        let config = BackdropConfig {
            clouds: vec![CloudConfig {
                seed: Some(0.7),
                ..CloudConfig::default()
            }],
            mountains: None,
        };
        let a = Backdrop::new(&config, &mut StdRng::seed_from_u64(1));
        let b = Backdrop::new(&config, &mut StdRng::seed_from_u64(2));
        assert_eq!(a.clouds[0].drift, b.clouds[0].drift);
        assert!(a.mountains.is_none());
    }
}
