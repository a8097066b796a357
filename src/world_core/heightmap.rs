use noise::{NoiseFn, OpenSimplex};

use crate::world_core::config::HeightmapConfig;

/// Gentle rolling ground near the viewer that rises into hills with
/// distance along -Z.
pub struct Heightmap {
    rolling: OpenSimplex,
    detail: OpenSimplex,
    hills: OpenSimplex,
    config: HeightmapConfig,
}

impl Heightmap {
    pub fn new(seed: u32, config: HeightmapConfig) -> Self {
        Self {
            rolling: OpenSimplex::new(seed),
            detail: OpenSimplex::new(seed.wrapping_add(907)),
            hills: OpenSimplex::new(seed.wrapping_add(1701)),
            config,
        }
    }

    pub fn sample_height(&self, x: f32, z: f32) -> f32 {
        let c = &self.config;
        let xd = x as f64;
        let zd = z as f64;

        let rolling = self
            .rolling
            .get([xd * c.rolling.frequency, zd * c.rolling.frequency]) as f32;
        let detail = self
            .detail
            .get([xd * c.detail.frequency, zd * c.detail.frequency]) as f32;
        let hills = self
            .hills
            .get([xd * c.hills.frequency, zd * c.hills.frequency]) as f32
            * 0.5
            + 0.5;

        let ramp = if c.hills_ramp > 0.0 {
            ((c.hills_start_z - z) / c.hills_ramp).clamp(0.0, 1.0)
        } else {
            0.0
        };

        rolling * c.rolling.amplitude
            + detail * c.detail.amplitude
            + hills * c.hills.amplitude * ramp * ramp
    }
}

#[cfg(test)]
mod tests {
    use super::Heightmap;
    use crate::world_core::config::HeightmapConfig;

    #[test]
    fn foreground_stays_low_and_background_rises() {
        let config = HeightmapConfig::default();
        let map = Heightmap::new(42, config.clone());

        let limit = config.rolling.amplitude + config.detail.amplitude;
        for x in [-30.0, 0.0, 25.0] {
            assert!(map.sample_height(x, 60.0).abs() <= limit + 1e-3);
        }

        let far_max = (-60..=60)
            .map(|i| map.sample_height(i as f32 * 5.0, -280.0))
            .fold(f32::MIN, f32::max);
        assert!(far_max > limit);
    }

    #[test]
    fn same_seed_same_heights() {
        let a = Heightmap::new(7, HeightmapConfig::default());
        let b = Heightmap::new(7, HeightmapConfig::default());
        assert_eq!(a.sample_height(12.5, -40.0), b.sample_height(12.5, -40.0));
    }
}
