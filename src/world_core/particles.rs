use glam::Vec3;
use rand::Rng;

use crate::world_core::config::ParticleConfig;

const MAX_ATTEMPTS_PER_PARTICLE: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    /// Spin about the view axis, in radians.
    pub rotation: f32,
}

/// Spawns `count / 3` particles uniformly inside the box of full extents
/// `limit` centred on `position`, rejecting any closer than `min_distance`
/// to the centre.
pub fn scatter_particles<R: Rng + ?Sized>(config: &ParticleConfig, rng: &mut R) -> Vec<Particle> {
    let spawn = config.count / 3;
    let center = Vec3::from(config.position);
    let limit = Vec3::from(config.limit).abs();

    // The farthest point from the centre is a box corner.
    if (limit * 0.5).length() <= config.min_distance {
        log::warn!(
            "particle box {:?} cannot hold points {} away from its centre, skipping particles",
            config.limit,
            config.min_distance
        );
        return Vec::new();
    }

    let mut particles = Vec::with_capacity(spawn);
    for _ in 0..spawn {
        let local = (0..MAX_ATTEMPTS_PER_PARTICLE).find_map(|_| {
            let p = Vec3::new(
                rng.random::<f32>() - 0.5,
                rng.random::<f32>() - 0.5,
                rng.random::<f32>() - 0.5,
            ) * limit;
            (p.length() >= config.min_distance).then_some(p)
        });
        let Some(local) = local else {
            log::warn!("gave up placing particles after {} of {spawn}", particles.len());
            break;
        };
        particles.push(Particle {
            position: center + local,
            rotation: rng.random_range(0.0..std::f32::consts::TAU),
        });
    }
    particles
}

#[cfg(test)]
mod tests {
    use super::scatter_particles;
    use crate::world_core::config::ParticleConfig;
    use glam::Vec3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn spawns_a_third_inside_the_box_outside_the_core() {
        let config = ParticleConfig::default();
        let particles = scatter_particles(&config, &mut StdRng::seed_from_u64(4));
        assert_eq!(particles.len(), config.count / 3);

        let center = Vec3::from(config.position);
        let half = Vec3::from(config.limit) * 0.5;
        for p in &particles {
            let local = p.position - center;
            assert!(local.length() >= config.min_distance);
            assert!(local.abs().cmple(half + 1e-4).all());
            assert!((0.0..std::f32::consts::TAU).contains(&p.rotation));
        }
    }

    #[test]
    fn box_too_small_for_min_distance_spawns_nothing() {
        let config = ParticleConfig {
            limit: [1.0, 1.0, 1.0],
            ..ParticleConfig::default()
        };
        assert!(scatter_particles(&config, &mut StdRng::seed_from_u64(4)).is_empty());
    }
}
