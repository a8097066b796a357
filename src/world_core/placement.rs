use glam::{Mat4, Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::world_core::surface_sampler::{SurfacePoint, SurfaceSampler};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// Rotate the instance's up axis onto the sampled surface normal.
    #[default]
    SurfaceNormal,
    /// Keep instances vertical regardless of slope.
    Upright,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlacementOptions {
    pub alignment: Alignment,
    /// Local rotation about X applied after the yaw, in radians.
    pub tilt: f32,
}

/// Deterministic when seeded, OS entropy otherwise.
pub fn placement_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Builds one transform per instance. Without a sampler there is nothing
/// to place on, so the result is empty.
pub fn build_transforms<S, R>(
    sampler: Option<&S>,
    count: usize,
    options: &PlacementOptions,
    rng: &mut R,
) -> Vec<Mat4>
where
    S: SurfaceSampler,
    R: Rng + ?Sized,
{
    let Some(sampler) = sampler else {
        return Vec::new();
    };

    (0..count)
        .map(|_| {
            let point = sampler.sample(rng);
            let yaw = rng.random_range(0.0..std::f32::consts::TAU);
            instance_transform(point, yaw, options)
        })
        .collect()
}

pub fn instance_transform(point: SurfacePoint, yaw: f32, options: &PlacementOptions) -> Mat4 {
    let alignment = match options.alignment {
        Alignment::SurfaceNormal => {
            let normal = point.normal.try_normalize().unwrap_or(Vec3::Y);
            Quat::from_rotation_arc(Vec3::Y, normal)
        }
        Alignment::Upright => Quat::IDENTITY,
    };
    let rotation = alignment * Quat::from_rotation_y(yaw) * Quat::from_rotation_x(options.tilt);
    Mat4::from_rotation_translation(rotation, point.position)
}
