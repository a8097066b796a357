use glam::Vec3;

use crate::world_core::keyframes::Keyframe;

/// Clear color for the frame. The surface is sRGB, so the linear sky color
/// is passed through as is.
pub fn clear_color(environment: &Keyframe) -> wgpu::Color {
    let sky = environment
        .sky_color
        .to_linear_rgb()
        .clamp(Vec3::ZERO, Vec3::ONE);
    wgpu::Color {
        r: sky.x as f64,
        g: sky.y as f64,
        b: sky.z as f64,
        a: 1.0,
    }
}
