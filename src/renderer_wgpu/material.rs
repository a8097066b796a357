use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};
use wgpu::util::DeviceExt;

use crate::world_core::config::{GrassMaterialConfig, SwayMaterialConfig};
use crate::world_core::color::Color;
use crate::world_core::keyframes::{Keyframe, KeyframeCycle, LightKeyframe};

#[repr(C)]
#[derive(Clone, Copy, Zeroable, Pod)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    /// Direction the light travels, normalized.
    pub light_direction: [f32; 4],
    pub directional_color: [f32; 4],
    pub ambient_color: [f32; 4],
    pub sky_color: [f32; 4],
    /// x: elapsed seconds, y: cloud brightness, z: mountain brightness.
    pub time: [f32; 4],
}

fn light_rgb(light: &LightKeyframe) -> [f32; 4] {
    let rgb = light.color.to_linear_rgb() * light.intensity;
    [rgb.x, rgb.y, rgb.z, light.intensity]
}

impl FrameUniform {
    pub fn new(
        view_proj: Mat4,
        camera_position: Vec3,
        light_direction: Vec3,
        environment: &Keyframe,
        elapsed: f64,
    ) -> Self {
        let sky = environment.sky_color.to_linear_rgb();
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            camera_position: camera_position.extend(1.0).to_array(),
            light_direction: light_direction.normalize_or_zero().extend(0.0).to_array(),
            directional_color: light_rgb(&environment.directional_light),
            ambient_color: light_rgb(&environment.ambient_light),
            sky_color: sky.extend(1.0).to_array(),
            time: [
                // Wrapped hourly for f32 precision.
                (elapsed % 3600.0) as f32,
                environment.clouds_brightness,
                environment.mountains_brightness,
                0.0,
            ],
        }
    }
}

/// How a material's time uniform advances each rendered frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeStep {
    /// Fixed increment per frame, regardless of frame duration.
    PerFrame(f32),
    /// `delta * factor` per frame.
    Scaled(f32),
}

impl TimeStep {
    pub fn advance(self, time: f32, dt_seconds: f32) -> f32 {
        match self {
            Self::PerFrame(step) => time + step,
            Self::Scaled(factor) => time + dt_seconds.max(0.0) * factor,
        }
    }
}

/// Shared by the grass and sway shaders; each reads the fields it needs.
#[repr(C)]
#[derive(Clone, Copy, Debug, Zeroable, Pod)]
pub struct VegetationUniform {
    pub base_color: [f32; 4],
    pub tip_color: [f32; 4],
    pub wind_tip_color: [f32; 4],
    /// strength, noise scale, max distance, max displacement distance.
    pub wind: [f32; 4],
    /// direction.xy, strength, time.
    pub sway: [f32; 4],
}

/// CPU side of a vegetation material: its parameters plus the animated time.
#[derive(Debug, Clone)]
pub struct VegetationMaterial {
    uniform: VegetationUniform,
    step: TimeStep,
    time: f32,
}

impl VegetationMaterial {
    pub fn grass(config: &GrassMaterialConfig) -> Self {
        let color = |c: Color| c.to_linear_rgb().extend(1.0).to_array();
        Self {
            uniform: VegetationUniform {
                base_color: color(config.base_color),
                tip_color: color(config.tip_color),
                wind_tip_color: color(config.wind_tip_color),
                wind: [
                    config.wind_strength,
                    config.noise_scale,
                    config.max_distance,
                    config.max_displacement_distance,
                ],
                sway: [1.0, 0.0, 0.0, 0.0],
            },
            step: TimeStep::PerFrame(config.time_step),
            time: 0.0,
        }
    }

    pub fn sway(config: &SwayMaterialConfig) -> Self {
        let direction = Vec2::from(config.wind_direction).normalize_or(Vec2::X);
        Self {
            uniform: VegetationUniform {
                base_color: [1.0; 4],
                tip_color: [1.0; 4],
                wind_tip_color: [1.0; 4],
                wind: [0.0; 4],
                sway: [direction.x, direction.y, config.wind_strength, 0.0],
            },
            step: TimeStep::PerFrame(config.time_step),
            time: 0.0,
        }
    }

    /// Advances time by one frame and returns the uniform to upload.
    pub fn advance(&mut self, dt_seconds: f32) -> VegetationUniform {
        self.time = self.step.advance(self.time, dt_seconds);
        let mut uniform = self.uniform;
        uniform.sway[3] = self.time;
        uniform
    }

    pub fn uniform(&self) -> VegetationUniform {
        let mut uniform = self.uniform;
        uniform.sway[3] = self.time;
        uniform
    }
}

#[repr(C)]
#[derive(Clone, Copy, Zeroable, Pod)]
pub struct ParticleUniform {
    pub color: [f32; 4],
    /// size, time.
    pub params: [f32; 4],
}

pub fn uniform_layout(
    device: &wgpu::Device,
    visibility: wgpu::ShaderStages,
    label: &str,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

pub struct FrameBindGroup {
    pub layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
    buffer: wgpu::Buffer,
}

impl FrameBindGroup {
    pub fn new(device: &wgpu::Device) -> Self {
        let layout = uniform_layout(
            device,
            wgpu::ShaderStages::VERTEX_FRAGMENT,
            "frame-bind-group-layout",
        );
        let initial = FrameUniform::new(
            Mat4::IDENTITY,
            Vec3::ZERO,
            Vec3::NEG_Y,
            &KeyframeCycle::default().sample(0.0),
            0.0,
        );
        let MaterialBindGroup { buffer, bind_group } =
            MaterialBindGroup::new(device, &layout, &initial, "frame");
        Self {
            layout,
            bind_group,
            buffer,
        }
    }

    pub fn update(&self, queue: &wgpu::Queue, uniform: &FrameUniform) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[*uniform]));
    }
}

/// A single uniform buffer bound at binding 0 of its group.
pub struct MaterialBindGroup {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl MaterialBindGroup {
    pub fn new<T: Pod>(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        initial: &T,
        label: &str,
    ) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-uniform-buffer")),
            contents: bytemuck::bytes_of(initial),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label}-bind-group")),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        Self { buffer, bind_group }
    }

    pub fn update<T: Pod>(&self, queue: &wgpu::Queue, data: &T) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(data));
    }
}
