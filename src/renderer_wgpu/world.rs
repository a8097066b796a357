use glam::{Mat4, Vec3};

use super::backdrop_pass::BackdropPass;
use super::instanced_pass::VegetationPass;
use super::material::{FrameBindGroup, FrameUniform};
use super::particle_pass::ParticlePass;
use super::pipeline::DepthTexture;
use super::sky::clear_color;
use super::terrain_pass::TerrainPass;
use crate::world_core::config::SceneConfig;
use crate::world_core::culling::Frustum;
use crate::world_core::keyframes::Keyframe;
use crate::world_core::scene::Scene;

pub struct FrameInputs<'a> {
    pub view_proj: Mat4,
    pub camera_position: Vec3,
    pub environment: &'a Keyframe,
    pub elapsed: f64,
    pub dt_seconds: f32,
}

pub struct SceneRenderer {
    frame_bg: FrameBindGroup,
    depth: DepthTexture,
    backdrop: BackdropPass,
    terrain: TerrainPass,
    vegetation: VegetationPass,
    particles: ParticlePass,
    light_direction: Vec3,
    clear: wgpu::Color,
}

impl SceneRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_config: &wgpu::SurfaceConfiguration,
        config: &SceneConfig,
    ) -> Self {
        let frame_bg = FrameBindGroup::new(device);
        let layout = &frame_bg.layout;

        let backdrop = BackdropPass::new(device, surface_config, layout);
        let terrain = TerrainPass::new(device, surface_config, layout);
        let vegetation =
            VegetationPass::new(device, surface_config, layout, &config.grass, &config.sway);
        let particles = ParticlePass::new(device, surface_config, layout, &config.particles);

        // The light sits at `light_position` and shines at the origin.
        let light_direction = (-Vec3::from(config.lighting.light_position))
            .try_normalize()
            .unwrap_or(Vec3::NEG_Y);

        Self {
            frame_bg,
            depth: DepthTexture::new(device, surface_config, "scene-depth"),
            backdrop,
            terrain,
            vegetation,
            particles,
            light_direction,
            clear: wgpu::Color::BLACK,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) {
        self.depth = DepthTexture::new(device, config, "scene-depth");
    }

    /// Uploads everything the scene placed. Call again after placement
    /// changes.
    pub fn sync_scene(&mut self, device: &wgpu::Device, scene: &Scene) {
        self.backdrop.sync_scene(device, &scene.backdrop);
        self.terrain.sync_scene(device, scene);
        self.vegetation.sync_scene(device, scene);
        self.particles.sync_scene(device, &scene.particles);
    }

    pub fn sync_vegetation(&mut self, device: &wgpu::Device, scene: &Scene) {
        self.vegetation.sync_scene(device, scene);
    }

    /// Writes every uniform for this frame; `render` consumes them.
    pub fn update(&mut self, queue: &wgpu::Queue, frame: &FrameInputs, scene: &Scene) {
        self.frame_bg.update(
            queue,
            &FrameUniform::new(
                frame.view_proj,
                frame.camera_position,
                self.light_direction,
                frame.environment,
                frame.elapsed,
            ),
        );
        self.clear = clear_color(frame.environment);

        let frustum = Frustum::from_view_projection(frame.view_proj);
        self.vegetation.update(queue, frame.dt_seconds, &frustum);
        self.backdrop.update(queue, &scene.backdrop, frame.elapsed);
        self.particles.update(queue, frame.dt_seconds);
    }

    pub fn visible_tiles(&self) -> usize {
        self.vegetation.visible_tiles()
    }

    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scene-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_bind_group(0, &self.frame_bg.bind_group, &[]);
        self.backdrop.render(&mut pass);
        self.terrain.render(&mut pass);
        self.vegetation.render(&mut pass);
        self.particles.render(&mut pass);
    }
}
