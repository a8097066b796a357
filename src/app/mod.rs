use anyhow::Result;
use wgpu::SurfaceError;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::window::Window;

use crate::renderer_wgpu::camera::{ParallaxCamera, PointerController};
use crate::renderer_wgpu::gpu_context::GpuContext;
use crate::renderer_wgpu::world::{FrameInputs, SceneRenderer};
use crate::world_core::config::SceneConfig;
use crate::world_core::keyframes::KeyframeCycle;
use crate::world_core::scene::Scene;

#[cfg(not(target_arch = "wasm32"))]
use crate::launch::LaunchOptions;

#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

mod event_loop;

pub use event_loop::run_event_loop;
#[cfg(target_arch = "wasm32")]
pub use event_loop::run_event_loop_web;

pub struct AppState {
    window: &'static Window,
    gpu: GpuContext,
    scene: Scene,
    renderer: SceneRenderer,
    camera: ParallaxCamera,
    pointer: PointerController,
    environment: KeyframeCycle,
    last_frame: Instant,
    frame_time_ms: f32,
    elapsed_seconds: f64,
}

impl AppState {
    #[cfg(not(target_arch = "wasm32"))]
    pub async fn new(window: &'static Window, options: LaunchOptions) -> Result<Self> {
        let config = SceneConfig::load(&options.config_path);
        Self::with_config(window, config, options.seed).await
    }

    #[cfg(target_arch = "wasm32")]
    pub async fn new_web(window: &'static Window) -> Result<Self> {
        Self::with_config(window, SceneConfig::default(), None).await
    }

    async fn with_config(
        window: &'static Window,
        config: SceneConfig,
        seed: Option<u64>,
    ) -> Result<Self> {
        let gpu = GpuContext::new(window).await?;

        let scene = Scene::build(&config, seed);
        log::info!(
            "scene: {} tiles, {} vegetation instances, {} particles",
            scene.tiles.len(),
            scene.instance_count(),
            scene.particles.len()
        );

        let mut renderer = SceneRenderer::new(&gpu.device, &gpu.config, &config);
        renderer.sync_scene(&gpu.device, &scene);

        let environment = KeyframeCycle::new(
            config.lighting.keyframes.clone(),
            config.lighting.keyframe_duration,
        )
        .unwrap_or_else(|e| {
            log::warn!("invalid lighting keyframes, using defaults: {e}");
            KeyframeCycle::default()
        });

        Ok(Self {
            window,
            camera: ParallaxCamera::new(&config.camera),
            pointer: PointerController::new(gpu.size),
            gpu,
            scene,
            renderer,
            environment,
            last_frame: Instant::now(),
            frame_time_ms: 0.0,
            elapsed_seconds: 0.0,
        })
    }

    fn process_window_event(&mut self, event: &WindowEvent) {
        let _ = self.pointer.process_window_event(event);
    }

    /// Multiplies the vegetation density and re-uploads the instances.
    fn scale_density(&mut self, factor: f32) {
        if self.scene.set_density(self.scene.density() * factor) {
            self.renderer.sync_vegetation(&self.gpu.device, &self.scene);
        }
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.gpu.resize(new_size);
        self.renderer.resize(&self.gpu.device, &self.gpu.config);
    }

    fn update(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.frame_time_ms = self.frame_time_ms * 0.94 + (dt * 1000.0) * 0.06;
        self.elapsed_seconds += dt as f64;

        self.camera.update(self.pointer.pointer());

        let environment = self.environment.sample(self.elapsed_seconds);
        let frame = FrameInputs {
            view_proj: self.camera.view_projection(self.gpu.aspect()),
            camera_position: self.camera.position,
            environment: &environment,
            elapsed: self.elapsed_seconds,
            dt_seconds: dt,
        };
        self.renderer.update(&self.gpu.queue, &frame, &self.scene);

        self.window.set_title(&format!(
            "grass-field | {:.1}ms ({:.0}fps) | instances: {} | visible tiles: {}/{} | density: {:.2}",
            self.frame_time_ms,
            1000.0 / self.frame_time_ms.max(0.01),
            self.scene.instance_count(),
            self.renderer.visible_tiles(),
            self.scene.tiles.len(),
            self.scene.density(),
        ));
    }

    fn render(&mut self) -> Result<(), SurfaceError> {
        let output = self.gpu.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("grass-field-render-encoder"),
            });

        self.renderer.render(&mut encoder, &view);

        self.gpu.queue.submit(Some(encoder.finish()));
        output.present();
        Ok(())
    }
}
