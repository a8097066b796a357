use bytemuck::{Pod, Zeroable};

use super::geometry::{unit_quad, Vertex};
use super::instancing::{upload_instances, upload_mesh, GpuInstanceChunk, GpuMesh};
use super::material::{uniform_layout, MaterialBindGroup, ParticleUniform, TimeStep};
use super::pipeline::{create_render_pipeline, PipelineEntry, PipelineStyle};
use crate::world_core::config::ParticleConfig;
use crate::world_core::particles::Particle;

const PARTICLE_TIME_STEP: TimeStep = TimeStep::Scaled(1.0 / 3.0);

#[repr(C)]
#[derive(Clone, Copy, Debug, Zeroable, Pod)]
struct ParticleInstance {
    /// xyz: position, w: rotation.
    position_rotation: [f32; 4],
}

impl ParticleInstance {
    const ATTRIBUTES: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
        offset: 0,
        shader_location: 3,
        format: wgpu::VertexFormat::Float32x4,
    }];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ParticleInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

pub struct ParticlePass {
    pipeline: wgpu::RenderPipeline,
    quad: Option<GpuMesh>,
    instances: Option<GpuInstanceChunk>,
    material: MaterialBindGroup,
    uniform: ParticleUniform,
}

impl ParticlePass {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        frame_layout: &wgpu::BindGroupLayout,
        particles: &ParticleConfig,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("particle-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/particles.wgsl").into()),
        });

        let material_layout = uniform_layout(
            device,
            wgpu::ShaderStages::VERTEX_FRAGMENT,
            "particle-material-layout",
        );
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("particle-pipeline-layout"),
            bind_group_layouts: &[frame_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let pipeline = create_render_pipeline(
            device,
            config,
            &pipeline_layout,
            &shader,
            &[Vertex::layout(), ParticleInstance::layout()],
            PipelineEntry::default(),
            PipelineStyle::Blended,
            "particle-pipeline",
        );

        let uniform = ParticleUniform {
            color: particles.color.to_linear_rgb().extend(1.0).to_array(),
            params: [particles.size, 0.0, 0.0, 0.0],
        };
        let material = MaterialBindGroup::new(device, &material_layout, &uniform, "particles");

        Self {
            pipeline,
            quad: upload_mesh(device, &unit_quad(), "particle-quad"),
            instances: None,
            material,
            uniform,
        }
    }

    pub fn sync_scene(&mut self, device: &wgpu::Device, particles: &[Particle]) {
        let data: Vec<ParticleInstance> = particles
            .iter()
            .map(|p| ParticleInstance {
                position_rotation: p.position.extend(p.rotation).to_array(),
            })
            .collect();
        self.instances = upload_instances(device, &data, "particles");
    }

    pub fn update(&mut self, queue: &wgpu::Queue, dt_seconds: f32) {
        self.uniform.params[1] = PARTICLE_TIME_STEP.advance(self.uniform.params[1], dt_seconds);
        self.material.update(queue, &self.uniform);
    }

    pub fn render<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        let (Some(quad), Some(instances)) = (&self.quad, &self.instances) else {
            return;
        };
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(1, &self.material.bind_group, &[]);
        pass.set_vertex_buffer(0, quad.vertex_buffer.slice(..));
        pass.set_vertex_buffer(1, instances.instance_buffer.slice(..));
        pass.set_index_buffer(quad.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..quad.index_count, 0, 0..instances.instance_count);
    }
}
