use bytemuck::{Pod, Zeroable};

use super::geometry::{unit_quad, Vertex};
use super::instancing::{upload_instances, upload_mesh, GpuInstanceChunk, GpuMesh};
use super::pipeline::{create_render_pipeline, PipelineEntry, PipelineStyle};
use crate::world_core::backdrop::Backdrop;

const CLOUD: f32 = 0.0;
const MOUNTAINS: f32 = 1.0;

#[repr(C)]
#[derive(Clone, Copy, Debug, Zeroable, Pod)]
pub struct BillboardInstance {
    /// xyz: center, w: kind.
    pub center: [f32; 4],
    /// xy: width and height, z: shape seed.
    pub size: [f32; 4],
    pub color: [f32; 4],
}

impl BillboardInstance {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] = [
        wgpu::VertexAttribute {
            offset: 0,
            shader_location: 3,
            format: wgpu::VertexFormat::Float32x4,
        },
        wgpu::VertexAttribute {
            offset: 16,
            shader_location: 4,
            format: wgpu::VertexFormat::Float32x4,
        },
        wgpu::VertexAttribute {
            offset: 32,
            shader_location: 5,
            format: wgpu::VertexFormat::Float32x4,
        },
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<BillboardInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Mountains first so clouds in front of them blend over the ridge.
pub fn billboard_instances(backdrop: &Backdrop, elapsed: f64) -> Vec<BillboardInstance> {
    let mountains = backdrop.mountains.iter().map(|m| BillboardInstance {
        center: m.position.extend(MOUNTAINS).to_array(),
        size: [m.size.x, m.size.y, 0.0, 0.0],
        color: m.color.to_linear_rgb().extend(1.0).to_array(),
    });
    let clouds = backdrop.clouds.iter().map(|c| BillboardInstance {
        center: c.position_at(elapsed).extend(CLOUD).to_array(),
        size: [c.scale.x, c.scale.y, c.drift.phase, 0.0],
        color: [1.0; 4],
    });
    mountains.chain(clouds).collect()
}

pub struct BackdropPass {
    pipeline: wgpu::RenderPipeline,
    quad: Option<GpuMesh>,
    instances: Option<GpuInstanceChunk>,
}

impl BackdropPass {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        frame_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("backdrop-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/backdrop.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("backdrop-pipeline-layout"),
            bind_group_layouts: &[frame_layout],
            push_constant_ranges: &[],
        });

        let pipeline = create_render_pipeline(
            device,
            config,
            &pipeline_layout,
            &shader,
            &[Vertex::layout(), BillboardInstance::layout()],
            PipelineEntry::default(),
            PipelineStyle::DoubleSided,
            "backdrop-pipeline",
        );

        Self {
            pipeline,
            quad: upload_mesh(device, &unit_quad(), "backdrop-quad"),
            instances: None,
        }
    }

    pub fn sync_scene(&mut self, device: &wgpu::Device, backdrop: &Backdrop) {
        self.instances =
            upload_instances(device, &billboard_instances(backdrop, 0.0), "backdrop");
    }

    /// Moves the clouds along their drift.
    pub fn update(&self, queue: &wgpu::Queue, backdrop: &Backdrop, elapsed: f64) {
        let Some(instances) = &self.instances else {
            return;
        };
        let data = billboard_instances(backdrop, elapsed);
        if data.len() as u32 != instances.instance_count {
            log::warn!("backdrop changed without a resync, skipping update");
            return;
        }
        queue.write_buffer(&instances.instance_buffer, 0, bytemuck::cast_slice(&data));
    }

    pub fn render<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        let (Some(quad), Some(instances)) = (&self.quad, &self.instances) else {
            return;
        };
        pass.set_pipeline(&self.pipeline);
        pass.set_vertex_buffer(0, quad.vertex_buffer.slice(..));
        pass.set_vertex_buffer(1, instances.instance_buffer.slice(..));
        pass.set_index_buffer(quad.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..quad.index_count, 0, 0..instances.instance_count);
    }
}

#[cfg(test)]
mod tests {
    use super::{billboard_instances, CLOUD, MOUNTAINS};
    use crate::world_core::backdrop::Backdrop;
    use crate::world_core::config::BackdropConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn clouds_drift_and_mountains_stay_put() {
        let backdrop = Backdrop::new(&BackdropConfig::default(), &mut StdRng::seed_from_u64(3));
        let start = billboard_instances(&backdrop, 0.0);
        let later = billboard_instances(&backdrop, 120.0);

        assert_eq!(start.len(), 3);
        assert_eq!(start[0].center[3], MOUNTAINS);
        assert_eq!(start[0].center, later[0].center);

        for (i, cloud) in backdrop.clouds.iter().enumerate() {
            let a = start[i + 1];
            let b = later[i + 1];
            assert_eq!(a.center[3], CLOUD);
            assert_eq!(a.center[1], b.center[1]);
            let dx = (b.center[0] - cloud.position.x).abs();
            assert!(dx <= cloud.drift.amplitude + 1e-3);
        }
    }
}
