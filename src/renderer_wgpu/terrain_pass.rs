use glam::Vec3;

use super::geometry::{CpuMesh, Vertex};
use super::instancing::{upload_mesh, GpuMesh};
use super::pipeline::{create_render_pipeline, PipelineEntry, PipelineStyle};
use crate::world_core::color::Color;
use crate::world_core::mesh::TriangleMesh;
use crate::world_core::scene::Scene;

/// Ground color for terrain meshes no tile claims.
const UNCLAIMED_GROUND: [f32; 3] = [0.05, 0.16, 0.03];

pub struct TerrainPass {
    pipeline: wgpu::RenderPipeline,
    meshes: Vec<GpuMesh>,
}

impl TerrainPass {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        frame_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("terrain-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/terrain.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("terrain-pipeline-layout"),
            bind_group_layouts: &[frame_layout],
            push_constant_ranges: &[],
        });

        let pipeline = create_render_pipeline(
            device,
            config,
            &pipeline_layout,
            &shader,
            &[Vertex::layout()],
            PipelineEntry::default(),
            PipelineStyle::Opaque,
            "terrain-pipeline",
        );

        Self {
            pipeline,
            meshes: Vec::new(),
        }
    }

    /// Uploads every terrain mesh in its tile's color; hidden tiles are
    /// left out.
    pub fn sync_scene(&mut self, device: &wgpu::Device, scene: &Scene) {
        self.meshes.clear();
        for (index, mesh) in scene.terrain.meshes().iter().enumerate() {
            let tile = scene.tiles.iter().find(|t| t.mesh == Some(index));
            if tile.is_some_and(|t| t.hidden) {
                continue;
            }
            let color = tile.map_or(UNCLAIMED_GROUND, |t| ground_color(t.color));
            if let Some(gpu) = upload_mesh(device, &colored_mesh(mesh, color), &mesh.name) {
                self.meshes.push(gpu);
            }
        }
    }

    pub fn render<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        pass.set_pipeline(&self.pipeline);
        for mesh in &self.meshes {
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}

fn ground_color(color: Color) -> [f32; 3] {
    color.to_linear_rgb().to_array()
}

fn colored_mesh(mesh: &TriangleMesh, color: [f32; 3]) -> CpuMesh {
    let vertices = mesh
        .positions
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            let normal = mesh.normals.get(i).copied().unwrap_or(Vec3::Y);
            Vertex::new(p, normal, color)
        })
        .collect();
    CpuMesh {
        vertices,
        indices: mesh.indices.clone(),
    }
}
