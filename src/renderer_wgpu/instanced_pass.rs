use super::geometry::{prototype_mesh, Vertex};
use super::instancing::{
    build_instances, upload_instances, upload_mesh, GpuInstanceChunk, GpuMesh, InstanceData,
};
use super::material::{uniform_layout, MaterialBindGroup, VegetationMaterial};
use super::pipeline::{create_render_pipeline, PipelineEntry, PipelineStyle};
use crate::world_core::config::{GrassMaterialConfig, SwayMaterialConfig};
use crate::world_core::culling::{is_visible, Aabb, Frustum};
use crate::world_core::scene::{Scene, VegetationKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shading {
    Grass,
    Sway,
}

/// Geometry and material shared by every group of one kind.
struct KindResources {
    kind: VegetationKind,
    shading: Shading,
    mesh: GpuMesh,
    /// Prototype height before instance scaling, for cull bounds.
    height: f32,
    material: VegetationMaterial,
    bind_group: MaterialBindGroup,
}

struct GroupInstances {
    tile: usize,
    kind: VegetationKind,
    gpu: GpuInstanceChunk,
}

pub struct VegetationPass {
    grass_pipeline: wgpu::RenderPipeline,
    sway_pipeline: wgpu::RenderPipeline,
    kinds: Vec<KindResources>,
    groups: Vec<GroupInstances>,
    cull_bounds: Vec<Option<Aabb>>,
    tile_visible: Vec<bool>,
}

impl VegetationPass {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        frame_layout: &wgpu::BindGroupLayout,
        grass: &GrassMaterialConfig,
        sway: &SwayMaterialConfig,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("vegetation-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/vegetation.wgsl").into()),
        });

        let material_layout = uniform_layout(
            device,
            wgpu::ShaderStages::VERTEX_FRAGMENT,
            "vegetation-material-layout",
        );
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("vegetation-pipeline-layout"),
            bind_group_layouts: &[frame_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let buffers = [Vertex::layout(), InstanceData::layout()];
        let grass_pipeline = create_render_pipeline(
            device,
            config,
            &pipeline_layout,
            &shader,
            &buffers,
            PipelineEntry {
                vertex: "vs_grass",
                fragment: "fs_grass",
            },
            PipelineStyle::DoubleSided,
            "grass-pipeline",
        );
        let sway_pipeline = create_render_pipeline(
            device,
            config,
            &pipeline_layout,
            &shader,
            &buffers,
            PipelineEntry {
                vertex: "vs_sway",
                fragment: "fs_sway",
            },
            PipelineStyle::DoubleSided,
            "sway-pipeline",
        );

        let kinds = VegetationKind::ALL
            .into_iter()
            .filter_map(|kind| {
                let cpu = prototype_mesh(kind);
                let Some(mesh) = upload_mesh(device, &cpu, kind.label()) else {
                    log::warn!("{} prototype is empty, it will not be drawn", kind.label());
                    return None;
                };
                let (shading, material) = match kind {
                    VegetationKind::Grass => (Shading::Grass, VegetationMaterial::grass(grass)),
                    _ => (Shading::Sway, VegetationMaterial::sway(sway)),
                };
                let bind_group = MaterialBindGroup::new(
                    device,
                    &material_layout,
                    &material.uniform(),
                    kind.label(),
                );
                Some(KindResources {
                    kind,
                    shading,
                    mesh,
                    height: cpu.height(),
                    material,
                    bind_group,
                })
            })
            .collect();

        Self {
            grass_pipeline,
            sway_pipeline,
            kinds,
            groups: Vec::new(),
            cull_bounds: Vec::new(),
            tile_visible: Vec::new(),
        }
    }

    /// Drops every instance buffer and uploads the scene's current
    /// transforms. Called at startup and whenever placement changes.
    pub fn sync_scene(&mut self, device: &wgpu::Device, scene: &Scene) {
        self.groups.clear();
        self.cull_bounds.clear();

        for (tile_index, tile) in scene.tiles.iter().enumerate() {
            let mut reach = 0.0f32;
            for group in &tile.groups {
                let instances = build_instances(&group.transforms, group.size);
                let label = format!("{}-{}", tile.node, group.kind.label());
                if let Some(gpu) = upload_instances(device, &instances, &label) {
                    self.groups.push(GroupInstances {
                        tile: tile_index,
                        kind: group.kind,
                        gpu,
                    });
                }
                reach = reach.max(self.prototype_height(group.kind) * group.size);
            }
            self.cull_bounds.push(tile.bounds.map(|b| b.extended_up(reach)));
        }
        self.tile_visible = vec![true; self.cull_bounds.len()];

        log::info!(
            "uploaded {} vegetation groups ({} instances)",
            self.groups.len(),
            self.groups
                .iter()
                .map(|g| g.gpu.instance_count as usize)
                .sum::<usize>()
        );
    }

    fn prototype_height(&self, kind: VegetationKind) -> f32 {
        self.kinds
            .iter()
            .find(|k| k.kind == kind)
            .map_or(1.0, |k| k.height)
    }

    /// Advances every material once and refreshes per-tile visibility.
    pub fn update(&mut self, queue: &wgpu::Queue, dt_seconds: f32, frustum: &Frustum) {
        for kind in &mut self.kinds {
            let uniform = kind.material.advance(dt_seconds);
            kind.bind_group.update(queue, &uniform);
        }
        self.tile_visible = tile_visibility(frustum, &self.cull_bounds);
    }

    pub fn visible_tiles(&self) -> usize {
        self.tile_visible.iter().filter(|v| **v).count()
    }

    pub fn render<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        for kind in &self.kinds {
            let mut groups = self
                .groups
                .iter()
                .filter(|g| g.kind == kind.kind && self.tile_visible[g.tile])
                .peekable();
            if groups.peek().is_none() {
                continue;
            }

            pass.set_pipeline(match kind.shading {
                Shading::Grass => &self.grass_pipeline,
                Shading::Sway => &self.sway_pipeline,
            });
            pass.set_bind_group(1, &kind.bind_group.bind_group, &[]);
            pass.set_vertex_buffer(0, kind.mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(kind.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            for group in groups {
                pass.set_vertex_buffer(1, group.gpu.instance_buffer.slice(..));
                pass.draw_indexed(0..kind.mesh.index_count, 0, 0..group.gpu.instance_count);
            }
        }
    }
}

fn tile_visibility(frustum: &Frustum, bounds: &[Option<Aabb>]) -> Vec<bool> {
    bounds
        .iter()
        .map(|b| is_visible(frustum, b.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::tile_visibility;
    use crate::world_core::culling::{Aabb, Frustum};
    use glam::{Mat4, Vec3};

    #[test]
    fn tiles_behind_the_camera_are_culled() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 5.0, 100.0), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(50f32.to_radians(), 16.0 / 9.0, 0.1, 2000.0);
        let frustum = Frustum::from_view_projection(proj * view);

        let ahead = Aabb::new(Vec3::new(-60.0, -2.0, 20.0), Vec3::new(60.0, 3.0, 55.0));
        let behind = Aabb::new(Vec3::new(-10.0, 0.0, 150.0), Vec3::new(10.0, 2.0, 180.0));

        let visible = tile_visibility(&frustum, &[Some(ahead), Some(behind), None]);
        assert_eq!(visible, vec![true, false, true]);
    }
}
