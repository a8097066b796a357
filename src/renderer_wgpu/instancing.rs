use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use super::geometry::CpuMesh;

/// Per-instance model matrix, uploaded as four column vectors.
#[repr(C)]
#[derive(Clone, Copy, Debug, Zeroable, Pod)]
pub struct InstanceData {
    pub model: [[f32; 4]; 4],
}

impl InstanceData {
    const ATTRIBUTES: [wgpu::VertexAttribute; 4] = [
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
        wgpu::VertexAttribute {
            offset: 48,
            shader_location: 6,
            format: wgpu::VertexFormat::Float32x4,
        },
    ];

    /// Bakes a uniform `size` under the placement transform.
    pub fn new(transform: Mat4, size: f32) -> Self {
        Self {
            model: (transform * Mat4::from_scale(Vec3::splat(size))).to_cols_array_2d(),
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

pub fn build_instances(transforms: &[Mat4], size: f32) -> Vec<InstanceData> {
    transforms
        .iter()
        .map(|&t| InstanceData::new(t, size))
        .collect()
}

pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

pub struct GpuInstanceChunk {
    pub instance_buffer: wgpu::Buffer,
    pub instance_count: u32,
}

/// `None` for an empty mesh; there is nothing to draw.
pub fn upload_mesh(device: &wgpu::Device, mesh: &CpuMesh, label: &str) -> Option<GpuMesh> {
    if mesh.indices.is_empty() {
        return None;
    }
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{label}-vb")),
        contents: bytemuck::cast_slice(&mesh.vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{label}-ib")),
        contents: bytemuck::cast_slice(&mesh.indices),
        usage: wgpu::BufferUsages::INDEX,
    });
    Some(GpuMesh {
        vertex_buffer,
        index_buffer,
        index_count: mesh.indices.len() as u32,
    })
}

/// Zero instances are never uploaded.
pub fn upload_instances<T: Pod>(
    device: &wgpu::Device,
    instances: &[T],
    label: &str,
) -> Option<GpuInstanceChunk> {
    if instances.is_empty() {
        return None;
    }
    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{label}-instance-buf")),
        contents: bytemuck::cast_slice(instances),
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    });
    Some(GpuInstanceChunk {
        instance_buffer: buffer,
        instance_count: instances.len() as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::{build_instances, InstanceData};
    use glam::{Mat4, Quat, Vec3};

    #[test]
    fn size_scales_about_the_instance_origin() {
        let transform = Mat4::from_rotation_translation(
            Quat::from_rotation_y(0.7),
            Vec3::new(3.0, 1.0, -2.0),
        );
        let data = InstanceData::new(transform, 2.5);
        let model = Mat4::from_cols_array_2d(&data.model);

        assert!((model.transform_point3(Vec3::ZERO) - Vec3::new(3.0, 1.0, -2.0)).length() < 1e-5);
        let up = model.transform_vector3(Vec3::Y);
        assert!((up - Vec3::Y * 2.5).length() < 1e-5);
    }

    #[test]
    fn one_instance_per_transform() {
        let transforms = vec![Mat4::IDENTITY; 9];
        assert_eq!(build_instances(&transforms, 1.0).len(), 9);
        assert!(build_instances(&[], 1.0).is_empty());
        assert_eq!(std::mem::size_of::<InstanceData>(), 64);
    }
}
