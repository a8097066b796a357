use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::world_core::color::Color;
use crate::world_core::scene::VegetationKind;

#[repr(C)]
#[derive(Clone, Copy, Debug, Zeroable, Pod)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] = [
        wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: 12,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: 24,
            shader_location: 2,
            format: wgpu::VertexFormat::Float32x3,
        },
    ];

    pub fn new(position: Vec3, normal: Vec3, color: [f32; 3]) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            color,
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CpuMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl CpuMesh {
    fn next_index(&self) -> u32 {
        self.vertices.len() as u32
    }

    /// Corners in counter-clockwise order as seen from the front.
    pub fn append_quad(&mut self, corners: [Vec3; 4], normal: Vec3, color: [f32; 3]) {
        let base = self.next_index();
        self.vertices
            .extend(corners.iter().map(|&p| Vertex::new(p, normal, color)));
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    pub fn append_triangle(&mut self, corners: [Vec3; 3], color: [f32; 3]) {
        let [a, b, c] = corners;
        let normal = (b - a).cross(c - a).normalize_or_zero();
        let base = self.next_index();
        self.vertices
            .extend(corners.iter().map(|&p| Vertex::new(p, normal, color)));
        self.indices.extend_from_slice(&[base, base + 1, base + 2]);
    }

    /// Flat disc in the XZ plane, facing up.
    pub fn append_disc(&mut self, center: Vec3, radius: f32, segments: u32, color: [f32; 3]) {
        let base = self.next_index();
        self.vertices.push(Vertex::new(center, Vec3::Y, color));
        for i in 0..segments {
            let angle = i as f32 / segments as f32 * std::f32::consts::TAU;
            let offset = Vec3::new(angle.cos(), 0.0, -angle.sin()) * radius;
            self.vertices.push(Vertex::new(center + offset, Vec3::Y, color));
        }
        for i in 0..segments {
            let a = base + 1 + i;
            let b = base + 1 + (i + 1) % segments;
            self.indices.extend_from_slice(&[base, a, b]);
        }
    }

    pub fn height(&self) -> f32 {
        self.vertices
            .iter()
            .map(|v| v.position[1])
            .fold(0.0, f32::max)
    }
}

fn srgb(hex: u32) -> [f32; 3] {
    Color::from_hex(hex).to_linear_rgb().to_array()
}

const PROTOTYPE_SEED: u64 = 0x6772_6173_73;
const STEM_GREEN: u32 = 0x3f6b2a;

/// A tuft of tapered blades, unit height. Colors come from the grass
/// material, so vertex colors stay white.
pub fn grass_clump(blades: u32) -> CpuMesh {
    const SEGMENTS: u32 = 4;
    let mut rng = StdRng::seed_from_u64(PROTOTYPE_SEED);
    let mut mesh = CpuMesh::default();

    for _ in 0..blades {
        let yaw = rng.random_range(0.0..std::f32::consts::TAU);
        let height = rng.random_range(0.6..1.0);
        let half_width = rng.random_range(0.025..0.045);
        let lean = rng.random_range(0.05..0.25);
        let root = Vec3::new(rng.random_range(-0.15..0.15), 0.0, rng.random_range(-0.15..0.15));

        let rotation = Quat::from_rotation_y(yaw);
        let side = rotation * Vec3::X;
        let facing = rotation * Vec3::Z;

        let point = |t: f32| root + Vec3::Y * (height * t) + facing * (lean * height * t * t);

        let base = mesh.next_index();
        for s in 0..SEGMENTS {
            let t = s as f32 / SEGMENTS as f32;
            let w = half_width * (1.0 - t);
            let center = point(t);
            mesh.vertices.push(Vertex::new(center - side * w, facing, [1.0; 3]));
            mesh.vertices.push(Vertex::new(center + side * w, facing, [1.0; 3]));
        }
        mesh.vertices.push(Vertex::new(point(1.0), facing, [1.0; 3]));

        for s in 0..SEGMENTS - 1 {
            let l0 = base + s * 2;
            let r0 = l0 + 1;
            let l1 = l0 + 2;
            let r1 = l0 + 3;
            mesh.indices.extend_from_slice(&[l0, r0, r1, l0, r1, l1]);
        }
        let last = base + (SEGMENTS - 1) * 2;
        let tip = base + SEGMENTS * 2;
        mesh.indices.extend_from_slice(&[last, last + 1, tip]);
    }
    mesh
}

struct FlowerShape {
    stem_height: f32,
    petals: u32,
    petal_length: f32,
    petal_width: f32,
    /// Upward tilt of each petal, radians.
    cup: f32,
    petal_color: u32,
    heart_color: u32,
    heart_radius: f32,
}

fn flower_shape(kind: VegetationKind) -> FlowerShape {
    match kind {
        VegetationKind::Poppy => FlowerShape {
            stem_height: 1.0,
            petals: 4,
            petal_length: 0.28,
            petal_width: 0.24,
            cup: 0.6,
            petal_color: 0xd7263d,
            heart_color: 0x1b1b1b,
            heart_radius: 0.05,
        },
        VegetationKind::Everlasting => FlowerShape {
            stem_height: 0.8,
            petals: 10,
            petal_length: 0.22,
            petal_width: 0.07,
            cup: 0.35,
            petal_color: 0xf4f1e8,
            heart_color: 0xf2c14e,
            heart_radius: 0.07,
        },
        VegetationKind::Periwinkle => FlowerShape {
            stem_height: 0.5,
            petals: 5,
            petal_length: 0.2,
            petal_width: 0.14,
            cup: 0.15,
            petal_color: 0x8c9be0,
            heart_color: 0xf5f5f5,
            heart_radius: 0.035,
        },
        VegetationKind::Grass => FlowerShape {
            stem_height: 1.0,
            petals: 0,
            petal_length: 0.0,
            petal_width: 0.0,
            cup: 0.0,
            petal_color: STEM_GREEN,
            heart_color: STEM_GREEN,
            heart_radius: 0.0,
        },
    }
}

/// Stem, a ring of petals and a flat heart, all baked with vertex colors.
pub fn flower(kind: VegetationKind) -> CpuMesh {
    let shape = flower_shape(kind);
    let mut mesh = CpuMesh::default();
    let stem = srgb(STEM_GREEN);
    let petal = srgb(shape.petal_color);
    let top = Vec3::Y * shape.stem_height;

    // Two crossed stem quads so the stem reads from every angle.
    let w = 0.015;
    for axis in [Vec3::X, Vec3::Z] {
        let normal = axis.cross(Vec3::Y);
        mesh.append_quad(
            [-axis * w, axis * w, top + axis * w, top - axis * w],
            normal,
            stem,
        );
    }

    for i in 0..shape.petals {
        let angle = i as f32 / shape.petals as f32 * std::f32::consts::TAU;
        let rotation = Quat::from_rotation_y(angle) * Quat::from_rotation_x(-shape.cup);
        let out = rotation * Vec3::Z;
        let side = rotation * Vec3::X;
        let normal = rotation * Vec3::Y;
        let half = shape.petal_width * 0.5;
        let mid = top + out * (shape.petal_length * 0.5);
        let tip = top + out * shape.petal_length;
        mesh.append_triangle([top, mid + side * half, tip], petal);
        mesh.append_triangle([top, tip, mid - side * half], petal);
        // Keep the lighting normal facing up-ish for both halves.
        let count = mesh.vertices.len();
        for v in &mut mesh.vertices[count - 6..] {
            v.normal = normal.to_array();
        }
    }

    if shape.heart_radius > 0.0 {
        mesh.append_disc(top + Vec3::Y * 0.01, shape.heart_radius, 8, srgb(shape.heart_color));
    }
    mesh
}

pub fn prototype_mesh(kind: VegetationKind) -> CpuMesh {
    match kind {
        VegetationKind::Grass => grass_clump(7),
        _ => flower(kind),
    }
}

/// Unit quad in the XY plane centred on the origin, facing +Z.
pub fn unit_quad() -> CpuMesh {
    let mut mesh = CpuMesh::default();
    mesh.append_quad(
        [
            Vec3::new(-0.5, -0.5, 0.0),
            Vec3::new(0.5, -0.5, 0.0),
            Vec3::new(0.5, 0.5, 0.0),
            Vec3::new(-0.5, 0.5, 0.0),
        ],
        Vec3::Z,
        [1.0; 3],
    );
    mesh
}
