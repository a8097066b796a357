pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub struct DepthTexture {
    pub view: wgpu::TextureView,
    _texture: wgpu::Texture,
}

impl DepthTexture {
    pub fn new(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration, label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            view,
            _texture: texture,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStyle {
    /// Back-face culled, depth written.
    Opaque,
    /// Thin geometry seen from both sides (blades, petals, billboards).
    DoubleSided,
    /// Alpha blended, depth tested but not written.
    Blended,
}

pub struct PipelineEntry<'a> {
    pub vertex: &'a str,
    pub fragment: &'a str,
}

impl Default for PipelineEntry<'_> {
    fn default() -> Self {
        Self {
            vertex: "vs_main",
            fragment: "fs_main",
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn create_render_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    buffers: &[wgpu::VertexBufferLayout],
    entry: PipelineEntry,
    style: PipelineStyle,
    label: &str,
) -> wgpu::RenderPipeline {
    let (blend, cull_mode, depth_write_enabled) = match style {
        PipelineStyle::Opaque => (wgpu::BlendState::REPLACE, Some(wgpu::Face::Back), true),
        PipelineStyle::DoubleSided => (wgpu::BlendState::REPLACE, None, true),
        PipelineStyle::Blended => (wgpu::BlendState::ALPHA_BLENDING, None, false),
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some(entry.vertex),
            buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(entry.fragment),
            targets: &[Some(wgpu::ColorTargetState {
                format: config.format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
