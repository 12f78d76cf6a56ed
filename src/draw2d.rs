use crate::assets::FontAtlas;
use crate::gpu::GpuContext;
use crate::texture::Texture;
use crate::ui::{Color, Rect, wrap_text};

/// Vertex for 2D overlay rendering.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex2d {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex2d {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex2d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 8,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
            // color
            wgpu::VertexAttribute {
                offset: 16,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x4,
            },
        ],
    };
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Draw2dUniforms {
    resolution: [f32; 2],
    _padding: [f32; 2],
}

const MAX_VERTICES: usize = 16384;

/// Two triangles covering `rect`, with `uv` spanning (u0, v0)..(u1, v1).
fn quad(rect: Rect, uv: [f32; 4], color: Color) -> [Vertex2d; 6] {
    let c = color.to_array();
    let (x0, y0) = (rect.x, rect.y);
    let (x1, y1) = (rect.x + rect.width, rect.y + rect.height);
    let [u0, v0, u1, v1] = uv;
    let v = |position, uv| Vertex2d {
        position,
        uv,
        color: c,
    };
    [
        v([x0, y0], [u0, v0]),
        v([x1, y0], [u1, v0]),
        v([x0, y1], [u0, v1]),
        v([x1, y0], [u1, v0]),
        v([x1, y1], [u1, v1]),
        v([x0, y1], [u0, v1]),
    ]
}

/// Immediate-mode overlay drawing: flat rectangles, one sampled image and text.
///
/// Calls are batched for the frame and drawn in that order by [`Draw2d::render`],
/// so text always lands on top of panels and the preview image.
pub struct Draw2d {
    colored_pipeline: wgpu::RenderPipeline,
    text_pipeline: wgpu::RenderPipeline,
    image_pipeline: wgpu::RenderPipeline,

    vertex_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_bind_group_layout: wgpu::BindGroupLayout,

    font_bind_group: Option<wgpu::BindGroup>,
    image_bind_group: Option<wgpu::BindGroup>,

    colored_vertices: Vec<Vertex2d>,
    image_vertices: Vec<Vertex2d>,
    text_vertices: Vec<Vertex2d>,
}

impl Draw2d {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Draw2d Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/draw2d.wgsl").into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw2d Uniforms"),
            size: std::mem::size_of::<Draw2dUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Draw2d Uniform Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw2d Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Draw2d Texture Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let colored_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Draw2d Colored Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });
        let textured_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Draw2d Textured Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout, &texture_bind_group_layout],
            push_constant_ranges: &[],
        });

        let blend_state = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
        };

        let pipeline = |label: &str, layout: &wgpu::PipelineLayout, fragment: &str| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs"),
                    buffers: &[Vertex2d::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(fragment),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: gpu.config.format,
                        blend: Some(blend_state),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        let colored_pipeline = pipeline("Draw2d Colored Pipeline", &colored_layout, "fs_colored");
        let text_pipeline = pipeline("Draw2d Text Pipeline", &textured_layout, "fs_text");
        let image_pipeline = pipeline("Draw2d Image Pipeline", &textured_layout, "fs_image");

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw2d Vertex Buffer"),
            size: (MAX_VERTICES * std::mem::size_of::<Vertex2d>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            colored_pipeline,
            text_pipeline,
            image_pipeline,
            vertex_buffer,
            uniform_buffer,
            uniform_bind_group,
            texture_bind_group_layout,
            font_bind_group: None,
            image_bind_group: None,
            colored_vertices: Vec::with_capacity(256),
            image_vertices: Vec::with_capacity(6),
            text_vertices: Vec::with_capacity(4096),
        }
    }

    fn texture_bind_group(
        &self,
        gpu: &GpuContext,
        label: &str,
        view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    /// Use `font` for all subsequent text.
    pub fn set_font(&mut self, gpu: &GpuContext, font: &FontAtlas) {
        self.font_bind_group =
            Some(self.texture_bind_group(gpu, "Font Bind Group", &font.view, &font.sampler));
    }

    /// Bind the texture sampled by [`Draw2d::image`]. Call again whenever it is recreated.
    pub fn set_image(&mut self, gpu: &GpuContext, texture: &Texture) {
        self.image_bind_group = Some(self.texture_bind_group(
            gpu,
            "Overlay Image Bind Group",
            &texture.view,
            &texture.sampler,
        ));
    }

    /// Clear all draw calls for the new frame.
    pub fn clear(&mut self) {
        self.colored_vertices.clear();
        self.image_vertices.clear();
        self.text_vertices.clear();
    }

    pub fn rect(&mut self, rect: Rect, color: Color) {
        self.colored_vertices
            .extend_from_slice(&quad(rect, [0.0; 4], color));
    }

    /// A rectangle outline `thickness` pixels wide, drawn inside `rect`.
    pub fn outline(&mut self, rect: Rect, thickness: f32, color: Color) {
        let t = thickness.min(rect.width * 0.5).min(rect.height * 0.5);
        self.rect(Rect::new(rect.x, rect.y, rect.width, t), color);
        self.rect(
            Rect::new(rect.x, rect.y + rect.height - t, rect.width, t),
            color,
        );
        self.rect(Rect::new(rect.x, rect.y + t, t, rect.height - 2.0 * t), color);
        self.rect(
            Rect::new(rect.x + rect.width - t, rect.y + t, t, rect.height - 2.0 * t),
            color,
        );
    }

    /// Draw the bound image stretched over `rect`. Replaces any earlier image this frame.
    pub fn image(&mut self, rect: Rect) {
        self.image_vertices.clear();
        self.image_vertices
            .extend_from_slice(&quad(rect, [0.0, 0.0, 1.0, 1.0], Color::WHITE));
    }

    /// Draw a single line of text with its top edge at `y`.
    pub fn text(&mut self, font: &FontAtlas, x: f32, y: f32, text: &str, color: Color) {
        let mut cursor_x = x;
        let baseline_y = y + font.size();

        for ch in text.chars() {
            let Some(glyph) = font.glyph(ch) else {
                cursor_x += font.size() * 0.5;
                continue;
            };

            if glyph.width > 0 && glyph.height > 0 {
                // fontdue's ymin is measured up from the baseline to the glyph's bottom edge
                let gx = cursor_x + glyph.offset_x;
                let gy = baseline_y - glyph.offset_y - glyph.height as f32;
                let [u, v, du, dv] = glyph.uv;
                self.text_vertices.extend_from_slice(&quad(
                    Rect::new(gx, gy, glyph.width as f32, glyph.height as f32),
                    [u, v, u + du, v + dv],
                    color,
                ));
            }

            cursor_x += glyph.advance;
        }
    }

    /// Word-wrap `text` into `area`, dropping lines that would overflow its bottom.
    ///
    /// Returns the y coordinate just below the last line drawn.
    pub fn text_block(&mut self, font: &FontAtlas, area: Rect, text: &str, color: Color) -> f32 {
        let mut y = area.y;
        for line in wrap_text(text, area.width, |s| font.measure(s)) {
            if y + font.line_height() > area.y + area.height {
                break;
            }
            self.text(font, area.x, y, &line, color);
            y += font.line_height();
        }
        y
    }

    /// Upload and draw everything batched since the last [`Draw2d::clear`].
    pub fn render(&self, gpu: &GpuContext, render_pass: &mut wgpu::RenderPass) {
        let uniforms = Draw2dUniforms {
            resolution: [gpu.width() as f32, gpu.height() as f32],
            _padding: [0.0, 0.0],
        };
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let batches = [
            (&self.colored_pipeline, None, &self.colored_vertices),
            (
                &self.image_pipeline,
                self.image_bind_group.as_ref(),
                &self.image_vertices,
            ),
            (
                &self.text_pipeline,
                self.font_bind_group.as_ref(),
                &self.text_vertices,
            ),
        ];

        let mut offset = 0usize;
        for (index, (pipeline, bind_group, vertices)) in batches.into_iter().enumerate() {
            if vertices.is_empty() || (index > 0 && bind_group.is_none()) {
                continue;
            }
            let count = vertices.len().min(MAX_VERTICES - offset);
            if count < vertices.len() {
                log::warn!("overlay vertex budget exceeded; dropping {} vertices", vertices.len() - count);
            }
            if count == 0 {
                break;
            }

            gpu.queue.write_buffer(
                &self.vertex_buffer,
                (offset * std::mem::size_of::<Vertex2d>()) as u64,
                bytemuck::cast_slice(&vertices[..count]),
            );

            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            if let Some(bind_group) = bind_group {
                render_pass.set_bind_group(1, bind_group, &[]);
            }
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.draw(offset as u32..(offset + count) as u32, 0..1);

            offset += count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_covers_rect() {
        let q = quad(Rect::new(10.0, 20.0, 30.0, 40.0), [0.0, 0.0, 1.0, 1.0], Color::WHITE);
        let xs: Vec<f32> = q.iter().map(|v| v.position[0]).collect();
        let ys: Vec<f32> = q.iter().map(|v| v.position[1]).collect();
        assert_eq!(xs.iter().cloned().fold(f32::MAX, f32::min), 10.0);
        assert_eq!(xs.iter().cloned().fold(f32::MIN, f32::max), 40.0);
        assert_eq!(ys.iter().cloned().fold(f32::MAX, f32::min), 20.0);
        assert_eq!(ys.iter().cloned().fold(f32::MIN, f32::max), 60.0);
    }

    #[test]
    fn quad_maps_uv_corners() {
        let q = quad(Rect::new(0.0, 0.0, 2.0, 2.0), [0.25, 0.5, 0.75, 1.0], Color::BLACK);
        for v in q {
            let expected_u = if v.position[0] == 0.0 { 0.25 } else { 0.75 };
            let expected_v = if v.position[1] == 0.0 { 0.5 } else { 1.0 };
            assert_eq!(v.uv, [expected_u, expected_v]);
            assert_eq!(v.color, Color::BLACK.to_array());
        }
    }

    #[test]
    fn vertex_layout_matches_struct() {
        assert_eq!(Vertex2d::LAYOUT.array_stride, 32);
    }
}
