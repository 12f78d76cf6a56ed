//! 3D mesh rendering pass with depth testing and texture support.
//!
//! The mesh pass uses three bind groups:
//! - **Group 0**: Camera uniforms (view-projection matrix, camera position, light)
//! - **Group 1**: Model uniforms, one aligned slot per draw selected by dynamic offset
//! - **Group 2**: Texture and sampler for the mesh surface
//!
//! Each `MeshPass` owns its uniform buffers and depth texture, so the gallery and
//! the popup preview use separate instances and can be drawn in one frame
//! without overwriting each other's uniforms.

use glam::{Mat4, Vec3};

use crate::camera::Camera;
use crate::ecs::TextureId;
use crate::gpu::GpuContext;
use crate::mesh::{Mesh, Vertex3d};
use crate::texture::Texture;
use crate::ui::Color;

/// Most draws a single pass accepts per frame.
pub const MAX_DRAWS: usize = 1024;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Camera uniforms for 3D rendering.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub ambient: f32,
    /// Direction the light travels, normalized.
    pub light_dir: [f32; 3],
    pub _padding: f32,
}

impl CameraUniforms {
    pub fn new(camera: &Camera) -> Self {
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            camera_pos: camera.position.to_array(),
            ambient: 0.35,
            light_dir: Vec3::new(-0.4, -1.0, -0.6).normalize().to_array(),
            _padding: 0.0,
        }
    }
}

/// Per-draw model uniforms.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniforms {
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of the model matrix.
    pub normal_matrix: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl ModelUniforms {
    pub fn new(model: Mat4, color: Color) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: model.inverse().transpose().to_cols_array_2d(),
            color: color.to_array(),
        }
    }
}

/// A mesh to draw with its world matrix, tint and optional artwork texture.
pub struct DrawCall<'a> {
    pub mesh: &'a Mesh,
    pub model: Mat4,
    pub color: Color,
    /// Index into the textures given to [`MeshPass::set_textures`]; `None` draws untextured.
    pub texture: Option<TextureId>,
}

/// Round `size` up to the next multiple of `alignment`.
pub(crate) fn align_to(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

/// Renders textured, lit meshes into a colour target with its own depth buffer.
pub struct MeshPass {
    pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    model_buffer: wgpu::Buffer,
    model_bind_group: wgpu::BindGroup,
    model_stride: u64,
    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
    texture_bind_group_layout: wgpu::BindGroupLayout,
    default_bind_group: wgpu::BindGroup,
    texture_bind_groups: Vec<wgpu::BindGroup>,
    label: String,
}

impl MeshPass {
    /// Create a pass that renders into targets of `color_format`.
    pub fn new(gpu: &GpuContext, color_format: wgpu::TextureFormat, label: &str) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });

        // Camera uniform buffer (group 0)
        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{label} Camera Uniforms")),
            size: std::mem::size_of::<CameraUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Camera Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        // Model uniform buffer (group 1)
        let model_size = std::mem::size_of::<ModelUniforms>() as u64;
        let model_stride = align_to(
            model_size,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let model_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{label} Model Uniforms")),
            size: model_stride * MAX_DRAWS as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let model_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Model Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(model_size),
                    },
                    count: None,
                }],
            });

        let model_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Model Bind Group"),
            layout: &model_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &model_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(model_size),
                }),
            }],
        });

        // Texture bind group layout (group 2)
        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Texture Bind Group Layout"),
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

        let default_texture = Texture::white(gpu);
        let default_bind_group =
            Self::texture_bind_group(gpu, &texture_bind_group_layout, &default_texture);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[
                &camera_bind_group_layout,
                &model_bind_group_layout,
                &texture_bind_group_layout,
            ],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{label} Mesh Pipeline")),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[Vertex3d::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // Paper sheets are seen from both sides while they spin.
                cull_mode: None,
                front_face: wgpu::FrontFace::Ccw,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let depth_size = (gpu.width(), gpu.height());
        let depth_view = Self::create_depth_view(gpu, depth_size, label);

        Self {
            pipeline,
            camera_buffer,
            camera_bind_group,
            model_buffer,
            model_bind_group,
            model_stride,
            depth_view,
            depth_size,
            texture_bind_group_layout,
            default_bind_group,
            texture_bind_groups: Vec::new(),
            label: label.to_string(),
        }
    }

    fn texture_bind_group(
        gpu: &GpuContext,
        layout: &wgpu::BindGroupLayout,
        texture: &Texture,
    ) -> wgpu::BindGroup {
        gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Mesh Texture Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        })
    }

    /// Bind the artwork textures that [`DrawCall::texture`] indexes into.
    pub fn set_textures(&mut self, gpu: &GpuContext, textures: &[Texture]) {
        self.texture_bind_groups = textures
            .iter()
            .map(|t| Self::texture_bind_group(gpu, &self.texture_bind_group_layout, t))
            .collect();
    }

    fn create_depth_view(gpu: &GpuContext, (width, height): (u32, u32), label: &str) -> wgpu::TextureView {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&format!("{label} Depth Texture")),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Recreate the depth buffer if the target size changed.
    pub fn ensure_depth_size(&mut self, gpu: &GpuContext, width: u32, height: u32) {
        let size = (width.max(1), height.max(1));
        if self.depth_size != size {
            self.depth_view = Self::create_depth_view(gpu, size, &self.label);
            self.depth_size = size;
        }
    }

    /// Start a render pass that clears `target` to `clear` and the depth buffer to 1.
    ///
    /// The depth buffer must match the target's size; see [`MeshPass::ensure_depth_size`].
    pub fn begin<'e>(
        &self,
        encoder: &'e mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        clear: Color,
    ) -> wgpu::RenderPass<'e> {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(&self.label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear.to_wgpu()),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        })
    }

    /// Upload uniforms and record `draws` into `pass`.
    ///
    /// Draws beyond [`MAX_DRAWS`] are dropped with a warning.
    pub fn render(
        &self,
        gpu: &GpuContext,
        pass: &mut wgpu::RenderPass<'_>,
        camera: &Camera,
        draws: &[DrawCall<'_>],
    ) {
        if draws.len() > MAX_DRAWS {
            log::warn!(
                "{}: {} draws requested, only {} drawn",
                self.label,
                draws.len(),
                MAX_DRAWS
            );
        }
        let draws = &draws[..draws.len().min(MAX_DRAWS)];
        if draws.is_empty() {
            return;
        }

        gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[CameraUniforms::new(camera)]),
        );

        let stride = self.model_stride as usize;
        let mut staging = vec![0u8; stride * draws.len()];
        for (slot, draw) in staging.chunks_exact_mut(stride).zip(draws) {
            let uniforms = ModelUniforms::new(draw.model, draw.color);
            let bytes = bytemuck::bytes_of(&uniforms);
            slot[..bytes.len()].copy_from_slice(bytes);
        }
        gpu.queue.write_buffer(&self.model_buffer, 0, &staging);

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.camera_bind_group, &[]);

        for (i, draw) in draws.iter().enumerate() {
            let texture = draw
                .texture
                .and_then(|id| self.texture_bind_groups.get(id.index()))
                .unwrap_or(&self.default_bind_group);

            pass.set_bind_group(1, &self.model_bind_group, &[(i as u64 * self.model_stride) as u32]);
            pass.set_bind_group(2, texture, &[]);
            pass.set_vertex_buffer(0, draw.mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(draw.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..draw.mesh.index_count, 0, 0..1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_sizes_match_shader_layout() {
        assert_eq!(std::mem::size_of::<CameraUniforms>(), 96);
        assert_eq!(std::mem::size_of::<ModelUniforms>(), 144);
    }

    #[test]
    fn model_slots_respect_offset_alignment() {
        assert_eq!(align_to(144, 256), 256);
        assert_eq!(align_to(256, 256), 256);
        assert_eq!(align_to(257, 256), 512);
        assert_eq!(align_to(144, 16), 144);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let model = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let uniforms = ModelUniforms::new(model, Color::WHITE);
        let normal = Mat4::from_cols_array_2d(&uniforms.normal_matrix);
        let n = normal.transform_vector3(Vec3::X);
        assert!((n - Vec3::new(0.5, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn light_direction_is_normalized() {
        let uniforms = CameraUniforms::new(&Camera::new());
        assert!((Vec3::from_array(uniforms.light_dir).length() - 1.0).abs() < 1e-6);
    }
}
