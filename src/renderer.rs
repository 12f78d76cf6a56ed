//! The wgpu implementation of [`FrameRenderer`].
//!
//! The gallery and the popup preview each get their own [`MeshPass`]. The
//! preview is drawn into an offscreen texture first, which the overlay then
//! samples when it composites the popup panel over the gallery.

use std::collections::HashMap;

use glam::Mat4;

use crate::artifact::ArtworkLibrary;
use crate::assets::FontAtlas;
use crate::camera::Camera;
use crate::draw2d::Draw2d;
use crate::ecs::Visual;
use crate::error::VitrineError;
use crate::gpu::GpuContext;
use crate::mesh::Mesh;
use crate::mesh_pass::{DrawCall, MeshPass};
use crate::museum::{FrameRenderer, PopupOverlay};
use crate::scene::SceneGraph;
use crate::texture::Texture;
use crate::ui::{Color, Rect};

type MeshKey = (u8, [u32; 3]);

pub struct GpuRenderer {
    gpu: GpuContext,
    gallery_pass: MeshPass,
    preview_pass: MeshPass,
    draw2d: Draw2d,
    meshes: HashMap<MeshKey, Mesh>,
    preview_target: Texture,
    /// Set once the preview target holds this frame's image.
    preview_ready: bool,
    font: Option<FontAtlas>,
    background: Color,
    fatal: Option<VitrineError>,
}

impl GpuRenderer {
    pub fn new(
        gpu: GpuContext,
        artwork: &ArtworkLibrary,
        font: Option<FontAtlas>,
        background: Color,
    ) -> Self {
        let format = gpu.format();
        let textures: Vec<Texture> = artwork
            .iter()
            .map(|(_, label, image)| Texture::from_image(&gpu, image, label))
            .collect();

        let mut gallery_pass = MeshPass::new(&gpu, format, "Gallery");
        let mut preview_pass = MeshPass::new(&gpu, format, "Preview");
        gallery_pass.set_textures(&gpu, &textures);
        preview_pass.set_textures(&gpu, &textures);

        let mut draw2d = Draw2d::new(&gpu);
        if let Some(font) = &font {
            draw2d.set_font(&gpu, font);
        }
        let preview_target = Texture::render_target(&gpu, 1, 1, format, "Preview Target");
        draw2d.set_image(&gpu, &preview_target);

        log::info!("renderer ready with {} artwork textures", textures.len());

        Self {
            gpu,
            gallery_pass,
            preview_pass,
            draw2d,
            meshes: HashMap::new(),
            preview_target,
            preview_ready: false,
            font,
            background,
            fatal: None,
        }
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
    }

    /// An unrecoverable error hit while presenting, if any.
    pub fn take_fatal(&mut self) -> Option<VitrineError> {
        self.fatal.take()
    }

    /// Upload meshes for any shapes not seen before.
    fn cache_meshes(&mut self, drawables: &[(Mat4, Visual)]) {
        for (_, visual) in drawables {
            let gpu = &self.gpu;
            self.meshes
                .entry(visual.shape.key())
                .or_insert_with(|| Mesh::from_shape(gpu, &visual.shape));
        }
    }

    fn ensure_preview_target(&mut self, (width, height): (u32, u32)) {
        let (width, height) = (width.max(1), height.max(1));
        if self.preview_target.width == width && self.preview_target.height == height {
            return;
        }
        self.preview_target =
            Texture::render_target(&self.gpu, width, height, self.gpu.format(), "Preview Target");
        self.draw2d.set_image(&self.gpu, &self.preview_target);
        log::debug!("preview target resized to {width}x{height}");
    }

    fn build_overlay(&mut self, overlay: &PopupOverlay<'_>) {
        let layout = overlay.layout;
        let accent = overlay.text.accent.unwrap_or(Color::PANEL_BORDER);

        self.draw2d.rect(layout.panel, Color::PANEL_BG);
        self.draw2d.outline(layout.panel, 2.0, accent);

        self.draw2d.rect(layout.preview, Color::PREVIEW_BG);
        if self.preview_ready {
            self.draw2d.image(layout.preview);
        }
        self.draw2d.outline(layout.preview, 1.0, Color::PANEL_BORDER);

        let close = layout.close_button;
        self.draw2d.rect(close, Color::PREVIEW_BG);
        self.draw2d.outline(close, 1.0, Color::PANEL_BORDER);

        let Some(font) = &self.font else {
            // Without a font the close button still needs a mark.
            self.draw2d.rect(close.inset(close.width * 0.35), Color::WHITE);
            return;
        };

        let glyph_w = font.measure("x");
        self.draw2d.text(
            font,
            close.x + (close.width - glyph_w) * 0.5,
            close.y + (close.height - font.line_height()) * 0.5,
            "x",
            Color::WHITE,
        );

        let text = layout.text;
        let below_title = self.draw2d.text_block(font, text, &overlay.text.title, accent);
        let body = Rect::new(
            text.x,
            below_title + font.line_height() * 0.5,
            text.width,
            (text.y + text.height - below_title - font.line_height() * 0.5).max(0.0),
        );
        self.draw2d
            .text_block(font, body, &overlay.text.description, Color::WHITE);
    }

    fn acquire_frame(&mut self) -> Option<wgpu::SurfaceTexture> {
        match self.gpu.surface.get_current_texture() {
            Ok(frame) => Some(frame),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost or outdated; reconfiguring");
                self.gpu.reconfigure();
                None
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("out of GPU memory while acquiring a frame");
                self.fatal = Some(VitrineError::SurfaceTexture(wgpu::SurfaceError::OutOfMemory));
                None
            }
            Err(err) => {
                log::warn!("skipping frame: {err}");
                None
            }
        }
    }
}

fn draw_calls<'m>(
    meshes: &'m HashMap<MeshKey, Mesh>,
    drawables: &[(Mat4, Visual)],
) -> Vec<DrawCall<'m>> {
    drawables
        .iter()
        .filter_map(|(model, visual)| {
            meshes.get(&visual.shape.key()).map(|mesh| DrawCall {
                mesh,
                model: *model,
                color: visual.color,
                texture: visual.texture,
            })
        })
        .collect()
}

impl FrameRenderer for GpuRenderer {
    fn render_preview(&mut self, scene: &SceneGraph, camera: &Camera, viewport: (u32, u32)) {
        self.ensure_preview_target(viewport);
        let (width, height) = (self.preview_target.width, self.preview_target.height);
        self.preview_pass.ensure_depth_size(&self.gpu, width, height);

        let drawables = scene.drawables();
        self.cache_meshes(&drawables);
        let draws = draw_calls(&self.meshes, &drawables);

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Preview Encoder"),
            });
        {
            let mut pass =
                self.preview_pass
                    .begin(&mut encoder, &self.preview_target.view, Color::PREVIEW_BG);
            self.preview_pass.render(&self.gpu, &mut pass, camera, &draws);
        }
        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        self.preview_ready = true;
    }

    fn render_primary(
        &mut self,
        scene: &SceneGraph,
        camera: &Camera,
        overlay: Option<PopupOverlay<'_>>,
    ) {
        let Some(frame) = self.acquire_frame() else {
            self.preview_ready = false;
            return;
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let (width, height) = (self.gpu.width(), self.gpu.height());
        self.gallery_pass.ensure_depth_size(&self.gpu, width, height);

        self.draw2d.clear();
        if let Some(overlay) = &overlay {
            self.build_overlay(overlay);
        }

        let drawables = scene.drawables();
        self.cache_meshes(&drawables);
        let draws = draw_calls(&self.meshes, &drawables);

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Gallery Encoder"),
            });
        {
            let mut pass = self.gallery_pass.begin(&mut encoder, &view, self.background);
            self.gallery_pass.render(&self.gpu, &mut pass, camera, &draws);
        }
        if overlay.is_some() {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Overlay Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.draw2d.render(&self.gpu, &mut pass);
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        self.preview_ready = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Shape;

    #[test]
    fn draws_without_cached_mesh_are_skipped() {
        let meshes = HashMap::new();
        let drawables = vec![(Mat4::IDENTITY, Visual::new(Shape::sphere(1.0), Color::WHITE))];
        assert!(draw_calls(&meshes, &drawables).is_empty());
    }
}
