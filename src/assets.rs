//! Font loading and glyph atlas packing.
//!
//! No font ships with the crate. [`locate_font`] looks for one on disk and the
//! renderer draws the popup without text if none turns up.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use fontdue::{Font, FontSettings};

use crate::error::{Result, VitrineError};
use crate::gpu::GpuContext;

/// Environment variable naming a TTF/OTF file to use for popup text.
pub const FONT_ENV: &str = "VITRINE_FONT";

/// Common install locations, tried in order after the explicit choices.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const ATLAS_PADDING: u32 = 1;
const MIN_ATLAS_SIZE: u32 = 256;

/// Information about a single glyph in the font atlas.
#[derive(Clone, Copy, Debug)]
pub struct GlyphInfo {
    /// UV coordinates in the atlas (x, y, width, height) normalized to [0, 1].
    pub uv: [f32; 4],
    pub width: u32,
    pub height: u32,
    /// Offset from the pen position to the glyph's bottom-left corner.
    pub offset_x: f32,
    pub offset_y: f32,
    pub advance: f32,
}

/// A font atlas containing pre-rasterized printable ASCII glyphs.
pub struct FontAtlas {
    #[allow(dead_code)]
    texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    glyphs: HashMap<char, GlyphInfo>,
    size: f32,
    line_height: f32,
}

impl FontAtlas {
    /// Rasterize `font_data` at `size` pixels and upload the atlas.
    pub fn new(gpu: &GpuContext, font_data: &[u8], size: f32) -> Result<Self> {
        let font = Font::from_bytes(font_data, FontSettings::default())
            .map_err(|e| VitrineError::Font(e.to_string()))?;

        let rasterized: Vec<(char, fontdue::Metrics, Vec<u8>)> = (32u8..=126u8)
            .map(char::from)
            .map(|c| {
                let (metrics, bitmap) = font.rasterize(c, size);
                (c, metrics, bitmap)
            })
            .collect();

        let sizes: Vec<(u32, u32)> = rasterized
            .iter()
            .map(|(_, m, _)| (m.width as u32, m.height as u32))
            .collect();
        let packing = AtlasPacking::pack(&sizes, ATLAS_PADDING);
        let (atlas_width, atlas_height) = (packing.width, packing.height);

        let mut atlas_data = vec![0u8; (atlas_width * atlas_height) as usize];
        let mut glyphs = HashMap::with_capacity(rasterized.len());

        for ((c, metrics, bitmap), &(x, y)) in rasterized.iter().zip(&packing.origins) {
            let glyph_w = metrics.width as u32;
            let glyph_h = metrics.height as u32;

            for gy in 0..glyph_h {
                let src = (gy * glyph_w) as usize;
                let dst = ((y + gy) * atlas_width + x) as usize;
                atlas_data[dst..dst + glyph_w as usize]
                    .copy_from_slice(&bitmap[src..src + glyph_w as usize]);
            }

            glyphs.insert(
                *c,
                GlyphInfo {
                    uv: [
                        x as f32 / atlas_width as f32,
                        y as f32 / atlas_height as f32,
                        glyph_w as f32 / atlas_width as f32,
                        glyph_h as f32 / atlas_height as f32,
                    ],
                    width: glyph_w,
                    height: glyph_h,
                    offset_x: metrics.xmin as f32,
                    offset_y: metrics.ymin as f32,
                    advance: metrics.advance_width,
                },
            );
        }

        let extent = wgpu::Extent3d {
            width: atlas_width,
            height: atlas_height,
            depth_or_array_layers: 1,
        };
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Font Atlas"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        gpu.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &atlas_data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(atlas_width),
                rows_per_image: Some(atlas_height),
            },
            extent,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Font Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let line_height = font
            .horizontal_line_metrics(size)
            .map(|m| m.new_line_size)
            .unwrap_or(size * 1.2);

        log::debug!(
            "font atlas {}x{} with {} glyphs at {}px",
            atlas_width,
            atlas_height,
            glyphs.len(),
            size
        );

        Ok(Self {
            texture,
            view,
            sampler,
            glyphs,
            size,
            line_height,
        })
    }

    /// Read a font file and build its atlas.
    pub fn from_file(gpu: &GpuContext, path: &Path, size: f32) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::new(gpu, &data, size)
    }

    pub fn glyph(&self, c: char) -> Option<&GlyphInfo> {
        self.glyphs.get(&c)
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    /// Width of `text` in pixels. Characters outside the atlas advance by half the size.
    pub fn measure(&self, text: &str) -> f32 {
        text.chars()
            .map(|c| self.glyphs.get(&c).map_or(self.size * 0.5, |g| g.advance))
            .sum()
    }
}

/// Shelf packing of glyph rectangles into a power-of-two atlas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct AtlasPacking {
    pub width: u32,
    pub height: u32,
    /// Top-left corner of each input rectangle, in input order.
    pub origins: Vec<(u32, u32)>,
}

impl AtlasPacking {
    pub fn pack(sizes: &[(u32, u32)], padding: u32) -> Self {
        let mut width = MIN_ATLAS_SIZE;
        let mut height = MIN_ATLAS_SIZE;
        loop {
            if let Some(origins) = Self::try_pack(sizes, padding, width, height) {
                return Self {
                    width,
                    height,
                    origins,
                };
            }
            if width <= height {
                width *= 2;
            } else {
                height *= 2;
            }
        }
    }

    fn try_pack(sizes: &[(u32, u32)], padding: u32, width: u32, height: u32) -> Option<Vec<(u32, u32)>> {
        let mut origins = Vec::with_capacity(sizes.len());
        let mut x = padding;
        let mut y = padding;
        let mut row_height = 0;

        for &(w, h) in sizes {
            if w + 2 * padding > width {
                return None;
            }
            if x + w + padding > width {
                x = padding;
                y += row_height + padding;
                row_height = 0;
            }
            if y + h + padding > height {
                return None;
            }
            origins.push((x, y));
            x += w + padding;
            row_height = row_height.max(h);
        }
        Some(origins)
    }
}

/// Find a font file: `explicit` first, then `$VITRINE_FONT`, then common system paths.
pub fn locate_font(explicit: Option<&Path>) -> Option<PathBuf> {
    let from_env = env::var_os(FONT_ENV).map(PathBuf::from);
    let candidates = explicit
        .map(Path::to_path_buf)
        .into_iter()
        .chain(from_env)
        .chain(SYSTEM_FONTS.iter().map(PathBuf::from));
    first_existing(candidates)
}

fn first_existing(candidates: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    candidates.into_iter().find(|path| path.is_file())
}

/// Load the popup font, logging instead of failing when none is usable.
pub fn load_font(gpu: &GpuContext, explicit: Option<&Path>, size: f32) -> Option<FontAtlas> {
    let Some(path) = locate_font(explicit) else {
        log::warn!("no font found (set {FONT_ENV}); popup text will not be drawn");
        return None;
    };
    match FontAtlas::from_file(gpu, &path, size) {
        Ok(atlas) => {
            log::info!("loaded font {}", path.display());
            Some(atlas)
        }
        Err(err) => {
            log::warn!("could not load font {}: {err}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlaps(a: (u32, u32, u32, u32), b: (u32, u32, u32, u32)) -> bool {
        a.0 < b.0 + b.2 && b.0 < a.0 + a.2 && a.1 < b.1 + b.3 && b.1 < a.1 + a.3
    }

    #[test]
    fn packs_small_glyphs_into_minimum_atlas() {
        let sizes = vec![(10, 12); 95];
        let packing = AtlasPacking::pack(&sizes, 1);
        assert_eq!((packing.width, packing.height), (MIN_ATLAS_SIZE, MIN_ATLAS_SIZE));
        assert_eq!(packing.origins.len(), sizes.len());
    }

    #[test]
    fn packed_rects_stay_inside_and_apart() {
        let sizes: Vec<(u32, u32)> = (0..95).map(|i| (5 + i % 23, 8 + i % 17)).collect();
        let packing = AtlasPacking::pack(&sizes, 1);
        let rects: Vec<_> = packing
            .origins
            .iter()
            .zip(&sizes)
            .map(|(&(x, y), &(w, h))| (x, y, w, h))
            .collect();
        for (i, a) in rects.iter().enumerate() {
            assert!(a.0 + a.2 <= packing.width && a.1 + a.3 <= packing.height);
            for b in &rects[i + 1..] {
                assert!(!overlaps(*a, *b));
            }
        }
    }

    #[test]
    fn atlas_grows_for_large_glyphs() {
        let sizes = vec![(120, 120); 20];
        let packing = AtlasPacking::pack(&sizes, 1);
        assert!(packing.width * packing.height >= 20 * 120 * 120);
        assert!(packing.width.is_power_of_two() && packing.height.is_power_of_two());
    }

    #[test]
    fn empty_glyphs_pack_at_the_cursor() {
        let packing = AtlasPacking::pack(&[(0, 0), (4, 4)], 1);
        assert_eq!(packing.origins, vec![(1, 1), (2, 1)]);
    }

    #[test]
    fn first_existing_skips_missing_paths() {
        let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml");
        let found = first_existing([PathBuf::from("/definitely/not/here.ttf"), manifest.clone()]);
        assert_eq!(found, Some(manifest));
        assert_eq!(first_existing([PathBuf::from("/nope.ttf")]), None);
    }

    #[test]
    fn explicit_font_path_wins() {
        let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml");
        assert_eq!(locate_font(Some(&manifest)), Some(manifest));
    }
}
