//! Procedural textures for artifacts and the room.
//!
//! All images are generated on the CPU at startup, deterministically from a
//! seed, and kept in an [`ArtworkLibrary`] until the renderer uploads them.
//! Printed text is suggested with ink bars rather than real glyphs; the
//! readable title and description live in the popup.

use image::{Rgba, RgbaImage};

use crate::ecs::TextureId;

/// Owns every generated image and hands out [`TextureId`]s in insertion order.
#[derive(Default)]
pub struct ArtworkLibrary {
    images: Vec<(String, RgbaImage)>,
}

impl ArtworkLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, label: impl Into<String>, image: RgbaImage) -> TextureId {
        self.images.push((label.into(), image));
        TextureId(self.images.len() - 1)
    }

    pub fn get(&self, id: TextureId) -> Option<&RgbaImage> {
        self.images.get(id.0).map(|(_, image)| image)
    }

    pub fn label(&self, id: TextureId) -> Option<&str> {
        self.images.get(id.0).map(|(label, _)| label.as_str())
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TextureId, &str, &RgbaImage)> {
        self.images
            .iter()
            .enumerate()
            .map(|(i, (label, image))| (TextureId(i), label.as_str(), image))
    }
}

const INK: [u8; 3] = [38, 32, 28];

/// Yellowed paper with darkened edges.
pub fn aged_paper(width: u32, height: u32, seed: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let variation = (hash(x, y, seed) % 18) as i32 - 9;
        // Distance to the nearest edge, as a fraction of the short side.
        let edge = x.min(y).min(width - 1 - x).min(height - 1 - y) as f32 / width.min(height) as f32;
        let burn = ((0.08 - edge).max(0.0) * 500.0) as i32;
        let tone = |c: i32| (c + variation - burn).clamp(0, 255) as u8;
        Rgba([tone(232), tone(214), tone(172), 255])
    })
}

/// A typed legal document: heading, seal and paragraphs of ink lines.
pub fn typed_document(seed: u32) -> RgbaImage {
    let (w, h) = (256, 360);
    let mut img = aged_paper(w, h, seed);

    // Heading
    fill_rect(&mut img, 48, 28, 160, 12, INK);
    fill_rect(&mut img, 72, 48, 112, 8, INK);
    // Paragraphs
    let mut y = 76;
    while y < h - 70 {
        let indent = if (y - 76) % 84 == 0 { 40 } else { 24 };
        let len = 160 + hash(y, 0, seed) % 48;
        fill_rect(&mut img, indent, y, len.min(w - indent - 24), 3, INK);
        y += if (y - 76) % 84 == 72 { 12 } else { 9 };
    }
    // Signatures and seal
    fill_rect(&mut img, 28, h - 44, 70, 2, INK);
    fill_rect(&mut img, 150, h - 44, 70, 2, INK);
    fill_circle(&mut img, 128, h - 52, 16, [150, 28, 30]);
    img
}

/// A newspaper front page with masthead, headline, photo and columns.
pub fn newspaper(seed: u32) -> RgbaImage {
    let (w, h) = (256, 340);
    let mut img = RgbaImage::from_fn(w, h, |x, y| {
        let v = (hash(x, y, seed) % 12) as u8;
        Rgba([222 - v, 220 - v, 210 - v, 255])
    });

    // Masthead and rule
    fill_rect(&mut img, 16, 12, 224, 22, INK);
    fill_rect(&mut img, 16, 40, 224, 2, INK);
    // Headline
    fill_rect(&mut img, 16, 52, 224, 16, INK);
    fill_rect(&mut img, 16, 74, 150, 16, INK);
    // Photo
    fill_rect(&mut img, 16, 100, 108, 84, [92, 90, 86]);
    fill_circle(&mut img, 70, 134, 20, [150, 146, 138]);
    // Columns
    for col in 0..3u32 {
        let x0 = if col == 0 { 16 } else { 132 + (col - 1) * 56 };
        let y0 = if col == 0 { 194 } else { 100 };
        let width = if col == 0 { 108 } else { 48 };
        let mut y = y0;
        while y < h - 16 {
            let short = hash(x0, y, seed) % 7 == 0;
            fill_rect(&mut img, x0, y, if short { width / 2 } else { width }, 2, INK);
            y += 6;
        }
    }
    img
}

/// A hand-lettered protest placard: yellow board, black lettering, red sun.
pub fn protest_poster(seed: u32) -> RgbaImage {
    let (w, h) = (256, 320);
    let mut img = RgbaImage::from_fn(w, h, |x, y| {
        let v = (hash(x / 2, y / 2, seed) % 14) as i32 - 7;
        let c = |base: i32| (base + v).clamp(0, 255) as u8;
        Rgba([c(244), c(206), c(38), 255])
    });

    // Border
    fill_rect(&mut img, 0, 0, w, 10, INK);
    fill_rect(&mut img, 0, h - 10, w, 10, INK);
    fill_rect(&mut img, 0, 0, 10, h, INK);
    fill_rect(&mut img, w - 10, 0, 10, h, INK);
    // Four rows of brush lettering
    for (row, len) in [(0u32, 170u32), (1, 200), (2, 120), (3, 190)] {
        let y = 36 + row * 42;
        let x = (w - len) / 2;
        let mut cursor = x;
        while cursor < x + len {
            let letter = 18 + hash(cursor, row, seed) % 10;
            fill_rect(&mut img, cursor, y, letter.min(x + len - cursor), 24, INK);
            cursor += letter + 6;
        }
    }
    fill_circle(&mut img, 128, 250, 38, [196, 30, 36]);
    img
}

/// Painted lion head pattern: red field with gold scales.
pub fn lion_scales(seed: u32) -> RgbaImage {
    RgbaImage::from_fn(128, 128, |x, y| {
        let cell_x = x % 16;
        let cell_y = (y + if (x / 16) % 2 == 0 { 0 } else { 8 }) % 16;
        let d = (cell_x as i32 - 8).pow(2) + (cell_y as i32 - 8).pow(2);
        let v = (hash(x, y, seed) % 16) as i32 - 8;
        if (36..56).contains(&d) {
            Rgba([(232 + v).clamp(0, 255) as u8, (182 + v).clamp(0, 255) as u8, 40, 255])
        } else {
            Rgba([(196 + v).clamp(0, 255) as u8, 24, 32, 255])
        }
    })
}

/// Weathered wood for railroad ties and pedestal tops.
pub fn wood_grain(seed: u32) -> RgbaImage {
    RgbaImage::from_fn(128, 128, |x, y| {
        let wobble = (hash(0, y / 8, seed) % 6) as f32;
        let ring = ((x as f32 + wobble) * 0.35).sin() * 0.5 + 0.5;
        let v = (hash(x, y, seed) % 10) as f32;
        let r = 104.0 + ring * 40.0 + v;
        Rgba([r as u8, (r * 0.68) as u8, (r * 0.42) as u8, 255])
    })
}

/// Polished stone floor tiles.
pub fn floor_tiles(seed: u32) -> RgbaImage {
    RgbaImage::from_fn(256, 256, |x, y| {
        if x % 64 == 0 || y % 64 == 0 {
            return Rgba([60, 56, 52, 255]);
        }
        let tile = hash(x / 64, y / 64, seed) % 3;
        let base = [150, 138, 126][tile as usize] as i32;
        let v = (hash(x, y, seed + 7) % 12) as i32 - 6;
        let c = (base + v).clamp(0, 255) as u8;
        Rgba([c, c - 6, c - 12, 255])
    })
}

fn fill_rect(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, rgb: [u8; 3]) {
    let x_end = (x + w).min(img.width());
    let y_end = (y + h).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            img.put_pixel(px, py, Rgba([rgb[0], rgb[1], rgb[2], 255]));
        }
    }
}

fn fill_circle(img: &mut RgbaImage, cx: u32, cy: u32, r: u32, rgb: [u8; 3]) {
    let r2 = (r * r) as i64;
    for py in cy.saturating_sub(r)..(cy + r).min(img.height()) {
        for px in cx.saturating_sub(r)..(cx + r).min(img.width()) {
            let dx = px as i64 - cx as i64;
            let dy = py as i64 - cy as i64;
            if dx * dx + dy * dy <= r2 {
                img.put_pixel(px, py, Rgba([rgb[0], rgb[1], rgb[2], 255]));
            }
        }
    }
}

/// Simple hash function for procedural generation.
fn hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_add(x.wrapping_mul(374761393));
    h = h.wrapping_add(y.wrapping_mul(668265263));
    h ^= h >> 13;
    h = h.wrapping_mul(1274126177);
    h ^= h >> 16;
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_ids_follow_insertion_order() {
        let mut library = ArtworkLibrary::new();
        let a = library.add("a", RgbaImage::new(2, 2));
        let b = library.add("b", RgbaImage::new(4, 4));
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(library.get(b).unwrap().width(), 4);
        assert_eq!(library.label(a), Some("a"));
        assert_eq!(library.iter().count(), 2);
    }

    #[test]
    fn generators_are_deterministic() {
        assert_eq!(typed_document(3), typed_document(3));
        assert_ne!(newspaper(1), newspaper(2));
    }

    #[test]
    fn images_are_opaque() {
        for img in [typed_document(1), newspaper(1), protest_poster(1), lion_scales(1)] {
            assert!(img.pixels().all(|p| p.0[3] == 255));
        }
    }

    #[test]
    fn paper_edges_are_darker() {
        let img = aged_paper(64, 64, 5);
        let edge = img.get_pixel(0, 32).0[0];
        let centre = img.get_pixel(32, 32).0[0];
        assert!(edge < centre);
    }
}
