//! Screen-space primitives and popup panel layout.
//!
//! Everything here is plain CPU data: colours, rectangles, the geometry of the
//! artifact popup and word wrapping for its description text. The GPU side
//! ([`Draw2d`](crate::draw2d::Draw2d)) only consumes the results.

/// A rectangle in screen-space pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns true if the point lies inside the rectangle (edges inclusive).
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }

    /// Shrink the rectangle by `amount` on every side.
    pub fn inset(&self, amount: f32) -> Self {
        Self::new(
            self.x + amount,
            self.y + amount,
            (self.width - 2.0 * amount).max(0.0),
            (self.height - 2.0 * amount).max(0.0),
        )
    }
}

/// RGBA color with components in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Build a color from a `0xRRGGBB` literal.
    pub const fn hex(rgb: u32) -> Self {
        Self::rgb(
            ((rgb >> 16) & 0xff) as f32 / 255.0,
            ((rgb >> 8) & 0xff) as f32 / 255.0,
            (rgb & 0xff) as f32 / 255.0,
        )
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }

    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);

    /// Popup backdrop.
    pub const PANEL_BG: Color = Color::rgba(0.08, 0.07, 0.06, 0.92);
    /// Popup border and close button.
    pub const PANEL_BORDER: Color = Color::rgba(0.78, 0.66, 0.42, 1.0);
    /// Background behind the 3D preview.
    pub const PREVIEW_BG: Color = Color::rgba(0.16, 0.15, 0.14, 1.0);
}

/// Geometry of the artifact popup for a given window size.
///
/// The panel docks to the right edge and takes a fixed fraction of the window
/// width, leaving the rest of the gallery clickable while it is open. The
/// preview viewport sits at the top of the panel, title and description below
/// it, and a square close button in the top-right corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PopupLayout {
    pub panel: Rect,
    pub preview: Rect,
    pub text: Rect,
    pub close_button: Rect,
}

impl PopupLayout {
    const PANEL_FRACTION: f32 = 0.4;
    const MARGIN: f32 = 24.0;
    const PADDING: f32 = 16.0;
    const CLOSE_SIZE: f32 = 28.0;

    pub fn for_window(width: u32, height: u32) -> Self {
        let (w, h) = (width as f32, height as f32);
        let panel_w = (w * Self::PANEL_FRACTION - Self::MARGIN).max(0.0);
        let panel = Rect::new(
            (w - panel_w - Self::MARGIN).max(0.0),
            Self::MARGIN,
            panel_w,
            (h - 2.0 * Self::MARGIN).max(0.0),
        );

        let inner = panel.inset(Self::PADDING);
        let top = inner.y + Self::CLOSE_SIZE;
        let preview_h = inner
            .width
            .min((inner.height - Self::CLOSE_SIZE) * 0.55)
            .max(0.0);
        let preview = Rect::new(inner.x, top, inner.width, preview_h);
        let text_y = preview.y + preview.height + Self::PADDING;
        let text = Rect::new(
            inner.x,
            text_y,
            inner.width,
            (inner.y + inner.height - text_y).max(0.0),
        );
        let close_button = Rect::new(
            panel.x + panel.width - Self::CLOSE_SIZE - 6.0,
            panel.y + 6.0,
            Self::CLOSE_SIZE,
            Self::CLOSE_SIZE,
        );

        Self {
            panel,
            preview,
            text,
            close_button,
        }
    }

    /// Pixel size of the preview viewport, never smaller than 1x1.
    pub fn preview_size(&self) -> (u32, u32) {
        (
            (self.preview.width as u32).max(1),
            (self.preview.height as u32).max(1),
        )
    }
}

/// Greedy word wrap. `measure` returns the pixel width of a string.
///
/// Paragraph breaks in the source text are preserved as empty lines. A single
/// word wider than `max_width` gets its own line rather than being split.
pub fn wrap_text<F>(text: &str, max_width: f32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{current} {word}");
            if measure(&candidate) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }
        lines.push(current);
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_width(s: &str) -> f32 {
        s.chars().count() as f32 * 10.0
    }

    #[test]
    fn rect_contains_edges() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(r.contains(10.0, 10.0));
        assert!(r.contains(30.0, 30.0));
        assert!(!r.contains(9.9, 15.0));
        assert!(!r.contains(15.0, 30.1));
    }

    #[test]
    fn hex_color() {
        let c = Color::hex(0xff8000);
        assert_eq!(c.r, 1.0);
        assert!((c.g - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.b, 0.0);
    }

    #[test]
    fn layout_is_inside_window() {
        let layout = PopupLayout::for_window(1280, 720);
        let window = Rect::new(0.0, 0.0, 1280.0, 720.0);
        for r in [layout.panel, layout.preview, layout.text, layout.close_button] {
            assert!(window.contains(r.x, r.y));
            assert!(window.contains(r.x + r.width, r.y + r.height));
        }
        assert!(layout.panel.contains(layout.close_button.x, layout.close_button.y));
        assert!(!layout.preview.contains(layout.close_button.x, layout.close_button.y));
        assert!(layout.text.y > layout.preview.y + layout.preview.height);
    }

    #[test]
    fn window_centre_stays_clickable() {
        let layout = PopupLayout::for_window(1280, 720);
        assert!(!layout.panel.contains(640.0, 360.0));
        assert!(layout.panel.contains(1200.0, 360.0));
    }

    #[test]
    fn layout_follows_window_size() {
        let small = PopupLayout::for_window(800, 600).preview_size();
        let large = PopupLayout::for_window(1600, 1200).preview_size();
        assert!(large.0 > small.0);
        assert!(large.1 > small.1);
    }

    #[test]
    fn wrap_respects_width() {
        let lines = wrap_text("one two three four five", 90.0, fixed_width);
        assert_eq!(lines, vec!["one two", "three", "four five"]);
        for line in &lines {
            assert!(fixed_width(line) <= 90.0);
        }
    }

    #[test]
    fn wrap_keeps_paragraphs() {
        let lines = wrap_text("alpha\n\nbeta\n", 1000.0, fixed_width);
        assert_eq!(lines, vec!["alpha", "", "beta"]);
    }

    #[test]
    fn wrap_long_word_gets_own_line() {
        let lines = wrap_text("a verylongword b", 50.0, fixed_width);
        assert_eq!(lines, vec!["a", "verylongword", "b"]);
    }
}
