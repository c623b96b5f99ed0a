// Render module
// CPU drawing into premultiplied BGRA shm canvases: pet frames, menu, speech bubble and text

use crate::image_loader::Frame;
use cosmic_text::{Attrs, Buffer, Color, FontSystem, Metrics, Shaping, SwashCache};

/// Menu geometry
pub const MENU_ITEM_HEIGHT: u32 = 25;
pub const MENU_WIDTH: u32 = 180;

/// Padding between the bubble border and its text
pub const BUBBLE_PADDING: u32 = 10;

/// Size of the corner marks left on screen while the pet is hidden
const CORNER_MARK: u32 = 20;

/// Premultiplied BGRA colors
const MENU_BG: [u8; 4] = [60, 60, 60, 230];
const MENU_HOVER: [u8; 4] = [180, 180, 80, 230];
const MENU_BORDER: [u8; 4] = [100, 100, 100, 255];
const BUBBLE_BG: [u8; 4] = [245, 245, 245, 245];
const BUBBLE_BORDER: [u8; 4] = [120, 120, 120, 255];
const HIDDEN_MARK: [u8; 4] = [60, 60, 60, 60];

/// Text colors (RGB)
const MENU_TEXT: [u8; 3] = [255, 255, 255];
const BUBBLE_TEXT: [u8; 3] = [40, 40, 40];

fn menu_metrics() -> Metrics {
    Metrics::new(13.0, 17.0)
}

fn bubble_metrics() -> Metrics {
    Metrics::new(14.0, 18.0)
}

/// Fill with transparent background
pub fn clear(canvas: &mut [u8]) {
    canvas.fill(0);
}

/// Draw `frame` over the whole canvas, scaling with nearest-neighbor when sizes differ
pub fn blit_frame(canvas: &mut [u8], width: u32, height: u32, frame: &Frame) {
    if frame.width == width && frame.height == height && frame.bgra_data.len() == canvas.len() {
        canvas.copy_from_slice(&frame.bgra_data);
        return;
    }

    clear(canvas);
    if frame.width == 0 || frame.height == 0 || width == 0 || height == 0 {
        return;
    }

    // Fixed-point scale factors
    let scale_x_fp = ((frame.width as u64) << 16) / width as u64;
    let scale_y_fp = ((frame.height as u64) << 16) / height as u64;
    let src_stride = frame.width as usize * 4;

    let x_lut: Vec<usize> = (0..width)
        .map(|x| (((x as u64 * scale_x_fp) >> 16) as u32).min(frame.width - 1) as usize)
        .collect();

    for y in 0..height {
        let src_y = (((y as u64 * scale_y_fp) >> 16) as u32).min(frame.height - 1) as usize;
        let src_row = src_y * src_stride;
        let dst_row = y as usize * width as usize * 4;

        for (x, &src_x) in x_lut.iter().enumerate() {
            let src_idx = src_row + src_x * 4;
            let dst_idx = dst_row + x * 4;
            if src_idx + 3 < frame.bgra_data.len() && dst_idx + 3 < canvas.len() {
                canvas[dst_idx..dst_idx + 4].copy_from_slice(&frame.bgra_data[src_idx..src_idx + 4]);
            }
        }
    }
}

/// Faint corner marks showing where the hidden pet sits
pub fn render_hidden_marks(canvas: &mut [u8], width: u32, height: u32) {
    clear(canvas);
    let right = width.saturating_sub(1);
    let bottom = height.saturating_sub(1);

    for i in 0..CORNER_MARK {
        // Top-left
        draw_pixel(canvas, width, height, i, 0, HIDDEN_MARK);
        draw_pixel(canvas, width, height, 0, i, HIDDEN_MARK);
        // Top-right
        draw_pixel(canvas, width, height, right.saturating_sub(i), 0, HIDDEN_MARK);
        draw_pixel(canvas, width, height, right, i, HIDDEN_MARK);
        // Bottom-left
        draw_pixel(canvas, width, height, i, bottom, HIDDEN_MARK);
        draw_pixel(canvas, width, height, 0, bottom.saturating_sub(i), HIDDEN_MARK);
        // Bottom-right
        draw_pixel(canvas, width, height, right.saturating_sub(i), bottom, HIDDEN_MARK);
        draw_pixel(canvas, width, height, right, bottom.saturating_sub(i), HIDDEN_MARK);
    }
}

/// Menu entry under a surface-local y coordinate
pub fn menu_item_at(y: f64, count: usize) -> Option<usize> {
    if y < 0.0 {
        return None;
    }
    let idx = (y / MENU_ITEM_HEIGHT as f64) as usize;
    (idx < count).then_some(idx)
}

/// Surface size for a menu with `count` entries
pub fn menu_size(count: usize) -> (u32, u32) {
    (MENU_WIDTH, (count as u32 * MENU_ITEM_HEIGHT).max(1))
}

/// Draw the menu filling the whole canvas
pub fn render_menu(
    canvas: &mut [u8],
    width: u32,
    height: u32,
    labels: &[&str],
    hover: Option<usize>,
    text: &mut TextRenderer,
) {
    clear(canvas);

    for (i, label) in labels.iter().enumerate() {
        let item_y = i as u32 * MENU_ITEM_HEIGHT;
        let bg = if hover == Some(i) { MENU_HOVER } else { MENU_BG };
        fill_rect(canvas, width, height, 0, item_y, width, MENU_ITEM_HEIGHT, bg);
        text.draw(
            canvas,
            width,
            height,
            (10, item_y as i32 + 4),
            label,
            None,
            menu_metrics(),
            MENU_TEXT,
        );
    }

    draw_border(canvas, width, height, MENU_BORDER);
}

/// Surface size of a bubble holding `line`
pub fn bubble_size(text: &mut TextRenderer, line: &str, max_text_width: u32) -> (u32, u32) {
    let (w, h) = text.measure(line, Some(max_text_width as f32), bubble_metrics());
    // Keep a usable box even when no font could be loaded
    let w = w.clamp(20, max_text_width);
    let h = h.max(18);
    (w + 2 * BUBBLE_PADDING, h + 2 * BUBBLE_PADDING)
}

pub fn render_bubble(
    canvas: &mut [u8],
    width: u32,
    height: u32,
    line: &str,
    max_text_width: u32,
    text: &mut TextRenderer,
) {
    clear(canvas);
    fill_rect(canvas, width, height, 0, 0, width, height, BUBBLE_BG);
    draw_border(canvas, width, height, BUBBLE_BORDER);
    text.draw(
        canvas,
        width,
        height,
        (BUBBLE_PADDING as i32, BUBBLE_PADDING as i32),
        line,
        Some(max_text_width as f32),
        bubble_metrics(),
        BUBBLE_TEXT,
    );
}

#[allow(clippy::too_many_arguments)]
pub fn fill_rect(canvas: &mut [u8], canvas_width: u32, canvas_height: u32, x: u32, y: u32, w: u32, h: u32, color: [u8; 4]) {
    for py in y..(y + h).min(canvas_height) {
        for px in x..(x + w).min(canvas_width) {
            draw_pixel(canvas, canvas_width, canvas_height, px, py, color);
        }
    }
}

fn draw_border(canvas: &mut [u8], width: u32, height: u32, color: [u8; 4]) {
    let right = width.saturating_sub(1);
    let bottom = height.saturating_sub(1);
    for x in 0..width {
        draw_pixel(canvas, width, height, x, 0, color);
        draw_pixel(canvas, width, height, x, bottom, color);
    }
    for y in 0..height {
        draw_pixel(canvas, width, height, 0, y, color);
        draw_pixel(canvas, width, height, right, y, color);
    }
}

/// Helper to draw a single pixel
fn draw_pixel(canvas: &mut [u8], canvas_width: u32, canvas_height: u32, x: u32, y: u32, color: [u8; 4]) {
    if x < canvas_width && y < canvas_height {
        let idx = ((y * canvas_width + x) * 4) as usize;
        if idx + 3 < canvas.len() {
            canvas[idx..idx + 4].copy_from_slice(&color);
        }
    }
}

/// Composite a straight-alpha RGB color with coverage `alpha` over a premultiplied pixel
fn blend_pixel(canvas: &mut [u8], canvas_width: u32, canvas_height: u32, x: i32, y: i32, rgb: [u8; 3], alpha: u8) {
    if x < 0 || y < 0 || x as u32 >= canvas_width || y as u32 >= canvas_height || alpha == 0 {
        return;
    }
    let idx = ((y as u32 * canvas_width + x as u32) * 4) as usize;
    if idx + 3 >= canvas.len() {
        return;
    }

    let a = alpha as u32;
    let inv = 255 - a;
    let src = [rgb[2], rgb[1], rgb[0]];
    for c in 0..3 {
        canvas[idx + c] = ((src[c] as u32 * a + canvas[idx + c] as u32 * inv) / 255) as u8;
    }
    canvas[idx + 3] = (a + canvas[idx + 3] as u32 * inv / 255) as u8;
}

/// Shapes and rasterizes text with the system fonts
pub struct TextRenderer {
    font_system: FontSystem,
    cache: SwashCache,
}

impl TextRenderer {
    pub fn new() -> Self {
        Self {
            font_system: FontSystem::new(),
            cache: SwashCache::new(),
        }
    }

    fn layout(&mut self, text: &str, max_width: Option<f32>, metrics: Metrics) -> Buffer {
        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        buffer.set_size(&mut self.font_system, max_width, None);
        buffer.set_text(&mut self.font_system, text, Attrs::new(), Shaping::Advanced);
        buffer.shape_until_scroll(&mut self.font_system, false);
        buffer
    }

    /// Width and height of `text` wrapped at `max_width`
    pub fn measure(&mut self, text: &str, max_width: Option<f32>, metrics: Metrics) -> (u32, u32) {
        let buffer = self.layout(text, max_width, metrics);
        let mut width: f32 = 0.0;
        let mut lines = 0;
        for run in buffer.layout_runs() {
            width = width.max(run.line_w);
            lines += 1;
        }
        (width.ceil() as u32, (lines as f32 * metrics.line_height).ceil() as u32)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &mut self,
        canvas: &mut [u8],
        canvas_width: u32,
        canvas_height: u32,
        origin: (i32, i32),
        text: &str,
        max_width: Option<f32>,
        metrics: Metrics,
        rgb: [u8; 3],
    ) {
        let buffer = self.layout(text, max_width, metrics);
        let color = Color::rgb(rgb[0], rgb[1], rgb[2]);
        buffer.draw(&mut self.font_system, &mut self.cache, color, |x, y, w, h, color| {
            let glyph_rgb = [color.r(), color.g(), color.b()];
            for dy in 0..h as i32 {
                for dx in 0..w as i32 {
                    blend_pixel(
                        canvas,
                        canvas_width,
                        canvas_height,
                        origin.0 + x + dx,
                        origin.1 + y + dy,
                        glyph_rgb,
                        color.a(),
                    );
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(canvas: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y * width + x) * 4) as usize;
        [canvas[idx], canvas[idx + 1], canvas[idx + 2], canvas[idx + 3]]
    }

    fn solid(width: u32, height: u32, color: [u8; 4]) -> Frame {
        Frame {
            width,
            height,
            bgra_data: color.repeat((width * height) as usize),
        }
    }

    #[test]
    fn test_blit_same_size_copies() {
        let frame = solid(3, 2, [1, 2, 3, 4]);
        let mut canvas = vec![9u8; 3 * 2 * 4];
        blit_frame(&mut canvas, 3, 2, &frame);
        assert_eq!(canvas, frame.bgra_data);
    }

    #[test]
    fn test_blit_scales_to_canvas() {
        let mut frame = solid(2, 1, [0, 0, 0, 0]);
        frame.bgra_data[4..8].copy_from_slice(&[10, 20, 30, 255]);

        let mut canvas = vec![0u8; 4 * 2 * 4];
        blit_frame(&mut canvas, 4, 2, &frame);
        assert_eq!(pixel(&canvas, 4, 0, 0), [0, 0, 0, 0]);
        assert_eq!(pixel(&canvas, 4, 1, 1), [0, 0, 0, 0]);
        assert_eq!(pixel(&canvas, 4, 2, 0), [10, 20, 30, 255]);
        assert_eq!(pixel(&canvas, 4, 3, 1), [10, 20, 30, 255]);
    }

    #[test]
    fn test_hidden_marks_only_touch_corners() {
        let (w, h) = (50, 60);
        let mut canvas = vec![255u8; (w * h * 4) as usize];
        render_hidden_marks(&mut canvas, w, h);
        assert_eq!(pixel(&canvas, w, 0, 0), HIDDEN_MARK);
        assert_eq!(pixel(&canvas, w, w - 1, h - 1), HIDDEN_MARK);
        assert_eq!(pixel(&canvas, w, 0, CORNER_MARK - 1), HIDDEN_MARK);
        assert_eq!(pixel(&canvas, w, w / 2, h / 2), [0, 0, 0, 0]);
        assert_eq!(pixel(&canvas, w, 0, CORNER_MARK + 5), [0, 0, 0, 0]);
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut canvas = vec![0u8; 4 * 4 * 4];
        fill_rect(&mut canvas, 4, 4, 2, 2, 10, 10, [1, 1, 1, 1]);
        assert_eq!(pixel(&canvas, 4, 3, 3), [1, 1, 1, 1]);
        assert_eq!(pixel(&canvas, 4, 1, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn test_blend_over_transparent_and_opaque() {
        let mut canvas = vec![0u8; 4];
        blend_pixel(&mut canvas, 1, 1, 0, 0, [255, 0, 0], 255);
        assert_eq!(canvas, vec![0, 0, 255, 255]);

        let mut canvas = vec![0, 0, 0, 255];
        blend_pixel(&mut canvas, 1, 1, 0, 0, [255, 255, 255], 51);
        assert_eq!(canvas, vec![51, 51, 51, 255]);

        // Out of bounds is ignored
        blend_pixel(&mut canvas, 1, 1, -1, 0, [255, 255, 255], 255);
        assert_eq!(canvas, vec![51, 51, 51, 255]);
    }

    #[test]
    fn test_menu_item_hit_testing() {
        assert_eq!(menu_item_at(0.0, 3), Some(0));
        assert_eq!(menu_item_at(26.0, 3), Some(1));
        assert_eq!(menu_item_at(75.0, 3), None);
        assert_eq!(menu_item_at(-1.0, 3), None);
        assert_eq!(menu_size(4), (MENU_WIDTH, 100));
    }
}
