// Window + software overlay drawing.
// The window shows the composited canvas with a few UI-only overlays on top:
// the crosshair under the mouse, the lasso polyline in progress, the resize
// handles and a one-line HUD. None of these end up in an exported PNG.

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use crate::error::Error;
use crate::font;
use crate::types::{FrameBuffer, Point};

pub struct Drawer {
    window: Window,
}

impl Drawer {
    /// Open a window exactly the size of the canvas.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self, Error> {
        let mut window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        window.set_target_fps(60);
        Ok(Self { window })
    }

    /// Push the pixels for this frame to the screen (also pumps input events).
    pub fn present(&mut self, framebuffer: &FrameBuffer) -> Result<(), Error> {
        self.window
            .update_with_buffer(&framebuffer.pixels, framebuffer.width, framebuffer.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// Keys that went down since the last frame, without auto-repeat.
    pub fn keys_pressed(&self) -> Vec<Key> {
        self.window.get_keys_pressed(KeyRepeat::No)
    }

    /// Mouse position in canvas pixels, `None` while outside the window.
    pub fn mouse_pos(&self) -> Option<Point> {
        self.window.get_mouse_pos(MouseMode::Discard).map(|(x, y)| Point::new(x, y))
    }

    pub fn left_mouse_down(&self) -> bool {
        self.window.get_mouse_down(MouseButton::Left)
    }
}

/* ---------- Software drawing: pixels, lines, crosshair, text ---------- */

/// Put a pixel on the framebuffer if (x,y) is inside bounds.
#[inline]
pub fn put_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    let idx = y * fb.width + x;
    fb.pixels[idx] = color;
}

/// Bresenham line, clipped per pixel.
pub fn draw_line(fb: &mut FrameBuffer, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
    let (mut x0, mut y0) = (x0, y0);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put_pixel(fb, x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Small "+" with a gap in the middle, centred at (cx,cy).
pub fn draw_crosshair(fb: &mut FrameBuffer, cx: i32, cy: i32, size: i32, color: u32) {
    draw_line(fb, cx - size, cy, cx - 2, cy, color);
    draw_line(fb, cx + 2, cy, cx + size, cy, color);
    draw_line(fb, cx, cy - size, cx, cy - 2, color);
    draw_line(fb, cx, cy + 2, cx, cy + size, color);
    put_pixel(fb, cx, cy, color);
}

/// Open polyline through `points`, plus a rubber-band segment to `cursor`.
/// Every vertex gets a 3x3 dot so single clicks are visible.
pub fn draw_polyline(fb: &mut FrameBuffer, points: &[Point], cursor: Option<Point>, color: u32) {
    let px = |p: &Point| (p.x.round() as i32, p.y.round() as i32);
    for pair in points.windows(2) {
        let ((x0, y0), (x1, y1)) = (px(&pair[0]), px(&pair[1]));
        draw_line(fb, x0, y0, x1, y1, color);
    }
    if let (Some(last), Some(c)) = (points.last(), cursor) {
        let ((x0, y0), (x1, y1)) = (px(last), px(&c));
        draw_line(fb, x0, y0, x1, y1, color);
    }
    for p in points {
        let (x, y) = px(p);
        for dy in -1..=1 {
            for dx in -1..=1 {
                put_pixel(fb, x + dx, y + dy, color);
            }
        }
    }
}

/// Outline of an axis-aligned rectangle given its top-left and size.
pub fn draw_rect(fb: &mut FrameBuffer, x: f32, y: f32, w: f32, h: f32, color: u32) {
    let (x0, y0) = (x.round() as i32, y.round() as i32);
    let (x1, y1) = ((x + w).round() as i32, (y + h).round() as i32);
    draw_line(fb, x0, y0, x1, y0, color);
    draw_line(fb, x1, y0, x1, y1, color);
    draw_line(fb, x1, y1, x0, y1, color);
    draw_line(fb, x0, y1, x0, y0, color);
}

/// HUD text at font scale 1 with a 1-pixel black shadow for contrast.
pub fn draw_text(fb: &mut FrameBuffer, x: i32, y: i32, text: &str, color: u32) {
    font::for_each_pixel(text, x + 1, y + 1, 1, |px, py| put_pixel(fb, px, py, 0x00000000));
    font::for_each_pixel(text, x, y, 1, |px, py| put_pixel(fb, px, py, color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_hits_both_endpoints_and_clips() {
        let mut fb = FrameBuffer::new(10, 10);
        draw_line(&mut fb, -5, 2, 9, 2, 1);
        assert_eq!(fb.get(0, 2), 1);
        assert_eq!(fb.get(9, 2), 1);
        assert_eq!(fb.pixels.iter().filter(|&&p| p == 1).count(), 10);
    }

    #[test]
    fn polyline_draws_rubber_band_to_cursor() {
        let mut fb = FrameBuffer::new(20, 20);
        let pts = [Point::new(2.0, 2.0), Point::new(10.0, 2.0)];
        draw_polyline(&mut fb, &pts, Some(Point::new(10.0, 15.0)), 7);
        assert_eq!(fb.get(6, 2), 7);
        assert_eq!(fb.get(10, 9), 7);
        // vertex dot
        assert_eq!(fb.get(1, 1), 7);
    }

    #[test]
    fn text_has_shadow_offset() {
        let mut fb = FrameBuffer::new(20, 12);
        fb.fill(0x123456);
        draw_text(&mut fb, 0, 0, "|", 0xffffff);
        // '|' lives in column 2 of the glyph.
        assert_eq!(fb.get(2, 0), 0xffffff);
        assert_eq!(fb.get(3, 7), 0x000000);
        assert_eq!(fb.get(3, 1), 0x000000);
        assert_eq!(fb.get(0, 0), 0x123456);
    }
}
