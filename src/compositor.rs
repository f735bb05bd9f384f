// Draws the whole scene onto the canvas frame buffer.
// Visual: dark backdrop, then each cutout with a soft white glow under it,
// stamps on top, and the two neon-green branding lines last.
use image::RgbaImage;

use crate::font;
use crate::gamma::GammaLut;
use crate::glow::{self, Coverage};
use crate::scene::{LayerKind, Scene, Transform};
use crate::types::{FrameBuffer, Rgb};

pub const BACKGROUND: Rgb = Rgb::new(0x0e, 0x10, 0x22);

const LAYER_GLOW: Rgb = Rgb::new(255, 255, 255);
const LAYER_GLOW_OPACITY: f32 = 0.8;
const LAYER_GLOW_RADIUS: usize = 20; // three passes, roughly a 40 px blur

const TEXT_COLOR: Rgb = Rgb::new(0x39, 0xff, 0x14);
const TEXT_GLOW_RADIUS: usize = 7;
const TEXT_SCALE: i32 = 3;
const TEXT_X: i32 = 20;
/// Baselines of the two branding lines.
const TEXT_BASELINES: [i32; 2] = [40, 70];

/// Where a source image lands on the canvas.
#[derive(Clone, Copy, Debug)]
struct Placement {
    tf: Transform,
    w: u32,
    h: u32,
    /// sin/cos of the rotation about the layer centre (0 rad when unsupported).
    sin: f32,
    cos: f32,
    center: (f32, f32),
}

impl Placement {
    fn new(tf: Transform, w: u32, h: u32, rotates: bool) -> Self {
        let theta = if rotates { tf.rotation.to_radians() } else { 0.0 };
        let (sin, cos) = theta.sin_cos();
        let (sw, sh) = tf.size(w, h);
        let center = (tf.x + sw / 2.0, tf.y + sh / 2.0);
        Self { tf, w, h, sin, cos, center }
    }

    /// Canvas pixel box [x0, x1) x [y0, y1) covering the (possibly rotated) layer.
    fn bounds(&self) -> (i32, i32, i32, i32) {
        let (sw, sh) = self.tf.size(self.w, self.h);
        let (cx, cy) = self.center;
        let (s, c) = (self.sin, self.cos);
        let (hx, hy) = (sw / 2.0, sh / 2.0);
        // Half extents of the rotated rectangle.
        let ex = (hx * c).abs() + (hy * s).abs();
        let ey = (hx * s).abs() + (hy * c).abs();
        (
            (cx - ex).floor() as i32,
            (cy - ey).floor() as i32,
            (cx + ex).ceil() as i32,
            (cy + ey).ceil() as i32,
        )
    }

    /// Source pixel under the centre of canvas pixel (x, y), if any.
    #[inline]
    fn source_at(&self, x: i32, y: i32) -> Option<(u32, u32)> {
        let (cx, cy) = self.center;
        let (dx, dy) = (x as f32 + 0.5 - cx, y as f32 + 0.5 - cy);
        // Undo the rotation about the centre.
        let (s, c) = (self.sin, self.cos);
        let (ux, uy) = (dx * c + dy * s, -dx * s + dy * c);
        let (sw, sh) = self.tf.size(self.w, self.h);
        let lx = ((ux + sw / 2.0) / self.tf.scale).floor();
        let ly = ((uy + sh / 2.0) / self.tf.scale).floor();
        if lx < 0.0 || ly < 0.0 || lx >= self.w as f32 || ly >= self.h as f32 {
            return None;
        }
        Some((lx as u32, ly as u32))
    }

    /// Visit every canvas pixel the layer covers, clipped to a `fw` x `fh` canvas
    /// grown by `margin`, with the sampled source pixel.
    fn for_each(&self, img: &RgbaImage, fw: usize, fh: usize, margin: i32, mut f: impl FnMut(i32, i32, [u8; 4])) {
        let (x0, y0, x1, y1) = self.bounds();
        let x0 = x0.max(-margin);
        let y0 = y0.max(-margin);
        let x1 = x1.min(fw as i32 + margin);
        let y1 = y1.min(fh as i32 + margin);
        for y in y0..y1 {
            for x in x0..x1 {
                if let Some((sx, sy)) = self.source_at(x, y) {
                    f(x, y, img.get_pixel(sx, sy).0);
                }
            }
        }
    }
}

pub struct Compositor {
    lut: GammaLut,
}

impl Compositor {
    pub fn new() -> Self {
        Self { lut: GammaLut::new() }
    }

    /// Redraw everything. Reads the scene only; same scene in, same pixels out.
    pub fn render(&self, scene: &Scene, fb: &mut FrameBuffer) {
        fb.fill(BACKGROUND.packed());

        for kind in scene.stacking() {
            if let Some((img, tf)) = scene.layer(kind) {
                let rotates = kind == LayerKind::Avatar && scene.caps().rotation;
                self.draw_glowing(fb, img, Placement::new(tf, img.width(), img.height(), rotates));
            }
        }

        for stamp in scene.placed_stamps() {
            let tf = Transform { x: stamp.x, y: stamp.y, scale: stamp.scale, rotation: 0.0 };
            let img = stamp.image.as_ref();
            self.draw_glowing(fb, img, Placement::new(tf, img.width(), img.height(), false));
        }

        let branding = &scene.caps().branding;
        self.draw_branding(fb, [branding[0].as_str(), branding[1].as_str()]);
    }

    /// Glow pass (blurred silhouette + image), then a sharp redraw on top.
    fn draw_glowing(&self, fb: &mut FrameBuffer, img: &RgbaImage, at: Placement) {
        if at.tf.scale <= 0.0 || img.width() == 0 || img.height() == 0 {
            return;
        }
        let margin = (LAYER_GLOW_RADIUS * glow::BLUR_PASSES) as i32;
        let (x0, y0, x1, y1) = at.bounds();
        let mut cov = Coverage::around(
            x0.max(-margin),
            y0.max(-margin),
            x1.min(fb.width as i32 + margin),
            y1.min(fb.height as i32 + margin),
            margin,
        );
        at.for_each(img, fb.width, fb.height, margin, |x, y, p| {
            cov.set(x, y, p[3] as f32 / 255.0);
        });
        if cov.is_empty() {
            return;
        }
        glow::blur(&mut cov, LAYER_GLOW_RADIUS);
        glow::shadow(fb, &cov, LAYER_GLOW, LAYER_GLOW_OPACITY, &self.lut);

        self.draw_image(fb, img, at);
        self.draw_image(fb, img, at);
    }

    fn draw_image(&self, fb: &mut FrameBuffer, img: &RgbaImage, at: Placement) {
        let (w, h) = (fb.width, fb.height);
        at.for_each(img, w, h, 0, |x, y, p| {
            if p[3] == 0 {
                return;
            }
            let idx = y as usize * w + x as usize;
            let a = p[3] as f32 / 255.0;
            fb.pixels[idx] = self.lut.over(fb.pixels[idx], Rgb::new(p[0], p[1], p[2]), a);
        });
    }

    fn draw_branding(&self, fb: &mut FrameBuffer, lines: [&str; 2]) {
        let glyph_h = font::GLYPH_H * TEXT_SCALE;
        let margin = (TEXT_GLOW_RADIUS * glow::BLUR_PASSES) as i32;

        for (line, baseline) in lines.iter().zip(TEXT_BASELINES) {
            if line.is_empty() {
                continue;
            }
            let top = baseline - glyph_h;
            let width = font::text_width(line, TEXT_SCALE);
            let mut cov = Coverage::around(TEXT_X, top, TEXT_X + width, baseline, margin);
            font::for_each_pixel(line, TEXT_X, top, TEXT_SCALE, |x, y| cov.set(x, y, 1.0));

            glow::blur(&mut cov, TEXT_GLOW_RADIUS);
            glow::shadow(fb, &cov, TEXT_COLOR, 1.0, &self.lut);

            let packed = TEXT_COLOR.packed();
            font::for_each_pixel(line, TEXT_X, top, TEXT_SCALE, |x, y| {
                if x >= 0 && y >= 0 && (x as usize) < fb.width && (y as usize) < fb.height {
                    fb.pixels[y as usize * fb.width + x as usize] = packed;
                }
            });
        }
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Capabilities, Profile};
    use crate::scene::Gallery;
    use crate::types::Point;
    use image::Rgba;

    fn scene_with(profile: Profile) -> Scene {
        let mut caps = Capabilities::for_profile(profile);
        caps.branding = [String::new(), String::new()];
        Scene::new(caps)
    }

    fn red_on_blue(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            if x >= 10 && x < w - 10 && y >= 10 && y < h - 10 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        })
    }

    #[test]
    fn empty_scene_is_backdrop_only() {
        let scene = scene_with(Profile::Classic);
        let mut fb = FrameBuffer::new(800, 600);
        Compositor::new().render(&scene, &mut fb);
        assert!(fb.pixels.iter().all(|&p| p == BACKGROUND.packed()));
    }

    #[test]
    fn render_is_deterministic() {
        let mut scene = Scene::new(Capabilities::for_profile(Profile::Classic));
        scene.set_avatar(red_on_blue(60, 60));
        scene.set_avatar_rotation(30.0);
        scene.gallery_loaded(Gallery::Stamps, 0, RgbaImage::from_pixel(20, 20, Rgba([0, 255, 0, 255])));
        scene.place_stamp(0, Point::new(100.0, 100.0));

        let comp = Compositor::new();
        let mut a = FrameBuffer::new(800, 600);
        let mut b = FrameBuffer::new(800, 600);
        comp.render(&scene, &mut a);
        comp.render(&scene, &mut b);
        comp.render(&scene, &mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn cutout_subject_is_sharp_and_background_glows() {
        let mut scene = scene_with(Profile::Classic);
        scene.set_avatar(red_on_blue(60, 60));
        let mut fb = FrameBuffer::new(800, 600);
        Compositor::new().render(&scene, &mut fb);

        // Avatar sits at (370, 270); its red core starts 10 px in.
        assert_eq!(fb.get(400, 300), 0xff0000);
        // The removed blue frame shows the backdrop lit by the glow, never blue.
        let frame = Rgb::from_packed(fb.get(372, 272));
        assert!(frame.r > BACKGROUND.r && frame.b != 255, "{frame:?}");
        // Far away stays untouched.
        assert_eq!(fb.get(5, 590), BACKGROUND.packed());
    }

    #[test]
    fn z_order_follows_profile() {
        for (profile, top) in [(Profile::Classic, 0x00ff00), (Profile::Editor, 0xff0000)] {
            let mut scene = scene_with(profile);
            scene.set_avatar(red_on_blue(60, 60));
            // Green merch covering the avatar centre.
            scene.gallery_loaded(Gallery::Merch, 0, RgbaImage::from_pixel(40, 40, Rgba([0, 255, 0, 255])));
            scene.move_layer(LayerKind::Merch, Point::new(380.0, 280.0));
            let mut fb = FrameBuffer::new(800, 600);
            Compositor::new().render(&scene, &mut fb);
            assert_eq!(fb.get(400, 300), top, "{profile:?}");
        }
    }

    #[test]
    fn rotation_turns_the_avatar_about_its_centre() {
        let mut scene = scene_with(Profile::Classic);
        // Blue 100x100 backdrop with a horizontal red bar through the middle.
        let bar = RgbaImage::from_fn(100, 100, |x, y| {
            if (20..80).contains(&x) && (45..55).contains(&y) {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        scene.set_avatar(bar);
        let comp = Compositor::new();
        let mut fb = FrameBuffer::new(800, 600);

        // Centre of the avatar is (400, 300).
        comp.render(&scene, &mut fb);
        assert_eq!(fb.get(420, 300), 0xff0000);
        assert_ne!(fb.get(400, 320), 0xff0000);

        scene.set_avatar_rotation(90.0);
        comp.render(&scene, &mut fb);
        assert_eq!(fb.get(400, 320), 0xff0000);
        assert_ne!(fb.get(420, 300), 0xff0000);
    }

    #[test]
    fn branding_text_is_drawn_last() {
        let mut scene = Scene::new(Capabilities::for_profile(Profile::Classic));
        // Merch right under the text.
        scene.gallery_loaded(Gallery::Merch, 0, RgbaImage::from_pixel(300, 100, Rgba([255, 0, 0, 255])));
        scene.move_layer(LayerKind::Merch, Point::new(0.0, 0.0));
        let mut fb = FrameBuffer::new(800, 600);
        Compositor::new().render(&scene, &mut fb);
        // 'A' top row is 0x0E: column 1 of the glyph is lit, scaled by 3.
        assert_eq!(fb.get(20 + 3, 40 - 21), TEXT_COLOR.packed());
    }
}
