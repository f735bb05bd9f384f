// Soft glow behind cutouts and the branding text.
// Visual: a blurred, tinted silhouette of each layer appears underneath it,
// a soft outline that hugs the shape with no offset.
use crate::gamma::GammaLut;
use crate::types::{FrameBuffer, Rgb};

/// Three box passes approximate a Gaussian; radius ~ blur / 2.
pub const BLUR_PASSES: usize = 3;

/// Coverage (0..1) of a region of the canvas, with its origin in canvas pixels.
/// The region may stick out of the canvas; `shadow` clips when compositing.
pub struct Coverage {
    pub x0: i32,
    pub y0: i32,
    pub width: usize,
    pub height: usize,
    pub alpha: Vec<f32>, // length = width * height
}

impl Coverage {
    /// Empty coverage for the canvas box [x0, x1) x [y0, y1) grown by `margin` on every side.
    pub fn around(x0: i32, y0: i32, x1: i32, y1: i32, margin: i32) -> Self {
        let (x0, y0) = (x0 - margin, y0 - margin);
        let width = (x1 + margin - x0).max(0) as usize;
        let height = (y1 + margin - y0).max(0) as usize;
        Self { x0, y0, width, height, alpha: vec![0.0; width * height] }
    }

    /// Record coverage at a canvas pixel; out-of-region pixels are ignored.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, a: f32) {
        let (lx, ly) = (x - self.x0, y - self.y0);
        if lx < 0 || ly < 0 || lx as usize >= self.width || ly as usize >= self.height {
            return;
        }
        let idx = ly as usize * self.width + lx as usize;
        self.alpha[idx] = self.alpha[idx].max(a);
    }

    pub fn is_empty(&self) -> bool {
        self.alpha.iter().all(|&a| a <= 0.0)
    }
}

/// One sliding-window pass along rows (horizontal) or columns.
/// Outside the region counts as zero coverage, so the glow fades out at the margin.
fn box_pass(src: &[f32], dst: &mut [f32], w: usize, h: usize, radius: usize, horizontal: bool) {
    let r = radius as isize;
    let win = (2 * radius + 1) as f32;
    let (lines, len) = if horizontal { (h, w) } else { (w, h) };
    let at = |line: usize, i: usize| if horizontal { line * w + i } else { i * w + line };

    for line in 0..lines {
        // Prime the window [0..r]
        let mut sum = 0.0f32;
        for i in 0..=r.min(len as isize - 1) {
            sum += src[at(line, i as usize)];
        }
        // Slide: add the entering sample, drop the leaving one
        for i in 0..len as isize {
            dst[at(line, i as usize)] = sum / win;
            let enter = i + r + 1;
            let leave = i - r;
            if enter < len as isize {
                sum += src[at(line, enter as usize)];
            }
            if leave >= 0 {
                sum -= src[at(line, leave as usize)];
            }
        }
    }
}

/// Blur the coverage in place with `BLUR_PASSES` horizontal + vertical box passes.
pub fn blur(cov: &mut Coverage, radius: usize) {
    if radius == 0 || cov.alpha.is_empty() {
        return;
    }
    let (w, h) = (cov.width, cov.height);
    let mut tmp = vec![0.0f32; w * h];
    for _ in 0..BLUR_PASSES {
        box_pass(&cov.alpha, &mut tmp, w, h, radius, true);
        box_pass(&tmp, &mut cov.alpha, w, h, radius, false);
    }
}

/// Composite the coverage onto the canvas as `color` at `opacity`.
pub fn shadow(fb: &mut FrameBuffer, cov: &Coverage, color: Rgb, opacity: f32, lut: &GammaLut) {
    for ly in 0..cov.height {
        let y = cov.y0 + ly as i32;
        if y < 0 || y as usize >= fb.height {
            continue;
        }
        for lx in 0..cov.width {
            let x = cov.x0 + lx as i32;
            if x < 0 || x as usize >= fb.width {
                continue;
            }
            let a = cov.alpha[ly * cov.width + lx] * opacity;
            if a <= 1.0 / 512.0 {
                continue;
            }
            let idx = y as usize * fb.width + x as usize;
            fb.pixels[idx] = lut.over(fb.pixels[idx], color, a);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blur_preserves_mass_inside_margin() {
        let mut cov = Coverage::around(10, 10, 14, 14, 12);
        for y in 10..14 {
            for x in 10..14 {
                cov.set(x, y, 1.0);
            }
        }
        blur(&mut cov, 3);
        let total: f32 = cov.alpha.iter().sum();
        assert!((total - 16.0).abs() < 0.01, "total {total}");
        let peak = cov.alpha.iter().cloned().fold(0.0, f32::max);
        assert!(peak < 1.0);
    }

    #[test]
    fn shadow_clips_to_canvas() {
        let mut fb = FrameBuffer::new(8, 8);
        let mut cov = Coverage::around(-4, -4, 4, 4, 2);
        for y in -4..4 {
            for x in -4..4 {
                cov.set(x, y, 1.0);
            }
        }
        shadow(&mut fb, &cov, Rgb::new(255, 255, 255), 1.0, &GammaLut::new());
        assert_eq!(fb.get(0, 0), 0xffffff);
        assert_eq!(fb.get(3, 3), 0xffffff);
        assert_eq!(fb.get(4, 4), 0);
    }
}
