// Background removal for the avatar layer.
// Visual expectation: pixels close to the sampled background colour vanish,
// a thin feathered band softens the cut, the subject stays fully opaque.
// Manual tools (wand erase, lasso) punch extra holes and remember them in a ManualMask.
use image::{Rgba, RgbaImage};

use crate::types::{ManualMask, Point, Rgb};

/// The feather band runs from T to FEATHER_END * T.
pub const FEATHER_END: f32 = 1.5;

/// Alpha for one pixel at colour distance `dist` from the background.
/// `orig` is returned untouched outside the removal + feather range.
#[inline]
pub fn feather_alpha(dist: f32, tolerance: f32, orig: u8) -> u8 {
    if dist <= tolerance {
        return 0;
    }
    // T = 0 has an empty band (and would divide by zero).
    if tolerance > 0.0 && dist <= tolerance * FEATHER_END {
        let band = tolerance * (FEATHER_END - 1.0);
        return (255.0 * (dist - tolerance) / band).round().clamp(0.0, 255.0) as u8;
    }
    orig
}

fn sane_tolerance(tolerance: f32) -> f32 {
    if tolerance.is_finite() && tolerance > 0.0 { tolerance } else { 0.0 }
}

/// Build a fresh alpha-masked copy of `source` keyed against `background`.
/// Replaces whatever segmentation existed before; manual masks are not applied here.
pub fn segment(source: &RgbaImage, background: Rgb, tolerance: f32) -> RgbaImage {
    let t = sane_tolerance(tolerance);
    let mut out = source.clone();
    for p in out.pixels_mut() {
        let dist = background.distance(p);
        p[3] = feather_alpha(dist, t, p[3]);
    }
    out
}

/// Number of fully transparent pixels.
pub fn removed_count(img: &RgbaImage) -> usize {
    img.pixels().filter(|p| p[3] == 0).count()
}

/// "Magic wand" erase: flood the 4-connected region whose RGB lies within
/// `tolerance` of the seed pixel and zero its alpha, in the buffer and the mask.
/// Uses an explicit stack and a visited bitmap, so every pixel is examined once.
/// Returns how many pixels were erased.
pub fn flood_erase(
    buf: &mut RgbaImage,
    mask: &mut Option<ManualMask>,
    seed_x: u32,
    seed_y: u32,
    tolerance: f32,
) -> usize {
    let (w, h) = buf.dimensions();
    if seed_x >= w || seed_y >= h {
        return 0;
    }
    let t = sane_tolerance(tolerance);
    let seed = Rgb::of(buf.get_pixel(seed_x, seed_y));
    let mask = mask.get_or_insert_with(|| ManualMask::opaque(w, h));

    let mut visited = vec![false; (w * h) as usize];
    let mut stack = Vec::with_capacity(1024);
    stack.push((seed_x, seed_y));
    let mut erased = 0;

    while let Some((px, py)) = stack.pop() {
        let idx = (py * w + px) as usize;
        if visited[idx] {
            continue;
        }
        visited[idx] = true;

        let p = buf.get_pixel_mut(px, py);
        // Alpha is ignored: already-erased pixels still compare by colour.
        if seed.distance(p) > t {
            continue;
        }
        p[3] = 0;
        mask.cut(px, py);
        erased += 1;

        let neighbors = [
            (px.wrapping_sub(1), py),
            (px + 1, py),
            (px, py.wrapping_sub(1)),
            (px, py + 1),
        ];
        for (nx, ny) in neighbors {
            if nx >= w || ny >= h {
                continue;
            }
            if !visited[(ny * w + nx) as usize] {
                stack.push((nx, ny));
            }
        }
    }

    log::debug!("flood_erase: seed ({seed_x},{seed_y}) {seed:?} tol {t} erased {erased}");
    erased
}

/// Even-odd ray casting: toggle on every edge a horizontal ray from (x, y) crosses.
pub fn point_in_polygon(x: f32, y: f32, polygon: &[Point]) -> bool {
    let mut inside = false;
    let mut j = polygon.len().wrapping_sub(1);
    for i in 0..polygon.len() {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > y) != (b.y > y) && x < (b.x - a.x) * (y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Cut everything outside `polygon` (canvas coordinates). The buffer sits at
/// `origin` with uniform `scale`; rotation is not taken into account.
/// Fewer than three points is a no-op. Returns how many pixels changed.
pub fn lasso_mask(
    buf: &mut RgbaImage,
    mask: &mut Option<ManualMask>,
    polygon: &[Point],
    origin: Point,
    scale: f32,
) -> usize {
    if polygon.len() < 3 {
        return 0;
    }
    let (w, h) = buf.dimensions();
    let mask = mask.get_or_insert_with(|| ManualMask::opaque(w, h));

    let mut changed = 0;
    for (px, py, p) in buf.enumerate_pixels_mut() {
        let cx = px as f32 * scale + origin.x;
        let cy = py as f32 * scale + origin.y;
        if point_in_polygon(cx, cy, polygon) {
            continue;
        }
        if p[3] != 0 {
            changed += 1;
        }
        p[3] = 0;
        mask.cut(px, py);
    }
    log::debug!("lasso_mask: {} points, {changed} pixels cut", polygon.len());
    changed
}

/// Re-apply earlier manual cuts on top of a fresh segmentation.
pub fn apply_manual_mask(buf: &mut RgbaImage, mask: &ManualMask) {
    if buf.dimensions() != (mask.width, mask.height) {
        log::warn!("apply_manual_mask: mask size does not match avatar, skipped");
        return;
    }
    for (x, y, p) in buf.enumerate_pixels_mut() {
        if mask.is_cut(x, y) {
            *p = Rgba([p[0], p[1], p[2], 0]);
        }
    }
}
