// Background colour estimate for an uploaded portrait.
// Corners and edges are assumed to be background; taking the median box keeps
// a single contaminated sample (a shoulder touching a corner) from skewing it.
use image::RgbaImage;

use crate::types::Rgb;

/// Side of one sample box: 1/20 of the short side, never below 4 px.
pub fn box_side(width: u32, height: u32) -> u32 {
    (width.min(height) / 20).max(4)
}

/// Origins of the 16 sample boxes: 4 corners, then 3 boxes along each edge.
fn box_origins(w: u32, h: u32, side: u32) -> [(u32, u32); 16] {
    let right = w.saturating_sub(side);
    let bottom = h.saturating_sub(side);
    [
        (0, 0),
        (right, 0),
        (0, bottom),
        (right, bottom),
        // top
        (w / 4, 0),
        (w / 2, 0),
        (3 * w / 4, 0),
        // bottom
        (w / 4, bottom),
        (w / 2, bottom),
        (3 * w / 4, bottom),
        // left
        (0, h / 4),
        (0, h / 2),
        (0, 3 * h / 4),
        // right
        (right, h / 4),
        (right, h / 2),
        (right, 3 * h / 4),
    ]
}

/// Mean RGB of one box clipped to the image, or None when nothing is left.
fn box_mean(img: &RgbaImage, x0: u32, y0: u32, side: u32) -> Option<[f32; 3]> {
    let x1 = (x0 + side).min(img.width());
    let y1 = (y0 + side).min(img.height());
    if x0 >= x1 || y0 >= y1 {
        return None;
    }

    let mut sum = [0u64; 3];
    for y in y0..y1 {
        for x in x0..x1 {
            let p = img.get_pixel(x, y);
            sum[0] += p[0] as u64;
            sum[1] += p[1] as u64;
            sum[2] += p[2] as u64;
        }
    }
    let n = ((x1 - x0) * (y1 - y0)) as f32;
    Some([sum[0] as f32 / n, sum[1] as f32 / n, sum[2] as f32 / n])
}

/// Estimate the background colour: per-box means, sorted by R+G+B, middle one wins.
pub fn sample_background(img: &RgbaImage) -> Rgb {
    let (w, h) = img.dimensions();
    let side = box_side(w, h);

    let mut boxes: Vec<[f32; 3]> = box_origins(w, h, side)
        .iter()
        .filter_map(|&(x, y)| box_mean(img, x, y, side))
        .collect();

    if boxes.is_empty() {
        log::debug!("sample_background: {w}x{h} image has no sample boxes");
        return Rgb::new(0, 0, 0);
    }

    boxes.sort_by(|a, b| (a[0] + a[1] + a[2]).total_cmp(&(b[0] + b[1] + b[2])));
    let mid = boxes[boxes.len() / 2];
    let bg = Rgb::new(
        mid[0].round() as u8,
        mid[1].round() as u8,
        mid[2].round() as u8,
    );
    log::debug!("sample_background: {} boxes of {side}px -> {bg:?}", boxes.len());
    bg
}
