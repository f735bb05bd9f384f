// Core types shared by the sampler, the segmentation engine, the scene and the compositor.

use image::{Rgba, RgbaImage};

/// The surface everything is composited onto; shown in the window and exported.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    pub width: usize,     // canvas width in pixels
    pub height: usize,    // canvas height in pixels
    pub pixels: Vec<u32>, // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u32; width * height] }
    }

    pub fn fill(&mut self, color: u32) {
        for p in &mut self.pixels {
            *p = color;
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }

    /// Opaque RGBA copy, used by PNG export.
    pub fn to_rgba(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let p = self.get(x as usize, y as usize);
            Rgba([(p >> 16) as u8, (p >> 8) as u8, p as u8, 255])
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Unpack from 0x00RRGGBB.
    pub const fn from_packed(p: u32) -> Self {
        Self { r: (p >> 16) as u8, g: (p >> 8) as u8, b: p as u8 }
    }

    pub const fn packed(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Euclidean distance in RGB space; alpha is ignored.
    #[inline]
    pub fn distance(self, p: &Rgba<u8>) -> f32 {
        let dr = p[0] as f32 - self.r as f32;
        let dg = p[1] as f32 - self.g as f32;
        let db = p[2] as f32 - self.b as f32;
        (dr * dr + dg * dg + db * db).sqrt()
    }

    pub fn of(p: &Rgba<u8>) -> Self {
        Self { r: p[0], g: p[1], b: p[2] }
    }
}

/// A position in canvas coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Alpha-only record of manual cuts over the segmented avatar.
/// 255 = keep, 0 = cut by a wand erase or a lasso.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManualMask {
    pub width: u32,
    pub height: u32,
    pub alpha: Vec<u8>, // length = width * height
}

impl ManualMask {
    /// Everything visible; the state before the first manual edit.
    pub fn opaque(width: u32, height: u32) -> Self {
        Self { width, height, alpha: vec![255; (width * height) as usize] }
    }

    #[inline]
    pub fn cut(&mut self, x: u32, y: u32) {
        self.alpha[(y * self.width + x) as usize] = 0;
    }

    #[inline]
    pub fn is_cut(&self, x: u32, y: u32) -> bool {
        self.alpha[(y * self.width + x) as usize] == 0
    }
}
