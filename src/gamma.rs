// Gamma-correct "over" blending for the compositor, with powf replaced by table lookups.
// Visual: cutout edges and glows mix into the backdrop without dark halos.

use crate::types::Rgb;

pub struct GammaLut {
    // sRGB(0..255) -> linear (0..1) as f32
    srgb_to_linear: [f32; 256],
    // linear(0..1) -> sRGB(0..255) via 4096-step quantization
    // (index = (linear * 4095).round())
    linear_to_srgb: [u8; 4096],
}

impl GammaLut {
    /// Build both tables once; the compositor owns one for its lifetime.
    pub fn new() -> Self {
        let mut s2l = [0.0f32; 256];
        for (v, slot) in s2l.iter_mut().enumerate() {
            let c = v as f32 / 255.0;
            *slot = if c <= 0.04045 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) };
        }

        let mut l2s = [0u8; 4096];
        for (i, slot) in l2s.iter_mut().enumerate() {
            let l = (i as f32) / 4095.0;
            let s = if l <= 0.003_130_8 { 12.92 * l } else { 1.055 * l.powf(1.0 / 2.4) - 0.055 };
            *slot = (s * 255.0).round().clamp(0.0, 255.0) as u8;
        }

        Self { srgb_to_linear: s2l, linear_to_srgb: l2s }
    }

    #[inline]
    pub fn srgb_u8_to_linear(&self, v: u8) -> f32 {
        self.srgb_to_linear[v as usize]
    }

    #[inline]
    pub fn linear_to_srgb_u8(&self, l: f32) -> u8 {
        let idx = (l.clamp(0.0, 1.0) * 4095.0).round() as usize;
        self.linear_to_srgb[idx]
    }

    /// Composite `src` at coverage `a` (0..1) over the packed 0x00RRGGBB `dst`.
    /// a >= 1 returns `src` exactly; a <= 0 returns `dst` untouched.
    #[inline]
    pub fn over(&self, dst: u32, src: Rgb, a: f32) -> u32 {
        if a <= 0.0 {
            return dst;
        }
        if a >= 1.0 {
            return src.packed();
        }
        let d = Rgb::from_packed(dst);
        let inv = 1.0 - a;
        let mix = |s: u8, d: u8| {
            self.linear_to_srgb_u8(a * self.srgb_u8_to_linear(s) + inv * self.srgb_u8_to_linear(d))
        };
        Rgb::new(mix(src.r, d.r), mix(src.g, d.g), mix(src.b, d.b)).packed()
    }
}

impl Default for GammaLut {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_exact() {
        let lut = GammaLut::new();
        let dst = 0x0e1022;
        let src = Rgb::new(200, 10, 99);
        assert_eq!(lut.over(dst, src, 0.0), dst);
        assert_eq!(lut.over(dst, src, 1.0), src.packed());
    }

    #[test]
    fn round_trip_is_stable() {
        let lut = GammaLut::new();
        for v in [0u8, 1, 14, 128, 254, 255] {
            let back = lut.linear_to_srgb_u8(lut.srgb_u8_to_linear(v));
            assert!((back as i16 - v as i16).abs() <= 1, "{v} -> {back}");
        }
    }

    #[test]
    fn half_white_over_black_is_light_grey() {
        let lut = GammaLut::new();
        let mixed = Rgb::from_packed(lut.over(0x000000, Rgb::new(255, 255, 255), 0.5));
        // Linear-light mixing lands well above the naive 128.
        assert!(mixed.r > 180 && mixed.r == mixed.g && mixed.g == mixed.b);
    }
}
