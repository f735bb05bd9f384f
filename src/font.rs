// 5x7 bitmap font covering printable ASCII.
// Used for the branding lines on the canvas and the HUD line in the window.
// Each u8 is a row; the low 5 bits are the pixels (bit 4 = leftmost).

pub const GLYPH_W: i32 = 5;
pub const GLYPH_H: i32 = 7;
/// Horizontal advance per character in font pixels (glyph + 1 px spacing).
pub const ADVANCE: i32 = GLYPH_W + 1;

#[rustfmt::skip]
const GLYPHS: [[u8; 7]; 95] = [
    [0x00,0x00,0x00,0x00,0x00,0x00,0x00], // ' '
    [0x04,0x04,0x04,0x04,0x00,0x00,0x04], // !
    [0x0A,0x0A,0x0A,0x00,0x00,0x00,0x00], // "
    [0x0A,0x0A,0x1F,0x0A,0x1F,0x0A,0x0A], // #
    [0x04,0x0F,0x14,0x0E,0x05,0x1E,0x04], // $
    [0x18,0x19,0x02,0x04,0x08,0x13,0x03], // %
    [0x0C,0x12,0x14,0x08,0x15,0x12,0x0D], // &
    [0x0C,0x04,0x08,0x00,0x00,0x00,0x00], // '
    [0x02,0x04,0x08,0x08,0x08,0x04,0x02], // (
    [0x08,0x04,0x02,0x02,0x02,0x04,0x08], // )
    [0x00,0x04,0x15,0x0E,0x15,0x04,0x00], // *
    [0x00,0x04,0x04,0x1F,0x04,0x04,0x00], // +
    [0x00,0x00,0x00,0x00,0x0C,0x04,0x08], // ,
    [0x00,0x00,0x00,0x1F,0x00,0x00,0x00], // -
    [0x00,0x00,0x00,0x00,0x00,0x0C,0x0C], // .
    [0x00,0x01,0x02,0x04,0x08,0x10,0x00], // /
    [0x0E,0x11,0x13,0x15,0x19,0x11,0x0E], // 0
    [0x04,0x0C,0x04,0x04,0x04,0x04,0x0E], // 1
    [0x0E,0x11,0x01,0x02,0x04,0x08,0x1F], // 2
    [0x1F,0x02,0x04,0x02,0x01,0x11,0x0E], // 3
    [0x02,0x06,0x0A,0x12,0x1F,0x02,0x02], // 4
    [0x1F,0x10,0x1E,0x01,0x01,0x11,0x0E], // 5
    [0x06,0x08,0x10,0x1E,0x11,0x11,0x0E], // 6
    [0x1F,0x01,0x02,0x04,0x08,0x08,0x08], // 7
    [0x0E,0x11,0x11,0x0E,0x11,0x11,0x0E], // 8
    [0x0E,0x11,0x11,0x0F,0x01,0x02,0x0C], // 9
    [0x00,0x0C,0x0C,0x00,0x0C,0x0C,0x00], // :
    [0x00,0x0C,0x0C,0x00,0x0C,0x04,0x08], // ;
    [0x02,0x04,0x08,0x10,0x08,0x04,0x02], // <
    [0x00,0x00,0x1F,0x00,0x1F,0x00,0x00], // =
    [0x08,0x04,0x02,0x01,0x02,0x04,0x08], // >
    [0x0E,0x11,0x01,0x02,0x04,0x00,0x04], // ?
    [0x0E,0x11,0x01,0x0D,0x15,0x15,0x0E], // @
    [0x0E,0x11,0x11,0x11,0x1F,0x11,0x11], // A
    [0x1E,0x11,0x11,0x1E,0x11,0x11,0x1E], // B
    [0x0E,0x11,0x10,0x10,0x10,0x11,0x0E], // C
    [0x1C,0x12,0x11,0x11,0x11,0x12,0x1C], // D
    [0x1F,0x10,0x10,0x1E,0x10,0x10,0x1F], // E
    [0x1F,0x10,0x10,0x1E,0x10,0x10,0x10], // F
    [0x0E,0x11,0x10,0x17,0x11,0x11,0x0F], // G
    [0x11,0x11,0x11,0x1F,0x11,0x11,0x11], // H
    [0x0E,0x04,0x04,0x04,0x04,0x04,0x0E], // I
    [0x07,0x02,0x02,0x02,0x02,0x12,0x0C], // J
    [0x11,0x12,0x14,0x18,0x14,0x12,0x11], // K
    [0x10,0x10,0x10,0x10,0x10,0x10,0x1F], // L
    [0x11,0x1B,0x15,0x15,0x11,0x11,0x11], // M
    [0x11,0x11,0x19,0x15,0x13,0x11,0x11], // N
    [0x0E,0x11,0x11,0x11,0x11,0x11,0x0E], // O
    [0x1E,0x11,0x11,0x1E,0x10,0x10,0x10], // P
    [0x0E,0x11,0x11,0x11,0x15,0x12,0x0D], // Q
    [0x1E,0x11,0x11,0x1E,0x14,0x12,0x11], // R
    [0x0F,0x10,0x10,0x0E,0x01,0x01,0x1E], // S
    [0x1F,0x04,0x04,0x04,0x04,0x04,0x04], // T
    [0x11,0x11,0x11,0x11,0x11,0x11,0x0E], // U
    [0x11,0x11,0x11,0x11,0x11,0x0A,0x04], // V
    [0x11,0x11,0x11,0x15,0x15,0x15,0x0A], // W
    [0x11,0x11,0x0A,0x04,0x0A,0x11,0x11], // X
    [0x11,0x11,0x11,0x0A,0x04,0x04,0x04], // Y
    [0x1F,0x01,0x02,0x04,0x08,0x10,0x1F], // Z
    [0x0E,0x08,0x08,0x08,0x08,0x08,0x0E], // [
    [0x00,0x10,0x08,0x04,0x02,0x01,0x00], // \
    [0x0E,0x02,0x02,0x02,0x02,0x02,0x0E], // ]
    [0x04,0x0A,0x11,0x00,0x00,0x00,0x00], // ^
    [0x00,0x00,0x00,0x00,0x00,0x00,0x1F], // _
    [0x08,0x04,0x02,0x00,0x00,0x00,0x00], // `
    [0x00,0x00,0x0E,0x01,0x0F,0x11,0x0F], // a
    [0x10,0x10,0x16,0x19,0x11,0x11,0x1E], // b
    [0x00,0x00,0x0E,0x10,0x10,0x11,0x0E], // c
    [0x01,0x01,0x0D,0x13,0x11,0x11,0x0F], // d
    [0x00,0x00,0x0E,0x11,0x1F,0x10,0x0E], // e
    [0x06,0x09,0x08,0x1C,0x08,0x08,0x08], // f
    [0x00,0x0F,0x11,0x11,0x0F,0x01,0x0E], // g
    [0x10,0x10,0x16,0x19,0x11,0x11,0x11], // h
    [0x04,0x00,0x0C,0x04,0x04,0x04,0x0E], // i
    [0x02,0x00,0x06,0x02,0x02,0x12,0x0C], // j
    [0x10,0x10,0x12,0x14,0x18,0x14,0x12], // k
    [0x0C,0x04,0x04,0x04,0x04,0x04,0x0E], // l
    [0x00,0x00,0x1A,0x15,0x15,0x11,0x11], // m
    [0x00,0x00,0x16,0x19,0x11,0x11,0x11], // n
    [0x00,0x00,0x0E,0x11,0x11,0x11,0x0E], // o
    [0x00,0x00,0x1E,0x11,0x1E,0x10,0x10], // p
    [0x00,0x00,0x0D,0x13,0x0F,0x01,0x01], // q
    [0x00,0x00,0x16,0x19,0x10,0x10,0x10], // r
    [0x00,0x00,0x0E,0x10,0x0E,0x01,0x1E], // s
    [0x08,0x08,0x1C,0x08,0x08,0x09,0x06], // t
    [0x00,0x00,0x11,0x11,0x11,0x13,0x0D], // u
    [0x00,0x00,0x11,0x11,0x11,0x0A,0x04], // v
    [0x00,0x00,0x11,0x11,0x15,0x15,0x0A], // w
    [0x00,0x00,0x11,0x0A,0x04,0x0A,0x11], // x
    [0x00,0x00,0x11,0x11,0x0F,0x01,0x0E], // y
    [0x00,0x00,0x1F,0x02,0x04,0x08,0x1F], // z
    [0x02,0x04,0x04,0x08,0x04,0x04,0x02], // {
    [0x04,0x04,0x04,0x04,0x04,0x04,0x04], // |
    [0x08,0x04,0x04,0x02,0x04,0x04,0x08], // }
    [0x00,0x00,0x08,0x15,0x02,0x00,0x00], // ~
];

/// Rows for `ch`; anything outside printable ASCII renders as '?'.
pub fn glyph(ch: char) -> &'static [u8; 7] {
    let code = ch as u32;
    if (0x20..0x7F).contains(&code) {
        &GLYPHS[(code - 0x20) as usize]
    } else {
        &GLYPHS[('?' as u32 - 0x20) as usize]
    }
}

/// Call `plot(x, y)` for every lit canvas pixel of `text` drawn at font `scale`
/// with its top-left corner at (x, y).
pub fn for_each_pixel(text: &str, x: i32, y: i32, scale: i32, mut plot: impl FnMut(i32, i32)) {
    let mut pen_x = x;
    for ch in text.chars() {
        for (ry, rowbits) in glyph(ch).iter().enumerate() {
            for rx in 0..GLYPH_W {
                if rowbits & (1 << (4 - rx)) == 0 {
                    continue;
                }
                let (cx, cy) = (pen_x + rx * scale, y + ry as i32 * scale);
                for dy in 0..scale {
                    for dx in 0..scale {
                        plot(cx + dx, cy + dy);
                    }
                }
            }
        }
        pen_x += ADVANCE * scale;
    }
}

/// Width in canvas pixels of `text` at `scale`.
pub fn text_width(text: &str, scale: i32) -> i32 {
    text.chars().count() as i32 * ADVANCE * scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lines_up_with_ascii() {
        assert_eq!(glyph('A')[0], 0x0E);
        assert_eq!(glyph('L')[6], 0x1F);
        assert_eq!(glyph('~'), &GLYPHS[94]);
        assert_eq!(glyph('é'), glyph('?'));
    }

    #[test]
    fn scaled_pixels_fill_blocks() {
        let mut lit = Vec::new();
        for_each_pixel("|", 10, 20, 2, |x, y| lit.push((x, y)));
        // '|' is a single column 7 rows tall -> 2x2 blocks per row.
        assert_eq!(lit.len(), 7 * 4);
        assert!(lit.contains(&(14, 20)));
        assert!(lit.contains(&(15, 33)));
        assert_eq!(text_width("ab", 3), 36);
    }
}
