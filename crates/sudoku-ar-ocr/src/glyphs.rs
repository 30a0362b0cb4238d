//! Built-in 5×7 digit font.
//!
//! Serves as the reference the template classifier correlates against and
//! as the pen used to render synthetic puzzles.

pub const GLYPH_WIDTH: usize = 5;
pub const GLYPH_HEIGHT: usize = 7;

// One row per byte, bit 4 = leftmost column. Every glyph is 8-connected and
// spans all seven rows.
const FONT: [[u8; GLYPH_HEIGHT]; 9] = [
    [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110], // 1
    [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111], // 2
    [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110], // 3
    [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010], // 4
    [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110], // 5
    [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110], // 6
    [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000], // 7
    [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110], // 8
    [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100], // 9
];

/// Whether font cell `(x, y)` of `digit` is inked. Out-of-range input is blank.
pub fn glyph_ink(digit: u8, x: usize, y: usize) -> bool {
    if !(1..=9).contains(&digit) || x >= GLYPH_WIDTH || y >= GLYPH_HEIGHT {
        return false;
    }
    let row = FONT[digit as usize - 1][y];
    row & (1 << (GLYPH_WIDTH - 1 - x)) != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyphs_span_full_height_and_differ() {
        for d in 1..=9u8 {
            for y in 0..GLYPH_HEIGHT {
                assert!((0..GLYPH_WIDTH).any(|x| glyph_ink(d, x, y)), "digit {d} row {y}");
            }
        }
        for a in 1..=9u8 {
            for b in (a + 1)..=9u8 {
                let same = (0..GLYPH_HEIGHT)
                    .all(|y| (0..GLYPH_WIDTH).all(|x| glyph_ink(a, x, y) == glyph_ink(b, x, y)));
                assert!(!same, "{a} and {b} share a bitmap");
            }
        }
        assert!(!glyph_ink(0, 2, 2));
        assert!(glyph_ink(1, 2, 0));
    }
}
