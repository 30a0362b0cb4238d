//! Synthetic camera frames of printed puzzles.
//!
//! Frames are rendered by inverse mapping: every frame pixel center is sent
//! through the frame-to-grid homography and inked if it lands on the ruling
//! or on a digit drawn in the built-in font. Any outline the homography can
//! express works, so rotated and perspective views come for free.

use crate::Frame;
use nalgebra::{Point2, Rotation2, Vector2};
use sudoku_ar_core::{homography_from_4pt, square_corners, Corners, GrayImage};
use sudoku_ar_ocr::{glyph_ink, GLYPH_HEIGHT, GLYPH_WIDTH};
use sudoku_ar_solver::{Givens, GRID_SIZE};

/// A puzzle page seen by the camera.
#[derive(Clone, Debug)]
pub struct PuzzleScene {
    pub width: usize,
    pub height: usize,
    /// Outer corners of the printed grid in the frame.
    pub corners: Corners,
    pub givens: Givens,
    pub paper: u8,
    pub ink: u8,
    /// Box borders and the outer frame, in cell units.
    pub thick_line: f32,
    /// Cell borders, in cell units.
    pub thin_line: f32,
    /// Digit height as a fraction of the cell.
    pub digit_height: f32,
}

impl PuzzleScene {
    pub fn new(width: usize, height: usize, corners: Corners, givens: Givens) -> Self {
        Self {
            width,
            height,
            corners,
            givens,
            paper: 235,
            ink: 30,
            thick_line: 0.08,
            thin_line: 0.035,
            digit_height: 0.55,
        }
    }

    /// Square grid of side `side` centered in the frame, rotated by `angle`
    /// radians (+x toward +y).
    pub fn centered(width: usize, height: usize, side: f32, angle: f32, givens: Givens) -> Self {
        let c = Vector2::new(width as f32 * 0.5, height as f32 * 0.5);
        let rot = Rotation2::new(angle);
        let h = side * 0.5;
        let at = |x: f32, y: f32| Point2::from(rot * Vector2::new(x, y) + c);
        let corners = Corners::new(at(-h, -h), at(h, -h), at(-h, h), at(h, h));
        Self::new(width, height, corners, givens)
    }

    fn ink_at(&self, u: f32, v: f32) -> bool {
        let n = GRID_SIZE as f32;
        if !(0.0..=n).contains(&u) || !(0.0..=n).contains(&v) {
            return false;
        }
        let on_rule = |t: f32| {
            let k = t.round();
            let d = (t - k).abs();
            let outer = k == 0.0 || k == n;
            let width = if outer {
                self.thick_line
            } else if (k as usize) % 3 == 0 {
                self.thick_line * 0.5
            } else {
                self.thin_line * 0.5
            };
            d <= width
        };
        if on_rule(u) || on_rule(v) {
            return true;
        }

        let (col, row) = ((u as usize).min(GRID_SIZE - 1), (v as usize).min(GRID_SIZE - 1));
        let Some(digit) = self.givens[row][col] else {
            return false;
        };
        let gh = self.digit_height;
        let gw = gh * GLYPH_WIDTH as f32 / GLYPH_HEIGHT as f32;
        let fx = (u - col as f32 - 0.5 + 0.5 * gw) / gw;
        let fy = (v - row as f32 - 0.5 + 0.5 * gh) / gh;
        if !(0.0..1.0).contains(&fx) || !(0.0..1.0).contains(&fy) {
            return false;
        }
        glyph_ink(
            digit,
            (fx * GLYPH_WIDTH as f32) as usize,
            (fy * GLYPH_HEIGHT as f32) as usize,
        )
    }

    pub fn render(&self) -> GrayImage {
        let mut img = GrayImage::filled(self.width, self.height, self.paper);
        let grid = square_corners(GRID_SIZE as f32).ring();
        let Some(h) = homography_from_4pt(&self.corners.ring(), &grid) else {
            log::warn!("degenerate scene outline, rendering blank page");
            return img;
        };
        for y in 0..self.height {
            for x in 0..self.width {
                let q = h.apply(Point2::new(x as f32 + 0.5, y as f32 + 0.5));
                if self.ink_at(q.x, q.y) {
                    img.set(x, y, self.ink);
                }
            }
        }
        img
    }

    pub fn render_frame(&self) -> Frame {
        Frame::from_gray(self.render())
    }
}

/// A surface with no puzzle: a soft left-to-right lighting gradient.
pub fn blank_surface(width: usize, height: usize) -> Frame {
    let mut img = GrayImage::filled(width, height, 0);
    for y in 0..height {
        for x in 0..width {
            let t = x as f32 / width.max(1) as f32;
            img.set(x, y, (180.0 + 50.0 * t) as u8);
        }
    }
    Frame::from_gray(img)
}

/// Parse 81 characters (`1`-`9`, `.` or `0` for empty) into givens.
///
/// Unknown characters count as empty.
pub fn givens_from_str(s: &str) -> Givens {
    let mut givens = [[None; GRID_SIZE]; GRID_SIZE];
    for (i, ch) in s.chars().filter(|c| !c.is_whitespace()).take(81).enumerate() {
        givens[i / GRID_SIZE][i % GRID_SIZE] = ch.to_digit(10).filter(|&d| d > 0).map(|d| d as u8);
    }
    givens
}
