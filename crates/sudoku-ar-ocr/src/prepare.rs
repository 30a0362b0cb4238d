//! Cell cleanup: blank detection and glyph normalization.

use crate::RecognizerParams;
use sudoku_ar_core::GrayImage;
use sudoku_ar_vision::{label_components, otsu_threshold, BinaryMask};

/// Normalized ink coverage of a glyph, row-major, values in `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Glyph {
    pub width: usize,
    pub height: usize,
    pub values: Vec<f32>,
}

impl Glyph {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.values[y * self.width + x]
    }
}

/// Outcome of looking for a digit in one cell.
#[derive(Clone, Debug, PartialEq)]
pub enum CellInk {
    Blank,
    Glyph(Glyph),
}

/// Find the digit blob in `cell` and resample it onto a `grid.0 × grid.1`
/// feature grid.
///
/// The blob is the largest ink component that does not touch the cell
/// border, which drops leftovers of the ruling. The sampling window spans
/// the blob's height and keeps the grid's aspect ratio, centered on the blob,
/// so narrow digits such as `1` keep their proportions.
pub fn prepare_cell(cell: &GrayImage, params: &RecognizerParams, grid: (usize, usize)) -> CellInk {
    let (w, h) = (cell.width, cell.height);
    let (gw, gh) = grid;
    if w < 3 || h < 3 || gw == 0 || gh == 0 {
        return CellInk::Blank;
    }

    let (lo, hi) = cell
        .data
        .iter()
        .fold((u8::MAX, u8::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if hi.saturating_sub(lo) < params.min_contrast {
        return CellInk::Blank;
    }

    let t = otsu_threshold(&cell.data);
    let mask = BinaryMask {
        width: w,
        height: h,
        data: cell.data.iter().map(|&v| v <= t).collect(),
    };
    let labeling = label_components(&mask);

    let Some(blob) = labeling
        .components
        .iter()
        .find(|c| !c.touches_border(w, h))
    else {
        return CellInk::Blank;
    };
    let min_pixels = params.min_ink_fraction * (w * h) as f32;
    let min_height = params.min_glyph_height * h as f32;
    if (blob.pixel_count as f32) < min_pixels || (blob.bbox_height() as f32) < min_height {
        return CellInk::Blank;
    }

    let bh = blob.bbox_height() as f32;
    let ww = bh * gw as f32 / gh as f32;
    let x0 = (blob.min_x + blob.max_x + 1) as f32 * 0.5 - 0.5 * ww;
    let y0 = blob.min_y as f32;
    let (step_x, step_y) = (ww / gw as f32, bh / gh as f32);
    let ss = params.supersample.max(1);
    let norm = (ss * ss) as f32;

    let mut values = Vec::with_capacity(gw * gh);
    for j in 0..gh {
        for i in 0..gw {
            let mut hits = 0usize;
            for b in 0..ss {
                for a in 0..ss {
                    let sx = x0 + (i as f32 + (a as f32 + 0.5) / ss as f32) * step_x;
                    let sy = y0 + (j as f32 + (b as f32 + 0.5) / ss as f32) * step_y;
                    if sx < 0.0 || sy < 0.0 {
                        continue;
                    }
                    let (px, py) = (sx as usize, sy as usize);
                    if px < w && py < h && labeling.label_at(px, py) == blob.label {
                        hits += 1;
                    }
                }
            }
            values.push(hits as f32 / norm);
        }
    }

    CellInk::Glyph(Glyph {
        width: gw,
        height: gh,
        values,
    })
}
