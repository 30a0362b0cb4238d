use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use sudoku_ar_core::{Corners, Homography};
use sudoku_ar_solver::{PuzzleGrid, GRID_SIZE};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayParams {
    /// Glyph height as a fraction of the projected cell height.
    pub glyph_height_fraction: f32,
}

impl Default for OverlayParams {
    fn default() -> Self {
        Self {
            glyph_height_fraction: 0.75,
        }
    }
}

/// Render parameters for one solver-filled cell.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolvedCell {
    pub digit: u8,
    pub is_known: bool,
    /// Glyph height in frame pixels.
    pub digit_height: f32,
    /// Grid tilt in radians, +x toward +y.
    pub digit_rotation: f32,
    /// Cell center in frame pixels.
    pub position: Point2<f32>,
}

/// A solved puzzle placed in one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub grid: PuzzleGrid,
    /// `Some` exactly for the cells the solver filled in.
    pub cells: [[Option<SolvedCell>; GRID_SIZE]; GRID_SIZE],
}

impl Solution {
    pub fn cell(&self, row: usize, col: usize) -> Option<&SolvedCell> {
        self.cells.get(row)?.get(col)?.as_ref()
    }

    /// Overlay entries with their grid position, row-major.
    pub fn overlay(&self) -> impl Iterator<Item = (usize, usize, &SolvedCell)> + '_ {
        self.cells.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(c, cell)| cell.as_ref().map(|s| (r, c, s)))
        })
    }

    /// Same digits in every cell.
    pub fn same_digits(&self, other: &Solution) -> bool {
        self.grid
            .iter()
            .zip(other.grid.iter())
            .all(|((_, _, a), (_, _, b))| a.digit == b.digit)
    }
}

/// Place the solver-filled cells of `grid` in the frame.
///
/// `h_frame_from_square` maps the rectified `size × size` square into the
/// frame. Positions are cell centers pushed through it; the rotation comes
/// from the outline once for the whole grid; the height follows the local
/// scale of the mapping at each cell.
pub fn compose_overlay(
    grid: &PuzzleGrid,
    corners: &Corners,
    h_frame_from_square: &Homography,
    size: usize,
    params: &OverlayParams,
) -> Solution {
    let cell = size as f32 / GRID_SIZE as f32;
    let rotation = corners.horizontal_angle();
    let mut cells = [[None; GRID_SIZE]; GRID_SIZE];

    for (r, c, g) in grid.iter() {
        if g.is_known {
            continue;
        }
        let Some(digit) = g.digit else {
            continue;
        };
        let center = Point2::new((c as f32 + 0.5) * cell, (r as f32 + 0.5) * cell);
        let scale = h_frame_from_square.local_scale(center);
        cells[r][c] = Some(SolvedCell {
            digit,
            is_known: false,
            digit_height: params.glyph_height_fraction * cell * scale,
            digit_rotation: rotation,
            position: h_frame_from_square.apply(center),
        });
    }

    Solution {
        grid: grid.clone(),
        cells,
    }
}
