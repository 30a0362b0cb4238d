use crate::{ExtractParams, RectifiedPuzzle};
use sudoku_ar_core::GrayImage;

/// Cells per side.
pub const GRID_SIZE: usize = 9;

/// One trimmed cell of the rectified puzzle.
#[derive(Clone, Debug)]
pub struct CellImage {
    pub row: usize,
    pub col: usize,
    pub image: GrayImage,
}

/// Partition the rectified square into 81 cells, row-major, trimming
/// `cell_margin` pixels from every side of each cell.
pub fn extract_cells(rect: &RectifiedPuzzle, params: &ExtractParams) -> Vec<CellImage> {
    let cell = rect.cell_size();
    let m = params.cell_margin;
    let edge = |k: usize| ((k as f32) * cell).round() as usize;

    let mut out = Vec::with_capacity(GRID_SIZE * GRID_SIZE);
    for row in 0..GRID_SIZE {
        for col in 0..GRID_SIZE {
            let (x0, x1) = (edge(col), edge(col + 1));
            let (y0, y1) = (edge(row), edge(row + 1));
            let w = (x1 - x0).saturating_sub(2 * m);
            let h = (y1 - y0).saturating_sub(2 * m);
            out.push(CellImage {
                row,
                col,
                image: rect.image.crop(x0 + m, y0 + m, w, h),
            });
        }
    }
    out
}
