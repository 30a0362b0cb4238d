use crate::GRID_SIZE;
use nalgebra::Point2;
use sudoku_ar_core::{GridLine, Homography};

/// Internal ruling of the puzzle projected into the frame: the eight
/// horizontal lines followed by the eight vertical ones.
pub fn grid_lines(h_frame_from_square: &Homography, size: usize) -> Vec<GridLine> {
    let s = size as f32;
    let step = s / GRID_SIZE as f32;
    let project = |x: f32, y: f32| h_frame_from_square.apply(Point2::new(x, y));

    let horizontal = (1..GRID_SIZE).map(|k| {
        let y = k as f32 * step;
        GridLine {
            p1: project(0.0, y),
            p2: project(s, y),
        }
    });
    let vertical = (1..GRID_SIZE).map(|k| {
        let x = k as f32 * step;
        GridLine {
            p1: project(x, 0.0),
            p2: project(x, s),
        }
    });
    horizontal.chain(vertical).collect()
}
