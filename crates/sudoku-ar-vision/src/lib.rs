//! Locating and rectifying a 9×9 puzzle in a grayscale frame.
//!
//! Stages, each a plain function over the previous stage's output:
//! 0. [`to_luminance`]: interleaved RGB(A) or gray bytes into a gray image.
//! 1. [`binarize`]: adaptive mean threshold into an ink mask.
//! 2. [`label_components`] + [`select_grid_candidate`]: 8-connected regions,
//!    largest near-square one wins.
//! 3. [`CornerDetector`]: extremal boundary points under the four diagonal
//!    projections, validated as a convex, non-degenerate quadrilateral.
//! 4. [`rectify`]: homography onto a fixed-size square, inverse-mapped with
//!    bilinear sampling.
//! 5. [`extract_cells`]: 81 equal cells with a margin trimmed off.
//!
//! "Nothing found" is an ordinary outcome and is reported through `Option`
//! or a rejection value, never as a panic.

mod cells;
mod components;
mod corners;
mod luma;
mod params;
mod rectify;
mod ruling;
mod threshold;

pub use cells::{extract_cells, CellImage, GRID_SIZE};
pub use components::{label_components, select_grid_candidate, Component, Labeling};
pub use corners::{CornerDetector, CornerReject};
pub use luma::{luma_bt601, to_luminance};
pub use params::{BinarizeParams, ComponentParams, CornerParams, ExtractParams};
pub use rectify::{rectify, RectifiedPuzzle, RectifyError};
pub use ruling::grid_lines;
pub use threshold::{binarize, otsu_threshold, BinaryMask};
