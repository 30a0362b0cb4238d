use crate::ExtractParams;
use sudoku_ar_core::{
    homography_from_4pt, square_corners, warp_perspective_gray, Corners, GrayImage, GrayImageView,
    Homography,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RectifyError {
    #[error("rectified size must be a positive multiple of 9 (got {0})")]
    InvalidSize(usize),
    #[error("homography estimation failed")]
    HomographyFailed,
    #[error("homography not invertible")]
    NonInvertible,
}

/// Puzzle warped onto an axis-aligned square, with both mappings kept for
/// projecting results back into the frame.
#[derive(Clone, Debug)]
pub struct RectifiedPuzzle {
    pub image: GrayImage,
    pub size: usize,
    pub h_frame_from_square: Homography,
    pub h_square_from_frame: Homography,
}

impl RectifiedPuzzle {
    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.size as f32 / 9.0
    }
}

/// Map the outline onto a `size × size` square and resample the frame.
///
/// Corners are assumed to have passed outline validation; collinear input is
/// still caught and reported instead of producing a singular transform.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(frame, corners, params), fields(size = params.size))
)]
pub fn rectify(
    frame: &GrayImageView<'_>,
    corners: &Corners,
    params: &ExtractParams,
) -> Result<RectifiedPuzzle, RectifyError> {
    let size = params.size;
    if size == 0 || size % 9 != 0 {
        return Err(RectifyError::InvalidSize(size));
    }

    let square = square_corners(size as f32).ring();
    let h_frame_from_square =
        homography_from_4pt(&square, &corners.ring()).ok_or(RectifyError::HomographyFailed)?;
    let h_square_from_frame = h_frame_from_square
        .inverse()
        .ok_or(RectifyError::NonInvertible)?;

    let image = warp_perspective_gray(frame, &h_frame_from_square, size, size);
    Ok(RectifiedPuzzle {
        image,
        size,
        h_frame_from_square,
        h_square_from_frame,
    })
}
