use sudoku_ar_core::{FrameError, GrayImage};

/// BT.601 luma with 8-bit integer weights (77, 150, 29).
#[inline]
pub fn luma_bt601(r: u8, g: u8, b: u8) -> u8 {
    ((77 * r as u32 + 150 * g as u32 + 29 * b as u32 + 128) >> 8) as u8
}

/// Luminance of an interleaved 8-bit buffer with `channels` ∈ {1, 3, 4}.
///
/// The first three channels are read as R, G, B; alpha is ignored.
pub fn to_luminance(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
) -> Result<GrayImage, FrameError> {
    if width == 0 || height == 0 {
        return Err(FrameError::InvalidDimensions { width, height });
    }
    let expected = width * height * channels;
    if !matches!(channels, 1 | 3 | 4) || data.len() != expected {
        return Err(FrameError::InvalidBuffer {
            expected,
            got: data.len(),
        });
    }
    let gray = match channels {
        1 => data.to_vec(),
        _ => data
            .chunks_exact(channels)
            .map(|px| luma_bt601(px[0], px[1], px[2]))
            .collect(),
    };
    GrayImage::from_raw(width, height, gray)
}
