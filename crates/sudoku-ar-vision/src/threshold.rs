//! Ink/background separation.

use crate::BinarizeParams;
use sudoku_ar_core::GrayImageView;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Per-pixel ink flags, same layout as the source frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryMask {
    pub width: usize,
    pub height: usize,
    pub data: Vec<bool>,
}

impl BinaryMask {
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![false; width * height],
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, ink: bool) {
        self.data[y * self.width + x] = ink;
    }

    pub fn count_ink(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }
}

// Summed-area table with one row/column of zero padding.
fn integral_image(src: &GrayImageView<'_>) -> Vec<u64> {
    let w = src.width + 1;
    let mut sat = vec![0u64; w * (src.height + 1)];
    for y in 0..src.height {
        let mut row_sum = 0u64;
        for x in 0..src.width {
            row_sum += src.data[y * src.width + x] as u64;
            sat[(y + 1) * w + x + 1] = sat[y * w + x + 1] + row_sum;
        }
    }
    sat
}

/// Adaptive mean threshold.
///
/// A pixel is ink when `value < local_mean - offset`, the mean taken over a
/// `(2r+1)²` window clipped to the frame. Uneven lighting shifts the local
/// mean along with the paper, so shadows do not swallow the grid.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(src, params), fields(w = src.width, h = src.height))
)]
pub fn binarize(src: &GrayImageView<'_>, params: &BinarizeParams) -> BinaryMask {
    let (w, h) = (src.width, src.height);
    let mut mask = BinaryMask::empty(w, h);
    if w == 0 || h == 0 {
        return mask;
    }

    let sat = integral_image(src);
    let stride = w + 1;
    let r = params.window_radius.max(1);
    let offset = params.offset as i64;

    for y in 0..h {
        let y0 = y.saturating_sub(r);
        let y1 = (y + r + 1).min(h);
        for x in 0..w {
            let x0 = x.saturating_sub(r);
            let x1 = (x + r + 1).min(w);
            let count = ((y1 - y0) * (x1 - x0)) as i64;
            let sum = (sat[y1 * stride + x1] + sat[y0 * stride + x0]) as i64
                - (sat[y0 * stride + x1] + sat[y1 * stride + x0]) as i64;
            let v = src.data[y * w + x] as i64;
            // v < sum / count - offset, kept in integers
            mask.data[y * w + x] = v * count < sum - offset * count;
        }
    }
    mask
}

/// Otsu threshold over a set of intensities.
///
/// Degenerate inputs (empty, flat, two-valued) return a midpoint instead of
/// running the between-class search.
pub fn otsu_threshold(samples: &[u8]) -> u8 {
    if samples.is_empty() {
        return 127;
    }

    let mut hist = [0u32; 256];
    let (mut min_v, mut max_v) = (u8::MAX, u8::MIN);
    for &v in samples {
        hist[v as usize] += 1;
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }
    if min_v == max_v {
        return min_v;
    }
    if hist.iter().filter(|&&c| c > 0).count() <= 2 {
        return ((min_v as u16 + max_v as u16) / 2) as u8;
    }

    let total = samples.len() as f64;
    let sum_total: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let (mut sum_b, mut w_b) = (0f64, 0f64);
    let (mut best_var, mut best_t) = (-1f64, 127u8);
    for (t, &c) in hist.iter().enumerate() {
        w_b += c as f64;
        if w_b < 1.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f < 1.0 {
            break;
        }
        sum_b += t as f64 * c as f64;
        let m_b = sum_b / w_b;
        let m_f = (sum_total - sum_b) / w_f;
        let var_between = w_b * w_f * (m_b - m_f) * (m_b - m_f);
        if var_between > best_var {
            best_var = var_between;
            best_t = t as u8;
        }
    }
    best_t
}
