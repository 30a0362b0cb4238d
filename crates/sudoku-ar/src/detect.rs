//! One-shot helpers over `image` types.

use crate::{
    Engine, EngineError, EngineParams, EngineSnapshot, Frame, RecognitionMode, StillImageSource,
    TickOutcome,
};
use std::sync::Arc;
use sudoku_ar_core::GrayImageView;
use sudoku_ar_ocr::DigitRecognizer;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Borrow an `image::GrayImage` as the core view type.
pub fn gray_view(img: &::image::GrayImage) -> GrayImageView<'_> {
    GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

pub fn frame_from_gray(img: &::image::GrayImage) -> Frame {
    Frame::from_gray(sudoku_ar_core::GrayImage {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw().clone(),
    })
}

/// Run a single inline tick on a still image.
///
/// Returns the tick outcome and the snapshot it published.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(img, params, recognizer), fields(width = img.width(), height = img.height()))
)]
pub fn solve_image(
    img: &::image::DynamicImage,
    params: EngineParams,
    recognizer: DigitRecognizer,
) -> Result<(TickOutcome, Arc<EngineSnapshot>), EngineError> {
    let params = EngineParams {
        recognition_mode: RecognitionMode::Inline,
        ..params
    };
    let mut engine = Engine::with_recognizer(params, recognizer);
    engine.start(StillImageSource::from_image(img)?)?;
    let outcome = engine.tick();
    let snapshot = engine.snapshot();
    engine.stop();
    Ok((outcome, snapshot))
}

/// [`solve_image`] with default parameters and the template recognizer.
pub fn solve_image_default(
    img: &::image::DynamicImage,
) -> Result<(TickOutcome, Arc<EngineSnapshot>), EngineError> {
    let params = EngineParams::default();
    let recognizer = DigitRecognizer::templates(params.recognizer.clone());
    solve_image(img, params, recognizer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{givens_from_str, PuzzleScene};
    use crate::PixelFormat;

    #[test]
    fn image_buffers_convert_losslessly() {
        let img = ::image::GrayImage::from_fn(4, 3, |x, y| ::image::Luma([(x + 10 * y) as u8]));
        let view = gray_view(&img);
        assert_eq!((view.width, view.height), (4, 3));
        assert_eq!(view.data[5], 11);
        let frame = frame_from_gray(&img);
        assert_eq!(frame.format(), PixelFormat::Gray8);
        assert_eq!(frame.data(), img.as_raw().as_slice());
    }

    #[test]
    fn rgb_photo_of_a_puzzle_solves() {
        let gray = PuzzleScene::centered(
            400,
            400,
            330.0,
            0.0,
            givens_from_str(
                "53..7....6..195....98....6.8...6...34..8.3..17...2...6.6....28....419..5....8..79",
            ),
        )
        .render();
        let luma = ::image::GrayImage::from_raw(400, 400, gray.data).unwrap();
        let rgb = ::image::DynamicImage::ImageLuma8(luma).to_rgb8();
        let (outcome, snapshot) =
            solve_image_default(&::image::DynamicImage::ImageRgb8(rgb)).unwrap();
        assert_eq!(outcome, TickOutcome::Solved { reused: false });
        assert!(snapshot.solution.is_some());
    }
}
