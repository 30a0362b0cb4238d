//! Frame sources.
//!
//! A [`VideoSource`] is opened once by [`crate::Engine::start`] and then
//! polled once per tick. Sources own their decoding; the engine only sees
//! [`Frame`]s.

use crate::Frame;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use sudoku_ar_core::FrameError;

/// Dimensions reported once the first frame is available.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub width: usize,
    pub height: usize,
}

impl VideoInfo {
    pub fn of(frame: &Frame) -> Self {
        Self {
            width: frame.width(),
            height: frame.height(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum VideoError {
    #[error("failed to open video source: {0}")]
    Open(String),
    #[error("video source produced no first frame")]
    NoFrame,
    #[error("video source is not open")]
    NotOpen,
    #[error("malformed frame: {0}")]
    Frame(#[from] FrameError),
}

pub trait VideoSource: Send {
    /// Prepare the source. Errors here are fatal to `start`.
    fn open(&mut self) -> Result<(), VideoError>;

    /// The latest frame, or `None` when no new frame is available yet.
    fn next_frame(&mut self) -> Result<Option<Frame>, VideoError>;

    fn close(&mut self) {}
}

/// Repeats a single frame forever.
#[derive(Clone, Debug)]
pub struct StillImageSource {
    frame: Frame,
    open: bool,
}

impl StillImageSource {
    pub fn new(frame: Frame) -> Self {
        Self { frame, open: false }
    }

    #[cfg(feature = "image")]
    pub fn from_image(img: &::image::DynamicImage) -> Result<Self, VideoError> {
        let rgb = img.to_rgb8();
        let (w, h) = (rgb.width() as usize, rgb.height() as usize);
        let frame = Frame::new(w, h, crate::PixelFormat::Rgb8, rgb.into_raw())?;
        Ok(Self::new(frame))
    }

    /// Decode an image file.
    #[cfg(feature = "image")]
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, VideoError> {
        let path = path.as_ref();
        let img = ::image::open(path)
            .map_err(|e| VideoError::Open(format!("{}: {e}", path.display())))?;
        Self::from_image(&img)
    }
}

impl VideoSource for StillImageSource {
    fn open(&mut self) -> Result<(), VideoError> {
        self.open = true;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, VideoError> {
        if !self.open {
            return Err(VideoError::NotOpen);
        }
        Ok(Some(self.frame.clone()))
    }

    fn close(&mut self) {
        self.open = false;
    }
}

/// Replays queued frames in order, then keeps returning the last one.
#[derive(Clone, Debug, Default)]
pub struct FrameSequence {
    queue: VecDeque<Frame>,
    last: Option<Frame>,
    open: bool,
}

impl FrameSequence {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            queue: frames.into_iter().collect(),
            last: None,
            open: false,
        }
    }

    pub fn push(&mut self, frame: Frame) {
        self.queue.push_back(frame);
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl VideoSource for FrameSequence {
    fn open(&mut self) -> Result<(), VideoError> {
        if self.queue.is_empty() && self.last.is_none() {
            return Err(VideoError::Open("frame sequence is empty".into()));
        }
        self.open = true;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, VideoError> {
        if !self.open {
            return Err(VideoError::NotOpen);
        }
        if let Some(f) = self.queue.pop_front() {
            self.last = Some(f);
        }
        Ok(self.last.clone())
    }

    fn close(&mut self) {
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sudoku_ar_core::GrayImage;

    fn gray(v: u8) -> Frame {
        Frame::from_gray(GrayImage::filled(4, 3, v))
    }

    #[test]
    fn sequence_replays_then_repeats_last() {
        let mut s = FrameSequence::new([gray(1), gray(2)]);
        assert!(matches!(s.next_frame(), Err(VideoError::NotOpen)));
        s.open().unwrap();
        let seen: Vec<u8> = (0..4)
            .map(|_| s.next_frame().unwrap().unwrap().data()[0])
            .collect();
        assert_eq!(seen, vec![1, 2, 2, 2]);
    }

    #[test]
    fn empty_sequence_fails_to_open() {
        let mut s = FrameSequence::default();
        assert!(matches!(s.open(), Err(VideoError::Open(_))));
    }

    #[test]
    fn still_source_reports_dimensions() {
        let mut s = StillImageSource::new(gray(9));
        s.open().unwrap();
        let f = s.next_frame().unwrap().unwrap();
        assert_eq!(VideoInfo::of(&f), VideoInfo { width: 4, height: 3 });
        s.close();
        assert!(s.next_frame().is_err());
    }
}
