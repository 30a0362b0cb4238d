//! Core types and utilities shared by the sudoku-ar pipeline stages.
//!
//! This crate is purely geometric. It knows about grayscale buffers,
//! projective transforms and the quadrilateral that outlines a puzzle, but
//! nothing about thresholds, digits or solving.

mod geometry;
mod homography;
mod image;
mod logger;

pub use geometry::{Corners, GridLine, QuadDefect};
pub use homography::{
    estimate_homography, homography_from_4pt, square_corners, warp_perspective_gray, Homography,
};
pub use image::{sample_bilinear, sample_bilinear_u8, FrameError, GrayImage, GrayImageView};

#[cfg(feature = "tracing")]
pub use logger::{init_tracing, init_tracing_with_level};

pub use logger::init_with_level;
