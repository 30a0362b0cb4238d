//! Digit recognition for rectified puzzle cells.
//!
//! A cell goes through two steps:
//! - [`prepare_cell`] decides whether the cell holds ink at all and, if so,
//!   normalizes the central blob into a small feature grid;
//! - a [`DigitClassifier`] turns the grid into ten class scores
//!   (blank + 1..=9).
//!
//! [`DigitRecognizer`] combines both and applies the confidence policy: an
//! unsure answer becomes blank instead of a guess.

mod classifier;
mod glyphs;
mod model;
mod params;
mod prepare;
mod recognizer;
mod template;

pub use classifier::{ClassScores, DigitClassifier, NUM_CLASSES};
pub use glyphs::{glyph_ink, GLYPH_HEIGHT, GLYPH_WIDTH};
pub use model::{LinearDigitModel, ModelError};
pub use params::RecognizerParams;
pub use prepare::{prepare_cell, CellInk, Glyph};
pub use recognizer::{DigitRecognizer, Recognition};
pub use template::TemplateClassifier;
