use crate::{prepare_cell, CellInk, DigitClassifier, RecognizerParams, TemplateClassifier};
use std::sync::Arc;
use sudoku_ar_core::GrayImage;
use sudoku_ar_vision::CellImage;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// What the recognizer read in one cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Recognition {
    /// `None` when the cell is blank or the classifier was unsure.
    pub digit: Option<u8>,
    /// Probability of the reported class (blank included).
    pub confidence: f32,
}

impl Recognition {
    pub const BLANK: Recognition = Recognition {
        digit: None,
        confidence: 1.0,
    };
}

/// Cell preprocessing plus a shared classifier.
///
/// Cloning is cheap; clones share the classifier.
#[derive(Clone)]
pub struct DigitRecognizer {
    classifier: Arc<dyn DigitClassifier>,
    params: RecognizerParams,
}

impl std::fmt::Debug for DigitRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigitRecognizer")
            .field("input_size", &self.classifier.input_size())
            .field("params", &self.params)
            .finish()
    }
}

impl Default for DigitRecognizer {
    fn default() -> Self {
        Self::templates(RecognizerParams::default())
    }
}

impl DigitRecognizer {
    pub fn new(classifier: Arc<dyn DigitClassifier>, params: RecognizerParams) -> Self {
        Self { classifier, params }
    }

    /// Recognizer backed by the built-in font templates.
    pub fn templates(params: RecognizerParams) -> Self {
        Self::new(Arc::new(TemplateClassifier::default()), params)
    }

    pub fn params(&self) -> &RecognizerParams {
        &self.params
    }

    pub fn recognize(&self, cell: &GrayImage) -> Recognition {
        let glyph = match prepare_cell(cell, &self.params, self.classifier.input_size()) {
            CellInk::Blank => return Recognition::BLANK,
            CellInk::Glyph(g) => g,
        };
        let (class, p) = self.classifier.classify(&glyph).best();
        if class == 0 || p < self.params.min_confidence {
            return Recognition {
                digit: None,
                confidence: p,
            };
        }
        Recognition {
            digit: Some(class as u8),
            confidence: p,
        }
    }

    /// Recognize every cell, in input order.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all, fields(cells = cells.len())))]
    pub fn recognize_cells(&self, cells: &[CellImage]) -> Vec<Recognition> {
        let out: Vec<Recognition> = cells.iter().map(|c| self.recognize(&c.image)).collect();
        log::debug!(
            "recognized {} digits in {} cells",
            out.iter().filter(|r| r.digit.is_some()).count(),
            cells.len()
        );
        out
    }
}
