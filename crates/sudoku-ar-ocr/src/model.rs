//! Pretrained linear classifier stored as JSON.
//!
//! ```json
//! { "input_width": 5, "input_height": 7,
//!   "weights": [[...], ... 10 rows of width*height],
//!   "bias": [... 10 values] }
//! ```
//! Row `k` scores class `k` (0 = blank, 1..=9 = digits).

use crate::{ClassScores, DigitClassifier, Glyph, NUM_CLASSES};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("failed to read model: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse model: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("model shape mismatch: {0}")]
    Shape(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearDigitModel {
    pub input_width: usize,
    pub input_height: usize,
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
}

impl LinearDigitModel {
    pub fn from_json_str(s: &str) -> Result<Self, ModelError> {
        let model: Self = serde_json::from_str(s)?;
        model.check_shape()?;
        Ok(model)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let model = Self::from_json_str(&text)?;
        log::info!(
            "loaded digit model {} ({}x{} input)",
            path.display(),
            model.input_width,
            model.input_height
        );
        Ok(model)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let text = serde_json::to_string(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    fn check_shape(&self) -> Result<(), ModelError> {
        let n = self.input_width * self.input_height;
        if n == 0 {
            return Err(ModelError::Shape("empty input grid".into()));
        }
        if self.weights.len() != NUM_CLASSES || self.bias.len() != NUM_CLASSES {
            return Err(ModelError::Shape(format!(
                "expected {NUM_CLASSES} weight rows and biases, got {} and {}",
                self.weights.len(),
                self.bias.len()
            )));
        }
        if let Some((k, row)) = self.weights.iter().enumerate().find(|(_, r)| r.len() != n) {
            return Err(ModelError::Shape(format!(
                "weight row {k} has {} entries, expected {n}",
                row.len()
            )));
        }
        Ok(())
    }
}

impl DigitClassifier for LinearDigitModel {
    fn input_size(&self) -> (usize, usize) {
        (self.input_width, self.input_height)
    }

    fn classify(&self, glyph: &Glyph) -> ClassScores {
        if glyph.values.len() != self.input_width * self.input_height {
            return ClassScores::blank();
        }
        let mut logits = [0f32; NUM_CLASSES];
        for (k, l) in logits.iter_mut().enumerate() {
            *l = self.bias[k]
                + self.weights[k]
                    .iter()
                    .zip(glyph.values.iter())
                    .map(|(w, x)| w * x)
                    .sum::<f32>();
        }
        ClassScores::from_logits(logits)
    }
}
