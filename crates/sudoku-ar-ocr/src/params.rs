use serde::{Deserialize, Serialize};

/// Cell preprocessing and decision policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerParams {
    /// Cells whose max−min intensity is below this are blank.
    pub min_contrast: u8,
    /// Smallest glyph blob, as a fraction of the cell area.
    pub min_ink_fraction: f32,
    /// Smallest glyph blob height, as a fraction of the cell height.
    pub min_glyph_height: f32,
    /// Sub-samples per feature cell along each axis.
    pub supersample: usize,
    /// Answers below this confidence are reported as blank.
    pub min_confidence: f32,
}

impl Default for RecognizerParams {
    fn default() -> Self {
        Self {
            min_contrast: 48,
            min_ink_fraction: 0.02,
            min_glyph_height: 0.3,
            supersample: 4,
            min_confidence: 0.5,
        }
    }
}
