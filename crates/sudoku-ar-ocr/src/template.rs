use crate::{
    glyph_ink, ClassScores, DigitClassifier, Glyph, GLYPH_HEIGHT, GLYPH_WIDTH, NUM_CLASSES,
};

/// Normalized cross-correlation against the built-in digit font.
///
/// Works well on printed puzzles whose typeface is close to the font, and
/// needs no model file. Blank is never predicted; blank cells are filtered
/// out before classification.
#[derive(Clone, Debug)]
pub struct TemplateClassifier {
    sharpness: f32,
    templates: Vec<[f32; GLYPH_WIDTH * GLYPH_HEIGHT]>,
}

impl Default for TemplateClassifier {
    fn default() -> Self {
        Self::new(12.0)
    }
}

fn centered(values: &[f32]) -> (Vec<f32>, f32) {
    let mean = values.iter().sum::<f32>() / values.len().max(1) as f32;
    let c: Vec<f32> = values.iter().map(|v| v - mean).collect();
    let norm = c.iter().map(|v| v * v).sum::<f32>().sqrt();
    (c, norm)
}

impl TemplateClassifier {
    /// `sharpness` scales correlations before the softmax; higher values
    /// give more decisive confidences.
    pub fn new(sharpness: f32) -> Self {
        let templates = (1..=9u8)
            .map(|d| {
                let mut t = [0f32; GLYPH_WIDTH * GLYPH_HEIGHT];
                for y in 0..GLYPH_HEIGHT {
                    for x in 0..GLYPH_WIDTH {
                        t[y * GLYPH_WIDTH + x] = if glyph_ink(d, x, y) { 1.0 } else { 0.0 };
                    }
                }
                t
            })
            .collect();
        Self {
            sharpness,
            templates,
        }
    }

    /// Correlation of `glyph` with the template of each digit 1..=9.
    pub fn correlations(&self, glyph: &Glyph) -> [f32; 9] {
        let mut out = [0f32; 9];
        if glyph.values.len() != GLYPH_WIDTH * GLYPH_HEIGHT {
            return out;
        }
        let (g, gn) = centered(&glyph.values);
        if gn <= f32::EPSILON {
            return out;
        }
        for (o, t) in out.iter_mut().zip(self.templates.iter()) {
            let (t, tn) = centered(t);
            *o = g.iter().zip(t.iter()).map(|(a, b)| a * b).sum::<f32>() / (gn * tn);
        }
        out
    }
}

impl DigitClassifier for TemplateClassifier {
    fn input_size(&self) -> (usize, usize) {
        (GLYPH_WIDTH, GLYPH_HEIGHT)
    }

    fn classify(&self, glyph: &Glyph) -> ClassScores {
        if glyph.width != GLYPH_WIDTH || glyph.height != GLYPH_HEIGHT {
            log::warn!(
                "template classifier got a {}x{} glyph, expected {}x{}",
                glyph.width,
                glyph.height,
                GLYPH_WIDTH,
                GLYPH_HEIGHT
            );
            return ClassScores::blank();
        }
        let mut logits = [f32::NEG_INFINITY; NUM_CLASSES];
        for (k, c) in self.correlations(glyph).iter().enumerate() {
            logits[k + 1] = self.sharpness * c;
        }
        ClassScores::from_logits(logits)
    }
}
