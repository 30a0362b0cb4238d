use crate::Glyph;

/// Blank plus the digits 1..=9; index `k` is digit `k`, index 0 is blank.
pub const NUM_CLASSES: usize = 10;

/// Class probabilities summing to one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClassScores(pub [f32; NUM_CLASSES]);

impl ClassScores {
    /// Softmax over logits; `f32::NEG_INFINITY` marks an impossible class.
    pub fn from_logits(logits: [f32; NUM_CLASSES]) -> Self {
        let max = logits
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(f32::NEG_INFINITY, f32::max);
        if !max.is_finite() {
            return Self::blank();
        }
        let mut out = [0f32; NUM_CLASSES];
        let mut sum = 0f32;
        for (o, &l) in out.iter_mut().zip(logits.iter()) {
            *o = if l.is_finite() { (l - max).exp() } else { 0.0 };
            sum += *o;
        }
        for o in &mut out {
            *o /= sum;
        }
        Self(out)
    }

    /// Certain blank.
    pub fn blank() -> Self {
        let mut s = [0f32; NUM_CLASSES];
        s[0] = 1.0;
        Self(s)
    }

    /// Most likely class and its probability.
    pub fn best(&self) -> (usize, f32) {
        self.0
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |acc, (k, p)| if p > acc.1 { (k, p) } else { acc })
    }
}

/// A pretrained cell classifier.
///
/// Implementations are shared between the tick loop and the recognition
/// worker, hence `Send + Sync`.
pub trait DigitClassifier: Send + Sync {
    /// Feature grid `(width, height)` the classifier expects.
    fn input_size(&self) -> (usize, usize);

    /// Score a glyph of exactly [`DigitClassifier::input_size`].
    fn classify(&self, glyph: &Glyph) -> ClassScores;
}
