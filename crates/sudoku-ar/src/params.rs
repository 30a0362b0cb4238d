use crate::OverlayParams;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use sudoku_ar_ocr::RecognizerParams;
use sudoku_ar_solver::SolverParams;
use sudoku_ar_vision::{BinarizeParams, ComponentParams, CornerParams, ExtractParams};

/// What to publish when a detected puzzle cannot be solved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsolvedPolicy {
    /// Publish no solution.
    #[default]
    Clear,
    /// Keep the last solved grid, re-placed on the current outline, as long
    /// as every digit read this tick agrees with it.
    Retain,
}

/// Where digit recognition runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionMode {
    /// Inside the tick.
    #[default]
    Inline,
    /// On a background thread; results are picked up on a later tick.
    Worker,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// All engine tunables. Missing JSON fields take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    pub tick_interval_ms: u64,
    pub unsolved_policy: UnsolvedPolicy,
    pub recognition_mode: RecognitionMode,
    pub binarize: BinarizeParams,
    pub components: ComponentParams,
    pub corners: CornerParams,
    pub extract: ExtractParams,
    pub recognizer: RecognizerParams,
    pub solver: SolverParams,
    pub overlay: OverlayParams,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            unsolved_policy: UnsolvedPolicy::default(),
            recognition_mode: RecognitionMode::default(),
            binarize: BinarizeParams::default(),
            components: ComponentParams::default(),
            corners: CornerParams::default(),
            extract: ExtractParams::default(),
            recognizer: RecognizerParams::default(),
            solver: SolverParams::default(),
            overlay: OverlayParams::default(),
        }
    }
}

impl EngineParams {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_json_keeps_defaults() {
        let p = EngineParams::from_json_str(
            r#"{ "tick_interval_ms": 50, "unsolved_policy": "retain", "solver": { "max_nodes": 10 } }"#,
        )
        .unwrap();
        assert_eq!(p.tick_interval(), Duration::from_millis(50));
        assert_eq!(p.unsolved_policy, UnsolvedPolicy::Retain);
        assert_eq!(p.recognition_mode, RecognitionMode::Inline);
        assert_eq!(p.solver.max_nodes, 10);
        assert!(p.solver.require_unique);
        assert_eq!(p.extract, ExtractParams::default());
    }

    #[test]
    fn loads_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{ "recognition_mode": "worker" }}"#).unwrap();
        let p = EngineParams::load(f.path()).unwrap();
        assert_eq!(p.recognition_mode, RecognitionMode::Worker);
        assert!(matches!(
            EngineParams::from_json_str("[1, 2"),
            Err(ConfigError::Parse(_))
        ));
    }
}
