use crate::{Solution, VideoInfo};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use sudoku_ar_core::{Corners, GridLine};

/// Wall time of each pipeline stage in the last tick, in milliseconds.
///
/// Stages a tick did not reach report zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct StageTimings {
    pub capture: f64,
    pub threshold: f64,
    pub component_label: f64,
    pub corner_detect: f64,
    pub perspective_extract: f64,
    pub box_extract: f64,
    pub recognize: f64,
    pub solve: f64,
}

impl StageTimings {
    pub fn total(&self) -> f64 {
        self.capture
            + self.threshold
            + self.component_label
            + self.corner_detect
            + self.perspective_extract
            + self.box_extract
            + self.recognize
            + self.solve
    }
}

pub(crate) fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1e3
}

/// Everything a consumer may read about the engine, as of one tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EngineSnapshot {
    /// Ticks completed since construction.
    pub tick: u64,
    pub corners: Option<Corners>,
    pub grid_lines: Vec<GridLine>,
    pub solution: Option<Arc<Solution>>,
    pub is_running: bool,
    pub metrics: StageTimings,
    pub video: Option<VideoInfo>,
}

/// Read access to the latest published snapshot from any thread.
#[derive(Clone, Debug)]
pub struct SnapshotReader {
    slot: Arc<RwLock<Arc<EngineSnapshot>>>,
}

impl SnapshotReader {
    pub fn latest(&self) -> Arc<EngineSnapshot> {
        self.slot.read().clone()
    }
}

/// Single-producer slot; publishing swaps the whole snapshot.
#[derive(Debug, Default)]
pub(crate) struct SnapshotSlot {
    slot: Arc<RwLock<Arc<EngineSnapshot>>>,
}

impl SnapshotSlot {
    pub(crate) fn load(&self) -> Arc<EngineSnapshot> {
        self.slot.read().clone()
    }

    pub(crate) fn store(&self, snapshot: EngineSnapshot) {
        *self.slot.write() = Arc::new(snapshot);
    }

    pub(crate) fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            slot: self.slot.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readers_see_whole_replacements() {
        let slot = SnapshotSlot::default();
        let reader = slot.reader();
        let before = reader.latest();
        assert_eq!(before.tick, 0);

        slot.store(EngineSnapshot {
            tick: 3,
            is_running: true,
            ..EngineSnapshot::default()
        });
        let after = reader.latest();
        assert_eq!(after.tick, 3);
        assert!(after.is_running);
        assert_eq!(before.tick, 0, "old snapshot is never mutated");
    }

    #[test]
    fn total_sums_stages() {
        let t = StageTimings {
            capture: 1.0,
            recognize: 2.5,
            solve: 0.5,
            ..StageTimings::default()
        };
        assert!((t.total() - 4.0).abs() < 1e-12);
    }
}
