//! Augmented-reality sudoku engine.
//!
//! The [`Engine`] pulls frames from a [`VideoSource`] once per tick and runs
//! them through the pipeline:
//!
//! capture → threshold → component labeling → corner fit → perspective
//! extraction → box extraction → digit recognition → solving → overlay.
//!
//! Each completed tick replaces an immutable [`EngineSnapshot`] holding the
//! outline, the projected ruling, the placed solution and per-stage timings.
//! Consumers poll it or subscribe to [`EngineEvent`]s.
//!
//! ## Quickstart
//!
//! ```no_run
//! use sudoku_ar::{Engine, EngineParams, StillImageSource};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut engine = Engine::new(EngineParams::default());
//! engine.start(StillImageSource::from_path("puzzle.png")?)?;
//! engine.tick();
//! if let Some(solution) = &engine.snapshot().solution {
//!     for (row, col, cell) in solution.overlay() {
//!         println!("({row}, {col}) -> {} at {:?}", cell.digit, cell.position);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `sudoku_ar::core`: images, homographies, corners.
//! - `sudoku_ar::vision`: binarization, components, corners, rectification, cells.
//! - `sudoku_ar::ocr`: digit classifiers and the recognition policy.
//! - `sudoku_ar::solver`: puzzle grid and solver.
//! - `sudoku_ar::synthetic`: rendered puzzle frames for tests and demos.
//! - `sudoku_ar::detect` (feature `image`): one-shot helpers over `image` types.

pub use sudoku_ar_core as core;
pub use sudoku_ar_ocr as ocr;
pub use sudoku_ar_solver as solver;
pub use sudoku_ar_vision as vision;

mod engine;
mod events;
mod frame;
mod overlay;
mod params;
mod scheduler;
mod snapshot;
pub mod synthetic;
mod video;
mod worker;

#[cfg(feature = "image")]
pub mod detect;

pub use engine::{Engine, EngineError, StopHandle, TickOutcome};
pub use events::{EngineEvent, EventBus, EventFilter, Subscription, SubscriptionId};
pub use frame::{Frame, PixelFormat};
pub use overlay::{compose_overlay, OverlayParams, Solution, SolvedCell};
pub use params::{ConfigError, EngineParams, RecognitionMode, UnsolvedPolicy};
pub use scheduler::{
    run_until, Clock, IntervalScheduler, ManualClock, RunStats, SystemClock, TickDecision,
};
pub use snapshot::{EngineSnapshot, SnapshotReader, StageTimings};
pub use video::{FrameSequence, StillImageSource, VideoError, VideoInfo, VideoSource};
pub use worker::{RecognitionResult, RecognitionWorker};

pub use sudoku_ar_core::{Corners, GridLine};
pub use sudoku_ar_solver::{Cell, PuzzleGrid, SolveError};
