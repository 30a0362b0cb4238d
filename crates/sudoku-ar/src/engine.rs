//! The per-tick pipeline and the state it publishes.

use crate::snapshot::{millis, SnapshotSlot};
use crate::{
    compose_overlay, EngineEvent, EngineParams, EngineSnapshot, EventBus, EventFilter, Frame,
    RecognitionMode, RecognitionWorker, Solution, SnapshotReader, StageTimings, Subscription,
    SubscriptionId, UnsolvedPolicy, VideoError, VideoInfo, VideoSource,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use sudoku_ar_core::{Corners, GrayImage, GridLine};
use sudoku_ar_ocr::{DigitRecognizer, Recognition};
use sudoku_ar_solver::{Givens, PuzzleGrid, SolveError, Solver, GRID_SIZE};
use sudoku_ar_vision::{
    binarize, extract_cells, grid_lines, label_components, rectify, select_grid_candidate,
    CellImage, CornerDetector, RectifiedPuzzle,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Video(#[from] VideoError),
    #[error("engine is already running")]
    AlreadyRunning,
    #[error("failed to spawn recognition worker: {0}")]
    Worker(#[from] std::io::Error),
}

/// What one call to [`Engine::tick`] did.
#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    NotRunning,
    /// A stop was requested; the tick's results were discarded.
    Stopped,
    /// The source had no new frame.
    NoFrame,
    NoGrid,
    /// Recognition is still running on the worker; the previous solution
    /// stays published.
    Pending,
    /// A solution was published. `reused` is set when the digits matched the
    /// last solved puzzle and the solver was skipped.
    Solved { reused: bool },
    Unsolvable(SolveError),
}

/// Requests a stop from any thread. The engine honours it at its next tick,
/// before anything from that tick is published.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

struct Located {
    corners: Corners,
    rect: RectifiedPuzzle,
    grid_lines: Vec<GridLine>,
    cells: Vec<CellImage>,
}

struct SolvedPuzzle {
    givens: Givens,
    grid: PuzzleGrid,
}

/// Snapshot contents produced by one tick, not yet published.
struct Publication {
    corners: Option<Corners>,
    grid_lines: Vec<GridLine>,
    solution: Option<Arc<Solution>>,
}

impl Publication {
    fn empty() -> Self {
        Self {
            corners: None,
            grid_lines: Vec::new(),
            solution: None,
        }
    }
}

/// Digits of 81 row-major recognitions.
fn givens_from(recognitions: &[Recognition]) -> Givens {
    let mut givens = [[None; GRID_SIZE]; GRID_SIZE];
    for (i, r) in recognitions.iter().take(GRID_SIZE * GRID_SIZE).enumerate() {
        givens[i / GRID_SIZE][i % GRID_SIZE] = r.digit;
    }
    givens
}

/// Locates, reads and solves puzzles in frames from a [`VideoSource`].
///
/// The engine is the only writer of its snapshot. Consumers read it through
/// [`Engine::snapshot`] or a [`SnapshotReader`], and follow changes through
/// [`Engine::subscribe`].
pub struct Engine {
    params: EngineParams,
    detector: CornerDetector,
    recognizer: DigitRecognizer,
    solver: Solver,
    source: Option<Box<dyn VideoSource>>,
    first_frame: Option<Frame>,
    video: Option<VideoInfo>,
    worker: Option<RecognitionWorker>,
    generation: u64,
    ticks: u64,
    last_solved: Option<SolvedPuzzle>,
    snapshot: SnapshotSlot,
    events: EventBus,
    stop_flag: StopHandle,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("running", &self.is_running())
            .field("generation", &self.generation)
            .field("ticks", &self.ticks)
            .finish()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineParams::default())
    }
}

impl Engine {
    /// Engine recognizing digits with the built-in font templates.
    pub fn new(params: EngineParams) -> Self {
        let recognizer = DigitRecognizer::templates(params.recognizer.clone());
        Self::with_recognizer(params, recognizer)
    }

    pub fn with_recognizer(params: EngineParams, recognizer: DigitRecognizer) -> Self {
        Self {
            detector: CornerDetector::new(params.corners.clone()),
            solver: Solver::new(params.solver.clone()),
            params,
            recognizer,
            source: None,
            first_frame: None,
            video: None,
            worker: None,
            generation: 0,
            ticks: 0,
            last_solved: None,
            snapshot: SnapshotSlot::default(),
            events: EventBus::new(),
            stop_flag: StopHandle::default(),
        }
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn is_running(&self) -> bool {
        self.source.is_some()
    }

    /// Open `source` and wait for its first frame.
    ///
    /// Fails when the source cannot be opened or yields no frame. On success
    /// a `VideoReady` event carries the frame size.
    pub fn start<S: VideoSource + 'static>(&mut self, source: S) -> Result<VideoInfo, EngineError> {
        if self.source.is_some() {
            return Err(EngineError::AlreadyRunning);
        }
        let mut source: Box<dyn VideoSource> = Box::new(source);
        source.open()?;
        let first = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                source.close();
                return Err(VideoError::NoFrame.into());
            }
            Err(e) => {
                source.close();
                return Err(e.into());
            }
        };

        if self.params.recognition_mode == RecognitionMode::Worker {
            match RecognitionWorker::spawn(self.recognizer.clone()) {
                Ok(worker) => self.worker = Some(worker),
                Err(e) => {
                    source.close();
                    return Err(e.into());
                }
            }
        }

        let info = VideoInfo::of(&first);
        self.stop_flag.reset();
        self.generation += 1;
        self.source = Some(source);
        self.first_frame = Some(first);
        self.video = Some(info);
        self.last_solved = None;
        self.snapshot.store(EngineSnapshot {
            tick: self.ticks,
            is_running: true,
            video: Some(info),
            ..EngineSnapshot::default()
        });
        log::info!("video ready: {}x{}", info.width, info.height);
        self.events.publish(EngineEvent::VideoReady(info));
        Ok(info)
    }

    /// Close the source and drop any in-flight work. The published snapshot
    /// becomes an idle one; a pending recognition result is never used.
    pub fn stop(&mut self) {
        let Some(mut source) = self.source.take() else {
            return;
        };
        source.close();
        self.generation += 1;
        self.first_frame = None;
        self.worker = None;
        self.last_solved = None;
        let had_solution = self.snapshot.load().solution.is_some();
        self.snapshot.store(EngineSnapshot {
            tick: self.ticks,
            is_running: false,
            video: self.video,
            ..EngineSnapshot::default()
        });
        if had_solution {
            self.events.publish(EngineEvent::SolutionChanged(None));
        }
        log::info!("engine stopped after {} ticks", self.ticks);
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop_flag.clone()
    }

    pub fn snapshot(&self) -> Arc<EngineSnapshot> {
        self.snapshot.load()
    }

    pub fn snapshot_reader(&self) -> SnapshotReader {
        self.snapshot.reader()
    }

    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.events.subscribe(filter)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Run the pipeline once on the next frame and publish the result.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self), fields(tick = self.ticks)))]
    pub fn tick(&mut self) -> TickOutcome {
        if self.source.is_none() {
            return TickOutcome::NotRunning;
        }
        if self.stop_flag.is_stop_requested() {
            self.stop();
            return TickOutcome::Stopped;
        }

        let mut timings = StageTimings::default();
        let start = Instant::now();
        let gray = match self.capture() {
            Ok(Some(gray)) => gray,
            Ok(None) => return TickOutcome::NoFrame,
            Err(e) => {
                log::warn!("frame capture failed: {e}");
                return TickOutcome::NoFrame;
            }
        };
        timings.capture = millis(start.elapsed());

        let (publication, outcome) = self.process(&gray, &mut timings);

        if self.stop_flag.is_stop_requested() {
            self.stop();
            return TickOutcome::Stopped;
        }
        self.publish(publication, timings);
        log::debug!("tick {}: {:?}", self.ticks, outcome);
        outcome
    }

    fn capture(&mut self) -> Result<Option<GrayImage>, VideoError> {
        let frame = match self.first_frame.take() {
            Some(frame) => frame,
            None => match self.source.as_mut() {
                Some(source) => match source.next_frame()? {
                    Some(frame) => frame,
                    None => return Ok(None),
                },
                None => return Ok(None),
            },
        };
        Ok(Some(frame.to_gray()?))
    }

    fn process(&mut self, gray: &GrayImage, timings: &mut StageTimings) -> (Publication, TickOutcome) {
        let Some(mut located) = self.locate(gray, timings) else {
            // A job issued before the puzzle left the view belongs to a
            // puzzle that may not come back; its result must not be placed
            // on the next outline.
            if let Some(worker) = self.worker.as_mut() {
                self.generation += 1;
                let _ = worker.try_take(self.generation);
            }
            return (Publication::empty(), TickOutcome::NoGrid);
        };

        let recognitions = match self.worker.as_mut() {
            None => {
                let start = Instant::now();
                let r = self.recognizer.recognize_cells(&located.cells);
                timings.recognize = millis(start.elapsed());
                r
            }
            Some(worker) => {
                let ready = worker.try_take(self.generation);
                if !worker.is_busy() {
                    worker.submit(self.generation, std::mem::take(&mut located.cells));
                }
                match ready {
                    Some(result) => {
                        timings.recognize = millis(result.elapsed);
                        result.recognitions
                    }
                    None => {
                        let publication = Publication {
                            corners: Some(located.corners),
                            grid_lines: located.grid_lines,
                            solution: self.snapshot.load().solution.clone(),
                        };
                        return (publication, TickOutcome::Pending);
                    }
                }
            }
        };

        let givens = givens_from(&recognitions);
        let start = Instant::now();
        let solved = self.solve(&givens);
        timings.solve = millis(start.elapsed());

        let place = |grid: &PuzzleGrid| {
            Arc::new(compose_overlay(
                grid,
                &located.corners,
                &located.rect.h_frame_from_square,
                located.rect.size,
                &self.params.overlay,
            ))
        };
        let (solution, outcome) = match solved {
            Ok((grid, reused)) => (Some(place(&grid)), TickOutcome::Solved { reused }),
            Err(e) => {
                log::debug!("puzzle not solvable: {e}");
                let retained = match self.params.unsolved_policy {
                    UnsolvedPolicy::Clear => None,
                    UnsolvedPolicy::Retain => self
                        .last_solved
                        .as_ref()
                        .filter(|last| last.grid.agrees_with(&givens))
                        .map(|last| place(&last.grid)),
                };
                (retained, TickOutcome::Unsolvable(e))
            }
        };

        let publication = Publication {
            corners: Some(located.corners),
            grid_lines: located.grid_lines,
            solution,
        };
        (publication, outcome)
    }

    fn locate(&self, gray: &GrayImage, timings: &mut StageTimings) -> Option<Located> {
        let view = gray.view();

        let start = Instant::now();
        let mask = binarize(&view, &self.params.binarize);
        timings.threshold = millis(start.elapsed());

        let start = Instant::now();
        let labeling = label_components(&mask);
        let candidate = select_grid_candidate(&labeling, &self.params.components);
        timings.component_label = millis(start.elapsed());
        let Some(candidate) = candidate else {
            log::debug!("no grid candidate among {} components", labeling.components.len());
            return None;
        };

        let start = Instant::now();
        let corners = self.detector.detect(&labeling, candidate);
        timings.corner_detect = millis(start.elapsed());
        let corners = match corners {
            Ok(c) => c,
            Err(reject) => {
                log::debug!("grid candidate rejected: {reject}");
                return None;
            }
        };

        let start = Instant::now();
        let rect = rectify(&view, &corners, &self.params.extract);
        let rect = match rect {
            Ok(r) => r,
            Err(e) => {
                timings.perspective_extract = millis(start.elapsed());
                log::warn!("rectification failed: {e}");
                return None;
            }
        };
        let lines = grid_lines(&rect.h_frame_from_square, rect.size);
        timings.perspective_extract = millis(start.elapsed());

        let start = Instant::now();
        let cells = extract_cells(&rect, &self.params.extract);
        timings.box_extract = millis(start.elapsed());

        Some(Located {
            corners,
            rect,
            grid_lines: lines,
            cells,
        })
    }

    /// Solve `givens`, reusing the cached grid when they did not change.
    fn solve(&mut self, givens: &Givens) -> Result<(PuzzleGrid, bool), SolveError> {
        if let Some(last) = &self.last_solved {
            if last.givens == *givens {
                return Ok((last.grid.clone(), true));
            }
        }
        let solved = self.solver.solve(&PuzzleGrid::from_givens(givens))?;
        log::info!(
            "solved puzzle with {} givens in {} nodes",
            solved.grid.known_count(),
            solved.nodes
        );
        self.last_solved = Some(SolvedPuzzle {
            givens: *givens,
            grid: solved.grid.clone(),
        });
        Ok((solved.grid, false))
    }

    fn publish(&mut self, publication: Publication, metrics: StageTimings) {
        self.ticks += 1;
        let previous = self.snapshot.load();
        let changed = match (&previous.solution, &publication.solution) {
            (None, None) => false,
            (Some(a), Some(b)) => !a.same_digits(b),
            _ => true,
        };
        self.snapshot.store(EngineSnapshot {
            tick: self.ticks,
            corners: publication.corners,
            grid_lines: publication.grid_lines,
            solution: publication.solution.clone(),
            is_running: true,
            metrics,
            video: self.video,
        });
        if changed {
            self.events
                .publish(EngineEvent::SolutionChanged(publication.solution));
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Some(source) = self.source.as_mut() {
            source.close();
        }
    }
}
