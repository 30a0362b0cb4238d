//! Background digit recognition.
//!
//! The tick loop hands cells to a dedicated thread and collects results on a
//! later tick. At most one job is in flight. Every job carries the engine
//! generation it was issued under; results from an older generation are
//! discarded when collected.

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use sudoku_ar_ocr::{DigitRecognizer, Recognition};
use sudoku_ar_vision::CellImage;

struct Job {
    generation: u64,
    cells: Vec<CellImage>,
}

#[derive(Clone, Debug)]
pub struct RecognitionResult {
    pub generation: u64,
    pub recognitions: Vec<Recognition>,
    pub elapsed: Duration,
}

pub struct RecognitionWorker {
    jobs: Option<Sender<Job>>,
    results: Receiver<RecognitionResult>,
    in_flight: bool,
    handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for RecognitionWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognitionWorker")
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

impl RecognitionWorker {
    pub fn spawn(recognizer: DigitRecognizer) -> std::io::Result<Self> {
        let (job_tx, job_rx) = bounded::<Job>(1);
        let (result_tx, result_rx) = bounded::<RecognitionResult>(1);
        let handle = std::thread::Builder::new()
            .name("sudoku-ar-recognize".into())
            .spawn(move || {
                for job in job_rx {
                    let start = Instant::now();
                    let recognitions = recognizer.recognize_cells(&job.cells);
                    let result = RecognitionResult {
                        generation: job.generation,
                        recognitions,
                        elapsed: start.elapsed(),
                    };
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
                log::debug!("recognition worker exiting");
            })?;
        Ok(Self {
            jobs: Some(job_tx),
            results: result_rx,
            in_flight: false,
            handle: Some(handle),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Queue `cells` unless a job is already in flight.
    pub fn submit(&mut self, generation: u64, cells: Vec<CellImage>) -> bool {
        if self.in_flight {
            return false;
        }
        let Some(jobs) = &self.jobs else {
            return false;
        };
        match jobs.try_send(Job { generation, cells }) {
            Ok(()) => {
                self.in_flight = true;
                true
            }
            Err(TrySendError::Full(_)) => false,
            Err(TrySendError::Disconnected(_)) => {
                log::warn!("recognition worker is gone");
                self.jobs = None;
                false
            }
        }
    }

    /// Finished result for `generation`, if any. Older results are dropped.
    pub fn try_take(&mut self, generation: u64) -> Option<RecognitionResult> {
        match self.results.try_recv() {
            Ok(result) => {
                self.in_flight = false;
                if result.generation == generation {
                    Some(result)
                } else {
                    log::debug!(
                        "dropping recognition result from generation {}",
                        result.generation
                    );
                    None
                }
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.in_flight = false;
                None
            }
        }
    }

    /// Close the job queue and wait for the thread to finish its current job.
    pub fn shutdown(mut self) {
        self.jobs = None;
        // Disconnect results so a thread blocked on a full queue wakes up.
        self.results = crossbeam_channel::never();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RecognitionWorker {
    fn drop(&mut self) {
        // Closing the queue lets the thread exit after its current job.
        self.jobs = None;
    }
}
