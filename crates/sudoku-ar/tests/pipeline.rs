use sudoku_ar::synthetic::{blank_surface, givens_from_str, PuzzleScene};
use sudoku_ar::{
    Engine, EngineEvent, EngineParams, EventFilter, FrameSequence, SolveError, StillImageSource,
    TickOutcome, UnsolvedPolicy,
};

const PUZZLE: &str =
    "53..7....6..195....98....6.8...6...34..8.3..17...2...6.6....28....419..5....8..79";
const SOLVED: &str =
    "534678912672195348198342567859761423426853791713924856961537284287419635345286179";
// Last given misread as 4: consistent locally, no completion exists.
const MISREAD: &str =
    "53..7....6..195....98....6.8...6...34..8.3..17...2...6.6....28....419..5....8..74";
// First twelve givens lost: two completions.
const SPARSE: &str =
    "...................................34..8.3..17...2...6.6....28....419..5....8..79";

fn scene(givens: &str) -> PuzzleScene {
    PuzzleScene::centered(480, 480, 378.0, 0.0, givens_from_str(givens))
}

#[test]
fn clean_puzzle_is_read_and_solved() {
    let mut engine = Engine::default();
    let frame = scene(PUZZLE).render_frame();
    engine.start(StillImageSource::new(frame)).unwrap();

    assert_eq!(engine.tick(), TickOutcome::Solved { reused: false });
    let snap = engine.snapshot();
    assert!(snap.is_running);
    assert_eq!(snap.grid_lines.len(), 16);

    let corners = snap.corners.expect("corners");
    let expected = scene(PUZZLE).corners;
    for (got, want) in corners.ring().iter().zip(expected.ring().iter()) {
        assert!((got - want).norm() < 2.0, "corner {got:?} vs {want:?}");
    }

    let solution = snap.solution.as_ref().expect("solution");
    assert!(solution.grid.is_solved());
    let givens = givens_from_str(PUZZLE);
    let answer = givens_from_str(SOLVED);
    for (r, c, cell) in solution.grid.iter() {
        assert_eq!(cell.is_known, givens[r][c].is_some(), "cell ({r}, {c})");
        assert_eq!(cell.digit, answer[r][c], "cell ({r}, {c})");
    }
    assert_eq!(solution.overlay().count(), 81 - 30);

    // Cell (0, 2) holds the solver's 4, centered in its 42 px square.
    let placed = solution.cell(0, 2).expect("overlay entry");
    assert_eq!(placed.digit, 4);
    assert!((placed.position.x - (51.0 + 2.5 * 42.0)).abs() < 1.5);
    assert!((placed.position.y - (51.0 + 0.5 * 42.0)).abs() < 1.5);
    assert!(placed.digit_rotation.abs() < 0.01);
    assert!((placed.digit_height - 0.75 * 42.0).abs() < 1.0);

    let m = snap.metrics;
    for v in [
        m.capture,
        m.threshold,
        m.component_label,
        m.corner_detect,
        m.perspective_extract,
        m.box_extract,
        m.recognize,
        m.solve,
    ] {
        assert!(v >= 0.0);
    }
}

#[test]
fn unchanged_digits_reuse_the_cached_solution() {
    let mut engine = Engine::default();
    engine
        .start(StillImageSource::new(scene(PUZZLE).render_frame()))
        .unwrap();
    let solved = engine.subscribe(EventFilter::SolutionChanged);

    assert_eq!(engine.tick(), TickOutcome::Solved { reused: false });
    assert_eq!(engine.tick(), TickOutcome::Solved { reused: true });
    assert_eq!(engine.snapshot().tick, 2);
    assert_eq!(solved.receiver.try_iter().count(), 1);
}

#[test]
fn rotated_puzzle_reports_its_tilt() {
    let angle = 10f32.to_radians();
    let scene = PuzzleScene::centered(480, 480, 340.0, angle, givens_from_str(PUZZLE));
    let mut engine = Engine::default();
    engine
        .start(StillImageSource::new(scene.render_frame()))
        .unwrap();

    assert_eq!(engine.tick(), TickOutcome::Solved { reused: false });
    let snap = engine.snapshot();
    let solution = snap.solution.as_ref().unwrap();
    for (_, _, cell) in solution.overlay() {
        assert!((cell.digit_rotation - angle).abs() < 1f32.to_radians());
    }
}

#[test]
fn blank_surface_publishes_nothing() {
    let mut engine = Engine::default();
    engine.start(StillImageSource::new(blank_surface(320, 240))).unwrap();

    assert_eq!(engine.tick(), TickOutcome::NoGrid);
    let snap = engine.snapshot();
    assert!(snap.corners.is_none());
    assert!(snap.solution.is_none());
    assert!(snap.grid_lines.is_empty());
    assert!(snap.is_running);
}

#[test]
fn misread_digit_clears_the_solution() {
    let mut engine = Engine::default();
    let events = engine.subscribe(EventFilter::SolutionChanged);
    engine
        .start(FrameSequence::new([
            scene(PUZZLE).render_frame(),
            scene(MISREAD).render_frame(),
        ]))
        .unwrap();

    assert_eq!(engine.tick(), TickOutcome::Solved { reused: false });
    match engine.tick() {
        TickOutcome::Unsolvable(SolveError::Contradiction | SolveError::NoSolution) => {}
        other => panic!("expected unsolvable, got {other:?}"),
    }
    let snap = engine.snapshot();
    assert!(snap.corners.is_some());
    assert!(snap.solution.is_none());

    let seen: Vec<EngineEvent> = events.receiver.try_iter().collect();
    assert_eq!(seen.len(), 2);
    assert!(matches!(&seen[0], EngineEvent::SolutionChanged(Some(_))));
    assert_eq!(seen[1], EngineEvent::SolutionChanged(None));
}

#[test]
fn retain_policy_keeps_a_compatible_solution() {
    let params = EngineParams {
        unsolved_policy: UnsolvedPolicy::Retain,
        ..EngineParams::default()
    };
    let mut engine = Engine::new(params);
    engine
        .start(FrameSequence::new([
            scene(PUZZLE).render_frame(),
            scene(SPARSE).render_frame(),
            scene(MISREAD).render_frame(),
        ]))
        .unwrap();

    assert_eq!(engine.tick(), TickOutcome::Solved { reused: false });
    let first = engine.snapshot().solution.clone().unwrap();

    assert_eq!(
        engine.tick(),
        TickOutcome::Unsolvable(SolveError::Ambiguous)
    );
    let kept = engine.snapshot().solution.clone().expect("retained");
    assert!(kept.same_digits(&first));
    // The retained grid keeps its original givens.
    assert_eq!(kept.overlay().count(), first.overlay().count());

    assert!(matches!(engine.tick(), TickOutcome::Unsolvable(_)));
    assert!(engine.snapshot().solution.is_none());
}

#[test]
fn snapshot_is_readable_from_another_thread() {
    let mut engine = Engine::default();
    engine
        .start(StillImageSource::new(scene(PUZZLE).render_frame()))
        .unwrap();
    let reader = engine.snapshot_reader();
    let before = reader.latest();

    let watcher = std::thread::spawn(move || {
        for _ in 0..2000 {
            if reader.latest().solution.is_some() {
                return true;
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        false
    });
    engine.tick();
    assert!(watcher.join().unwrap());
    assert!(before.solution.is_none());
}

#[test]
fn stop_clears_and_announces() {
    let mut engine = Engine::default();
    engine
        .start(StillImageSource::new(scene(PUZZLE).render_frame()))
        .unwrap();
    engine.tick();
    let events = engine.subscribe(EventFilter::All);
    engine.stop();

    let snap = engine.snapshot();
    assert!(!snap.is_running);
    assert!(snap.solution.is_none());
    assert!(snap.corners.is_none());
    assert_eq!(
        events.receiver.try_recv().unwrap(),
        EngineEvent::SolutionChanged(None)
    );
    assert!(engine.unsubscribe(events.id));
    assert_eq!(engine.tick(), TickOutcome::NotRunning);
}
