use sudoku_ar_solver::{Cell, PuzzleGrid, SolveError, Solver, SolverParams};

const BASE: &str =
    "534678912672195348198342567859761423426853791713924856961537284287419635345286179";

struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> usize {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.0 >> 33) as usize
    }
}

/// A valid full grid: digits relabelled, bands and rows within bands shuffled.
fn shuffled_solution(rng: &mut Lcg) -> PuzzleGrid {
    let base: PuzzleGrid = BASE.parse().unwrap();
    let mut relabel: Vec<u8> = (1..=9).collect();
    for i in (1..9).rev() {
        relabel.swap(i, rng.next() % (i + 1));
    }
    let band_order = [rng.next() % 3, 0, 0];
    let band_order = [band_order[0], (band_order[0] + 1) % 3, (band_order[0] + 2) % 3];
    let shift = rng.next() % 3;

    let mut out = PuzzleGrid::default();
    for r in 0..9 {
        let src_row = band_order[r / 3] * 3 + (r % 3 + shift) % 3;
        for c in 0..9 {
            let d = base.get(src_row, c).digit.unwrap();
            out.cells[r][c] = Cell {
                digit: Some(relabel[d as usize - 1]),
                is_known: true,
            };
        }
    }
    out
}

#[test]
fn consistent_givens_never_fail_hard() {
    let mut rng = Lcg(7);
    let solver = Solver::new(SolverParams {
        min_givens: 0,
        ..SolverParams::default()
    });
    for round in 0..40 {
        let full = shuffled_solution(&mut rng);
        assert!(full.is_solved());
        let mut puzzle = full.clone();
        let holes = 30 + round;
        for _ in 0..holes {
            let i = rng.next() % 81;
            puzzle.cells[i / 9][i % 9] = Cell::default();
        }

        match solver.solve(&puzzle) {
            Ok(solved) => {
                assert!(solved.grid.is_solved());
                assert!(solved.grid.agrees_with(&puzzle.givens()));
                for (r, c, cell) in puzzle.iter() {
                    assert_eq!(solved.grid.get(r, c).is_known, cell.is_known);
                }
                // A unique completion of givens taken from `full` must be `full`.
                for (r, c, cell) in full.iter() {
                    assert_eq!(solved.grid.get(r, c).digit, cell.digit);
                }
            }
            Err(SolveError::Ambiguous) => {}
            Err(e) => panic!("round {round}: unexpected {e:?}"),
        }
    }
}

#[test]
fn solution_serializes_with_known_flags() {
    let puzzle: PuzzleGrid =
        "53..7....6..195....98....6.8...6...34..8.3..17...2...6.6....28....419..5....8..79"
            .parse()
            .unwrap();
    let solved = Solver::default().solve(&puzzle).unwrap();
    let json = serde_json::to_string(&solved.grid).unwrap();
    let back: PuzzleGrid = serde_json::from_str(&json).unwrap();
    assert_eq!(back, solved.grid);
    assert!(back.get(0, 0).is_known);
    assert!(!back.get(0, 2).is_known);
}
