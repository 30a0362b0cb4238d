use crate::{Cell, PuzzleGrid, SolverParams, GRID_SIZE};

#[cfg(feature = "tracing")]
use tracing::instrument;

const N: usize = GRID_SIZE * GRID_SIZE;
const ALL: u16 = 0b11_1111_1110;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    #[error("cell ({row}, {col}) holds an invalid given")]
    InvalidGivens { row: usize, col: usize },
    #[error("only {count} givens, need at least {min}")]
    TooFewGivens { count: usize, min: usize },
    #[error("givens contradict each other")]
    Contradiction,
    #[error("no completion exists")]
    NoSolution,
    #[error("more than one completion exists")]
    Ambiguous,
    #[error("search budget of {0} nodes exhausted")]
    BudgetExhausted(usize),
}

/// A unique completion and the search effort it took.
#[derive(Clone, Debug, PartialEq)]
pub struct Solved {
    pub grid: PuzzleGrid,
    pub nodes: usize,
}

#[derive(Default)]
struct Search {
    nodes: usize,
    found: Vec<[u8; N]>,
}

#[inline]
fn box_of(idx: usize) -> usize {
    (idx / 27) * 3 + (idx % 9) / 3
}

/// Cell indices of the 27 rows, columns and boxes.
fn units() -> [[usize; 9]; 27] {
    let mut u = [[0usize; 9]; 27];
    for i in 0..9 {
        for j in 0..9 {
            u[i][j] = i * 9 + j;
            u[9 + i][j] = j * 9 + i;
            u[18 + i][j] = (3 * (i / 3) + j / 3) * 9 + 3 * (i % 3) + j % 3;
        }
    }
    u
}

#[derive(Clone)]
struct Board {
    digits: [u8; N],
    rows: [u16; 9],
    cols: [u16; 9],
    boxes: [u16; 9],
}

struct Dead;

impl Board {
    fn empty() -> Self {
        Self {
            digits: [0; N],
            rows: [0; 9],
            cols: [0; 9],
            boxes: [0; 9],
        }
    }

    #[inline]
    fn candidates(&self, idx: usize) -> u16 {
        ALL & !(self.rows[idx / 9] | self.cols[idx % 9] | self.boxes[box_of(idx)])
    }

    fn place(&mut self, idx: usize, d: u8) -> Result<(), Dead> {
        let bit = 1u16 << d;
        if self.candidates(idx) & bit == 0 {
            return Err(Dead);
        }
        self.digits[idx] = d;
        self.rows[idx / 9] |= bit;
        self.cols[idx % 9] |= bit;
        self.boxes[box_of(idx)] |= bit;
        Ok(())
    }

    /// Apply naked and hidden singles until nothing changes.
    fn propagate(&mut self, units: &[[usize; 9]; 27]) -> Result<(), Dead> {
        loop {
            let mut changed = false;

            for idx in 0..N {
                if self.digits[idx] != 0 {
                    continue;
                }
                let c = self.candidates(idx);
                if c == 0 {
                    return Err(Dead);
                }
                if c.count_ones() == 1 {
                    self.place(idx, c.trailing_zeros() as u8)?;
                    changed = true;
                }
            }

            for unit in units {
                for d in 1..=9u8 {
                    let bit = 1u16 << d;
                    let mut spot = None;
                    let mut count = 0;
                    let mut placed = false;
                    for &idx in unit {
                        if self.digits[idx] == d {
                            placed = true;
                            break;
                        }
                        if self.digits[idx] == 0 && self.candidates(idx) & bit != 0 {
                            count += 1;
                            spot = Some(idx);
                        }
                    }
                    if placed {
                        continue;
                    }
                    match (count, spot) {
                        (0, _) => return Err(Dead),
                        (1, Some(idx)) => {
                            self.place(idx, d)?;
                            changed = true;
                        }
                        _ => {}
                    }
                }
            }

            if !changed {
                return Ok(());
            }
        }
    }

    /// Empty cell with the fewest candidates.
    fn most_constrained(&self) -> Option<(usize, u16)> {
        let mut best: Option<(usize, u16)> = None;
        for idx in (0..N).filter(|&i| self.digits[i] == 0) {
            let c = self.candidates(idx);
            if best.is_none_or(|(_, b)| c.count_ones() < b.count_ones()) {
                best = Some((idx, c));
                if c.count_ones() <= 1 {
                    break;
                }
            }
        }
        best
    }
}

/// Propagation plus MRV backtracking, stopping at the second solution.
#[derive(Clone, Debug, Default)]
pub struct Solver {
    params: SolverParams,
}

impl Solver {
    pub fn new(params: SolverParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SolverParams {
        &self.params
    }

    /// Complete `grid`. Cells marked known are fixed; every other cell is
    /// treated as empty.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all, fields(givens = grid.known_count())))]
    pub fn solve(&self, grid: &PuzzleGrid) -> Result<Solved, SolveError> {
        let count = grid.known_count();
        if count < self.params.min_givens {
            return Err(SolveError::TooFewGivens {
                count,
                min: self.params.min_givens,
            });
        }

        let mut board = Board::empty();
        for (r, c, cell) in grid.iter() {
            if !cell.is_known {
                continue;
            }
            let d = match cell.digit {
                Some(d @ 1..=9) => d,
                _ => return Err(SolveError::InvalidGivens { row: r, col: c }),
            };
            board
                .place(r * 9 + c, d)
                .map_err(|_| SolveError::Contradiction)?;
        }

        let units = units();
        board
            .propagate(&units)
            .map_err(|_| SolveError::Contradiction)?;

        let limit = if self.params.require_unique { 2 } else { 1 };
        let mut search = Search::default();
        self.search(board, &units, limit, &mut search)?;

        match search.found.len() {
            0 => Err(SolveError::NoSolution),
            1 => {
                log::debug!("solved with {} search nodes", search.nodes);
                let digits = search.found[0];
                let mut out = grid.clone();
                for (idx, &d) in digits.iter().enumerate() {
                    let cell = &mut out.cells[idx / 9][idx % 9];
                    if !cell.is_known {
                        *cell = Cell {
                            digit: Some(d),
                            is_known: false,
                        };
                    }
                }
                Ok(Solved {
                    grid: out,
                    nodes: search.nodes,
                })
            }
            _ => Err(SolveError::Ambiguous),
        }
    }

    fn search(
        &self,
        mut board: Board,
        units: &[[usize; 9]; 27],
        limit: usize,
        state: &mut Search,
    ) -> Result<(), SolveError> {
        state.nodes += 1;
        if state.nodes > self.params.max_nodes {
            return Err(SolveError::BudgetExhausted(self.params.max_nodes));
        }
        if board.propagate(units).is_err() {
            return Ok(());
        }
        let Some((idx, cands)) = board.most_constrained() else {
            state.found.push(board.digits);
            return Ok(());
        };
        for d in 1..=9u8 {
            if cands & (1 << d) == 0 {
                continue;
            }
            let mut next = board.clone();
            if next.place(idx, d).is_err() {
                continue;
            }
            self.search(next, units, limit, state)?;
            if state.found.len() >= limit {
                break;
            }
        }
        Ok(())
    }
}
