//! Sudoku solving for recognized puzzles.
//!
//! Givens are hard constraints. A grid is only reported solved when it has
//! exactly one completion; contradictions, dead ends, ambiguity and budget
//! exhaustion are all [`SolveError`]s.

mod grid;
mod params;
mod solver;

pub use grid::{Cell, Givens, GridParseError, PuzzleGrid, GRID_SIZE};
pub use params::SolverParams;
pub use solver::{SolveError, Solved, Solver};
