use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cells per side.
pub const GRID_SIZE: usize = 9;

/// Recognized digits, row-major; `None` is an empty cell.
pub type Givens = [[Option<u8>; GRID_SIZE]; GRID_SIZE];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub digit: Option<u8>,
    /// Read from the image rather than filled in by the solver.
    pub is_known: bool,
}

/// A 9×9 sudoku table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleGrid {
    pub cells: [[Cell; GRID_SIZE]; GRID_SIZE],
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GridParseError {
    #[error("expected 81 cells, got {0}")]
    Length(usize),
    #[error("unexpected character {ch:?} at cell {index}")]
    Character { ch: char, index: usize },
}

impl PuzzleGrid {
    /// Grid whose non-empty cells are all known.
    pub fn from_givens(givens: &Givens) -> Self {
        let mut grid = Self::default();
        for (r, row) in givens.iter().enumerate() {
            for (c, d) in row.iter().enumerate() {
                grid.cells[r][c] = Cell {
                    digit: *d,
                    is_known: d.is_some(),
                };
            }
        }
        grid
    }

    /// Digits of the known cells.
    pub fn givens(&self) -> Givens {
        let mut out = [[None; GRID_SIZE]; GRID_SIZE];
        for (r, row) in self.cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if cell.is_known {
                    out[r][c] = cell.digit;
                }
            }
        }
        out
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[row][col]
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .flat_map(|(r, row)| row.iter().enumerate().map(move |(c, cell)| (r, c, *cell)))
    }

    pub fn known_count(&self) -> usize {
        self.iter().filter(|(_, _, c)| c.is_known).count()
    }

    /// Every cell filled and every row, column and box a permutation of 1..=9.
    pub fn is_solved(&self) -> bool {
        let unit_ok = |cells: &mut dyn Iterator<Item = Option<u8>>| {
            let mut seen = 0u16;
            for d in cells {
                match d {
                    Some(d @ 1..=9) => seen |= 1 << d,
                    _ => return false,
                }
            }
            seen == 0b11_1111_1110
        };
        (0..GRID_SIZE).all(|i| {
            unit_ok(&mut (0..GRID_SIZE).map(|j| self.cells[i][j].digit))
                && unit_ok(&mut (0..GRID_SIZE).map(|j| self.cells[j][i].digit))
                && unit_ok(
                    &mut (0..GRID_SIZE)
                        .map(|j| self.cells[3 * (i / 3) + j / 3][3 * (i % 3) + j % 3].digit),
                )
        })
    }

    /// Whether every given agrees with this grid's digit at the same cell.
    pub fn agrees_with(&self, givens: &Givens) -> bool {
        givens.iter().enumerate().all(|(r, row)| {
            row.iter()
                .enumerate()
                .all(|(c, g)| g.is_none() || *g == self.cells[r][c].digit)
        })
    }
}

/// 81 characters, row-major; `1`-`9` are givens, `0` or `.` are empty.
/// Whitespace is ignored.
impl FromStr for PuzzleGrid {
    type Err = GridParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().filter(|c| !c.is_whitespace()).collect();
        if chars.len() != GRID_SIZE * GRID_SIZE {
            return Err(GridParseError::Length(chars.len()));
        }
        let mut givens = [[None; GRID_SIZE]; GRID_SIZE];
        for (index, &ch) in chars.iter().enumerate() {
            let d = match ch {
                '0' | '.' => None,
                '1'..='9' => Some(ch as u8 - b'0'),
                _ => return Err(GridParseError::Character { ch, index }),
            };
            givens[index / GRID_SIZE][index % GRID_SIZE] = d;
        }
        Ok(Self::from_givens(&givens))
    }
}

impl fmt::Display for PuzzleGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (r, row) in self.cells.iter().enumerate() {
            if r > 0 && r % 3 == 0 {
                writeln!(f, "------+-------+------")?;
            }
            for (c, cell) in row.iter().enumerate() {
                if c > 0 && c % 3 == 0 {
                    write!(f, "| ")?;
                }
                match cell.digit {
                    Some(d) => write!(f, "{d}")?,
                    None => write!(f, ".")?,
                }
                if c + 1 < GRID_SIZE {
                    write!(f, " ")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOLVED: &str =
        "534678912672195348198342567859761423426853791713924856961537284287419635345286179";

    #[test]
    fn parse_marks_givens_known() {
        let g: PuzzleGrid = "53..7....6..195....98....6.8...6...34..8.3..17...2...6.6....28....419..5....8..79"
            .parse()
            .unwrap();
        assert_eq!(g.get(0, 0), Cell { digit: Some(5), is_known: true });
        assert_eq!(g.get(0, 2), Cell::default());
        assert_eq!(g.known_count(), 30);
    }

    #[test]
    fn parse_errors() {
        assert_eq!("123".parse::<PuzzleGrid>(), Err(GridParseError::Length(3)));
        let bad = format!("x{}", &SOLVED[1..]);
        assert!(matches!(
            bad.parse::<PuzzleGrid>(),
            Err(GridParseError::Character { ch: 'x', index: 0 })
        ));
    }

    #[test]
    fn solved_check() {
        let g: PuzzleGrid = SOLVED.parse().unwrap();
        assert!(g.is_solved());
        let mut broken = g.clone();
        broken.cells[0][0].digit = Some(3);
        assert!(!broken.is_solved());
        let mut hole = g;
        hole.cells[4][4].digit = None;
        assert!(!hole.is_solved());
    }

    #[test]
    fn agreement_with_givens() {
        let g: PuzzleGrid = SOLVED.parse().unwrap();
        let mut givens = [[None; GRID_SIZE]; GRID_SIZE];
        givens[0][0] = Some(5);
        givens[8][8] = Some(9);
        assert!(g.agrees_with(&givens));
        givens[1][1] = Some(1);
        assert!(!g.agrees_with(&givens));
    }

    #[test]
    fn display_has_box_separators() {
        let g: PuzzleGrid = SOLVED.parse().unwrap();
        let text = g.to_string();
        assert_eq!(text.lines().count(), 11);
        assert!(text.starts_with("5 3 4 | 6 7 8 | 9 1 2\n"));
    }
}
