use serde::{Deserialize, Serialize};

/// Search limits for [`crate::Solver`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverParams {
    /// Maximum search nodes before giving up.
    pub max_nodes: usize,
    /// Look for a second solution and reject ambiguous grids.
    pub require_unique: bool,
    /// Fewer givens than this cannot have a unique solution.
    pub min_givens: usize,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            max_nodes: 200_000,
            require_unique: true,
            min_givens: 17,
        }
    }
}
