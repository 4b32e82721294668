//! Trace events, the append-only delta journal and state replay.
//!
//! Every event carries a `version`: the journal length at the moment the
//! event was emitted. Instead of deep-copying the assignment and all domains
//! into each event, a consumer that needs the full picture replays the
//! journal prefix up to that version with [`Replay`].

use crate::board::{Board, Pos};
use crate::model::SearchModel;
use serde::{Deserialize, Serialize};

/// How a finished search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// A complete satisfying assignment was found.
    Solved,
    /// The root exhausted every alternative without a solution.
    Unsatisfiable,
    /// The controller abandoned the search on request.
    Cancelled,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Solved => write!(f, "solved"),
            Outcome::Unsatisfiable => write!(f, "unsatisfiable"),
            Outcome::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// One step of the instrumented search.
///
/// `node` is the id of the search-tree node the event belongs to; `depth`
/// its recursion depth; `version` indexes the delta journal (see module
/// docs). The order of emission is the only ordering contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceEvent {
    /// A search-tree node was entered.
    Enter {
        node: u64,
        depth: usize,
        version: u64,
        /// Variables assigned on entry, givens included.
        assigned: usize,
    },
    /// A candidate value is about to be tried (emitted before any mutation).
    Try {
        node: u64,
        depth: usize,
        version: u64,
        pos: Pos,
        value: u8,
    },
    /// Forward checking wiped a neighbor's domain.
    Deadend {
        node: u64,
        depth: usize,
        version: u64,
        pos: Pos,
        value: u8,
        /// The neighbor whose domain emptied.
        wiped: Pos,
    },
    /// A candidate (or the whole node, when `value` is `None`) was undone.
    Backtrack {
        node: u64,
        depth: usize,
        version: u64,
        pos: Pos,
        value: Option<u8>,
    },
    /// A complete satisfying assignment was reached.
    Solution {
        node: u64,
        depth: usize,
        version: u64,
        assignment: Vec<(Pos, u8)>,
        nodes_visited: u64,
    },
    /// Terminal event: the search is over, solved or not.
    Done {
        nodes_visited: u64,
        outcome: Outcome,
    },
}

impl TraceEvent {
    /// Node id, absent only on the terminal `Done`.
    pub fn node(&self) -> Option<u64> {
        match *self {
            TraceEvent::Enter { node, .. }
            | TraceEvent::Try { node, .. }
            | TraceEvent::Deadend { node, .. }
            | TraceEvent::Backtrack { node, .. }
            | TraceEvent::Solution { node, .. } => Some(node),
            TraceEvent::Done { .. } => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TraceEvent::Done { .. })
    }
}

/// One mutation of session state, as recorded in the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Delta {
    Assign { pos: Pos, value: u8 },
    Unassign { pos: Pos, value: u8 },
    /// Forward checking removed `value` from the domain at `pos`.
    Remove { pos: Pos, value: u8 },
    /// Backtracking reinserted `value` into the domain at `pos`.
    Restore { pos: Pos, value: u8 },
}

/// Reconstructs assignment/domain state at any journal version.
///
/// Replay starts from the deterministic post-construction model (givens
/// assigned, their values pruned) and folds in the journal prefix. Domains
/// are reproduced as value sets; the engine's internal value order is not
/// part of the replayed state.
pub struct Replay<'a> {
    board: &'a Board,
    journal: &'a [Delta],
}

impl<'a> Replay<'a> {
    pub fn new(board: &'a Board, journal: &'a [Delta]) -> Self {
        Self { board, journal }
    }

    fn model_at(&self, version: u64) -> SearchModel {
        let mut model = SearchModel::from_board(self.board);
        let upto = (version as usize).min(self.journal.len());
        for delta in &self.journal[..upto] {
            match *delta {
                Delta::Assign { pos, value } => {
                    let var = model.topology().index_of(pos);
                    model.assign(var, value);
                }
                Delta::Unassign { pos, .. } => {
                    let var = model.topology().index_of(pos);
                    model.unassign(var);
                }
                Delta::Remove { pos, value } => {
                    let var = model.topology().index_of(pos);
                    let _ = model.remove_value(var, value);
                }
                Delta::Restore { pos, value } => {
                    let var = model.topology().index_of(pos);
                    let slot = model
                        .domain(var)
                        .iter()
                        .position(|&v| v > value)
                        .unwrap_or(model.domain(var).len());
                    model.restore_value(var, value, slot);
                }
            }
        }
        model
    }

    /// Assignment in effect at `version`, givens included, row-major.
    pub fn assignment_at(&self, version: u64) -> Vec<(Pos, u8)> {
        self.model_at(version).assignment_pairs()
    }

    /// Domain of `pos` at `version`, ascending.
    pub fn domain_at(&self, version: u64, pos: Pos) -> Vec<u8> {
        let model = self.model_at(version);
        let mut domain = model.domain(model.topology().index_of(pos)).to_vec();
        domain.sort_unstable();
        domain
    }
}
