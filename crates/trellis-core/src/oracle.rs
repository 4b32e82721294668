//! Bounded-effort solvability check.
//!
//! The same MRV + forward-checking search as the driver, with no event
//! emission and a hard ceiling on visited nodes. Used as a pre-flight check
//! so a broken puzzle state is reported instead of driving a doomed
//! instrumented search. Runs on its own private model copy and never
//! interacts with an active controller.

use crate::board::Board;
use crate::model::SearchModel;
use crate::propagate;
use serde::{Deserialize, Serialize};

/// Node-visit ceiling. Hitting it returns an optimistic verdict rather than
/// burning more time; below it the answer is exact.
pub const ORACLE_NODE_LIMIT: u64 = 50_000;

/// Answer of a bounded solvability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// A complete assignment exists.
    Solvable,
    /// Exhaustively refuted below the node ceiling.
    Unsolvable,
    /// Ceiling reached; treated as solvable by [`solvable`].
    NodeLimit,
}

/// Is the board worth searching? `NodeLimit` counts as yes: a rare false
/// positive is cheaper than an unbounded pre-flight check, and a false
/// "unsolvable" below the ceiling can never occur.
pub fn solvable(board: &Board) -> bool {
    verdict(board) != Verdict::Unsolvable
}

/// Bounded solvability check with the ceiling outcome kept distinct.
pub fn verdict(board: &Board) -> Verdict {
    let mut model = SearchModel::from_board(board);
    if model.contradiction().is_some() {
        // a domain emptied while pruning givens: refuted without search
        return Verdict::Unsolvable;
    }
    let mut nodes = 0;
    match search(&mut model, &mut nodes) {
        Some(true) => Verdict::Solvable,
        Some(false) => Verdict::Unsolvable,
        None => Verdict::NodeLimit,
    }
}

/// Plain recursive backtracking. `Some(found)` is exact; `None` means the
/// node budget ran out.
fn search(model: &mut SearchModel, nodes: &mut u64) -> Option<bool> {
    *nodes += 1;
    if *nodes > ORACLE_NODE_LIMIT {
        return None;
    }
    if model.is_complete() {
        return Some(true);
    }

    let var = model
        .select_mrv()
        .expect("incomplete model has an unassigned variable");
    let candidates = model.domain(var).to_vec();
    for value in candidates {
        model.assign(var, value);
        let prop = propagate::forward_check(model, var, value);
        if !prop.failed() {
            match search(model, nodes) {
                Some(true) => return Some(true),
                Some(false) => {}
                None => {
                    // out of budget: unwind and report the ceiling
                    propagate::undo(model, &prop.removed);
                    model.unassign(var);
                    return None;
                }
            }
        }
        propagate::undo(model, &prop.removed);
        model.unassign(var);
    }
    Some(false)
}
