//! The instrumented backtracking search.
//!
//! One search-tree node per `Enter` event: minimum-remaining-values variable
//! selection (row-major tie-break), values tried in domain order, forward
//! checking after each tentative assignment, exact undo on failure. The
//! recursion of the textbook algorithm is flattened into an explicit frame
//! stack so the whole search suspends between events: each
//! [`Iterator::next`] call advances the machine just far enough to produce
//! the next [`TraceEvent`].

use std::collections::VecDeque;

use crate::board::{Board, Pos};
use crate::event::{Delta, Outcome, TraceEvent};
use crate::model::SearchModel;
use crate::oracle;
use crate::propagate::{self, Reduction};
use serde::{Deserialize, Serialize};

/// A suggested move: the first value the search commits to an empty cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    pub pos: Pos,
    pub value: u8,
}

/// One suspended search-tree node.
struct Frame {
    node: u64,
    depth: usize,
    var: usize,
    /// Domain snapshot taken at selection time; tried in this order.
    candidates: Vec<u8>,
    next: usize,
    /// Reductions applied for the value currently in flight.
    ledger: Vec<Reduction>,
    in_flight: Option<u8>,
}

enum Phase {
    /// About to enter a fresh node at depth `stack.len()`.
    Enter,
    /// The top frame tries its next candidate value.
    TryNext,
    /// The subtree under the top frame's in-flight value failed.
    ChildFailed,
    Finished,
}

/// Steppable search over one exclusively-owned model.
///
/// All session state (model, journal, node counter, frame stack) lives in
/// the driver and is discarded with it; nothing survives across searches.
pub struct SearchDriver {
    board: Board,
    model: SearchModel,
    journal: Vec<Delta>,
    nodes: u64,
    stack: Vec<Frame>,
    queue: VecDeque<TraceEvent>,
    phase: Phase,
    outcome: Option<Outcome>,
}

impl SearchDriver {
    /// Start a search session for `board`. No work happens until the first
    /// event is pulled.
    pub fn new(board: &Board) -> Self {
        Self {
            board: board.clone(),
            model: SearchModel::from_board(board),
            journal: Vec::new(),
            nodes: 0,
            stack: Vec::new(),
            queue: VecDeque::new(),
            phase: Phase::Enter,
            outcome: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Search-tree nodes entered so far.
    pub fn nodes_visited(&self) -> u64 {
        self.nodes
    }

    /// The delta journal accumulated so far; event `version` fields index
    /// into it (see [`crate::event::Replay`]).
    pub fn journal(&self) -> &[Delta] {
        &self.journal
    }

    /// Final outcome, once the terminal event has been produced.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    fn version(&self) -> u64 {
        self.journal.len() as u64
    }

    fn pos_of(&self, var: usize) -> Pos {
        self.model.topology().pos_of(var)
    }

    fn finish(&mut self, outcome: Outcome) {
        self.queue.push_back(TraceEvent::Done {
            nodes_visited: self.nodes,
            outcome,
        });
        self.outcome = Some(outcome);
        self.phase = Phase::Finished;
    }

    /// Advance the machine by one transition, queueing the events it emits.
    fn pump(&mut self) {
        match self.phase {
            Phase::Finished => {}
            Phase::Enter => self.enter_node(),
            Phase::TryNext => self.try_next(),
            Phase::ChildFailed => self.child_failed(),
        }
    }

    fn enter_node(&mut self) {
        self.nodes += 1;
        let node = self.nodes;
        let depth = self.stack.len();
        self.queue.push_back(TraceEvent::Enter {
            node,
            depth,
            version: self.version(),
            assigned: self.model.assigned_count(),
        });

        // Givens that contradict each other empty a domain before the
        // search starts; the root has no viable candidates at all.
        if depth == 0 {
            if let Some(wiped) = self.model.contradiction() {
                self.queue.push_back(TraceEvent::Backtrack {
                    node,
                    depth,
                    version: self.version(),
                    pos: wiped,
                    value: None,
                });
                self.finish(Outcome::Unsatisfiable);
                return;
            }
        }

        if self.model.is_complete() {
            self.queue.push_back(TraceEvent::Solution {
                node,
                depth,
                version: self.version(),
                assignment: self.model.assignment_pairs(),
                nodes_visited: self.nodes,
            });
            // First solution wins: no pending alternative is ever revisited.
            self.finish(Outcome::Solved);
            return;
        }

        let var = self
            .model
            .select_mrv()
            .expect("incomplete model has an unassigned variable");
        self.stack.push(Frame {
            node,
            depth,
            var,
            candidates: self.model.domain(var).to_vec(),
            next: 0,
            ledger: Vec::new(),
            in_flight: None,
        });
        self.phase = Phase::TryNext;
    }

    fn try_next(&mut self) {
        let top = self.stack.len() - 1;
        let (node, depth, var) = {
            let f = &self.stack[top];
            (f.node, f.depth, f.var)
        };
        let pos = self.pos_of(var);

        if self.stack[top].next >= self.stack[top].candidates.len() {
            // Exhausted: give up on this node as a whole.
            self.queue.push_back(TraceEvent::Backtrack {
                node,
                depth,
                version: self.version(),
                pos,
                value: None,
            });
            self.stack.pop();
            if self.stack.is_empty() {
                self.finish(Outcome::Unsatisfiable);
            } else {
                self.phase = Phase::ChildFailed;
            }
            return;
        }

        let value = self.stack[top].candidates[self.stack[top].next];
        self.stack[top].next += 1;

        self.queue.push_back(TraceEvent::Try {
            node,
            depth,
            version: self.version(),
            pos,
            value,
        });

        self.model.assign(var, value);
        self.journal.push(Delta::Assign { pos, value });
        let prop = propagate::forward_check(&mut self.model, var, value);
        for r in &prop.removed {
            self.journal.push(Delta::Remove {
                pos: self.model.topology().pos_of(r.var),
                value: r.value,
            });
        }

        if let Some(wiped) = prop.wiped {
            self.queue.push_back(TraceEvent::Deadend {
                node,
                depth,
                version: self.version(),
                pos,
                value,
                wiped: self.pos_of(wiped),
            });
            self.unwind(&prop.removed, var, value);
            self.queue.push_back(TraceEvent::Backtrack {
                node,
                depth,
                version: self.version(),
                pos,
                value: Some(value),
            });
            // next candidate of the same node
        } else {
            let f = &mut self.stack[top];
            f.ledger = prop.removed;
            f.in_flight = Some(value);
            self.phase = Phase::Enter;
        }
    }

    fn child_failed(&mut self) {
        let top = self.stack.len() - 1;
        let (node, depth, var) = {
            let f = &self.stack[top];
            (f.node, f.depth, f.var)
        };
        let ledger = std::mem::take(&mut self.stack[top].ledger);
        let value = self.stack[top]
            .in_flight
            .take()
            .expect("failed child implies an in-flight value");
        let pos = self.pos_of(var);

        self.unwind(&ledger, var, value);
        self.queue.push_back(TraceEvent::Backtrack {
            node,
            depth,
            version: self.version(),
            pos,
            value: Some(value),
        });
        self.phase = Phase::TryNext;
    }

    /// Undo one tried value: restore every reduction (newest first), then
    /// clear the assignment, journalling each step.
    fn unwind(&mut self, ledger: &[Reduction], var: usize, value: u8) {
        propagate::undo(&mut self.model, ledger);
        for r in ledger.iter().rev() {
            self.journal.push(Delta::Restore {
                pos: self.model.topology().pos_of(r.var),
                value: r.value,
            });
        }
        self.model.unassign(var);
        self.journal.push(Delta::Unassign {
            pos: self.pos_of(var),
            value,
        });
    }
}

impl Iterator for SearchDriver {
    type Item = TraceEvent;

    fn next(&mut self) -> Option<TraceEvent> {
        while self.queue.is_empty() {
            if matches!(self.phase, Phase::Finished) {
                return None;
            }
            self.pump();
        }
        self.queue.pop_front()
    }
}

/// Run a full search and return the solved board, if one exists.
pub fn solve(board: &Board) -> Option<Board> {
    let driver = SearchDriver::new(board);
    for event in driver {
        if let TraceEvent::Solution { assignment, .. } = event {
            return Some(board.filled(&assignment));
        }
    }
    None
}

/// First move the search would commit to an empty cell, or `None` when the
/// board is already complete or unsolvable. The oracle screens the board
/// first so a broken position is reported instead of searched.
pub fn hint(board: &Board) -> Option<Hint> {
    if !oracle::solvable(board) {
        return None;
    }
    let driver = SearchDriver::new(board);
    for event in driver {
        if let TraceEvent::Try { pos, value, .. } = event {
            if board.is_empty(pos) {
                return Some(Hint { pos, value });
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BlockShape, PairConstraint};
    use crate::topology::Topology;

    fn mini(digits: &str) -> Board {
        Board::mini6().with_digits(digits).unwrap()
    }

    fn events(board: &Board) -> Vec<TraceEvent> {
        SearchDriver::new(board).collect()
    }

    /// Every topology relation holds in the solution assignment.
    fn assert_solution_consistent(board: &Board, assignment: &[(Pos, u8)]) {
        let topo = Topology::from_board(board);
        let mut values = vec![0u8; topo.var_count()];
        for &(pos, value) in assignment {
            values[topo.index_of(pos)] = value;
        }
        assert!(values.iter().all(|&v| v != 0), "assignment incomplete");
        for var in 0..topo.var_count() {
            for &(nbr, relation) in topo.neighbors(var) {
                assert!(
                    relation.satisfied(values[var], values[nbr]),
                    "{:?} violated between {} and {}",
                    relation,
                    topo.pos_of(var),
                    topo.pos_of(nbr),
                );
            }
        }
    }

    #[test]
    fn test_single_given_solves() {
        // 6x6 grid, 3x2 blocks, one given: (0,0) = 1
        let board = mini(&("1".to_owned() + &"0".repeat(35)));
        let trace = events(&board);

        assert_eq!(
            trace.first().and_then(TraceEvent::node),
            Some(1),
            "first event must be the root enter"
        );
        match trace.first() {
            Some(&TraceEvent::Enter { node, depth, .. }) => {
                assert_eq!(node, 1);
                assert_eq!(depth, 0);
            }
            other => panic!("expected root enter, got {:?}", other),
        }

        let solution = trace.iter().find_map(|e| match e {
            TraceEvent::Solution { assignment, .. } => Some(assignment.clone()),
            _ => None,
        });
        let assignment = solution.expect("a single given leaves the grid solvable");
        assert_solution_consistent(&board, &assignment);

        // row 0 is a permutation of 1..=6 with the given 1 at column 0
        let mut row0: Vec<u8> = assignment
            .iter()
            .filter(|(p, _)| p.row == 0)
            .map(|&(_, v)| v)
            .collect();
        assert_eq!(
            assignment
                .iter()
                .find(|(p, _)| *p == Pos::new(0, 0))
                .map(|&(_, v)| v),
            Some(1)
        );
        row0.sort_unstable();
        assert_eq!(row0, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_node_counter_strictly_increasing() {
        let board = mini(&("1".to_owned() + &"0".repeat(35)));
        let trace = events(&board);

        let mut last = 0;
        for event in &trace {
            if let TraceEvent::Enter { node, .. } = event {
                assert_eq!(*node, last + 1, "enter ids must be dense and increasing");
                last = *node;
            }
        }
        match trace.last() {
            Some(&TraceEvent::Done { nodes_visited, .. }) => assert_eq!(nodes_visited, last),
            other => panic!("expected terminal done, got {:?}", other),
        }
    }

    #[test]
    fn test_terminal_event_ends_stream() {
        let board = mini(&("1".to_owned() + &"0".repeat(35)));
        let mut driver = SearchDriver::new(&board);
        let mut saw_done = false;
        for event in driver.by_ref() {
            assert!(!saw_done, "no events may follow the terminal done");
            saw_done = event.is_terminal();
        }
        assert!(saw_done);
        assert_eq!(driver.next(), None);
        assert_eq!(driver.outcome(), Some(Outcome::Solved));
    }

    #[test]
    fn test_conflicting_givens_unsatisfiable() {
        // two 3s in row 0
        let board = mini(&("33".to_owned() + &"0".repeat(34)));
        let trace = events(&board);
        assert!(trace
            .iter()
            .all(|e| !matches!(e, TraceEvent::Solution { .. })));
        assert_eq!(
            trace.last(),
            Some(&TraceEvent::Done {
                nodes_visited: 1,
                outcome: Outcome::Unsatisfiable,
            })
        );
        // root enters, then gives up wholesale
        assert!(matches!(
            trace[1],
            TraceEvent::Backtrack { value: None, .. }
        ));
    }

    #[test]
    fn test_exhaustive_failure_is_unsatisfiable() {
        // the same pair constrained both equal and opposite can never hold
        let board = Board::pairwise(
            1,
            3,
            2,
            vec![0; 3],
            vec![
                PairConstraint::equal(Pos::new(0, 0), Pos::new(0, 1)),
                PairConstraint::opposite(Pos::new(0, 0), Pos::new(0, 1)),
            ],
        )
        .unwrap();
        let trace = events(&board);

        let deadends = trace
            .iter()
            .filter(|e| matches!(e, TraceEvent::Deadend { .. }))
            .count();
        assert_eq!(deadends, 2, "both candidate values dead-end");
        assert_eq!(
            trace.last(),
            Some(&TraceEvent::Done {
                nodes_visited: 1,
                outcome: Outcome::Unsatisfiable,
            })
        );
    }

    #[test]
    fn test_deadend_advances_to_next_value() {
        // as above: after the first deadend the driver must try value 2 at
        // the same node rather than abandoning it
        let board = Board::pairwise(
            1,
            3,
            2,
            vec![0; 3],
            vec![
                PairConstraint::equal(Pos::new(0, 0), Pos::new(0, 1)),
                PairConstraint::opposite(Pos::new(0, 0), Pos::new(0, 1)),
            ],
        )
        .unwrap();
        let tries: Vec<u8> = events(&board)
            .iter()
            .filter_map(|e| match e {
                TraceEvent::Try { value, .. } => Some(*value),
                _ => None,
            })
            .collect();
        assert_eq!(tries, vec![1, 2]);
    }

    #[test]
    fn test_try_precedes_child_enter() {
        let board = mini(&("1".to_owned() + &"0".repeat(35)));
        let trace = events(&board);
        // the first try appears after the root enter and before node 2
        let first_try = trace
            .iter()
            .position(|e| matches!(e, TraceEvent::Try { .. }))
            .unwrap();
        let second_enter = trace
            .iter()
            .position(|e| matches!(e, TraceEvent::Enter { node: 2, .. }))
            .unwrap();
        assert!(first_try > 0 && first_try < second_enter);
    }

    #[test]
    fn test_pair_variant_solution() {
        // 2x2 binary grid glued together by pair relations
        let board = Board::pairwise(
            2,
            2,
            2,
            vec![1, 0, 0, 0],
            vec![
                PairConstraint::equal(Pos::new(0, 0), Pos::new(1, 1)),
                PairConstraint::opposite(Pos::new(0, 0), Pos::new(0, 1)),
                PairConstraint::opposite(Pos::new(1, 0), Pos::new(1, 1)),
            ],
        )
        .unwrap();
        let solved = solve(&board).expect("pair variant is satisfiable");
        assert_eq!(solved.get(Pos::new(0, 0)), Some(1));
        assert_eq!(solved.get(Pos::new(0, 1)), Some(2));
        assert_eq!(solved.get(Pos::new(1, 1)), Some(1));
        assert_eq!(solved.get(Pos::new(1, 0)), Some(2));
    }

    #[test]
    fn test_solve_classic9() {
        let board = Board::classic9()
            .with_digits(
                "530070000\
                 600195000\
                 098000060\
                 800060003\
                 400803001\
                 700020006\
                 060000280\
                 000419005\
                 000080079",
            )
            .unwrap();
        let solved = solve(&board).expect("known-good puzzle");
        assert_eq!(solved.empty_count(), 0);
        // givens survive
        assert_eq!(solved.get(Pos::new(0, 0)), Some(5));
        assert_eq!(solved.get(Pos::new(8, 8)), Some(9));
    }

    #[test]
    fn test_identical_runs_identical_traces() {
        let board = mini(&("100004 000000 020000 000000 000300 000000".replace(' ', "")));
        let a = events(&board);
        let b = events(&board);
        assert_eq!(a, b);
    }

    #[test]
    fn test_hint_fills_an_empty_cell() {
        let board = mini(&("1".to_owned() + &"0".repeat(35)));
        let hint = hint(&board).expect("solvable board yields a hint");
        assert!(board.is_empty(hint.pos));
        assert!((1..=6).contains(&hint.value));
        // the hinted move must keep the board solvable
        let mut next = board.clone();
        next.set(hint.pos, hint.value).unwrap();
        assert!(solve(&next).is_some());
    }

    #[test]
    fn test_hint_refuses_broken_board() {
        let board = mini(&("33".to_owned() + &"0".repeat(34)));
        assert_eq!(hint(&board), None);
    }

    #[test]
    fn test_solved_board_emits_solution_at_root() {
        let board = Board::latin(2, vec![1, 2, 2, 1]).unwrap();
        let trace = events(&board);
        assert!(matches!(trace[0], TraceEvent::Enter { node: 1, depth: 0, .. }));
        assert!(matches!(trace[1], TraceEvent::Solution { node: 1, .. }));
        assert_eq!(
            trace[2],
            TraceEvent::Done {
                nodes_visited: 1,
                outcome: Outcome::Solved,
            }
        );
    }

    #[test]
    fn test_replay_reconstructs_solution() {
        use crate::event::Replay;

        let board = mini(&("1".to_owned() + &"0".repeat(35)));
        let mut driver = SearchDriver::new(&board);
        let mut solution = None;
        while let Some(event) = driver.next() {
            if let TraceEvent::Solution {
                version,
                assignment,
                ..
            } = event
            {
                solution = Some((version, assignment));
            }
        }
        let (version, assignment) = solution.expect("board solves");

        // folding the journal up to the solution's version rebuilds the
        // same assignment the event carried
        let replay = Replay::new(&board, driver.journal());
        let mut replayed = replay.assignment_at(version);
        let mut expected = assignment.clone();
        replayed.sort();
        expected.sort();
        assert_eq!(replayed, expected);
    }

    #[test]
    fn test_boxed_blockshape_respected() {
        let board = Board::boxed(
            4,
            BlockShape {
                height: 2,
                width: 2,
            },
            vec![0; 16],
        )
        .unwrap();
        let solved = solve(&board).expect("empty 4x4 is solvable");
        let assignment: Vec<(Pos, u8)> = solved
            .positions()
            .map(|p| (p, solved.get(p).unwrap()))
            .collect();
        assert_solution_consistent(&board, &assignment);
    }
}
