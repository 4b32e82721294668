//! Instrumented constraint-satisfaction engine for small grid puzzles.
//!
//! The engine solves unique-value-per-row/column/region grids (mini and
//! classic sudoku shapes, latin squares) and pair-constrained variants
//! (equal/opposite cell pairs) with backtracking search: minimum-remaining-
//! values selection, forward checking and exact undo. Every search step is
//! emitted as a [`TraceEvent`], and a [`StepController`] gives the caller
//! run/pause/step/cancel control over the stream without restarting the
//! search.
//!
//! ```
//! use trellis_core::{solve, Board, Pos};
//!
//! let board = Board::mini6().with_digits(
//!     "100000 000000 000000 000000 000000 000000",
//! ).unwrap();
//! let solved = solve(&board).unwrap();
//! assert_eq!(solved.get(Pos::new(0, 0)), Some(1));
//! assert_eq!(solved.empty_count(), 0);
//! ```

pub mod board;
pub mod control;
pub mod driver;
pub mod error;
pub mod event;
pub mod model;
pub mod oracle;
pub mod propagate;
pub mod topology;

pub use board::{BlockShape, Board, PairConstraint, PairRelation, Pos};
pub use control::{ControlState, Delivery, StepController};
pub use driver::{hint, solve, Hint, SearchDriver};
pub use error::BoardError;
pub use event::{Delta, Outcome, Replay, TraceEvent};
pub use oracle::{solvable, verdict, Verdict, ORACLE_NODE_LIMIT};
pub use topology::{Relation, Topology};
