//! Random starting-grid generation.
//!
//! Scatter non-conflicting givens over an empty board, then let the
//! solvability oracle accept or reject the candidate; retry until it
//! passes. The oracle call is mandatory: a grid is never presented to a
//! user without it.

use rand::Rng;
use trellis_core::{solvable, Board, Pos};

/// Candidate grids tried before giving up.
const MAX_RETRIES: usize = 200;
/// Placement attempts per candidate grid.
const MAX_PLACEMENTS: usize = 2_000;

/// Generate a solvable puzzle with `givens` placed cells on the (empty)
/// `template` shape. Returns `None` when no candidate passed the oracle.
pub fn generate(template: &Board, givens: usize, rng: &mut impl Rng) -> Option<Board> {
    for _ in 0..MAX_RETRIES {
        let mut board = template.clone();
        let mut placed = 0;
        let mut attempts = 0;
        while placed < givens && attempts < MAX_PLACEMENTS {
            attempts += 1;
            let pos = Pos::new(
                rng.gen_range(0..board.rows()),
                rng.gen_range(0..board.cols()),
            );
            if !board.is_empty(pos) {
                continue;
            }
            let value = rng.gen_range(1..=board.max_value());
            if board.conflicts_at(pos, value) {
                continue;
            }
            board
                .set(pos, value)
                .expect("generated value is in range");
            placed += 1;
        }
        if placed == givens && solvable(&board) {
            return Some(board);
        }
    }
    None
}
