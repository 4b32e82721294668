//! Static neighbor relation: which variables constrain each other, and how.
//!
//! Built once per board and read-only during search. Uniqueness puzzles
//! contribute `Distinct` edges (same row, column or block); variant puzzles
//! contribute `Equal`/`Opposite` edges from their pair lists. Both kinds can
//! coexist on one board.

use crate::board::{Board, PairRelation, Pos};
use serde::{Deserialize, Serialize};

/// Relation enforced along one topology edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    /// Endpoints must hold different values (uniqueness neighbors).
    Distinct,
    /// Endpoints must hold the same value.
    Equal,
    /// Endpoints must hold different values (explicit pair).
    Opposite,
}

impl Relation {
    /// Does the relation hold between two assigned values?
    pub fn satisfied(self, a: u8, b: u8) -> bool {
        match self {
            Relation::Distinct | Relation::Opposite => a != b,
            Relation::Equal => a == b,
        }
    }
}

/// Per-variable adjacency, indexed by row-major variable index.
pub struct Topology {
    cols: usize,
    edges: Vec<Vec<(usize, Relation)>>,
}

impl Topology {
    /// Derive the neighbor sets from a board's shape and pair lists.
    pub fn from_board(board: &Board) -> Self {
        let n = board.cell_count();
        let cols = board.cols();
        let mut edges: Vec<Vec<(usize, Relation)>> = vec![Vec::new(); n];

        for idx in 0..n {
            let mut peers = distinct_peers(board, board.pos_of(idx));
            peers.sort_unstable();
            peers.dedup();
            edges[idx] = peers.into_iter().map(|p| (p, Relation::Distinct)).collect();
        }

        for pair in board.pairs() {
            let relation = match pair.relation {
                PairRelation::Equal => Relation::Equal,
                PairRelation::Opposite => Relation::Opposite,
            };
            let a = board.index_of(pair.a);
            let b = board.index_of(pair.b);
            edges[a].push((b, relation));
            edges[b].push((a, relation));
        }

        Self { cols, edges }
    }

    pub fn var_count(&self) -> usize {
        self.edges.len()
    }

    /// Neighbors of `var` in deterministic order: uniqueness peers by
    /// ascending index, then pair edges in declaration order.
    pub fn neighbors(&self, var: usize) -> &[(usize, Relation)] {
        &self.edges[var]
    }

    pub fn index_of(&self, pos: Pos) -> usize {
        pos.row * self.cols + pos.col
    }

    pub fn pos_of(&self, var: usize) -> Pos {
        Pos::new(var / self.cols, var % self.cols)
    }
}

/// Row, column and block peers of `pos` under the board's uniqueness rules.
fn distinct_peers(board: &Board, pos: Pos) -> Vec<usize> {
    let mut peers = Vec::new();
    if board.unique_lines() {
        for col in 0..board.cols() {
            if col != pos.col {
                peers.push(board.index_of(Pos::new(pos.row, col)));
            }
        }
        for row in 0..board.rows() {
            if row != pos.row {
                peers.push(board.index_of(Pos::new(row, pos.col)));
            }
        }
    }
    if let Some(block) = board.blocks() {
        let br = pos.row / block.height * block.height;
        let bc = pos.col / block.width * block.width;
        for dr in 0..block.height {
            for dc in 0..block.width {
                let p = Pos::new(br + dr, bc + dc);
                if p != pos {
                    peers.push(board.index_of(p));
                }
            }
        }
    }
    peers
}
