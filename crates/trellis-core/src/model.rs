//! Per-search mutable state: domains, the accumulating assignment and the
//! variable-selection heuristic.
//!
//! A [`SearchModel`] is created fresh for every search invocation and owned
//! exclusively by it; nothing here survives across searches.

use crate::board::{Board, Pos};
use crate::topology::{Relation, Topology};

/// One search session's variables, domains and assignment.
pub struct SearchModel {
    topology: Topology,
    /// Per-variable admissible values in ledger order.
    domains: Vec<Vec<u8>>,
    assignment: Vec<Option<u8>>,
    given: Vec<bool>,
    unassigned: usize,
    /// First cell whose domain emptied while pruning givens, if any.
    /// A contradictory model is unsatisfiable before the search starts.
    contradiction: Option<Pos>,
}

impl SearchModel {
    /// Build the session state: full domains for empty cells, singleton
    /// domains for givens, then prune each given's value through its
    /// neighbors. Pruning applies to every neighbor, givens included, so
    /// conflicting givens surface here as an emptied initial domain.
    pub fn from_board(board: &Board) -> Self {
        let topology = Topology::from_board(board);
        let n = topology.var_count();
        let full: Vec<u8> = (1..=board.max_value()).collect();

        let mut domains = vec![Vec::new(); n];
        let mut assignment = vec![None; n];
        let mut given = vec![false; n];
        let mut unassigned = 0;

        for var in 0..n {
            match board.get(topology.pos_of(var)) {
                Some(value) => {
                    domains[var] = vec![value];
                    assignment[var] = Some(value);
                    given[var] = true;
                }
                None => {
                    domains[var] = full.clone();
                    unassigned += 1;
                }
            }
        }

        let mut contradiction = None;
        for var in 0..n {
            // read the value from the assignment: a conflicting earlier
            // given may already have emptied this given's domain
            let value = match (given[var], assignment[var]) {
                (true, Some(v)) => v,
                _ => continue,
            };
            for &(nbr, relation) in topology.neighbors(var) {
                match relation {
                    Relation::Distinct | Relation::Opposite => {
                        domains[nbr].retain(|&v| v != value);
                    }
                    Relation::Equal => domains[nbr].retain(|&v| v == value),
                }
                if domains[nbr].is_empty() && contradiction.is_none() {
                    contradiction = Some(topology.pos_of(nbr));
                }
            }
        }

        Self {
            topology,
            domains,
            assignment,
            given,
            unassigned,
            contradiction,
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn var_count(&self) -> usize {
        self.domains.len()
    }

    pub fn domain(&self, var: usize) -> &[u8] {
        &self.domains[var]
    }

    pub fn value_of(&self, var: usize) -> Option<u8> {
        self.assignment[var]
    }

    pub fn is_assigned(&self, var: usize) -> bool {
        self.assignment[var].is_some()
    }

    pub fn is_given(&self, var: usize) -> bool {
        self.given[var]
    }

    /// Number of variables still unassigned.
    pub fn unassigned_count(&self) -> usize {
        self.unassigned
    }

    pub fn is_complete(&self) -> bool {
        self.unassigned == 0
    }

    /// The cell whose initial domain emptied, when the givens already
    /// contradict each other.
    pub fn contradiction(&self) -> Option<Pos> {
        self.contradiction
    }

    /// Current assignment as `(position, value)` pairs, row-major.
    pub fn assignment_pairs(&self) -> Vec<(Pos, u8)> {
        self.assignment
            .iter()
            .enumerate()
            .filter_map(|(var, value)| value.map(|v| (self.topology.pos_of(var), v)))
            .collect()
    }

    pub fn assigned_count(&self) -> usize {
        self.var_count() - self.unassigned
    }

    /// Minimum-remaining-values selection: the unassigned variable with the
    /// smallest domain. Ties break to the lowest row-major index so traces
    /// are reproducible.
    pub fn select_mrv(&self) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for var in 0..self.domains.len() {
            if self.assignment[var].is_some() {
                continue;
            }
            let size = self.domains[var].len();
            if best.map_or(true, |(_, best_size)| size < best_size) {
                best = Some((var, size));
            }
        }
        best.map(|(var, _)| var)
    }

    pub(crate) fn assign(&mut self, var: usize, value: u8) {
        debug_assert!(self.assignment[var].is_none());
        self.assignment[var] = Some(value);
        self.unassigned -= 1;
    }

    pub(crate) fn unassign(&mut self, var: usize) {
        debug_assert!(self.assignment[var].is_some());
        self.assignment[var] = None;
        self.unassigned += 1;
    }

    /// Remove `value` from `var`'s domain, returning the slot it occupied
    /// so the removal can be undone exactly.
    pub(crate) fn remove_value(&mut self, var: usize, value: u8) -> Option<usize> {
        let slot = self.domains[var].iter().position(|&v| v == value)?;
        self.domains[var].remove(slot);
        Some(slot)
    }

    /// Reinsert `value` into `var`'s domain at `slot`.
    pub(crate) fn restore_value(&mut self, var: usize, value: u8, slot: usize) {
        self.domains[var].insert(slot, value);
    }

    pub fn domain_is_empty(&self, var: usize) -> bool {
        self.domains[var].is_empty()
    }
}
