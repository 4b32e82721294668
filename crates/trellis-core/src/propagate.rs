//! Forward checking: push one assignment through the topology, recording
//! every domain removal so the branch can be unwound exactly.

use crate::model::SearchModel;
use crate::topology::Relation;

/// One recorded domain removal. `slot` is the position the value occupied,
/// so undo restores the domain byte-for-byte, not just as a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reduction {
    pub var: usize,
    pub value: u8,
    pub slot: usize,
}

/// Outcome of propagating one assignment.
#[derive(Debug)]
pub struct Propagation {
    /// Removals applied, in application order. On failure this holds the
    /// partial ledger accumulated before the wipe was detected.
    pub removed: Vec<Reduction>,
    /// The variable whose domain emptied, when propagation failed.
    pub wiped: Option<usize>,
}

impl Propagation {
    pub fn failed(&self) -> bool {
        self.wiped.is_some()
    }
}

/// Remove `value` from the domain of every unassigned neighbor of `var`
/// that the relation rules out: `Distinct`/`Opposite` neighbors lose
/// `value` itself, `Equal` neighbors lose everything else. Stops at the
/// first emptied domain. Never touches `var`'s own domain or assignment.
pub fn forward_check(model: &mut SearchModel, var: usize, value: u8) -> Propagation {
    let mut removed = Vec::new();
    let neighbor_count = model.topology().neighbors(var).len();

    for edge in 0..neighbor_count {
        let (nbr, relation) = model.topology().neighbors(var)[edge];
        if model.is_assigned(nbr) {
            continue;
        }
        match relation {
            Relation::Distinct | Relation::Opposite => {
                if let Some(slot) = model.remove_value(nbr, value) {
                    removed.push(Reduction {
                        var: nbr,
                        value,
                        slot,
                    });
                }
            }
            Relation::Equal => {
                let doomed: Vec<u8> = model
                    .domain(nbr)
                    .iter()
                    .copied()
                    .filter(|&v| v != value)
                    .collect();
                for v in doomed {
                    if let Some(slot) = model.remove_value(nbr, v) {
                        removed.push(Reduction {
                            var: nbr,
                            value: v,
                            slot,
                        });
                    }
                }
            }
        }
        if model.domain_is_empty(nbr) {
            return Propagation {
                removed,
                wiped: Some(nbr),
            };
        }
    }

    Propagation {
        removed,
        wiped: None,
    }
}

/// Reinsert every ledger entry, newest first, restoring each domain to the
/// exact state it had before the matching [`forward_check`].
pub fn undo(model: &mut SearchModel, removed: &[Reduction]) {
    for r in removed.iter().rev() {
        model.restore_value(r.var, r.value, r.slot);
    }
}
