//! Resolution reconstruction: turns a derived clause's antecedent list
//! (`a_0, ..., a_{n-1}`, discovery order, `a_{n-1}` the originally
//! conflicting clause) into a binary `ProofNode` tree.
//!
//! `running` starts as the node for `a_{n-1}` with its literals marked (no
//! pivot can be found against an empty scratchpad, so the first iteration
//! never builds a node -- it only seeds the marks). Walking the remaining
//! antecedents backward, the first literal of `a_i` whose opposite polarity
//! is already marked is the pivot resolved against `running`.

use std::rc::Rc;

use definability_proof::ClauseId;

use crate::dag::{ProofDagStore, ProofNode};
use crate::errors::DefinabilityError;
use crate::marks::MarkScratchpad;

fn node_for(store: &ProofDagStore, id: ClauseId) -> Result<Rc<ProofNode>, DefinabilityError> {
    store
        .proof_node(id)
        .ok_or_else(|| DefinabilityError::InvariantBreach(format!("clause {} has no proof node yet", id)))
}

fn literals_of(store: &ProofDagStore, id: ClauseId) -> Result<Vec<i64>, DefinabilityError> {
    store
        .clause_literals(id)
        .map(|lits| lits.to_vec())
        .ok_or_else(|| DefinabilityError::InvariantBreach(format!("clause {} has no recorded literals", id)))
}

/// Reconstruct every clause named in `order`, in order, installing its
/// `ProofNode` into `store` as it goes (earlier entries are always
/// antecedents of later ones, so their nodes already exist by then).
pub(crate) fn reconstruct_core(store: &mut ProofDagStore, order: &[ClauseId]) -> Result<(), DefinabilityError> {
    let mut marks = MarkScratchpad::new();

    for &id in order {
        let antecedents = store
            .pending_antecedents(id)
            .ok_or_else(|| DefinabilityError::InvariantBreach(format!("clause {} has no recorded antecedents", id)))?
            .to_vec();
        let n = antecedents.len();

        marks.unmark_all();
        let mut running = node_for(store, antecedents[n - 1])?;
        // Seed the scratchpad with a_{n-1}'s own literals; the first
        // iteration below reprocesses it and (correctly) finds no pivot.
        for i in (0..n).rev() {
            let clause_i = literals_of(store, antecedents[i])?;

            let mut pivot: Option<i64> = None;
            for &lit in &clause_i {
                let prior_opposite = marks.mark_literal(lit);
                if prior_opposite != 0 && pivot.is_none() {
                    pivot = Some(lit);
                }
            }

            if let Some(pivot_lit) = pivot {
                let left = node_for(store, antecedents[i])?;
                running = Rc::new(ProofNode::Inner {
                    pivot: pivot_lit,
                    left,
                    right: running,
                });
            }
        }
        marks.unmark_all();

        store.install_proof_node(id, running);
    }

    Ok(())
}
