//! Core extraction: finds which derived clauses, reachable from the empty
//! clause, still need a `ProofNode` built for them, in an order where every
//! antecedent is listed before the clause that depends on it.

use definability_proof::ClauseId;
use std::collections::HashSet;

use crate::dag::ProofDagStore;
use crate::errors::DefinabilityError;

/// Post-order list of derived clause ids on the path from `store.empty_id()`
/// back to the original clauses, skipping anything already reconstructed
/// (originals are leaves from the moment they're added, so they never
/// appear here).
pub(crate) fn extract_core(store: &ProofDagStore) -> Result<Vec<ClauseId>, DefinabilityError> {
    let empty_id = store.require_empty_id()?;

    if store.proof_node(empty_id).is_some() {
        return Ok(Vec::new());
    }

    let mut order = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![(empty_id, false)];

    while let Some((id, children_done)) = stack.pop() {
        if store.proof_node(id).is_some() {
            continue;
        }
        if children_done {
            order.push(id);
            continue;
        }
        if !visited.insert(id) {
            continue;
        }
        let antecedents = store.pending_antecedents(id).ok_or_else(|| {
            DefinabilityError::InvariantBreach(format!("clause {} has no recorded antecedents", id))
        })?;
        if antecedents.is_empty() {
            return Err(DefinabilityError::InvariantBreach(format!(
                "derived clause {} was recorded with zero antecedents",
                id
            )));
        }
        stack.push((id, true));
        for &antecedent in antecedents {
            if store.proof_node(antecedent).is_none() {
                stack.push((antecedent, false));
            }
        }
    }

    Ok(order)
}
