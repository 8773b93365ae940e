//! Interpolant synthesis: walks the `ProofNode` DAG rooted at the empty
//! clause and builds the corresponding AIG, coloring each resolution step
//! by which side of the partition its pivot variable belongs to.
//!
//! - A pivot that is a shared variable's equality selector becomes an ITE
//!   on a fresh AIG input standing for that public variable (selector
//!   polarity picks which branch is "then").
//! - A pivot found in an A-side clause (but not a shared selector) becomes
//!   an OR; anything else (B-side) becomes an AND.
//! - A-side leaves interpolate to false, B-side leaves to true.
//!
//! Shared subtrees are visited once: an explicit stack carries a
//! "children pushed" flag for the iterative post-order walk, and a memo
//! keyed by node identity (`Rc::as_ptr`) both detects a node already
//! processed and supplies its AIG literal to its parent.

use std::collections::HashMap;
use std::rc::Rc;

use definability_aig::{AigLit, AigManager};

use crate::dag::{ProofDagStore, ProofNode, Side};
use crate::errors::DefinabilityError;

/// `v` is a shared variable's equality selector iff it was tripled (i.e.
/// `v = 3 * public + 2` for some `public`); see `extractor.rs` for the
/// tripling scheme.
fn as_selector(tripled_var: i64) -> Option<i64> {
    if tripled_var >= 3 && tripled_var % 3 == 2 {
        Some(tripled_var / 3)
    } else {
        None
    }
}

/// Result of synthesis: the AIG's root literal plus the shared public
/// variables in the order their AIG inputs were created (needed by
/// `tseitin.rs` to assign each CI its caller-supplied id).
pub(crate) struct Interpolant {
    pub(crate) root: AigLit,
    pub(crate) shared_order: Vec<i64>,
}

pub(crate) fn synthesize_interpolant(
    aig: &mut AigManager,
    store: &ProofDagStore,
    shared_variables: &std::collections::HashSet<i64>,
) -> Result<Interpolant, DefinabilityError> {
    let root_id = store.require_empty_id()?;
    let root = store
        .proof_node(root_id)
        .ok_or_else(|| DefinabilityError::InvariantBreach("empty clause has no proof node".into()))?;

    let mut memo: HashMap<usize, AigLit> = HashMap::new();
    let mut input_cache: HashMap<i64, AigLit> = HashMap::new();
    let mut shared_order: Vec<i64> = Vec::new();

    let key_of = |node: &Rc<ProofNode>| Rc::as_ptr(node) as usize;

    let mut stack: Vec<(Rc<ProofNode>, bool)> = vec![(root.clone(), false)];
    while let Some((node, children_done)) = stack.pop() {
        let key = key_of(&node);
        if memo.contains_key(&key) {
            continue;
        }
        match &*node {
            ProofNode::Leaf { side } => {
                let lit = match side {
                    Side::A => !aig.const1(),
                    Side::B => aig.const1(),
                };
                memo.insert(key, lit);
            }
            ProofNode::Inner { pivot, left, right } => {
                if !children_done {
                    stack.push((node.clone(), true));
                    if !memo.contains_key(&key_of(right)) {
                        stack.push((right.clone(), false));
                    }
                    if !memo.contains_key(&key_of(left)) {
                        stack.push((left.clone(), false));
                    }
                } else {
                    let left_lit = *memo
                        .get(&key_of(left))
                        .expect("left child is processed before its parent");
                    let right_lit = *memo
                        .get(&key_of(right))
                        .expect("right child is processed before its parent");

                    let var = pivot.abs();
                    let result = match as_selector(var).filter(|public| shared_variables.contains(public)) {
                        Some(public_var) => {
                            let sel = *input_cache.entry(public_var).or_insert_with(|| {
                                let ci = aig.create_ci();
                                shared_order.push(public_var);
                                ci
                            });
                            let sel = if *pivot > 0 { sel } else { !sel };
                            aig.mux(sel, left_lit, right_lit)
                        }
                        None if store.a_variables().contains(&var) => aig.or(left_lit, right_lit),
                        None => aig.and(left_lit, right_lit),
                    };
                    memo.insert(key, result);
                }
            }
        }
    }

    let root_lit = *memo.get(&key_of(&root)).expect("root is processed last");
    Ok(Interpolant {
        root: root_lit,
        shared_order,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::extract_core;
    use crate::reconstruct::reconstruct_core;
    use definability_proof::{ConclusionKind, ProofTracer};
    use std::collections::HashSet;

    #[test]
    fn shared_pivot_produces_an_ite_input() {
        // A: (1 ∨ 5), B: (-5). Resolving on 5 (a B-local literal) yields
        // the empty clause with pivot 5; classify it as B-local since 5 is
        // not of the form 3v+2.
        let mut store = ProofDagStore::new();
        store.add_original(0, &[1, 5]);
        store.add_original(1, &[-5]);
        store.add_derived(2, &[], &[1, 0]);
        store.conclude_unsat(ConclusionKind::Refutation, &[2]);

        let order = extract_core(&store).unwrap();
        reconstruct_core(&mut store, &order).unwrap();

        let mut aig = AigManager::start_manager(0);
        let shared: HashSet<i64> = HashSet::new();
        let interpolant = synthesize_interpolant(&mut aig, &store, &shared).unwrap();
        assert!(interpolant.shared_order.is_empty());
    }

    #[test]
    fn selector_pivot_for_a_shared_variable_allocates_one_input() {
        // Selector for public var 2 is 3*2+2 = 8.
        let mut store = ProofDagStore::new();
        store.add_original(0, &[1, 8]);
        store.add_original(1, &[-8]);
        store.add_derived(2, &[], &[1, 0]);
        store.conclude_unsat(ConclusionKind::Refutation, &[2]);

        let order = extract_core(&store).unwrap();
        reconstruct_core(&mut store, &order).unwrap();

        let mut aig = AigManager::start_manager(1);
        let mut shared = HashSet::new();
        shared.insert(2i64);
        let interpolant = synthesize_interpolant(&mut aig, &store, &shared).unwrap();
        assert_eq!(interpolant.shared_order, vec![2]);
    }
}
