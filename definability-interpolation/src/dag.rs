//! Proof DAG store: the `ProofTracer` implementation that records a
//! solver's original and derived clauses and turns them into the shared
//! `ProofNode` tree the interpolant synthesizer walks.
//!
//! Bookkeeping is split across three maps:
//!
//! - `literals` holds every clause's literal list for as long as the
//!   clause is registered. A clause can be an antecedent of more than one
//!   derivation, so its literals stay available after it is first used,
//!   until the solver reports it deleted.
//! - `pending_antecedents` holds a not-yet-reconstructed derived clause's
//!   antecedent list. It is dropped the moment `reconstruct.rs` builds the
//!   clause's `ProofNode` -- that list is only ever needed once.
//! - `proof_nodes` holds the `Rc<ProofNode>` for every clause that has one
//!   -- immediately for original clauses (a fresh leaf), lazily for
//!   derived ones. This is what the synthesizer reads from, and it is
//!   never touched by `delete_clauses`: once a node is built it stays
//!   reachable for as long as something in the tree still points to it.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use definability_proof::{ClauseId, ConclusionKind, ProofTracer};
use log::trace;

use crate::errors::DefinabilityError;

/// Which side of the partition an original clause belongs to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Side {
    A,
    B,
}

/// A node of a resolution tree, shared via `Rc` so that a clause used as
/// an antecedent in several derivations is materialized once.
pub enum ProofNode {
    Leaf { side: Side },
    Inner {
        pivot: i64,
        left: Rc<ProofNode>,
        right: Rc<ProofNode>,
    },
}

/// Reserved tag literal. It never collides with a tripled variable's
/// A-copy, B-copy or selector, since those all have magnitude `>= 3`.
pub const PARTITION_TAG: i64 = 1;

#[derive(Default)]
pub struct ProofDagStore {
    literals: HashMap<ClauseId, Vec<i64>>,
    original_sides: HashMap<ClauseId, Side>,
    pending_antecedents: HashMap<ClauseId, Vec<ClauseId>>,
    proof_nodes: HashMap<ClauseId, Rc<ProofNode>>,
    a_variables: HashSet<i64>,
    delete_queue: Vec<ClauseId>,
    empty_id: Option<ClauseId>,
}

impl ProofDagStore {
    pub fn new() -> Self {
        ProofDagStore::default()
    }

    pub fn empty_id(&self) -> Option<ClauseId> {
        self.empty_id
    }

    pub fn a_variables(&self) -> &HashSet<i64> {
        &self.a_variables
    }

    pub fn proof_node(&self, id: ClauseId) -> Option<Rc<ProofNode>> {
        self.proof_nodes.get(&id).cloned()
    }

    pub(crate) fn pending_antecedents(&self, id: ClauseId) -> Option<&[ClauseId]> {
        self.pending_antecedents.get(&id).map(|v| v.as_slice())
    }

    pub(crate) fn clause_literals(&self, id: ClauseId) -> Option<&[i64]> {
        self.literals.get(&id).map(|v| v.as_slice())
    }

    /// Materialize the `ProofNode` for `id` and drop its now-unneeded
    /// antecedent list (the literals stay, in case `id` is itself later
    /// used as an antecedent elsewhere in the DAG).
    pub(crate) fn install_proof_node(&mut self, id: ClauseId, node: Rc<ProofNode>) {
        self.proof_nodes.insert(id, node);
        self.pending_antecedents.remove(&id);
    }

    /// Drop the queued deletions, reclaiming their bookkeeping. A no-op for
    /// ids never queued by the solver.
    pub fn delete_clauses(&mut self) {
        for id in self.delete_queue.drain(..) {
            self.literals.remove(&id);
            self.original_sides.remove(&id);
            self.pending_antecedents.remove(&id);
        }
    }

    pub(crate) fn require_empty_id(&self) -> Result<ClauseId, DefinabilityError> {
        self.empty_id
            .ok_or_else(|| DefinabilityError::InvariantBreach("no refutation has been concluded".into()))
    }
}

impl ProofTracer for ProofDagStore {
    fn add_original(&mut self, id: ClauseId, clause: &[i64]) {
        let side = if clause.contains(&PARTITION_TAG) {
            Side::A
        } else {
            Side::B
        };
        if side == Side::A {
            for &lit in clause {
                self.a_variables.insert(lit.abs());
            }
        }
        trace!("original clause {} recorded on side {:?}", id, side);
        self.literals.insert(id, clause.to_vec());
        self.original_sides.insert(id, side);
        self.proof_nodes.insert(id, Rc::new(ProofNode::Leaf { side }));
    }

    fn add_derived(&mut self, id: ClauseId, clause: &[i64], antecedents: &[ClauseId]) {
        trace!("derived clause {} recorded with {} antecedents", id, antecedents.len());
        self.literals.insert(id, clause.to_vec());
        self.pending_antecedents.insert(id, antecedents.to_vec());
    }

    fn delete(&mut self, id: ClauseId, _clause: &[i64]) {
        self.delete_queue.push(id);
    }

    fn conclude_unsat(&mut self, kind: ConclusionKind, ids: &[ClauseId]) {
        debug_assert_eq!(kind, ConclusionKind::Refutation);
        debug_assert_eq!(ids.len(), 1, "a refutation names exactly one falsified clause");
        self.empty_id = ids.first().copied();
    }
}
