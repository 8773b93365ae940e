//! Contracts for the external collaborators of the definability engine.
//!
//! The engine is driven by a SAT solver it treats as a black box: it only
//! requires that the solver report its refutations through the five hooks of
//! [`ProofTracer`], in the solver's own derivation order. Neither the solving
//! algorithm nor the tracer's backing storage is prescribed here; see
//! `definability-sat` for a reference implementation and
//! `definability-interpolation` for the tracer that actually builds a proof
//! DAG out of these events.

use std::fmt;

/// Opaque clause identifier assigned by the SAT solver.
///
/// Identifiers are never reused: once retired (by `delete`) the id may still
/// appear as an antecedent of clauses derived before the deletion.
pub type ClauseId = u64;

/// Why a `conclude_unsat` call is being made.
///
/// Mirrors `CaDiCaL::ConclusionType`: a refutation concludes with a single
/// derivation of the empty clause, while a constraint-core conclusion names
/// the subset of an unsatisfiable *constraint* (not the whole formula) and is
/// never the kind this engine expects (see §4.1's precondition on
/// `conclude_unsat`).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ConclusionKind {
    /// The formula itself was refuted; `ids` names the empty clause.
    Refutation,
    /// A failing subset of constraints/assumptions was identified.
    ConstraintCore,
}

/// Hooks a SAT solver invokes while refuting a formula.
///
/// Invoked synchronously from within `SatSolver::solve`; see §5 for the
/// concurrency model (single-threaded, no suspension points).
pub trait ProofTracer {
    /// An input clause was added. `clause` is the literal list as given by
    /// the caller (partition-tag literal included, if present).
    fn add_original(&mut self, id: ClauseId, clause: &[i64]);

    /// A clause was derived from existing clauses via resolution.
    /// `antecedents` lists the clauses resolved, in the solver's own
    /// trail-reverse chronological order (see §4.4).
    fn add_derived(&mut self, id: ClauseId, clause: &[i64], antecedents: &[ClauseId]);

    /// A clause derived from a failing set of assumptions/constraints.
    ///
    /// Handled identically to [`add_derived`](ProofTracer::add_derived); the
    /// default forwards there, matching the original implementation's reuse
    /// of `add_derived_clause` for this case.
    fn add_assumption_clause(&mut self, id: ClauseId, clause: &[i64], antecedents: &[ClauseId]) {
        self.add_derived(id, clause, antecedents);
    }

    /// A clause is no longer needed by the solver.
    ///
    /// Physical deletion may be deferred; see `delete_clauses` on the
    /// concrete tracer for the flush point.
    fn delete(&mut self, id: ClauseId, clause: &[i64]);

    /// The solver has refuted the formula (or a constraint).
    ///
    /// # Precondition
    /// `kind == ConclusionKind::Refutation` and `ids.len() == 1`.
    fn conclude_unsat(&mut self, kind: ConclusionKind, ids: &[ClauseId]);
}

/// Outcome of a `SatSolver::solve` call.
///
/// Named after the DIMACS/IPASIR convention the docstrings reference (SAT =
/// 10, UNSAT = 20, UNKNOWN = 0) without committing to those as the Rust
/// representation.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SolveResult {
    Satisfiable,
    Unsatisfiable,
    Unknown,
}

impl fmt::Display for SolveResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SolveResult::Satisfiable => write!(f, "SAT"),
            SolveResult::Unsatisfiable => write!(f, "UNSAT"),
            SolveResult::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// A SAT solver usable as the external collaborator of §6.
///
/// Implementors own a [`ProofTracer`] and invoke it while solving. The
/// associated type (rather than a `dyn` tracer) lets callers downcast to the
/// tracer's concrete type after a solve to run the interpolation-specific
/// post-processing (core extraction, proof reconstruction) that isn't part
/// of this external contract.
pub trait SatSolver {
    type Tracer: ProofTracer;

    /// Shared access to the registered proof tracer.
    fn tracer(&self) -> &Self::Tracer;

    /// Mutable access to the registered proof tracer.
    fn tracer_mut(&mut self) -> &mut Self::Tracer;

    /// Add a single clause to the solver's formula.
    fn add_clause(&mut self, clause: &[i64]);

    /// Add every clause of `formula` to the solver's formula.
    fn append_formula(&mut self, formula: &[Vec<i64>]) {
        for clause in formula {
            self.add_clause(clause);
        }
    }

    /// Decide satisfiability of the current formula under `assumptions`.
    fn solve(&mut self, assumptions: &[i64]) -> SolveResult;
}
