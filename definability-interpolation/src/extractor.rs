//! The public definition-extraction driver: owns the accumulated formula,
//! the solver that proves a variable defined, and the state machine that
//! gates `get_definition` to right after a successful `has_definition`.
//!
//! Every public variable `v` is tripled into three SAT variables: `3v`
//! (its B-copy), `3v + 1` (its A-copy) and `3v + 2` (the equality selector
//! that, when assumed true, forces the two copies to agree). Variable `1`
//! is reserved as the partition tag: an A-side clause carries it as an
//! extra disjunct so it can be "turned off" (forced false) to activate
//! the A-part of the formula during a query.

use std::collections::HashSet;

use definability_aig::AigManager;
use definability_proof::{SatSolver, SolveResult};
use log::debug;

use crate::dag::{ProofDagStore, PARTITION_TAG};
use crate::errors::DefinabilityError;
use crate::{core, reconstruct, synth, tseitin};

fn a_copy(lit: i64) -> i64 {
    let v = lit.abs();
    let magnitude = 3 * v + 1;
    if lit > 0 {
        magnitude
    } else {
        -magnitude
    }
}

fn b_copy(lit: i64) -> i64 {
    let v = lit.abs();
    let magnitude = 3 * v;
    if lit > 0 {
        magnitude
    } else {
        -magnitude
    }
}

fn selector_of(v: i64) -> i64 {
    3 * v + 2
}

#[derive(Copy, Clone, Eq, PartialEq)]
enum State {
    Undefined,
    Defined,
}

struct PendingDefinition {
    aig: AigManager,
    shared_order: Vec<i64>,
    y: i64,
}

/// Drives the Padoa-style definability queries described by `add_clause`,
/// `has_definition` and `get_definition`.
pub struct DefinitionExtractor<S: SatSolver<Tracer = ProofDagStore>> {
    solver: S,
    registered: HashSet<i64>,
    max_public_var: i64,
    state: State,
    pending: Option<PendingDefinition>,
}

impl<S: SatSolver<Tracer = ProofDagStore> + Default> Default for DefinitionExtractor<S> {
    fn default() -> Self {
        DefinitionExtractor {
            solver: S::default(),
            registered: HashSet::new(),
            max_public_var: 0,
            state: State::Undefined,
            pending: None,
        }
    }
}

impl<S: SatSolver<Tracer = ProofDagStore> + Default> DefinitionExtractor<S> {
    pub fn new() -> Self {
        DefinitionExtractor::default()
    }

    fn touch(&mut self, v: i64) {
        if v > self.max_public_var {
            self.max_public_var = v;
        }
    }

    /// One more than the highest public variable seen so far; also the
    /// threshold that separates tripled public-variable ids from the
    /// auxiliary ids `get_definition`'s Tseitin encoding introduces.
    fn variable_space(&self) -> i64 {
        self.max_public_var + 1
    }

    /// Register a clause of the matrix. Registering a variable for the
    /// first time emits its equality-selector biconditional; the clause
    /// itself is added twice, once per copy (the A-copy carries the
    /// partition tag).
    pub fn add_clause(&mut self, clause: &[i64]) {
        for &lit in clause {
            self.touch(lit.abs());
        }
        for &lit in clause {
            let v = lit.abs();
            if self.registered.insert(v) {
                let sel = selector_of(v);
                let va = 3 * v + 1;
                let vb = 3 * v;
                self.solver.add_clause(&[-sel, va, -vb]);
                self.solver.add_clause(&[-sel, -va, vb]);
            }
        }

        let mut a_clause: Vec<i64> = clause.iter().copied().map(a_copy).collect();
        a_clause.push(PARTITION_TAG);
        let b_clause: Vec<i64> = clause.iter().copied().map(b_copy).collect();
        self.solver.add_clause(&a_clause);
        self.solver.add_clause(&b_clause);

        self.state = State::Undefined;
        self.pending = None;
    }

    /// `add_clause` for every clause of `formula`, in order.
    pub fn append_formula(&mut self, formula: &[Vec<i64>]) {
        for clause in formula {
            self.add_clause(clause);
        }
    }

    /// Ask whether `y` is defined in terms of `shared` given the current
    /// formula (plus `extra_assumptions`, asserted identically on both
    /// copies). On success, reconstructs and synthesizes the interpolant
    /// eagerly so a later `delete_clauses` pass can safely reap the
    /// per-query proof scratch; `get_definition` only has to translate and
    /// Tseitin-encode what is already built.
    pub fn has_definition(&mut self, y: i64, shared: &[i64], extra_assumptions: &[i64]) -> bool {
        self.state = State::Undefined;
        self.pending = None;

        self.touch(y.abs());
        for &v in shared {
            self.touch(v.abs());
        }
        for &lit in extra_assumptions {
            self.touch(lit.abs());
        }

        let mut assumptions = Vec::new();
        for &v in shared {
            assumptions.push(selector_of(v.abs()));
        }
        for &lit in extra_assumptions {
            assumptions.push(a_copy(lit));
            assumptions.push(b_copy(lit));
        }
        assumptions.push(a_copy(y));
        assumptions.push(-b_copy(y));
        assumptions.push(-PARTITION_TAG);

        let result = self.solver.solve(&assumptions);
        debug!("has_definition(y={}) solved as {}", y, result);

        match result {
            SolveResult::Unsatisfiable => {
                let shared_set: HashSet<i64> = shared.iter().map(|v| v.abs()).collect();
                let store = self.solver.tracer_mut();
                let order = core::extract_core(store).expect("refutation proof is well-formed");
                reconstruct::reconstruct_core(store, &order).expect("refutation proof is well-formed");
                let mut aig = AigManager::start_manager(shared_set.len());
                let interpolant = synth::synthesize_interpolant(&mut aig, store, &shared_set)
                    .expect("refutation proof is well-formed");
                aig.create_co(interpolant.root);

                self.pending = Some(PendingDefinition {
                    aig,
                    shared_order: interpolant.shared_order,
                    y,
                });
                self.state = State::Defined;
                self.solver.tracer_mut().delete_clauses();
                true
            }
            SolveResult::Satisfiable | SolveResult::Unknown => {
                self.solver.tracer_mut().delete_clauses();
                false
            }
        }
    }

    /// Translate the interpolant cached by the last successful
    /// `has_definition` call into a CNF definition of `y` over public
    /// variables, resetting to `UNDEFINED` on return.
    pub fn get_definition(&mut self, rewrite: bool) -> Result<(Vec<Vec<i64>>, i64), DefinabilityError> {
        if self.state != State::Defined {
            return Err(DefinabilityError::StateViolation);
        }
        let pending = self.pending.take().ok_or(DefinabilityError::StateViolation)?;
        let PendingDefinition { aig, shared_order, y } = pending;
        let aig = if rewrite { aig.rewrite() } else { aig };

        let variable_space = self.variable_space();
        let k0 = 3 * variable_space;
        let (internal_clauses, output_var_internal) = tseitin::encode_to_cnf(&aig, k0, &shared_order);

        let translate = |lit: i64| -> i64 {
            let v = lit.abs();
            let public = if v / 3 >= variable_space { v } else { v / 3 };
            if lit > 0 {
                public
            } else {
                -public
            }
        };

        let mut clauses: Vec<Vec<i64>> = internal_clauses
            .into_iter()
            .map(|clause| clause.into_iter().map(translate).collect())
            .collect();

        let output_var = translate(output_var_internal);
        clauses.push(vec![output_var, -y]);
        clauses.push(vec![-output_var, y]);

        self.state = State::Undefined;
        self.solver.tracer_mut().delete_clauses();

        Ok((clauses, output_var))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use definability_sat::CdclSolver;

    type Extractor = DefinitionExtractor<CdclSolver<ProofDagStore>>;

    #[test]
    fn constant_function_is_defined() {
        // F = { (y) }. y is always true, hence definable from the empty
        // shared set as the constant function "true".
        let mut extractor = Extractor::new();
        extractor.add_clause(&[1]);
        assert!(extractor.has_definition(1, &[], &[]));
        let (clauses, output_var) = extractor.get_definition(false).unwrap();
        assert!(!clauses.is_empty());
        assert_ne!(output_var, 0);
    }

    #[test]
    fn get_definition_outside_defined_state_is_rejected() {
        let mut extractor = Extractor::new();
        extractor.add_clause(&[1, 2]);
        assert!(matches!(
            extractor.get_definition(false),
            Err(DefinabilityError::StateViolation)
        ));
    }

    #[test]
    fn xor_style_formula_defines_y_from_x() {
        // F = { (x ∨ y), (¬x ∨ ¬y) }: y is forced to ¬x, definable from {x}.
        let mut extractor = Extractor::new();
        extractor.add_clause(&[1, 2]);
        extractor.add_clause(&[-1, -2]);
        assert!(extractor.has_definition(2, &[1], &[]));
        let (clauses, _) = extractor.get_definition(false).unwrap();
        assert!(!clauses.is_empty());
    }

    #[test]
    fn underdetermined_variable_is_not_defined() {
        // F = { (x ∨ y) }: y is free when x is true, not defined by {x}.
        let mut extractor = Extractor::new();
        extractor.add_clause(&[1, 2]);
        assert!(!extractor.has_definition(2, &[1], &[]));
    }

    #[test]
    fn adding_a_clause_resets_to_undefined() {
        let mut extractor = Extractor::new();
        extractor.add_clause(&[1, 2]);
        extractor.add_clause(&[-1, -2]);
        assert!(extractor.has_definition(2, &[1], &[]));
        extractor.add_clause(&[3, 4]);
        assert!(matches!(
            extractor.get_definition(false),
            Err(DefinabilityError::StateViolation)
        ));
    }

    #[test]
    fn deletion_invariant_after_a_satisfiable_query() {
        let mut extractor = Extractor::new();
        for i in 1..=50i64 {
            extractor.add_clause(&[i, -(i + 1)]);
        }
        assert!(!extractor.has_definition(2, &[1], &[]));
        extractor.solver.tracer_mut().delete_clauses();
    }
}
