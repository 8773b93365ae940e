//! A small, deliberately unoptimized CDCL solver.
//!
//! This crate exists so the workspace has a concrete, runnable
//! `SatSolver` to drive `definability-interpolation` end to end. It has no
//! watched literals, no VSIDS, no restarts and no clause deletion: every
//! propagation step rescans the whole clause database. None of that is
//! required by the contract in `definability-proof` -- only that conflicts
//! are reported to the registered tracer in a consistent, documented
//! antecedent order.
//!
//! Antecedent order: `add_derived` receives the clauses resolved during
//! conflict analysis in trail-reverse chronological order, i.e. the
//! conflicting clause that triggered analysis is always last
//! (`antecedents[antecedents.len() - 1]`), and each earlier entry is the
//! reason clause of the next variable resolved away while walking the trail
//! backward from the conflict.
//!
//! `solve` is non-incremental across calls: assumptions are registered as
//! ordinary unit clauses (so they get a proper side classification and can
//! stand as resolution leaves), and every clause added since the call
//! started -- assumption units and anything learnt -- is reported deleted
//! before `solve` returns. Deleted slots are tombstoned, not reclaimed: a
//! `ClauseId` is always `self.clauses.len()` at the moment a clause is
//! pushed and is never reused afterwards, as `definability-proof`'s
//! `ClauseId` contract requires -- reusing ids across queries would let a
//! later query's fresh derivation collide with an earlier query's
//! already-reconstructed `ProofNode`.

use definability_proof::{ClauseId, ConclusionKind, ProofTracer, SatSolver, SolveResult};
use log::{debug, trace};

struct Clause {
    lits: Vec<i64>,
}

fn var_of(lit: i64) -> usize {
    lit.unsigned_abs() as usize
}

/// A CDCL solver generic over the proof tracer it reports to.
pub struct CdclSolver<T: ProofTracer> {
    tracer: T,
    clauses: Vec<Option<Clause>>,
    assignment: Vec<Option<bool>>,
    level: Vec<usize>,
    reason: Vec<Option<ClauseId>>,
    trail: Vec<i64>,
    trail_lim: Vec<usize>,
    decision_level: usize,
}

impl<T: ProofTracer> CdclSolver<T> {
    /// Create a solver with room for `num_vars` variables (1-indexed
    /// DIMACS-style variables; grows automatically if a larger variable is
    /// later introduced by `add_clause`).
    pub fn new(num_vars: usize, tracer: T) -> CdclSolver<T> {
        CdclSolver {
            tracer,
            clauses: Vec::new(),
            assignment: vec![None; num_vars + 1],
            level: vec![0; num_vars + 1],
            reason: vec![None; num_vars + 1],
            trail: Vec::new(),
            trail_lim: Vec::new(),
            decision_level: 0,
        }
    }

    fn ensure_var(&mut self, v: usize) {
        if v >= self.assignment.len() {
            self.assignment.resize(v + 1, None);
            self.level.resize(v + 1, 0);
            self.reason.resize(v + 1, None);
        }
    }

    fn lit_value(&self, lit: i64) -> Option<bool> {
        self.assignment[var_of(lit)].map(|val| val == (lit > 0))
    }

    fn assign(&mut self, lit: i64, reason: Option<ClauseId>) {
        let v = var_of(lit);
        self.assignment[v] = Some(lit > 0);
        self.level[v] = self.decision_level;
        self.reason[v] = reason;
        self.trail.push(lit);
    }

    /// Rescan every clause until no further unit propagation is possible,
    /// returning the id of a falsified clause on conflict.
    fn propagate(&mut self) -> Option<ClauseId> {
        loop {
            let mut changed = false;
            for idx in 0..self.clauses.len() {
                let clause = match &self.clauses[idx] {
                    Some(clause) => clause,
                    None => continue,
                };
                let mut satisfied = false;
                let mut unassigned_count = 0;
                let mut unassigned_lit = 0i64;
                for &lit in &clause.lits {
                    match self.lit_value(lit) {
                        Some(true) => {
                            satisfied = true;
                            break;
                        }
                        Some(false) => {}
                        None => {
                            unassigned_count += 1;
                            unassigned_lit = lit;
                        }
                    }
                }
                if satisfied {
                    continue;
                }
                if unassigned_count == 0 {
                    trace!("conflict in clause {}", idx);
                    return Some(idx as ClauseId);
                }
                if unassigned_count == 1 {
                    self.assign(unassigned_lit, Some(idx as ClauseId));
                    changed = true;
                }
            }
            if !changed {
                return None;
            }
        }
    }

    /// 1-UIP conflict analysis. Returns the learnt clause (asserting
    /// literal first), the antecedent clauses in discovery order, and the
    /// decision level to backtrack to.
    fn analyze(&mut self, confl: ClauseId) -> (Vec<i64>, Vec<ClauseId>, usize) {
        let mut seen = vec![false; self.assignment.len()];
        let mut out_learnt: Vec<i64> = vec![0];
        let mut antecedents: Vec<ClauseId> = Vec::new();
        let mut path_c = 0usize;
        let mut p: Option<i64> = None;
        let mut confl_id = confl;
        let mut idx = self.trail.len();

        loop {
            antecedents.push(confl_id);
            let lits = self.clauses[confl_id as usize]
                .as_ref()
                .expect("antecedent clause is still active during its own conflict analysis")
                .lits
                .clone();
            for lit in lits {
                if Some(lit) == p {
                    continue;
                }
                let v = var_of(lit);
                if seen[v] || self.level[v] == 0 {
                    continue;
                }
                seen[v] = true;
                if self.level[v] == self.decision_level {
                    path_c += 1;
                } else {
                    out_learnt.push(lit);
                }
            }

            loop {
                idx -= 1;
                let lit = self.trail[idx];
                if seen[var_of(lit)] {
                    p = Some(lit);
                    break;
                }
            }
            let pv = var_of(p.unwrap());
            seen[pv] = false;
            path_c -= 1;
            if path_c == 0 {
                break;
            }
            confl_id = self.reason[pv].expect("a variable resolved during analysis must be propagated, not decided");
        }

        out_learnt[0] = -p.unwrap();

        let backtrack_level = out_learnt[1..]
            .iter()
            .map(|&lit| self.level[var_of(lit)])
            .max()
            .unwrap_or(0);

        antecedents.reverse();
        (out_learnt, antecedents, backtrack_level)
    }

    fn backtrack_to(&mut self, level: usize) {
        if self.decision_level <= level {
            return;
        }
        let target = self.trail_lim[level];
        for &lit in &self.trail[target..] {
            let v = var_of(lit);
            self.assignment[v] = None;
            self.reason[v] = None;
        }
        self.trail.truncate(target);
        self.trail_lim.truncate(level);
        self.decision_level = level;
    }

    fn pick_unassigned_var(&self) -> Option<usize> {
        (1..self.assignment.len()).find(|&v| self.assignment[v].is_none())
    }

    fn add_learnt_clause(&mut self, lits: Vec<i64>, antecedents: Vec<ClauseId>) -> ClauseId {
        let id = self.clauses.len() as ClauseId;
        self.tracer.add_derived(id, &lits, &antecedents);
        self.clauses.push(Some(Clause { lits }));
        id
    }
}

impl<T: ProofTracer + Default> Default for CdclSolver<T> {
    fn default() -> Self {
        CdclSolver::new(0, T::default())
    }
}

impl<T: ProofTracer> SatSolver for CdclSolver<T> {
    type Tracer = T;

    fn tracer(&self) -> &T {
        &self.tracer
    }

    fn tracer_mut(&mut self) -> &mut T {
        &mut self.tracer
    }

    fn add_clause(&mut self, clause: &[i64]) {
        for &lit in clause {
            self.ensure_var(var_of(lit));
        }
        let id = self.clauses.len() as ClauseId;
        self.tracer.add_original(id, clause);
        self.clauses.push(Some(Clause {
            lits: clause.to_vec(),
        }));
    }

    fn solve(&mut self, assumptions: &[i64]) -> SolveResult {
        // Fresh search state on every call; the clause database accumulated
        // by `add_clause` across calls is the only thing that persists.
        for slot in self.assignment.iter_mut() {
            *slot = None;
        }
        for slot in self.reason.iter_mut() {
            *slot = None;
        }
        self.trail.clear();
        self.trail_lim.clear();
        self.decision_level = 0;

        // Assumptions are registered as ordinary unit clauses so they
        // participate in propagation and conflict analysis like any other
        // input clause, and so their side (A/B) is classified by the tracer
        // the same way as the rest of the formula. They, and everything
        // learnt while they were in effect, are retracted below once this
        // call concludes.
        let permanent_clause_count = self.clauses.len();
        for &lit in assumptions {
            self.ensure_var(var_of(lit));
            let id = self.clauses.len() as ClauseId;
            self.tracer.add_original(id, &[lit]);
            self.clauses.push(Some(Clause { lits: vec![lit] }));
        }

        let result = loop {
            match self.propagate() {
                Some(confl) => {
                    if self.decision_level == 0 {
                        debug!("refuted at decision level 0");
                        self.tracer
                            .conclude_unsat(ConclusionKind::Refutation, &[confl]);
                        break SolveResult::Unsatisfiable;
                    }
                    let (learnt, antecedents, backtrack_level) = self.analyze(confl);
                    let learnt_id = self.add_learnt_clause(learnt.clone(), antecedents);
                    self.backtrack_to(backtrack_level);
                    self.assign(learnt[0], Some(learnt_id));
                }
                None => match self.pick_unassigned_var() {
                    Some(v) => {
                        self.decision_level += 1;
                        self.trail_lim.push(self.trail.len());
                        self.assign(v as i64, None);
                    }
                    None => break SolveResult::Satisfiable,
                },
            }
        };

        for (offset, slot) in self.clauses[permanent_clause_count..].iter().enumerate() {
            if let Some(clause) = slot {
                let id = (permanent_clause_count + offset) as ClauseId;
                self.tracer.delete(id, &clause.lits);
            }
        }
        // Tombstone rather than truncate: `permanent_clause_count` must stay
        // the length floor it already is, but these slots' ids must never
        // be handed out again by a later `add_clause`/`solve` call.
        for slot in self.clauses[permanent_clause_count..].iter_mut() {
            *slot = None;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingTracer {
        originals: Vec<(ClauseId, Vec<i64>)>,
        derived: Vec<(ClauseId, Vec<i64>, Vec<ClauseId>)>,
        concluded: Option<(ConclusionKind, Vec<ClauseId>)>,
    }

    impl ProofTracer for RecordingTracer {
        fn add_original(&mut self, id: ClauseId, clause: &[i64]) {
            self.originals.push((id, clause.to_vec()));
        }

        fn add_derived(&mut self, id: ClauseId, clause: &[i64], antecedents: &[ClauseId]) {
            self.derived.push((id, clause.to_vec(), antecedents.to_vec()));
        }

        fn delete(&mut self, _id: ClauseId, _clause: &[i64]) {}

        fn conclude_unsat(&mut self, kind: ConclusionKind, ids: &[ClauseId]) {
            self.concluded = Some((kind, ids.to_vec()));
        }
    }

    #[test]
    fn satisfiable_unit_clause() {
        let mut solver = CdclSolver::new(1, RecordingTracer::default());
        solver.add_clause(&[1]);
        assert_eq!(solver.solve(&[]), SolveResult::Satisfiable);
    }

    #[test]
    fn trivial_contradiction_is_refuted_at_level_zero() {
        let mut solver = CdclSolver::new(1, RecordingTracer::default());
        solver.add_clause(&[1]);
        solver.add_clause(&[-1]);
        assert_eq!(solver.solve(&[]), SolveResult::Unsatisfiable);
        assert!(solver.tracer().concluded.is_some());
        let (kind, ids) = solver.tracer().concluded.as_ref().unwrap();
        assert_eq!(*kind, ConclusionKind::Refutation);
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn pigeonhole_two_into_one_is_unsat() {
        // x1: pigeon A in hole, x2: pigeon B in hole, both can't hold it.
        let mut solver = CdclSolver::new(2, RecordingTracer::default());
        solver.add_clause(&[1]);
        solver.add_clause(&[2]);
        solver.add_clause(&[-1, -2]);
        assert_eq!(solver.solve(&[]), SolveResult::Unsatisfiable);
    }

    #[test]
    fn conflict_analysis_learns_a_nonempty_clause_with_recorded_antecedents() {
        let mut solver = CdclSolver::new(3, RecordingTracer::default());
        solver.add_clause(&[1, 2]);
        solver.add_clause(&[-1, 3]);
        solver.add_clause(&[-2, 3]);
        solver.add_clause(&[-3]);
        solver.add_clause(&[1]);
        let result = solver.solve(&[]);
        assert_eq!(result, SolveResult::Unsatisfiable);
        assert!(!solver.tracer().derived.is_empty());
        for (_, clause, antecedents) in &solver.tracer().derived {
            assert!(!antecedents.is_empty());
            let _ = clause;
        }
    }
}
