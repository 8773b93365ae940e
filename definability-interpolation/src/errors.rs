use thiserror::Error;

/// Errors raised by the definability engine.
///
/// `SolverUnknown` is intentionally absent from the public surface: a
/// solver reporting `SolveResult::Unknown` is treated the same as a
/// satisfiable result by `has_definition` (no definition learned), since
/// the engine never asks a solver for anything beyond a plain refutation.
#[derive(Debug, Error)]
pub enum DefinabilityError {
    #[error("get_definition called while the extractor was not in the DEFINED state")]
    StateViolation,

    #[error("proof graph invariant violated: {0}")]
    InvariantBreach(String),
}
