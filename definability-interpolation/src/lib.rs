//! Craig interpolation engine that decides whether an existential variable
//! of a QBF matrix is implicitly defined by a set of shared variables, and
//! if so extracts a propositional definition from the refutation's
//! resolution proof.
//!
//! The driver is [`DefinitionExtractor`]; it is generic over the SAT
//! solver it queries, requiring only that the solver's [`ProofTracer`]
//! implementation be [`ProofDagStore`] (the one tracer this crate
//! provides). `definability-sat`'s `CdclSolver` is the reference solver
//! used in this crate's own tests.

mod core;
mod dag;
mod errors;
mod extractor;
mod marks;
mod reconstruct;
mod synth;
mod tseitin;

pub use dag::ProofDagStore;
pub use errors::DefinabilityError;
pub use extractor::DefinitionExtractor;
