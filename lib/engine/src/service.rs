use rdf_eval_model::{Multiset, NamedNode};
use spargebra::algebra::GraphPattern;
use std::error::Error;
use std::fmt::Debug;

/// Handles `SERVICE` calls.
///
/// The handler receives the pattern as written in the query and must return solutions that only
/// bind variables of that pattern. The evaluator joins these solutions with the current solution
/// of the query.
///
/// If no handler is registered, every `SERVICE` call fails with
/// [UnsupportedService](rdf_eval_common::QueryEvaluationError::UnsupportedService).
pub trait ServiceHandler: Debug + Send + Sync {
    /// Evaluates `pattern` against the endpoint `service_name`.
    fn handle(
        &self,
        service_name: &NamedNode,
        pattern: &GraphPattern,
        base_iri: Option<&str>,
    ) -> Result<Multiset, Box<dyn Error + Send + Sync>>;
}
