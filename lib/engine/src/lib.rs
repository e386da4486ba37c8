//! The evaluation engine of RDF Eval.
//!
//! The [QueryEvaluator] is the entry point for evaluating SPARQL queries. It lowers a query into
//! the algebra of [rdf_eval_logical], optimizes it, and evaluates it with an [Evaluator] against
//! a [Dataset](rdf_eval_common::Dataset).

mod context;
mod evaluator;
mod hooks;
mod paths;
pub mod results;
mod service;
pub mod sparql;

pub use context::{EvaluationContext, ExecutionTimer};
pub use evaluator::{EvaluableExpression, Evaluator, GraphScope};
pub use hooks::{EvaluationHook, NodeStatistics, StatisticsHook, TracingHook};
pub use paths::PathEvaluator;
pub use service::ServiceHandler;
pub use sparql::{QueryEvaluator, QueryExplanation, QueryOptions};
