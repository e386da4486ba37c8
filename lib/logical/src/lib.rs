//! The algebra that queries are evaluated on.
//!
//! A query is first lowered from the `spargebra` representation into an [AlgebraNode] tree
//! ([AlgebraBuilder]). Then, the [AlgebraOptimizer] rewrites the tree before it is handed to the
//! evaluator.

mod algebra;
mod builder;
mod custom;
mod expr;
pub mod optimizer;
mod path;

pub use algebra::{AlgebraNode, PatternElement, TermOrVariable, TriplePattern};
pub use builder::{AlgebraBuilder, AlgebraQuery, DatasetSpec, QueryForm};
pub use custom::{CustomAlgebraNode, SubtreeEvaluator};
pub use expr::{AggregateExpr, Expr, OrderKey};
pub use optimizer::{AlgebraOptimizer, OptimizationLevel, OptimizerReport, PatternWeights};
pub use path::PathExpression;
