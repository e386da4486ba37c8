use crate::AlgebraNode;
use rdf_eval_common::{QueryEvaluationError, QueryResult};
use rdf_eval_model::{Multiset, Variable};
use std::fmt::Debug;

/// Gives custom nodes access to the evaluator of the query they are part of.
pub trait SubtreeEvaluator {
    /// Evaluates `node` in the current evaluation context (active graph, timeout, etc.).
    fn evaluate(&mut self, node: &AlgebraNode) -> QueryResult<Multiset>;
}

/// An extension point for algebra operators that are not part of the builtin node set.
///
/// A custom node either provides its own evaluation procedure by overriding
/// [CustomAlgebraNode::evaluate] or must be replaced with builtin nodes by a custom
/// [OptimizerRule](crate::optimizer::OptimizerRule) before evaluation.
pub trait CustomAlgebraNode: Debug + Send + Sync {
    /// The name of the node, used for explaining plans.
    fn name(&self) -> &str;

    /// The variables that the solutions of this node may bind.
    fn variables(&self) -> Vec<Variable>;

    /// The inputs of this node, if any.
    fn children(&self) -> Vec<&AlgebraNode> {
        Vec::new()
    }

    /// Evaluates this node.
    fn evaluate(&self, _evaluator: &mut dyn SubtreeEvaluator) -> QueryResult<Multiset> {
        Err(QueryEvaluationError::NotImplemented(format!(
            "The custom algebra node '{}' has no evaluation procedure and was not rewritten.",
            self.name()
        )))
    }
}
