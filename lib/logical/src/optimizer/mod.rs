//! Rewrites of the algebra that do not change the solutions of a query but the amount of work
//! that is necessary to compute them.

mod bgp_reordering;
mod cross_product;
mod specialization;

pub use bgp_reordering::{BgpReorderingRule, PatternWeights};
pub use cross_product::CrossProductDetectionRule;
pub use specialization::{AskSpecializationRule, LimitSpecializationRule};

use crate::AlgebraNode;
use rdf_eval_common::QueryResult;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// A single rewrite of an algebra tree.
pub trait OptimizerRule: Debug + Send + Sync {
    /// The name of the rule.
    fn name(&self) -> &str;

    /// Rewrites the tree rooted at `node`.
    fn rewrite(&self, node: AlgebraNode, report: &mut OptimizerReport)
        -> QueryResult<AlgebraNode>;
}

/// Controls which [OptimizerRule]s are applied to a query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OptimizationLevel {
    /// Evaluates the algebra as it has been built.
    None,
    /// Only applies rewrites that do not depend on heuristics.
    Default,
    /// Applies all rewrites, including the reordering of patterns.
    #[default]
    Full,
}

/// The findings of an optimizer run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OptimizerReport {
    /// The names of the rules that have been applied, in order.
    pub applied_rules: Vec<String>,
    /// Descriptions of the cross products that the query will compute.
    pub cross_products: Vec<String>,
}

impl Display for OptimizerReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Applied rules: {}", self.applied_rules.join(", "))?;
        for cross_product in &self.cross_products {
            writeln!(f, "Cross product: {cross_product}")?;
        }
        Ok(())
    }
}

/// Applies a sequence of [OptimizerRule]s to algebra trees.
#[derive(Clone, Debug)]
pub struct AlgebraOptimizer {
    rules: Vec<Arc<dyn OptimizerRule>>,
}

impl AlgebraOptimizer {
    /// Creates an optimizer with the builtin rules of `level`.
    pub fn new(level: OptimizationLevel, weights: Option<PatternWeights>) -> Self {
        Self {
            rules: default_optimizer_rules(level, weights),
        }
    }

    /// Creates an optimizer that applies exactly `rules`.
    pub fn with_rules(rules: Vec<Arc<dyn OptimizerRule>>) -> Self {
        Self { rules }
    }

    /// Adds a rule that runs before the builtin rules. Such rules can be used to replace
    /// [AlgebraNode::Custom] nodes with builtin nodes.
    #[must_use]
    pub fn with_leading_rule(mut self, rule: Arc<dyn OptimizerRule>) -> Self {
        self.rules.insert(0, rule);
        self
    }

    /// The rules of this optimizer.
    pub fn rules(&self) -> &[Arc<dyn OptimizerRule>] {
        &self.rules
    }

    /// Applies all rules to `node`.
    pub fn optimize(&self, node: AlgebraNode) -> QueryResult<(AlgebraNode, OptimizerReport)> {
        let mut report = OptimizerReport::default();
        let mut node = node;
        for rule in &self.rules {
            node = rule.rewrite(node, &mut report)?;
            report.applied_rules.push(rule.name().to_owned());
            tracing::trace!(rule = rule.name(), "Applied optimizer rule");
        }
        tracing::debug!(
            rules = report.applied_rules.len(),
            cross_products = report.cross_products.len(),
            "Optimized algebra"
        );
        Ok((node, report))
    }
}

/// Returns the builtin rules for the given [OptimizationLevel].
pub fn default_optimizer_rules(
    level: OptimizationLevel,
    weights: Option<PatternWeights>,
) -> Vec<Arc<dyn OptimizerRule>> {
    match level {
        OptimizationLevel::None => Vec::new(),
        OptimizationLevel::Default => vec![
            Arc::new(CrossProductDetectionRule::new()),
            Arc::new(AskSpecializationRule::new()),
            Arc::new(LimitSpecializationRule::new()),
        ],
        OptimizationLevel::Full => vec![
            Arc::new(BgpReorderingRule::new(weights.unwrap_or_default())),
            Arc::new(CrossProductDetectionRule::new()),
            Arc::new(AskSpecializationRule::new()),
            Arc::new(LimitSpecializationRule::new()),
        ],
    }
}
