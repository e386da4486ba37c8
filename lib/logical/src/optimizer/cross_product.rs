use crate::optimizer::{OptimizerReport, OptimizerRule};
use crate::{AlgebraNode, PatternElement};
use rdf_eval_common::QueryResult;
use rustc_hash::FxHashSet;

/// Reports joins whose inputs do not share a variable and thus produce a cross product.
///
/// The rule does not change the tree. For a [AlgebraNode::Bgp], the elements are inspected in
/// evaluation order, so it should run after the [BgpReorderingRule](super::BgpReorderingRule).
#[derive(Debug, Default)]
pub struct CrossProductDetectionRule;

impl CrossProductDetectionRule {
    /// Creates a new [CrossProductDetectionRule].
    pub fn new() -> Self {
        Self
    }
}

impl OptimizerRule for CrossProductDetectionRule {
    fn name(&self) -> &str {
        "cross-product-detection"
    }

    fn rewrite(&self, node: AlgebraNode, report: &mut OptimizerReport) -> QueryResult<AlgebraNode> {
        node.try_transform_up(&mut |node| {
            for cross_product in detect_cross_products(&node) {
                tracing::info!(%cross_product, "Query contains a cross product");
                report.cross_products.push(cross_product);
            }
            Ok(node)
        })
    }
}

fn detect_cross_products(node: &AlgebraNode) -> Vec<String> {
    match node {
        AlgebraNode::Bgp(elements) => {
            let mut result = Vec::new();
            let mut bound = FxHashSet::default();
            for element in elements {
                if matches!(
                    element,
                    PatternElement::Filter(_) | PatternElement::Assign { .. }
                ) {
                    bound.extend(element.bound_variables());
                    continue;
                }

                let variables = element.bound_variables();
                if !bound.is_empty()
                    && !variables.is_empty()
                    && variables.iter().all(|variable| !bound.contains(variable))
                {
                    result.push(format!(
                        "Bgp element '{element}' shares no variable with the elements before it"
                    ));
                }
                bound.extend(variables);
            }
            result
        }
        AlgebraNode::Join { left, right } => {
            let left_variables = left.variables();
            let right_variables = right.variables();
            let disjoint = right_variables
                .iter()
                .all(|variable| !left_variables.contains(variable));
            if !left_variables.is_empty() && !right_variables.is_empty() && disjoint {
                vec![format!(
                    "Join of {} and {} shares no variable",
                    left.name(),
                    right.name()
                )]
            } else {
                Vec::new()
            }
        }
        _ => Vec::new(),
    }
}
