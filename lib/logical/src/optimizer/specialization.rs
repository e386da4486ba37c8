use crate::optimizer::{OptimizerReport, OptimizerRule};
use crate::AlgebraNode;
use rdf_eval_common::QueryResult;

/// Makes `ASK` stop after the first solution.
///
/// The input of every [AlgebraNode::Ask] is wrapped in an [AlgebraNode::Limit] of one. The
/// evaluator propagates the limit into joins, unions, and BGPs, which then stop producing
/// solutions once the first one is known.
#[derive(Debug, Default)]
pub struct AskSpecializationRule;

impl AskSpecializationRule {
    /// Creates a new [AskSpecializationRule].
    pub fn new() -> Self {
        Self
    }
}

impl OptimizerRule for AskSpecializationRule {
    fn name(&self) -> &str {
        "ask-specialization"
    }

    fn rewrite(
        &self,
        node: AlgebraNode,
        _report: &mut OptimizerReport,
    ) -> QueryResult<AlgebraNode> {
        node.try_transform_up(&mut |node| {
            Ok(match node {
                AlgebraNode::Ask { inner } if !matches!(*inner, AlgebraNode::Limit { .. }) => {
                    AlgebraNode::Ask {
                        inner: Box::new(AlgebraNode::Limit { inner, limit: 1 }),
                    }
                }
                node => node,
            })
        })
    }
}

/// Lets `LIMIT` stop the evaluation of its input early.
///
/// The input of a [AlgebraNode::Slice] with a limit is wrapped in an [AlgebraNode::Limit] of
/// `offset + limit`. This is skipped if the input contains an operator that must see all
/// solutions before producing the first one (ordering, aggregation, custom nodes).
#[derive(Debug, Default)]
pub struct LimitSpecializationRule;

impl LimitSpecializationRule {
    /// Creates a new [LimitSpecializationRule].
    pub fn new() -> Self {
        Self
    }
}

impl OptimizerRule for LimitSpecializationRule {
    fn name(&self) -> &str {
        "limit-specialization"
    }

    fn rewrite(
        &self,
        node: AlgebraNode,
        _report: &mut OptimizerReport,
    ) -> QueryResult<AlgebraNode> {
        node.try_transform_up(&mut |node| {
            Ok(match node {
                AlgebraNode::Slice {
                    inner,
                    offset,
                    limit: Some(limit),
                } if can_stop_early(&inner) => AlgebraNode::Slice {
                    inner: Box::new(AlgebraNode::Limit {
                        inner,
                        limit: offset.saturating_add(limit),
                    }),
                    offset,
                    limit: Some(limit),
                },
                node => node,
            })
        })
    }
}

fn can_stop_early(node: &AlgebraNode) -> bool {
    !matches!(node, AlgebraNode::Limit { .. })
        && !node.any(&|node| {
            matches!(
                node,
                AlgebraNode::OrderBy { .. }
                    | AlgebraNode::Group { .. }
                    | AlgebraNode::Having { .. }
                    | AlgebraNode::Custom(_)
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Expr, OrderKey};
    use rdf_eval_model::Variable;

    #[test]
    fn ask_is_limited_once() {
        let rule = AskSpecializationRule::new();
        let node = AlgebraNode::Ask {
            inner: Box::new(AlgebraNode::empty_bgp()),
        };
        let node = rule.rewrite(node, &mut OptimizerReport::default()).unwrap();
        let node = rule.rewrite(node, &mut OptimizerReport::default()).unwrap();
        insta::assert_snapshot!(node, @r"
        Ask
          Limit: 1
            Bgp
        ");
    }

    #[test]
    fn slice_limits_its_input() {
        let node = AlgebraNode::Slice {
            inner: Box::new(AlgebraNode::empty_bgp()),
            offset: 5,
            limit: Some(10),
        };
        let node = LimitSpecializationRule::new()
            .rewrite(node, &mut OptimizerReport::default())
            .unwrap();
        insta::assert_snapshot!(node, @r"
        Slice: offset=5, limit=10
          Limit: 15
            Bgp
        ");
    }

    #[test]
    fn order_by_prevents_early_stop() {
        let node = AlgebraNode::Slice {
            inner: Box::new(AlgebraNode::OrderBy {
                inner: Box::new(AlgebraNode::empty_bgp()),
                keys: vec![OrderKey::asc(Expr::Variable(Variable::new_unchecked("x")))],
            }),
            offset: 0,
            limit: Some(1),
        };
        let node = LimitSpecializationRule::new()
            .rewrite(node, &mut OptimizerReport::default())
            .unwrap();
        insta::assert_snapshot!(node, @r"
        Slice: offset=0, limit=1
          OrderBy: ASC(?x)
            Bgp
        ");
    }
}
