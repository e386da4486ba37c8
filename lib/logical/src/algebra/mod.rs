mod display;
mod pattern;

use crate::custom::CustomAlgebraNode;
use crate::expr::{AggregateExpr, Expr, OrderKey};
use crate::path::PathExpression;
use rdf_eval_common::QueryResult;
use rdf_eval_model::{merge_variables, NamedNode, NamedNodePattern, Term, Variable};
use spargebra::algebra::GraphPattern;
use std::sync::Arc;

pub use pattern::{PatternElement, TermOrVariable, TriplePattern};

/// A node of the query algebra.
///
/// Evaluating a node yields a [Multiset](rdf_eval_model::Multiset) of solutions. The order of
/// the solutions is deterministic for a given dataset and query.
#[derive(Clone, Debug)]
pub enum AlgebraNode {
    /// A sequence of elements whose solutions are joined. Evaluated with nested loops, feeding the
    /// bindings of each element into the next one.
    Bgp(Vec<PatternElement>),
    Join {
        left: Box<AlgebraNode>,
        right: Box<AlgebraNode>,
    },
    /// `OPTIONAL`. The optional `expression` filters the combined solutions.
    LeftJoin {
        left: Box<AlgebraNode>,
        right: Box<AlgebraNode>,
        expression: Option<Expr>,
    },
    Union {
        left: Box<AlgebraNode>,
        right: Box<AlgebraNode>,
    },
    Minus {
        left: Box<AlgebraNode>,
        right: Box<AlgebraNode>,
    },
    /// Keeps solutions of `left` for which `right` (evaluated with the solution substituted) has
    /// at least one solution. `negated` inverts the condition.
    ExistsJoin {
        left: Box<AlgebraNode>,
        right: Box<AlgebraNode>,
        negated: bool,
    },
    Filter {
        inner: Box<AlgebraNode>,
        expression: Expr,
    },
    /// `BIND`. Errors of `expression` are errors of the query.
    Extend {
        inner: Box<AlgebraNode>,
        variable: Variable,
        expression: Expr,
    },
    Group {
        inner: Box<AlgebraNode>,
        variables: Vec<Variable>,
        aggregates: Vec<(Variable, AggregateExpr)>,
    },
    /// A filter that is applied to the solutions of a [AlgebraNode::Group].
    Having {
        inner: Box<AlgebraNode>,
        expression: Expr,
    },
    OrderBy {
        inner: Box<AlgebraNode>,
        keys: Vec<OrderKey>,
    },
    Distinct {
        inner: Box<AlgebraNode>,
    },
    Reduced {
        inner: Box<AlgebraNode>,
    },
    Project {
        inner: Box<AlgebraNode>,
        variables: Vec<Variable>,
    },
    Slice {
        inner: Box<AlgebraNode>,
        offset: usize,
        limit: Option<usize>,
    },
    /// Evaluates `inner` with a named graph as active graph.
    Graph {
        inner: Box<AlgebraNode>,
        name: NamedNodePattern,
    },
    /// A pattern that is evaluated by a remote endpoint.
    Service {
        name: NamedNodePattern,
        pattern: Box<GraphPattern>,
        variables: Vec<Variable>,
        silent: bool,
    },
    /// Yields a single empty solution if `inner` has a solution, otherwise nothing.
    Ask {
        inner: Box<AlgebraNode>,
    },
    /// Inline data. `None` represents an unbound value.
    Values {
        variables: Vec<Variable>,
        bindings: Vec<Vec<Option<Term>>>,
    },
    /// Relates every term to itself.
    ZeroLengthPath {
        subject: TermOrVariable,
        object: TermOrVariable,
    },
    /// The reflexive and transitive closure of `path`.
    ZeroOrMorePath {
        subject: TermOrVariable,
        path: PathExpression,
        object: TermOrVariable,
    },
    /// The transitive closure of `path`.
    OneOrMorePath {
        subject: TermOrVariable,
        path: PathExpression,
        object: TermOrVariable,
    },
    NegatedPropertySet {
        subject: TermOrVariable,
        forward: Vec<NamedNode>,
        inverse: Vec<NamedNode>,
        object: TermOrVariable,
    },
    /// Yields at most the first `limit` solutions of `inner` and stops evaluating `inner` as soon
    /// as they are known.
    Limit {
        inner: Box<AlgebraNode>,
        limit: usize,
    },
    Custom(Arc<dyn CustomAlgebraNode>),
}

impl AlgebraNode {
    /// The name of the node kind.
    pub fn name(&self) -> &str {
        match self {
            AlgebraNode::Bgp(_) => "Bgp",
            AlgebraNode::Join { .. } => "Join",
            AlgebraNode::LeftJoin { .. } => "LeftJoin",
            AlgebraNode::Union { .. } => "Union",
            AlgebraNode::Minus { .. } => "Minus",
            AlgebraNode::ExistsJoin { negated: false, .. } => "ExistsJoin",
            AlgebraNode::ExistsJoin { negated: true, .. } => "NotExistsJoin",
            AlgebraNode::Filter { .. } => "Filter",
            AlgebraNode::Extend { .. } => "Extend",
            AlgebraNode::Group { .. } => "Group",
            AlgebraNode::Having { .. } => "Having",
            AlgebraNode::OrderBy { .. } => "OrderBy",
            AlgebraNode::Distinct { .. } => "Distinct",
            AlgebraNode::Reduced { .. } => "Reduced",
            AlgebraNode::Project { .. } => "Project",
            AlgebraNode::Slice { .. } => "Slice",
            AlgebraNode::Graph { .. } => "Graph",
            AlgebraNode::Service { .. } => "Service",
            AlgebraNode::Ask { .. } => "Ask",
            AlgebraNode::Values { .. } => "Values",
            AlgebraNode::ZeroLengthPath { .. } => "ZeroLengthPath",
            AlgebraNode::ZeroOrMorePath { .. } => "ZeroOrMorePath",
            AlgebraNode::OneOrMorePath { .. } => "OneOrMorePath",
            AlgebraNode::NegatedPropertySet { .. } => "NegatedPropertySet",
            AlgebraNode::Limit { .. } => "Limit",
            AlgebraNode::Custom(node) => node.name(),
        }
    }

    /// Creates an empty [AlgebraNode::Bgp] which yields a single empty solution.
    pub fn empty_bgp() -> Self {
        AlgebraNode::Bgp(Vec::new())
    }

    /// The variables that may be bound in the solutions of this node.
    pub fn variables(&self) -> Vec<Variable> {
        match self {
            AlgebraNode::Bgp(elements) => {
                let mut result = Vec::new();
                for element in elements {
                    for variable in element.bound_variables() {
                        if !result.contains(&variable) {
                            result.push(variable);
                        }
                    }
                }
                result
            }
            AlgebraNode::Join { left, right }
            | AlgebraNode::LeftJoin { left, right, .. }
            | AlgebraNode::Union { left, right } => {
                merge_variables(&left.variables(), &right.variables())
            }
            AlgebraNode::Minus { left, .. } | AlgebraNode::ExistsJoin { left, .. } => {
                left.variables()
            }
            AlgebraNode::Filter { inner, .. }
            | AlgebraNode::Having { inner, .. }
            | AlgebraNode::OrderBy { inner, .. }
            | AlgebraNode::Distinct { inner }
            | AlgebraNode::Reduced { inner }
            | AlgebraNode::Slice { inner, .. }
            | AlgebraNode::Limit { inner, .. } => inner.variables(),
            AlgebraNode::Extend {
                inner, variable, ..
            } => merge_variables(&inner.variables(), std::slice::from_ref(variable)),
            AlgebraNode::Group {
                variables,
                aggregates,
                ..
            } => {
                let mut result = variables.clone();
                result.extend(aggregates.iter().map(|(variable, _)| variable.clone()));
                result
            }
            AlgebraNode::Project { variables, .. } | AlgebraNode::Values { variables, .. } => {
                variables.clone()
            }
            AlgebraNode::Graph { inner, name } => match name {
                NamedNodePattern::Variable(variable) => {
                    merge_variables(&inner.variables(), std::slice::from_ref(variable))
                }
                NamedNodePattern::NamedNode(_) => inner.variables(),
            },
            AlgebraNode::Service { variables, .. } => variables.clone(),
            AlgebraNode::Ask { .. } => Vec::new(),
            AlgebraNode::ZeroLengthPath { subject, object }
            | AlgebraNode::ZeroOrMorePath {
                subject, object, ..
            }
            | AlgebraNode::OneOrMorePath {
                subject, object, ..
            }
            | AlgebraNode::NegatedPropertySet {
                subject, object, ..
            } => endpoint_variables(subject, object),
            AlgebraNode::Custom(node) => node.variables(),
        }
    }

    /// All variables that are mentioned anywhere in this node, including expressions and
    /// variables that are projected away.
    pub fn mentioned_variables(&self) -> Vec<Variable> {
        let mut result = Vec::new();
        self.collect_mentioned_variables(&mut result);
        result
    }

    fn collect_mentioned_variables(&self, result: &mut Vec<Variable>) {
        let push = |variable: &Variable, result: &mut Vec<Variable>| {
            if !result.contains(variable) {
                result.push(variable.clone());
            }
        };

        match self {
            AlgebraNode::Bgp(elements) => {
                for element in elements {
                    match element {
                        PatternElement::SubQuery(node) => node.collect_mentioned_variables(result),
                        PatternElement::Filter(expression) => {
                            expression.collect_variables(result)
                        }
                        PatternElement::Assign {
                            variable,
                            expression,
                        } => {
                            push(variable, result);
                            expression.collect_variables(result);
                        }
                        _ => {
                            for variable in element.bound_variables() {
                                push(&variable, result);
                            }
                        }
                    }
                }
            }
            AlgebraNode::Group {
                inner,
                variables,
                aggregates,
            } => {
                inner.collect_mentioned_variables(result);
                for variable in variables {
                    push(variable, result);
                }
                for (variable, aggregate) in aggregates {
                    push(variable, result);
                    aggregate.collect_variables(result);
                }
            }
            AlgebraNode::Custom(node) => {
                for variable in node.variables() {
                    push(&variable, result);
                }
                for child in node.children() {
                    child.collect_mentioned_variables(result);
                }
            }
            _ => {
                for child in self.children() {
                    child.collect_mentioned_variables(result);
                }
                for expression in self.expressions() {
                    expression.collect_variables(result);
                }
                for variable in self.variables() {
                    push(&variable, result);
                }
            }
        }
    }

    /// The direct inputs of this node. Sub-queries of a [AlgebraNode::Bgp] are included, the
    /// patterns of `EXISTS` expressions are not.
    pub fn children(&self) -> Vec<&AlgebraNode> {
        match self {
            AlgebraNode::Bgp(elements) => elements
                .iter()
                .filter_map(|element| match element {
                    PatternElement::SubQuery(node) => Some(node.as_ref()),
                    _ => None,
                })
                .collect(),
            AlgebraNode::Join { left, right }
            | AlgebraNode::LeftJoin { left, right, .. }
            | AlgebraNode::Union { left, right }
            | AlgebraNode::Minus { left, right }
            | AlgebraNode::ExistsJoin { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            AlgebraNode::Filter { inner, .. }
            | AlgebraNode::Extend { inner, .. }
            | AlgebraNode::Group { inner, .. }
            | AlgebraNode::Having { inner, .. }
            | AlgebraNode::OrderBy { inner, .. }
            | AlgebraNode::Distinct { inner }
            | AlgebraNode::Reduced { inner }
            | AlgebraNode::Project { inner, .. }
            | AlgebraNode::Slice { inner, .. }
            | AlgebraNode::Graph { inner, .. }
            | AlgebraNode::Ask { inner }
            | AlgebraNode::Limit { inner, .. } => vec![inner.as_ref()],
            AlgebraNode::Service { .. }
            | AlgebraNode::Values { .. }
            | AlgebraNode::ZeroLengthPath { .. }
            | AlgebraNode::ZeroOrMorePath { .. }
            | AlgebraNode::OneOrMorePath { .. }
            | AlgebraNode::NegatedPropertySet { .. } => Vec::new(),
            AlgebraNode::Custom(node) => node.children(),
        }
    }

    /// The expressions that are directly attached to this node.
    pub fn expressions(&self) -> Vec<&Expr> {
        match self {
            AlgebraNode::Bgp(elements) => elements
                .iter()
                .filter_map(|element| match element {
                    PatternElement::Assign { expression, .. } | PatternElement::Filter(expression) => {
                        Some(expression)
                    }
                    _ => None,
                })
                .collect(),
            AlgebraNode::LeftJoin { expression, .. } => expression.iter().collect(),
            AlgebraNode::Filter { expression, .. }
            | AlgebraNode::Extend { expression, .. }
            | AlgebraNode::Having { expression, .. } => vec![expression],
            AlgebraNode::Group { aggregates, .. } => aggregates
                .iter()
                .filter_map(|(_, aggregate)| match aggregate {
                    AggregateExpr::Function { expr, .. } => Some(expr.as_ref()),
                    AggregateExpr::CountSolutions { .. } => None,
                })
                .collect(),
            AlgebraNode::OrderBy { keys, .. } => keys.iter().map(|key| &key.expression).collect(),
            _ => Vec::new(),
        }
    }

    /// Whether this node or any node below it satisfies `predicate`. Does not descend into the
    /// patterns of `EXISTS` expressions.
    pub fn any(&self, predicate: &dyn Fn(&AlgebraNode) -> bool) -> bool {
        predicate(self) || self.children().into_iter().any(|child| child.any(predicate))
    }

    /// Applies `f` to every direct input of this node, including sub-queries and the patterns of
    /// `EXISTS` expressions.
    ///
    /// Custom nodes are left untouched.
    pub fn try_map_children(
        self,
        f: &mut dyn FnMut(AlgebraNode) -> QueryResult<AlgebraNode>,
    ) -> QueryResult<AlgebraNode> {
        fn map(
            node: Box<AlgebraNode>,
            f: &mut dyn FnMut(AlgebraNode) -> QueryResult<AlgebraNode>,
        ) -> QueryResult<Box<AlgebraNode>> {
            f(*node).map(Box::new)
        }

        Ok(match self {
            AlgebraNode::Bgp(elements) => AlgebraNode::Bgp(
                elements
                    .into_iter()
                    .map(|element| {
                        Ok(match element {
                            PatternElement::SubQuery(node) => {
                                PatternElement::SubQuery(map(node, f)?)
                            }
                            PatternElement::Filter(expression) => {
                                PatternElement::Filter(expression.try_map_exists(f)?)
                            }
                            PatternElement::Assign {
                                variable,
                                expression,
                            } => PatternElement::Assign {
                                variable,
                                expression: expression.try_map_exists(f)?,
                            },
                            other => other,
                        })
                    })
                    .collect::<QueryResult<_>>()?,
            ),
            AlgebraNode::Join { left, right } => AlgebraNode::Join {
                left: map(left, f)?,
                right: map(right, f)?,
            },
            AlgebraNode::LeftJoin {
                left,
                right,
                expression,
            } => AlgebraNode::LeftJoin {
                left: map(left, f)?,
                right: map(right, f)?,
                expression: expression
                    .map(|expression| expression.try_map_exists(f))
                    .transpose()?,
            },
            AlgebraNode::Union { left, right } => AlgebraNode::Union {
                left: map(left, f)?,
                right: map(right, f)?,
            },
            AlgebraNode::Minus { left, right } => AlgebraNode::Minus {
                left: map(left, f)?,
                right: map(right, f)?,
            },
            AlgebraNode::ExistsJoin {
                left,
                right,
                negated,
            } => AlgebraNode::ExistsJoin {
                left: map(left, f)?,
                right: map(right, f)?,
                negated,
            },
            AlgebraNode::Filter { inner, expression } => AlgebraNode::Filter {
                inner: map(inner, f)?,
                expression: expression.try_map_exists(f)?,
            },
            AlgebraNode::Extend {
                inner,
                variable,
                expression,
            } => AlgebraNode::Extend {
                inner: map(inner, f)?,
                variable,
                expression: expression.try_map_exists(f)?,
            },
            AlgebraNode::Group {
                inner,
                variables,
                aggregates,
            } => AlgebraNode::Group {
                inner: map(inner, f)?,
                variables,
                aggregates,
            },
            AlgebraNode::Having { inner, expression } => AlgebraNode::Having {
                inner: map(inner, f)?,
                expression: expression.try_map_exists(f)?,
            },
            AlgebraNode::OrderBy { inner, keys } => AlgebraNode::OrderBy {
                inner: map(inner, f)?,
                keys: keys
                    .into_iter()
                    .map(|key| {
                        Ok(OrderKey {
                            expression: key.expression.try_map_exists(f)?,
                            descending: key.descending,
                        })
                    })
                    .collect::<QueryResult<_>>()?,
            },
            AlgebraNode::Distinct { inner } => AlgebraNode::Distinct {
                inner: map(inner, f)?,
            },
            AlgebraNode::Reduced { inner } => AlgebraNode::Reduced {
                inner: map(inner, f)?,
            },
            AlgebraNode::Project { inner, variables } => AlgebraNode::Project {
                inner: map(inner, f)?,
                variables,
            },
            AlgebraNode::Slice {
                inner,
                offset,
                limit,
            } => AlgebraNode::Slice {
                inner: map(inner, f)?,
                offset,
                limit,
            },
            AlgebraNode::Graph { inner, name } => AlgebraNode::Graph {
                inner: map(inner, f)?,
                name,
            },
            AlgebraNode::Ask { inner } => AlgebraNode::Ask {
                inner: map(inner, f)?,
            },
            AlgebraNode::Limit { inner, limit } => AlgebraNode::Limit {
                inner: map(inner, f)?,
                limit,
            },
            leaf @ (AlgebraNode::Service { .. }
            | AlgebraNode::Values { .. }
            | AlgebraNode::ZeroLengthPath { .. }
            | AlgebraNode::ZeroOrMorePath { .. }
            | AlgebraNode::OneOrMorePath { .. }
            | AlgebraNode::NegatedPropertySet { .. }
            | AlgebraNode::Custom(_)) => leaf,
        })
    }

    /// Rewrites the tree bottom-up. `f` is called on the inputs of a node before the node itself.
    pub fn try_transform_up(
        self,
        f: &mut dyn FnMut(AlgebraNode) -> QueryResult<AlgebraNode>,
    ) -> QueryResult<AlgebraNode> {
        let node = self.try_map_children(&mut |child| child.try_transform_up(f))?;
        f(node)
    }

    /// Rewrites the tree top-down. `f` is called on a node before its (new) inputs.
    pub fn try_transform_down(
        self,
        f: &mut dyn FnMut(AlgebraNode) -> QueryResult<AlgebraNode>,
    ) -> QueryResult<AlgebraNode> {
        let node = f(self)?;
        node.try_map_children(&mut |child| child.try_transform_down(f))
    }
}

fn endpoint_variables(subject: &TermOrVariable, object: &TermOrVariable) -> Vec<Variable> {
    let mut result = Vec::new();
    for endpoint in [subject, object] {
        if let TermOrVariable::Variable(variable) = endpoint {
            if !result.contains(variable) {
                result.push(variable.clone());
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Variable {
        Variable::new_unchecked(name)
    }

    fn triple(s: &str, p: &str, o: &str) -> PatternElement {
        PatternElement::Triple(TriplePattern::new(
            TermOrVariable::Variable(var(s)),
            TermOrVariable::Term(NamedNode::new_unchecked(format!("http://example.com/{p}")).into()),
            TermOrVariable::Variable(var(o)),
        ))
    }

    #[test]
    fn variables_of_left_join_are_merged() {
        let node = AlgebraNode::LeftJoin {
            left: Box::new(AlgebraNode::Bgp(vec![triple("s", "p", "o")])),
            right: Box::new(AlgebraNode::Bgp(vec![triple("s", "q", "x")])),
            expression: None,
        };
        assert_eq!(node.variables(), vec![var("s"), var("o"), var("x")]);
    }

    #[test]
    fn minus_only_exposes_left_variables() {
        let node = AlgebraNode::Minus {
            left: Box::new(AlgebraNode::Bgp(vec![triple("s", "p", "o")])),
            right: Box::new(AlgebraNode::Bgp(vec![triple("s", "q", "x")])),
        };
        assert_eq!(node.variables(), vec![var("s"), var("o")]);
        assert_eq!(node.mentioned_variables(), vec![var("s"), var("o"), var("x")]);
    }

    #[test]
    fn transform_up_visits_children_first() {
        let node = AlgebraNode::Distinct {
            inner: Box::new(AlgebraNode::Project {
                inner: Box::new(AlgebraNode::empty_bgp()),
                variables: vec![],
            }),
        };
        let mut visited = Vec::new();
        node.try_transform_up(&mut |node| {
            visited.push(node.name().to_owned());
            Ok(node)
        })
        .unwrap();
        assert_eq!(visited, vec!["Bgp", "Project", "Distinct"]);
    }

    #[test]
    fn transform_reaches_exists_patterns() {
        let node = AlgebraNode::Filter {
            inner: Box::new(AlgebraNode::empty_bgp()),
            expression: Expr::Exists(Box::new(AlgebraNode::Bgp(vec![triple("s", "p", "o")]))),
        };
        let mut bgps = 0;
        node.try_transform_up(&mut |node| {
            if matches!(node, AlgebraNode::Bgp(_)) {
                bgps += 1;
            }
            Ok(node)
        })
        .unwrap();
        assert_eq!(bgps, 2);
    }
}
