use crate::optimizer::{OptimizerReport, OptimizerRule};
use crate::{AlgebraNode, Expr, PatternElement, TermOrVariable, TriplePattern};
use rdf_eval_common::QueryResult;
use rdf_eval_model::{Term, Variable};
use rustc_hash::{FxHashMap, FxHashSet};

/// Externally supplied cost estimates for patterns that mention specific terms.
///
/// If a triple pattern mentions a weighted term, the smallest weight of its terms replaces the
/// heuristic estimate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatternWeights {
    weights: FxHashMap<Term, usize>,
}

impl PatternWeights {
    /// Creates an empty set of weights.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the weight of `term`.
    #[must_use]
    pub fn with_weight(mut self, term: impl Into<Term>, weight: usize) -> Self {
        self.weights.insert(term.into(), weight);
        self
    }

    /// Returns the weight of `pattern`, if any of its terms is weighted.
    pub fn weight_of(&self, pattern: &TriplePattern) -> Option<usize> {
        [&pattern.subject, &pattern.predicate, &pattern.object]
            .into_iter()
            .filter_map(|position| position.as_term())
            .filter_map(|term| self.weights.get(term).copied())
            .min()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

/// Reorders the elements of each [AlgebraNode::Bgp] such that cheap and selective patterns are
/// evaluated first.
///
/// Triple and path patterns are ordered greedily. The next pattern is the cheapest one that shares
/// a variable with the already placed patterns. Only if no such pattern exists, the cheapest
/// disconnected pattern is picked. `BIND` and sub-queries separate the BGP into segments that are
/// ordered independently. They stay behind every pattern that precedes them in the query, as an
/// assignment must run once per solution of these patterns.
///
/// Filters are placed directly after the last pattern that binds one of their variables. Filters
/// that reference a variable that no element binds are evaluated on the result of the whole BGP.
#[derive(Debug, Default)]
pub struct BgpReorderingRule {
    weights: PatternWeights,
}

impl BgpReorderingRule {
    /// Creates a new [BgpReorderingRule].
    pub fn new(weights: PatternWeights) -> Self {
        Self { weights }
    }

    fn reorder(&self, elements: Vec<PatternElement>) -> AlgebraNode {
        let mut filters = Vec::new();
        let mut ordered = Vec::with_capacity(elements.len());
        let mut bound = FxHashSet::default();
        let mut segment = Vec::new();

        for element in elements {
            match element {
                PatternElement::Filter(expression) => filters.push(expression),
                PatternElement::Triple(_) | PatternElement::Path { .. } => segment.push(element),
                barrier => {
                    self.order_segment(std::mem::take(&mut segment), &mut bound, &mut ordered);
                    bound.extend(barrier.bound_variables());
                    ordered.push(barrier);
                }
            }
        }
        self.order_segment(segment, &mut bound, &mut ordered);

        place_filters(ordered, filters)
    }

    /// Greedily orders the triple and path patterns of `segment` and appends them to `result`.
    fn order_segment(
        &self,
        mut segment: Vec<PatternElement>,
        bound: &mut FxHashSet<Variable>,
        result: &mut Vec<PatternElement>,
    ) {
        while !segment.is_empty() {
            let connected = segment
                .iter()
                .enumerate()
                .filter(|(_, element)| {
                    element
                        .bound_variables()
                        .iter()
                        .any(|variable| bound.contains(variable))
                })
                .min_by_key(|(_, element)| self.estimate_cost(element, bound))
                .map(|(i, _)| i);
            let next = connected.unwrap_or_else(|| {
                segment
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, element)| self.estimate_cost(element, bound))
                    .map_or(0, |(i, _)| i)
            });

            let element = segment.remove(next);
            bound.extend(element.bound_variables());
            result.push(element);
        }
    }

    /// Estimates the cost of evaluating `element` once the variables in `bound` are known.
    fn estimate_cost(&self, element: &PatternElement, bound: &FxHashSet<Variable>) -> usize {
        let is_bound = |position: &TermOrVariable| match position {
            TermOrVariable::Term(_) => true,
            TermOrVariable::Variable(variable) => bound.contains(variable),
        };

        match element {
            PatternElement::Triple(pattern) => {
                if let Some(weight) = self.weights.weight_of(pattern) {
                    return weight;
                }
                estimate_triple_cardinality(
                    is_bound(&pattern.subject),
                    is_bound(&pattern.predicate),
                    is_bound(&pattern.object),
                )
            }
            PatternElement::Path {
                subject, object, ..
            } => estimate_triple_cardinality(is_bound(subject), true, is_bound(object))
                .saturating_mul(10),
            _ => usize::MAX,
        }
    }
}

impl OptimizerRule for BgpReorderingRule {
    fn name(&self) -> &str {
        "bgp-reordering"
    }

    fn rewrite(
        &self,
        node: AlgebraNode,
        _report: &mut OptimizerReport,
    ) -> QueryResult<AlgebraNode> {
        node.try_transform_up(&mut |node| {
            Ok(match node {
                AlgebraNode::Bgp(elements) => self.reorder(elements),
                node => node,
            })
        })
    }
}

/// Estimates the cardinality of a single triple pattern.
///
/// This uses the heuristics from Oxigraph's join reordering.
fn estimate_triple_cardinality(
    subject_bound: bool,
    predicate_bound: bool,
    object_bound: bool,
) -> usize {
    match (subject_bound, predicate_bound, object_bound) {
        (true, true, true) => 1,
        (true, true, false) => 10,
        (true, false, true) => 2,
        (false, true, true) => 10_000,
        (true, false, false) => 100,
        (false, false, false) => 1_000_000_000,
        (false, true, false) => 1_000_000,
        (false, false, true) => 100_000,
    }
}

fn binds_any(element: &PatternElement, variables: &[Variable]) -> bool {
    element
        .bound_variables()
        .iter()
        .any(|variable| variables.contains(variable))
}

/// Inserts each filter after the last element that binds one of its variables. Filters whose
/// variables are not all bound by an element wrap the resulting BGP.
fn place_filters(mut elements: Vec<PatternElement>, filters: Vec<Expr>) -> AlgebraNode {
    let provided = elements
        .iter()
        .flat_map(PatternElement::bound_variables)
        .collect::<FxHashSet<_>>();

    let mut insertions: Vec<(usize, Expr)> = Vec::new();
    let mut unplaced = Vec::new();
    for filter in filters {
        let variables = filter.variables();
        if !variables.iter().all(|variable| provided.contains(variable)) {
            unplaced.push(filter);
            continue;
        }

        let position = elements
            .iter()
            .rposition(|element| binds_any(element, &variables))
            .map_or(0, |i| i + 1);
        insertions.push((position, filter));
    }

    // Insert from the back to keep the positions valid. Filters at the same position keep their
    // relative order.
    insertions.sort_by_key(|(position, _)| *position);
    for (position, filter) in insertions.into_iter().rev() {
        elements.insert(position, PatternElement::Filter(filter));
    }

    unplaced
        .into_iter()
        .fold(AlgebraNode::Bgp(elements), |inner, expression| {
            AlgebraNode::Filter {
                inner: Box::new(inner),
                expression,
            }
        })
}
