use crate::evaluator::{EvaluableExpression, Evaluator};
use rdf_eval_common::{QueryEvaluationError, QueryResult};
use rdf_eval_functions::aggregates::{create_accumulator, Accumulator};
use rdf_eval_functions::order_by_cmp;
use rdf_eval_logical::{AggregateExpr, AlgebraNode, OrderKey};
use rdf_eval_model::{Binding, Literal, Multiset, Term, ThinError, Variable};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Ordering;

/// The values of the group variables. `None` is the key of unbound variables.
type GroupKey = Vec<Option<Term>>;

/// Partitions the solutions of `inner` by the values of `variables` and computes the aggregates
/// for each partition. Groups are emitted in the order of their first solution.
///
/// Without group variables, all solutions form a single group, even if there are none.
pub(super) fn evaluate_group(
    evaluator: &mut Evaluator<'_>,
    inner: &AlgebraNode,
    variables: &[Variable],
    aggregates: &[(Variable, AggregateExpr)],
) -> QueryResult<Multiset> {
    let mut output_variables = variables.to_vec();
    output_variables.extend(aggregates.iter().map(|(variable, _)| variable.clone()));

    let solutions = evaluator.with_seed(None, |this| this.evaluate_node(inner, None))?;
    if solutions.is_singleton() {
        return Ok(Multiset::Singleton(output_variables));
    }

    let mut positions: FxHashMap<GroupKey, usize> = FxHashMap::default();
    let mut groups: Vec<(GroupKey, Vec<Binding>)> = Vec::new();
    for solution in solutions.into_bindings() {
        let key: GroupKey = variables
            .iter()
            .map(|variable| solution.get(variable).cloned())
            .collect();
        match positions.get(&key) {
            Some(position) => groups[*position].1.push(solution),
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push((key, vec![solution]));
            }
        }
    }
    if groups.is_empty() && variables.is_empty() {
        groups.push((Vec::new(), Vec::new()));
    }

    let mut result = Vec::with_capacity(groups.len());
    for (key, members) in groups {
        let mut binding: Binding = variables
            .iter()
            .zip(key)
            .filter_map(|(variable, value)| value.map(|value| (variable.clone(), value)))
            .collect();
        for (variable, aggregate) in aggregates {
            if let Some(value) = evaluate_aggregate(evaluator, aggregate, &members)? {
                binding.insert(variable.clone(), value);
            }
        }
        result.push(binding);
    }
    Ok(Multiset::new(output_variables, result))
}

/// Computes an aggregate over the members of a group. Returns [None] if the aggregate is
/// undefined for the group (e.g., `SUM` over non-numeric values).
fn evaluate_aggregate(
    evaluator: &mut Evaluator<'_>,
    aggregate: &AggregateExpr,
    members: &[Binding],
) -> QueryResult<Option<Term>> {
    match aggregate {
        AggregateExpr::CountSolutions { distinct } => {
            let count = if *distinct {
                members.iter().collect::<FxHashSet<_>>().len()
            } else {
                members.len()
            };
            let count = i64::try_from(count).map_err(|_| {
                QueryEvaluationError::InternalError(format!("Cannot represent the count {count}"))
            })?;
            Ok(Some(Literal::from(count).into()))
        }
        AggregateExpr::Function {
            function,
            expr,
            distinct,
        } => {
            let Some(mut accumulator) = create_accumulator(function, *distinct) else {
                return Err(QueryEvaluationError::NotImplemented(format!(
                    "The aggregate function {function} is not supported"
                )));
            };
            for member in members {
                let binding_id = evaluator.context.next_binding_id();
                let value = match expr.value(evaluator, member, binding_id) {
                    Ok(value) => Ok(value),
                    Err(error) if error.is_absorbable() => ThinError::expected(),
                    Err(error) => return Err(error),
                };
                accumulator.accumulate(value);
            }
            Ok(accumulator.evaluate().ok())
        }
    }
}

/// Sorts the solutions of `inner` by `keys`. The sort is stable, so solutions with equal keys keep
/// their relative order. Keys that cannot be evaluated sort like unbound values.
pub(super) fn evaluate_order_by(
    evaluator: &mut Evaluator<'_>,
    inner: &AlgebraNode,
    keys: &[OrderKey],
) -> QueryResult<Multiset> {
    let solutions = evaluator.evaluate_node(inner, None)?;
    if solutions.is_singleton() {
        return Ok(solutions);
    }

    let (variables, bindings) = solutions.into_parts();
    let mut keyed = Vec::with_capacity(bindings.len());
    for binding in bindings {
        let binding_id = evaluator.context.next_binding_id();
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            let value = match key.expression.value(evaluator, &binding, binding_id) {
                Ok(value) => Some(value),
                Err(error) if error.is_absorbable() => None,
                Err(error) => return Err(error),
            };
            values.push(value);
        }
        keyed.push((values, binding));
    }

    keyed.sort_by(|(lhs, _), (rhs, _)| {
        for ((lhs, rhs), key) in lhs.iter().zip(rhs).zip(keys) {
            let ordering = order_by_cmp(lhs.as_ref(), rhs.as_ref());
            let ordering = if key.descending {
                ordering.reverse()
            } else {
                ordering
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });

    Ok(Multiset::new(
        variables,
        keyed.into_iter().map(|(_, binding)| binding).collect(),
    ))
}
