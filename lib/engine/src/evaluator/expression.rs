use crate::evaluator::Evaluator;
use rdf_eval_common::{QueryEvaluationError, QueryResult};
use rdf_eval_functions::{sparql_compare, sparql_equals, FunctionContext, FunctionName, Numeric};
use rdf_eval_logical::Expr;
use rdf_eval_model::{Binding, Literal, Term, ThinResult};
use std::cmp::Ordering;

/// An expression that can be evaluated for a single solution.
///
/// `binding_id` identifies the solution within the query. Stateful functions (e.g., `BNODE`) use it
/// to return the same value for repeated calls on the same solution.
pub trait EvaluableExpression {
    /// Computes the value of the expression.
    fn value(
        &self,
        evaluator: &mut Evaluator<'_>,
        binding: &Binding,
        binding_id: u64,
    ) -> QueryResult<Term>;

    /// Computes the [effective boolean value](https://www.w3.org/TR/sparql11-query/#ebv) of the
    /// expression.
    fn effective_boolean_value(
        &self,
        evaluator: &mut Evaluator<'_>,
        binding: &Binding,
        binding_id: u64,
    ) -> QueryResult<bool> {
        let value = self.value(evaluator, binding, binding_id)?;
        Ok(rdf_eval_functions::effective_boolean_value(&value)?)
    }
}

impl EvaluableExpression for Expr {
    fn value(
        &self,
        evaluator: &mut Evaluator<'_>,
        binding: &Binding,
        binding_id: u64,
    ) -> QueryResult<Term> {
        match self {
            Expr::Constant(term) => Ok(term.clone()),
            Expr::Variable(variable) => binding
                .get(variable)
                .cloned()
                .ok_or_else(|| QueryEvaluationError::UnboundVariable(variable.clone())),
            Expr::Or(..)
            | Expr::And(..)
            | Expr::Not(_)
            | Expr::Equal(..)
            | Expr::SameTerm(..)
            | Expr::Greater(..)
            | Expr::GreaterOrEqual(..)
            | Expr::Less(..)
            | Expr::LessOrEqual(..)
            | Expr::In(..)
            | Expr::Bound(_)
            | Expr::Exists(_) => {
                let value = self.effective_boolean_value(evaluator, binding, binding_id)?;
                Ok(Literal::from(value).into())
            }
            Expr::Add(lhs, rhs) => {
                arithmetic(evaluator, binding, binding_id, lhs, rhs, Numeric::checked_add)
            }
            Expr::Subtract(lhs, rhs) => {
                arithmetic(evaluator, binding, binding_id, lhs, rhs, Numeric::checked_sub)
            }
            Expr::Multiply(lhs, rhs) => {
                arithmetic(evaluator, binding, binding_id, lhs, rhs, Numeric::checked_mul)
            }
            Expr::Divide(lhs, rhs) => {
                arithmetic(evaluator, binding, binding_id, lhs, rhs, Numeric::checked_div)
            }
            Expr::UnaryPlus(inner) => {
                let value = inner.value(evaluator, binding, binding_id)?;
                Ok(Numeric::from_term(&value)?.into_term())
            }
            Expr::UnaryMinus(inner) => {
                let value = inner.value(evaluator, binding, binding_id)?;
                Ok(Numeric::from_term(&value)?.checked_neg()?.into_term())
            }
            Expr::If(condition, then, otherwise) => {
                if condition.effective_boolean_value(evaluator, binding, binding_id)? {
                    then.value(evaluator, binding, binding_id)
                } else {
                    otherwise.value(evaluator, binding, binding_id)
                }
            }
            Expr::Coalesce(alternatives) => {
                for alternative in alternatives {
                    match alternative.value(evaluator, binding, binding_id) {
                        Ok(value) => return Ok(value),
                        Err(error) if error.is_absorbable() => {}
                        Err(error) => return Err(error),
                    }
                }
                QueryEvaluationError::expression("No argument of COALESCE has a value")
            }
            Expr::FunctionCall(name, args) => {
                let args = args
                    .iter()
                    .map(|arg| arg.value(evaluator, binding, binding_id))
                    .collect::<QueryResult<Vec<_>>>()?;
                let Some(function) = evaluator.registry.scalar_function(name) else {
                    return Err(match name {
                        FunctionName::Custom(name) => {
                            QueryEvaluationError::UnknownFunction(name.clone())
                        }
                        FunctionName::Builtin(builtin) => QueryEvaluationError::NotImplemented(
                            format!("The builtin function {builtin} is not registered"),
                        ),
                    });
                };
                let context = FunctionContext::new(evaluator.context.query_id(), binding_id);
                Ok(function.invoke(&args, &context)?)
            }
        }
    }

    fn effective_boolean_value(
        &self,
        evaluator: &mut Evaluator<'_>,
        binding: &Binding,
        binding_id: u64,
    ) -> QueryResult<bool> {
        match self {
            Expr::Or(lhs, rhs) => {
                match lhs.effective_boolean_value(evaluator, binding, binding_id) {
                    Ok(true) => Ok(true),
                    Ok(false) => rhs.effective_boolean_value(evaluator, binding, binding_id),
                    Err(error) if error.is_absorbable() => {
                        if rhs.effective_boolean_value(evaluator, binding, binding_id)? {
                            Ok(true)
                        } else {
                            Err(error)
                        }
                    }
                    Err(error) => Err(error),
                }
            }
            Expr::And(lhs, rhs) => {
                match lhs.effective_boolean_value(evaluator, binding, binding_id) {
                    Ok(true) => rhs.effective_boolean_value(evaluator, binding, binding_id),
                    Ok(false) => Ok(false),
                    Err(error) if error.is_absorbable() => {
                        if rhs.effective_boolean_value(evaluator, binding, binding_id)? {
                            Err(error)
                        } else {
                            Ok(false)
                        }
                    }
                    Err(error) => Err(error),
                }
            }
            Expr::Not(inner) => Ok(!inner.effective_boolean_value(evaluator, binding, binding_id)?),
            Expr::Equal(lhs, rhs) => {
                let (lhs, rhs) = operands(evaluator, binding, binding_id, lhs, rhs)?;
                Ok(sparql_equals(&lhs, &rhs)?)
            }
            Expr::SameTerm(lhs, rhs) => {
                let (lhs, rhs) = operands(evaluator, binding, binding_id, lhs, rhs)?;
                Ok(lhs == rhs)
            }
            Expr::Greater(lhs, rhs) => compare(evaluator, binding, binding_id, lhs, rhs)
                .map(|ordering| ordering == Ordering::Greater),
            Expr::GreaterOrEqual(lhs, rhs) => compare(evaluator, binding, binding_id, lhs, rhs)
                .map(|ordering| ordering != Ordering::Less),
            Expr::Less(lhs, rhs) => compare(evaluator, binding, binding_id, lhs, rhs)
                .map(|ordering| ordering == Ordering::Less),
            Expr::LessOrEqual(lhs, rhs) => compare(evaluator, binding, binding_id, lhs, rhs)
                .map(|ordering| ordering != Ordering::Greater),
            Expr::In(needle, haystack) => {
                let needle = needle.value(evaluator, binding, binding_id)?;
                let mut error = None;
                for candidate in haystack {
                    let equals = candidate
                        .value(evaluator, binding, binding_id)
                        .and_then(|candidate| {
                            sparql_equals(&needle, &candidate).map_err(QueryEvaluationError::from)
                        });
                    match equals {
                        Ok(true) => return Ok(true),
                        Ok(false) => {}
                        Err(candidate_error) if candidate_error.is_absorbable() => {
                            error = Some(candidate_error);
                        }
                        Err(candidate_error) => return Err(candidate_error),
                    }
                }
                match error {
                    Some(error) => Err(error),
                    None => Ok(false),
                }
            }
            Expr::Bound(variable) => Ok(binding.contains(variable)),
            Expr::Exists(pattern) => evaluator.exists(pattern, binding),
            _ => {
                let value = self.value(evaluator, binding, binding_id)?;
                Ok(rdf_eval_functions::effective_boolean_value(&value)?)
            }
        }
    }
}

fn operands(
    evaluator: &mut Evaluator<'_>,
    binding: &Binding,
    binding_id: u64,
    lhs: &Expr,
    rhs: &Expr,
) -> QueryResult<(Term, Term)> {
    let lhs = lhs.value(evaluator, binding, binding_id)?;
    let rhs = rhs.value(evaluator, binding, binding_id)?;
    Ok((lhs, rhs))
}

fn compare(
    evaluator: &mut Evaluator<'_>,
    binding: &Binding,
    binding_id: u64,
    lhs: &Expr,
    rhs: &Expr,
) -> QueryResult<Ordering> {
    let (lhs, rhs) = operands(evaluator, binding, binding_id, lhs, rhs)?;
    Ok(sparql_compare(&lhs, &rhs)?)
}

fn arithmetic(
    evaluator: &mut Evaluator<'_>,
    binding: &Binding,
    binding_id: u64,
    lhs: &Expr,
    rhs: &Expr,
    op: impl FnOnce(Numeric, Numeric) -> ThinResult<Numeric>,
) -> QueryResult<Term> {
    let (lhs, rhs) = operands(evaluator, binding, binding_id, lhs, rhs)?;
    let result = op(Numeric::from_term(&lhs)?, Numeric::from_term(&rhs)?)?;
    Ok(result.into_term())
}
