use crate::aggregates::Accumulator;
use crate::order_by_cmp;
use rdf_eval_model::{Term, ThinError, ThinResult};
use std::cmp::Ordering;

/// `MAX(expr)` returns the largest value according to the `ORDER BY` order.
#[derive(Default)]
pub struct MaxAccumulator {
    max: Option<ThinResult<Term>>,
}

impl Accumulator for MaxAccumulator {
    fn accumulate(&mut self, value: ThinResult<Term>) {
        self.max = match (self.max.take(), value) {
            (Some(Err(error)), _) | (_, Err(error)) => Some(Err(error)),
            (None, Ok(value)) => Some(Ok(value)),
            (Some(Ok(current)), Ok(value)) => {
                if order_by_cmp(Some(&value), Some(&current)) == Ordering::Greater {
                    Some(Ok(value))
                } else {
                    Some(Ok(current))
                }
            }
        };
    }

    fn evaluate(&self) -> ThinResult<Term> {
        self.max.clone().unwrap_or(ThinError::expected())
    }
}
