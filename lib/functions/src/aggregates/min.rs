use crate::aggregates::Accumulator;
use crate::order_by_cmp;
use rdf_eval_model::{Term, ThinError, ThinResult};
use std::cmp::Ordering;

/// `MIN(expr)` returns the smallest value according to the `ORDER BY` order.
#[derive(Default)]
pub struct MinAccumulator {
    min: Option<ThinResult<Term>>,
}

impl Accumulator for MinAccumulator {
    fn accumulate(&mut self, value: ThinResult<Term>) {
        self.min = match (self.min.take(), value) {
            (Some(Err(error)), _) | (_, Err(error)) => Some(Err(error)),
            (None, Ok(value)) => Some(Ok(value)),
            (Some(Ok(current)), Ok(value)) => {
                if order_by_cmp(Some(&value), Some(&current)) == Ordering::Less {
                    Some(Ok(value))
                } else {
                    Some(Ok(current))
                }
            }
        };
    }

    fn evaluate(&self) -> ThinResult<Term> {
        self.min.clone().unwrap_or(ThinError::expected())
    }
}
