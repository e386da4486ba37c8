use crate::aggregates::Accumulator;
use crate::Numeric;
use rdf_eval_model::{Integer, Term, ThinResult};

/// `SUM(expr)` adds all values. Fails if any value is not numeric.
pub struct SumAccumulator {
    sum: ThinResult<Numeric>,
}

impl Default for SumAccumulator {
    fn default() -> Self {
        Self {
            sum: Ok(Numeric::Integer(Integer::from(0))),
        }
    }
}

impl Accumulator for SumAccumulator {
    fn accumulate(&mut self, value: ThinResult<Term>) {
        if let Ok(sum) = self.sum {
            self.sum = value
                .and_then(|value| Numeric::from_term(&value))
                .and_then(|value| sum.checked_add(value));
        }
    }

    fn evaluate(&self) -> ThinResult<Term> {
        self.sum.map(Numeric::into_term)
    }
}
