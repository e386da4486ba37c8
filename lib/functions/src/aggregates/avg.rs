use crate::aggregates::{Accumulator, SumAccumulator};
use crate::Numeric;
use rdf_eval_model::{Integer, Term, ThinResult};

/// `AVG(expr)` divides the sum by the number of values. The average of no values is `0`.
#[derive(Default)]
pub struct AvgAccumulator {
    sum: SumAccumulator,
    count: i64,
}

impl Accumulator for AvgAccumulator {
    fn accumulate(&mut self, value: ThinResult<Term>) {
        self.count += 1;
        self.sum.accumulate(value);
    }

    fn evaluate(&self) -> ThinResult<Term> {
        let sum = Numeric::from_term(&self.sum.evaluate()?)?;
        if self.count == 0 {
            return Ok(Numeric::Integer(Integer::from(0)).into_term());
        }
        let count = Numeric::Integer(Integer::from(self.count));
        Ok(sum.checked_div(count)?.into_term())
    }
}
