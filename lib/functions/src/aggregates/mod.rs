//! Accumulators for the SPARQL [set functions](https://www.w3.org/TR/sparql11-query/#aggregateAlgebra).
//!
//! Each accumulator receives the value of the aggregated expression for every solution of a group.
//! Evaluation errors are passed in as well, as some aggregates (e.g., `SUM`) fail if one of their
//! inputs failed while others (e.g., `COUNT`) ignore them.

mod avg;
mod group_concat;
mod max;
mod min;
mod sum;

use rdf_eval_model::{Integer, NamedNode, Term, ThinError, ThinResult};
use rustc_hash::FxHashSet;
use std::fmt::{Display, Formatter};

pub use avg::AvgAccumulator;
pub use group_concat::GroupConcatAccumulator;
pub use max::MaxAccumulator;
pub use min::MinAccumulator;
pub use sum::SumAccumulator;

/// The aggregate functions that can be applied to a group of solutions.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Sample,
    GroupConcat { separator: Option<String> },
    Custom(NamedNode),
}

impl Display for AggregateFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregateFunction::Count => f.write_str("COUNT"),
            AggregateFunction::Sum => f.write_str("SUM"),
            AggregateFunction::Avg => f.write_str("AVG"),
            AggregateFunction::Min => f.write_str("MIN"),
            AggregateFunction::Max => f.write_str("MAX"),
            AggregateFunction::Sample => f.write_str("SAMPLE"),
            AggregateFunction::GroupConcat { separator } => match separator {
                Some(separator) => write!(f, "GROUP_CONCAT[separator={separator:?}]"),
                None => f.write_str("GROUP_CONCAT"),
            },
            AggregateFunction::Custom(name) => write!(f, "{name}"),
        }
    }
}

/// Accumulates the values of a single group.
pub trait Accumulator {
    /// Adds the value of the aggregated expression for one solution.
    fn accumulate(&mut self, value: ThinResult<Term>);

    /// Computes the aggregate. An error leaves the aggregate unbound.
    fn evaluate(&self) -> ThinResult<Term>;
}

/// Creates a fresh accumulator for `function`. Returns [None] for custom aggregates, which are
/// not supported.
pub fn create_accumulator(
    function: &AggregateFunction,
    distinct: bool,
) -> Option<Box<dyn Accumulator>> {
    let accumulator: Box<dyn Accumulator> = match function {
        AggregateFunction::Count => Box::new(CountAccumulator::default()),
        AggregateFunction::Sum => Box::new(SumAccumulator::default()),
        AggregateFunction::Avg => Box::new(AvgAccumulator::default()),
        AggregateFunction::Min => Box::new(MinAccumulator::default()),
        AggregateFunction::Max => Box::new(MaxAccumulator::default()),
        AggregateFunction::Sample => Box::new(SampleAccumulator::default()),
        AggregateFunction::GroupConcat { separator } => Box::new(GroupConcatAccumulator::new(
            separator.as_deref().unwrap_or(" "),
        )),
        AggregateFunction::Custom(_) => return None,
    };

    Some(if distinct {
        Box::new(DistinctAccumulator::new(accumulator))
    } else {
        accumulator
    })
}

/// Only forwards the first occurrence of each value.
pub struct DistinctAccumulator {
    seen: FxHashSet<Term>,
    inner: Box<dyn Accumulator>,
}

impl DistinctAccumulator {
    pub fn new(inner: Box<dyn Accumulator>) -> Self {
        Self {
            seen: FxHashSet::default(),
            inner,
        }
    }
}

impl Accumulator for DistinctAccumulator {
    fn accumulate(&mut self, value: ThinResult<Term>) {
        match value {
            Ok(term) => {
                if self.seen.insert(term.clone()) {
                    self.inner.accumulate(Ok(term));
                }
            }
            Err(error) => self.inner.accumulate(Err(error)),
        }
    }

    fn evaluate(&self) -> ThinResult<Term> {
        self.inner.evaluate()
    }
}

/// `COUNT(expr)` counts the solutions for which `expr` could be evaluated.
#[derive(Default)]
pub struct CountAccumulator {
    count: i64,
}

impl Accumulator for CountAccumulator {
    fn accumulate(&mut self, value: ThinResult<Term>) {
        if value.is_ok() {
            self.count += 1;
        }
    }

    fn evaluate(&self) -> ThinResult<Term> {
        Ok(crate::Numeric::Integer(Integer::from(self.count)).into_term())
    }
}

/// `SAMPLE(expr)` returns an arbitrary value. We pick the first one.
#[derive(Default)]
pub struct SampleAccumulator {
    value: Option<Term>,
}

impl Accumulator for SampleAccumulator {
    fn accumulate(&mut self, value: ThinResult<Term>) {
        if self.value.is_none() {
            self.value = value.ok();
        }
    }

    fn evaluate(&self) -> ThinResult<Term> {
        self.value.clone().ok_or(ThinError::default())
    }
}
