//! [SPARQL](https://www.w3.org/TR/sparql11-overview/) query evaluation.

mod eval;
mod explanation;

pub use eval::QueryEvaluator;
pub use explanation::QueryExplanation;
pub use rdf_eval_logical::{OptimizationLevel, PatternWeights};
pub use spargebra::{Query, SparqlSyntaxError};

use std::time::Duration;

/// The default number of units of work between two checks of the query timeout.
pub const DEFAULT_TIMEOUT_CHECK_INTERVAL: usize = 1024;

/// Options for SPARQL query evaluation.
#[derive(Clone, Debug)]
pub struct QueryOptions {
    /// The defined optimization level
    pub optimization_level: OptimizationLevel,
    /// The time after which the evaluation is aborted. [None] disables the timeout.
    pub timeout: Option<Duration>,
    /// How many units of work (e.g., matched triples) are processed between two checks of the
    /// timeout.
    pub timeout_check_interval: usize,
    /// Use the union of all graphs as default graph if the query has no `FROM` clause.
    pub default_graph_as_union: bool,
    /// Overrides the selectivity estimates of patterns that mention a weighted term.
    pub pattern_weights: Option<PatternWeights>,
    /// Collects per-node statistics into the [QueryExplanation].
    pub collect_statistics: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            optimization_level: OptimizationLevel::default(),
            timeout: None,
            timeout_check_interval: DEFAULT_TIMEOUT_CHECK_INTERVAL,
            default_graph_as_union: false,
            pattern_weights: None,
            collect_statistics: false,
        }
    }
}

impl QueryOptions {
    #[must_use]
    pub fn with_optimization_level(mut self, level: OptimizationLevel) -> Self {
        self.optimization_level = level;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_default_graph_as_union(mut self) -> Self {
        self.default_graph_as_union = true;
        self
    }

    #[must_use]
    pub fn with_statistics(mut self) -> Self {
        self.collect_statistics = true;
        self
    }
}
