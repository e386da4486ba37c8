use crate::hooks::NodeStatistics;
use rdf_eval_logical::{AlgebraNode, OptimizerReport};
use std::fmt::{Display, Formatter};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct QueryExplanation {
    /// The time spent building and optimizing the algebra.
    pub planning_time: Duration,
    /// The time spent evaluating the optimized algebra.
    pub evaluation_time: Duration,
    /// The algebra as it has been built from the query.
    pub initial_plan: AlgebraNode,
    /// The algebra that has been evaluated.
    pub optimized_plan: AlgebraNode,
    pub optimizer_report: OptimizerReport,
    /// The statistics of the evaluated nodes in pre-order. Only collected if requested in the
    /// [QueryOptions](crate::sparql::QueryOptions).
    pub statistics: Option<Vec<NodeStatistics>>,
}

impl Display for QueryExplanation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Planning time: {:?}", self.planning_time)?;
        writeln!(f, "Evaluation time: {:?}", self.evaluation_time)?;
        write!(f, "Initial plan:\n{}", self.initial_plan)?;
        write!(f, "Optimized plan:\n{}", self.optimized_plan)?;
        write!(f, "{}", self.optimizer_report)?;
        if let Some(statistics) = &self.statistics {
            writeln!(f, "Statistics:")?;
            for node in statistics {
                writeln!(f, "{node}")?;
            }
        }
        Ok(())
    }
}
