mod construct;
mod describe;

pub use construct::{construct_triples, ConstructTemplate, TemplateConstructor};
pub use describe::{ConciseBoundedDescription, DescribeAlgorithm};

use rdf_eval_model::{Multiset, Triple, Variable};

/// Results of a [SPARQL query](https://www.w3.org/TR/sparql11-query/).
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResults {
    /// Results of a [SELECT](https://www.w3.org/TR/sparql11-query/#select) query.
    Solutions(Multiset),
    /// Result of a [ASK](https://www.w3.org/TR/sparql11-query/#ask) query.
    Boolean(bool),
    /// Results of a [CONSTRUCT](https://www.w3.org/TR/sparql11-query/#construct) or
    /// [DESCRIBE](https://www.w3.org/TR/sparql11-query/#describe) query.
    Graph(Vec<Triple>),
}

impl QueryResults {
    /// The variables of the solutions. Empty for boolean and graph results.
    pub fn variables(&self) -> &[Variable] {
        match self {
            QueryResults::Solutions(solutions) => solutions.variables(),
            QueryResults::Boolean(_) | QueryResults::Graph(_) => &[],
        }
    }

    /// The number of solutions, triples, or `1` for a boolean result.
    pub fn len(&self) -> usize {
        match self {
            QueryResults::Solutions(solutions) => solutions.len(),
            QueryResults::Boolean(_) => 1,
            QueryResults::Graph(triples) => triples.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Multiset> for QueryResults {
    #[inline]
    fn from(value: Multiset) -> Self {
        Self::Solutions(value)
    }
}
