use rdf_eval_model::{GraphName, NamedOrBlankNode};
use std::fmt::Display;

/// The active graph defines which graphs can partake in the pattern matching process.
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActiveGraph {
    /// Only the default graph forms the active graph.
    #[default]
    DefaultGraph,
    /// Any graph, including the default graph, form the active graph.
    AllGraphs,
    /// A set of graphs form the active graph. This allows expressing the user-intent of
    /// queries that use the `FROM` clause.
    Union(Vec<GraphName>),
    /// A single named graph forms the active graph. This corresponds to `GRAPH <iri> { ... }`
    /// patterns or a `GRAPH ?x { ... }` pattern once `?x` has been bound.
    NamedGraph(NamedOrBlankNode),
}

impl ActiveGraph {
    /// Returns the graphs that must be scanned for matching quads. [None] stands for every graph
    /// in the dataset.
    pub fn graph_names(&self) -> Option<Vec<GraphName>> {
        match self {
            ActiveGraph::DefaultGraph => Some(vec![GraphName::DefaultGraph]),
            ActiveGraph::AllGraphs => None,
            ActiveGraph::Union(graphs) => Some(graphs.clone()),
            ActiveGraph::NamedGraph(name) => Some(vec![name.clone().into()]),
        }
    }

    /// Returns whether the active graph spans more than a single graph. Matches against such a
    /// graph must merge identical triples from different graphs.
    pub fn is_merged(&self) -> bool {
        match self {
            ActiveGraph::DefaultGraph | ActiveGraph::NamedGraph(_) => false,
            ActiveGraph::AllGraphs => true,
            ActiveGraph::Union(graphs) => graphs.len() > 1,
        }
    }
}

impl Display for ActiveGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActiveGraph::DefaultGraph => write!(f, "Default Graph"),
            ActiveGraph::AllGraphs => write!(f, "All Graphs"),
            ActiveGraph::Union(graphs) => write!(f, "Union of {:?}", graphs),
            ActiveGraph::NamedGraph(name) => write!(f, "Named Graph {name}"),
        }
    }
}
