use rdf_eval_common::{
    ActiveGraph, Dataset, QueryEvaluationError, QueryResult, QueryTimeoutError, StorageError,
};
use rdf_eval_logical::DatasetSpec;
use rdf_eval_model::{
    GraphName, NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef, Term, TermRef, Triple,
    Variable,
};
use rustc_hash::FxHashSet;
use std::sync::RwLockReadGuard;
use std::time::{Duration, Instant};

/// Tracks the running time of a query and enforces its timeout.
///
/// Reading the clock for every solution is too expensive. Hence, [ExecutionTimer::tick] only
/// consults the clock every `check_interval` calls.
#[derive(Debug, Clone)]
pub struct ExecutionTimer {
    start: Instant,
    timeout: Option<Duration>,
    check_interval: usize,
    countdown: usize,
}

impl ExecutionTimer {
    /// Starts a new timer. A `check_interval` of zero is treated as one.
    pub fn start(timeout: Option<Duration>, check_interval: usize) -> Self {
        let check_interval = check_interval.max(1);
        Self {
            start: Instant::now(),
            timeout,
            check_interval,
            countdown: check_interval,
        }
    }

    /// The time since the timer has been started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Counts a unit of work and checks the timeout once per check interval.
    pub fn tick(&mut self) -> Result<(), QueryTimeoutError> {
        self.countdown -= 1;
        if self.countdown == 0 {
            self.countdown = self.check_interval;
            return self.check();
        }
        Ok(())
    }

    /// Checks the timeout immediately.
    pub fn check(&self) -> Result<(), QueryTimeoutError> {
        match self.timeout {
            Some(timeout) => {
                let elapsed = self.elapsed();
                if elapsed >= timeout {
                    Err(QueryTimeoutError::new(timeout, elapsed))
                } else {
                    Ok(())
                }
            }
            None => Ok(()),
        }
    }
}

/// The state of a single query evaluation.
///
/// The context holds the read side of the dataset lock until it is dropped. Hence, writers to the
/// dataset wait for the query to finish. The active graph is tracked per context, such that
/// concurrent queries against the same dataset cannot observe each other's graph scopes.
pub struct EvaluationContext<'a> {
    dataset: &'a dyn Dataset,
    _guard: RwLockReadGuard<'a, ()>,
    default_graph: ActiveGraph,
    named_graphs: Option<Vec<NamedOrBlankNode>>,
    graph_stack: Vec<ActiveGraph>,
    timer: ExecutionTimer,
    query_id: u64,
    next_binding_id: u64,
    next_variable_id: u64,
}

impl<'a> EvaluationContext<'a> {
    /// Creates a new context for evaluating a query against `dataset`.
    ///
    /// The graphs referenced by `FROM` and `FROM NAMED` must exist in the dataset. Without a
    /// `FROM` clause the default graph of the dataset is the default graph of the query, or the
    /// union of all graphs if `default_graph_as_union` is set.
    pub fn try_new(
        dataset: &'a dyn Dataset,
        spec: Option<&DatasetSpec>,
        default_graph_as_union: bool,
        timer: ExecutionTimer,
    ) -> QueryResult<Self> {
        let guard = dataset
            .lock()
            .read()
            .map_err(|_| QueryEvaluationError::DatasetLockPoisoned)?;

        let (default_graph, named_graphs) = match spec {
            Some(spec) => {
                for graph in spec.default.iter().chain(spec.named.iter().flatten()) {
                    if !dataset.contains_named_graph(graph.as_ref().into())? {
                        return Err(QueryEvaluationError::GraphDoesNotExist(graph.clone()));
                    }
                }

                let default_graph = ActiveGraph::Union(
                    spec.default
                        .iter()
                        .map(|graph| GraphName::NamedNode(graph.clone()))
                        .collect(),
                );
                let named_graphs = spec
                    .named
                    .iter()
                    .flatten()
                    .map(|graph| NamedOrBlankNode::NamedNode(graph.clone()))
                    .collect();
                (default_graph, Some(named_graphs))
            }
            None if default_graph_as_union => (ActiveGraph::AllGraphs, None),
            None => (ActiveGraph::DefaultGraph, None),
        };

        tracing::debug!(%default_graph, "Created evaluation context");
        Ok(Self {
            dataset,
            _guard: guard,
            default_graph,
            named_graphs,
            graph_stack: Vec::new(),
            timer,
            query_id: rand::random(),
            next_binding_id: 0,
            next_variable_id: 0,
        })
    }

    pub fn dataset(&self) -> &'a dyn Dataset {
        self.dataset
    }

    /// The graph that patterns are currently matched against.
    pub fn active_graph(&self) -> &ActiveGraph {
        self.graph_stack.last().unwrap_or(&self.default_graph)
    }

    pub fn default_graph(&self) -> &ActiveGraph {
        &self.default_graph
    }

    /// Makes `graph` the active graph until the matching [EvaluationContext::pop_graph].
    ///
    /// Prefer [GraphScope](crate::GraphScope), which pops the graph when it goes out of scope.
    pub fn push_graph(&mut self, graph: ActiveGraph) {
        self.graph_stack.push(graph);
    }

    pub fn pop_graph(&mut self) {
        self.graph_stack.pop();
    }

    /// The number of active graph scopes.
    pub fn graph_depth(&self) -> usize {
        self.graph_stack.len()
    }

    /// The named graphs that `GRAPH ?g` ranges over.
    pub fn named_graphs(&self) -> QueryResult<Vec<NamedOrBlankNode>> {
        match &self.named_graphs {
            Some(graphs) => Ok(graphs.clone()),
            None => Ok(self.dataset.named_graphs()?),
        }
    }

    /// Returns whether `GRAPH <name>` can match anything. Without `FROM NAMED`, the graph must
    /// exist in the dataset.
    pub fn is_available_named_graph(&self, name: NamedOrBlankNodeRef<'_>) -> QueryResult<bool> {
        match &self.named_graphs {
            Some(graphs) => Ok(graphs.iter().any(|graph| graph.as_ref() == name)),
            None => Ok(self.dataset.contains_named_graph(name)?),
        }
    }

    pub fn timer(&self) -> &ExecutionTimer {
        &self.timer
    }

    /// See [ExecutionTimer::tick].
    pub fn tick(&mut self) -> QueryResult<()> {
        Ok(self.timer.tick()?)
    }

    /// See [ExecutionTimer::check].
    pub fn check_timeout(&self) -> QueryResult<()> {
        Ok(self.timer.check()?)
    }

    /// A random identifier of this query evaluation.
    pub fn query_id(&self) -> u64 {
        self.query_id
    }

    /// Returns a new identifier for a solution that an expression is evaluated on.
    pub fn next_binding_id(&mut self) -> u64 {
        self.next_binding_id += 1;
        self.next_binding_id
    }

    /// Returns a variable that does not clash with any variable of the query.
    pub fn fresh_variable(&mut self) -> Variable {
        self.next_variable_id += 1;
        Variable::new_unchecked(format!("__path{}", self.next_variable_id))
    }

    /// Returns the triples of the active graph that match the given pattern.
    ///
    /// If the active graph spans multiple graphs, a triple that is contained in more than one of
    /// them is only returned once.
    pub fn triples_for_pattern(
        &self,
        subject: Option<TermRef<'_>>,
        predicate: Option<NamedNodeRef<'_>>,
        object: Option<TermRef<'_>>,
    ) -> Result<Vec<Triple>, StorageError> {
        let active_graph = self.active_graph();
        let quads = match active_graph.graph_names() {
            None => self
                .dataset
                .quads_for_pattern(None, subject, predicate, object)?,
            Some(graphs) => {
                let mut quads = Vec::new();
                for graph in &graphs {
                    quads.extend(self.dataset.quads_for_pattern(
                        Some(graph.as_ref()),
                        subject,
                        predicate,
                        object,
                    )?);
                }
                quads
            }
        };

        let triples = quads
            .into_iter()
            .map(|quad| Triple::new(quad.subject, quad.predicate, quad.object));
        if active_graph.is_merged() {
            let mut seen = FxHashSet::default();
            Ok(triples
                .filter(|triple| seen.insert(triple.clone()))
                .collect())
        } else {
            Ok(triples.collect())
        }
    }

    /// Returns every term that is the subject or object of a triple in the active graph, in the
    /// order of their first occurrence.
    pub fn graph_nodes(&self) -> Result<Vec<Term>, StorageError> {
        let mut seen = FxHashSet::default();
        let mut result = Vec::new();
        for triple in self.triples_for_pattern(None, None, None)? {
            for node in [Term::from(triple.subject), triple.object] {
                if seen.insert(node.clone()) {
                    result.push(node);
                }
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_eval_model::{NamedNode, Quad};
    use std::sync::RwLock;

    #[derive(Debug, Default)]
    struct SingleGraphDataset {
        lock: RwLock<()>,
        quads: Vec<Quad>,
    }

    impl Dataset for SingleGraphDataset {
        fn quads_for_pattern(
            &self,
            graph_name: Option<rdf_eval_model::GraphNameRef<'_>>,
            _subject: Option<TermRef<'_>>,
            _predicate: Option<NamedNodeRef<'_>>,
            _object: Option<TermRef<'_>>,
        ) -> Result<Vec<Quad>, StorageError> {
            Ok(self
                .quads
                .iter()
                .filter(|quad| graph_name.map_or(true, |graph| quad.graph_name.as_ref() == graph))
                .cloned()
                .collect())
        }

        fn named_graphs(&self) -> Result<Vec<NamedOrBlankNode>, StorageError> {
            Ok(Vec::new())
        }

        fn contains_named_graph(
            &self,
            _graph_name: NamedOrBlankNodeRef<'_>,
        ) -> Result<bool, StorageError> {
            Ok(false)
        }

        fn lock(&self) -> &RwLock<()> {
            &self.lock
        }
    }

    fn ex(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.com/{name}"))
    }

    #[test]
    fn timer_without_timeout_never_fails() {
        let mut timer = ExecutionTimer::start(None, 1);
        for _ in 0..100 {
            assert!(timer.tick().is_ok());
        }
    }

    #[test]
    fn zero_timeout_fails_on_first_check() {
        let mut timer = ExecutionTimer::start(Some(Duration::ZERO), 3);
        assert!(timer.tick().is_ok());
        assert!(timer.tick().is_ok());
        assert!(timer.tick().is_err());
        assert!(timer.check().is_err());
    }

    #[test]
    fn unknown_from_graph_is_rejected() {
        let dataset = SingleGraphDataset::default();
        let spec = DatasetSpec {
            default: vec![ex("missing")],
            named: None,
        };
        let result =
            EvaluationContext::try_new(&dataset, Some(&spec), false, ExecutionTimer::start(None, 1));
        assert!(matches!(
            result,
            Err(QueryEvaluationError::GraphDoesNotExist(graph)) if graph == ex("missing")
        ));
    }

    #[test]
    fn graph_stack_restores_default_graph() {
        let dataset = SingleGraphDataset::default();
        let mut context =
            EvaluationContext::try_new(&dataset, None, false, ExecutionTimer::start(None, 1))
                .unwrap();
        context.push_graph(ActiveGraph::NamedGraph(ex("g").into()));
        assert_eq!(
            context.active_graph(),
            &ActiveGraph::NamedGraph(ex("g").into())
        );
        context.pop_graph();
        assert_eq!(context.active_graph(), &ActiveGraph::DefaultGraph);
    }

    #[test]
    fn context_holds_read_lock() {
        let dataset = SingleGraphDataset::default();
        let context =
            EvaluationContext::try_new(&dataset, None, false, ExecutionTimer::start(None, 1))
                .unwrap();
        assert!(dataset.lock.try_write().is_err());
        drop(context);
        assert!(dataset.lock.try_write().is_ok());
    }

    #[test]
    fn graph_nodes_are_unique() {
        let dataset = SingleGraphDataset {
            lock: RwLock::default(),
            quads: vec![
                Quad::new(ex("a"), ex("p"), ex("b"), GraphName::DefaultGraph),
                Quad::new(ex("b"), ex("p"), ex("a"), GraphName::DefaultGraph),
            ],
        };
        let context =
            EvaluationContext::try_new(&dataset, None, false, ExecutionTimer::start(None, 1))
                .unwrap();
        assert_eq!(
            context.graph_nodes().unwrap(),
            vec![Term::from(ex("a")), Term::from(ex("b"))]
        );
    }
}
