use rdf_eval_model::{
    GraphName, GraphNameRef, NamedNode, NamedNodeRef, NamedOrBlankNode, Quad, QuadRef, Term,
    TermRef,
};
use rustc_hash::{FxHashMap, FxHashSet};

/// The content of a [MemDataset](super::MemDataset).
///
/// Quads are kept in a log in insertion order. For each quad component, the index maps a term to
/// the log positions of the quads that contain it. Scans pick the shortest list of the bound
/// components and filter it, which keeps the results in insertion order.
///
/// Removing a quad leaves a hole in the log. Index entries that point to a hole are skipped.
#[derive(Debug, Default)]
pub(super) struct MemQuadIndex {
    log: Vec<Option<Quad>>,
    positions: FxHashMap<Quad, usize>,
    graphs: FxHashMap<GraphName, Vec<usize>>,
    subjects: FxHashMap<Term, Vec<usize>>,
    predicates: FxHashMap<NamedNode, Vec<usize>>,
    objects: FxHashMap<Term, Vec<usize>>,
    named_graphs: Vec<NamedOrBlankNode>,
    named_graph_set: FxHashSet<NamedOrBlankNode>,
}

impl MemQuadIndex {
    /// The number of quads.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Inserts a quad. Returns `false` if the quad was already present.
    pub fn insert(&mut self, quad: QuadRef<'_>) -> bool {
        let quad = quad.into_owned();
        if self.positions.contains_key(&quad) {
            return false;
        }

        let position = self.log.len();
        if let Some(graph) = named_graph(&quad.graph_name) {
            self.insert_named_graph(graph);
        }
        self.graphs
            .entry(quad.graph_name.clone())
            .or_default()
            .push(position);
        self.subjects
            .entry(quad.subject.clone().into())
            .or_default()
            .push(position);
        self.predicates
            .entry(quad.predicate.clone())
            .or_default()
            .push(position);
        self.objects
            .entry(quad.object.clone())
            .or_default()
            .push(position);
        self.positions.insert(quad.clone(), position);
        self.log.push(Some(quad));
        true
    }

    /// Removes a quad. Returns `false` if the quad was not present.
    pub fn remove(&mut self, quad: QuadRef<'_>) -> bool {
        match self.positions.remove(&quad.into_owned()) {
            Some(position) => {
                self.log[position] = None;
                true
            }
            None => false,
        }
    }

    /// Registers a named graph, even if it has no quads.
    pub fn insert_named_graph(&mut self, graph: NamedOrBlankNode) -> bool {
        if self.named_graph_set.insert(graph.clone()) {
            self.named_graphs.push(graph);
            true
        } else {
            false
        }
    }

    pub fn named_graphs(&self) -> &[NamedOrBlankNode] {
        &self.named_graphs
    }

    pub fn contains_named_graph(&self, graph: &NamedOrBlankNode) -> bool {
        self.named_graph_set.contains(graph)
    }

    /// Returns the quads that match the pattern in insertion order.
    pub fn scan(
        &self,
        graph_name: Option<GraphNameRef<'_>>,
        subject: Option<TermRef<'_>>,
        predicate: Option<NamedNodeRef<'_>>,
        object: Option<TermRef<'_>>,
    ) -> Vec<Quad> {
        let mut candidates: Vec<&[usize]> = Vec::new();
        macro_rules! lookup {
            ($map: expr, $key: expr) => {
                if let Some(key) = $key {
                    match $map.get(&key.into_owned()) {
                        Some(positions) => candidates.push(positions),
                        None => return Vec::new(),
                    }
                }
            };
        }
        lookup!(self.graphs, graph_name);
        lookup!(self.subjects, subject);
        lookup!(self.predicates, predicate);
        lookup!(self.objects, object);

        let matches = |quad: &&Quad| {
            graph_name.map_or(true, |g| quad.graph_name.as_ref() == g)
                && subject.map_or(true, |s| TermRef::from(quad.subject.as_ref()) == s)
                && predicate.map_or(true, |p| quad.predicate.as_ref() == p)
                && object.map_or(true, |o| quad.object.as_ref() == o)
        };

        match candidates.into_iter().min_by_key(|positions| positions.len()) {
            Some(positions) => positions
                .iter()
                .filter_map(|position| self.log[*position].as_ref())
                .filter(matches)
                .cloned()
                .collect(),
            None => self.log.iter().flatten().filter(matches).cloned().collect(),
        }
    }
}

fn named_graph(graph_name: &GraphName) -> Option<NamedOrBlankNode> {
    match graph_name {
        GraphName::NamedNode(node) => Some(node.clone().into()),
        GraphName::BlankNode(node) => Some(node.clone().into()),
        GraphName::DefaultGraph => None,
    }
}
