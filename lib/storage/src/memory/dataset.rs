use crate::memory::index::MemQuadIndex;
use rdf_eval_common::{Dataset, StorageError};
use rdf_eval_model::{
    GraphNameRef, NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef, Quad, QuadRef, TermRef,
};
use std::sync::{PoisonError, RwLock};

/// An in-memory [Dataset].
///
/// Quads are returned in insertion order. Writers take the write side of [Dataset::lock] and thus
/// wait for running queries to finish. Consequently, a query must never write to the dataset it
/// is evaluated on.
///
/// # Example
///
/// ```
/// # use rdf_eval_common::Dataset;
/// # use rdf_eval_model::{GraphName, NamedNode, Quad};
/// # use rdf_eval_storage::MemDataset;
/// let ex = NamedNode::new("http://example.com")?;
/// let dataset = MemDataset::new();
/// dataset.insert(Quad::new(ex.clone(), ex.clone(), ex.clone(), GraphName::DefaultGraph).as_ref())?;
///
/// let quads = dataset.quads_for_pattern(None, None, Some(ex.as_ref()), None)?;
/// assert_eq!(quads.len(), 1);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Default)]
pub struct MemDataset {
    lock: RwLock<()>,
    index: RwLock<MemQuadIndex>,
}

impl MemDataset {
    /// Creates an empty [MemDataset].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a [MemDataset] that contains `quads`.
    pub fn from_quads(quads: impl IntoIterator<Item = Quad>) -> Self {
        let mut index = MemQuadIndex::default();
        for quad in quads {
            index.insert(quad.as_ref());
        }
        Self {
            lock: RwLock::new(()),
            index: RwLock::new(index),
        }
    }

    /// Inserts a quad. Returns `false` if the quad was already present.
    pub fn insert(&self, quad: QuadRef<'_>) -> Result<bool, StorageError> {
        self.write(|index| index.insert(quad))
    }

    /// Inserts all `quads`. Returns the number of new quads.
    pub fn extend(&self, quads: impl IntoIterator<Item = Quad>) -> Result<usize, StorageError> {
        self.write(|index| {
            quads
                .into_iter()
                .filter(|quad| index.insert(quad.as_ref()))
                .count()
        })
    }

    /// Removes a quad. Returns `false` if the quad was not present.
    pub fn remove(&self, quad: QuadRef<'_>) -> Result<bool, StorageError> {
        self.write(|index| index.remove(quad))
    }

    /// Registers a named graph, even if it has no quads. Returns `false` if the graph was
    /// already known.
    pub fn insert_named_graph(
        &self,
        graph: impl Into<NamedOrBlankNode>,
    ) -> Result<bool, StorageError> {
        let graph = graph.into();
        self.write(|index| index.insert_named_graph(graph))
    }

    /// The number of quads.
    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.index.read().map_err(poisoned)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }

    fn write<T>(&self, action: impl FnOnce(&mut MemQuadIndex) -> T) -> Result<T, StorageError> {
        let _guard = self.lock.write().map_err(poisoned)?;
        let mut index = self.index.write().map_err(poisoned)?;
        let result = action(&mut index);
        tracing::trace!(len = index.len(), "Updated in-memory dataset");
        Ok(result)
    }
}

impl Dataset for MemDataset {
    fn quads_for_pattern(
        &self,
        graph_name: Option<GraphNameRef<'_>>,
        subject: Option<TermRef<'_>>,
        predicate: Option<NamedNodeRef<'_>>,
        object: Option<TermRef<'_>>,
    ) -> Result<Vec<Quad>, StorageError> {
        let index = self.index.read().map_err(poisoned)?;
        Ok(index.scan(graph_name, subject, predicate, object))
    }

    fn named_graphs(&self) -> Result<Vec<NamedOrBlankNode>, StorageError> {
        Ok(self.index.read().map_err(poisoned)?.named_graphs().to_vec())
    }

    fn contains_named_graph(&self, graph_name: NamedOrBlankNodeRef<'_>) -> Result<bool, StorageError> {
        Ok(self
            .index
            .read()
            .map_err(poisoned)?
            .contains_named_graph(&graph_name.into_owned()))
    }

    fn lock(&self) -> &RwLock<()> {
        &self.lock
    }
}

impl FromIterator<Quad> for MemDataset {
    fn from_iter<T: IntoIterator<Item = Quad>>(iter: T) -> Self {
        Self::from_quads(iter)
    }
}

fn poisoned<T>(_: PoisonError<T>) -> StorageError {
    StorageError::msg("The in-memory dataset has been poisoned by a panicking writer")
}
