use crate::error::StorageError;
use rdf_eval_model::{
    GraphNameRef, NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef, Quad, TermRef,
};
use std::fmt::Debug;
use std::sync::{LazyLock, RwLock};

/// The lock used by datasets that do not provide their own lock.
pub static DEFAULT_DATASET_LOCK: LazyLock<RwLock<()>> = LazyLock::new(|| RwLock::new(()));

/// The graph dataset that queries are evaluated against.
///
/// The dataset is shared between concurrently running queries. Each query holds the read side of
/// [Dataset::lock] for its whole evaluation, while writers are expected to take the write side.
/// The active graph of a query is not part of the dataset and is tracked by the evaluation
/// context instead.
pub trait Dataset: Debug + Send + Sync {
    /// Returns the quads that match the given pattern. A `None` position matches any term.
    ///
    /// Quads must be returned in a deterministic order such that evaluating the same query twice
    /// yields the same solution order.
    fn quads_for_pattern(
        &self,
        graph_name: Option<GraphNameRef<'_>>,
        subject: Option<TermRef<'_>>,
        predicate: Option<NamedNodeRef<'_>>,
        object: Option<TermRef<'_>>,
    ) -> Result<Vec<Quad>, StorageError>;

    /// Returns the list of named graphs in the dataset.
    fn named_graphs(&self) -> Result<Vec<NamedOrBlankNode>, StorageError>;

    /// Returns whether `graph_name` is a named graph in the dataset.
    fn contains_named_graph(&self, graph_name: NamedOrBlankNodeRef<'_>)
        -> Result<bool, StorageError>;

    /// Returns the lock that guards the content of this dataset.
    ///
    /// Datasets that do not override this method share [DEFAULT_DATASET_LOCK].
    fn lock(&self) -> &RwLock<()> {
        &DEFAULT_DATASET_LOCK
    }
}
