mod active_graph;
mod dataset;
pub mod error;

pub use active_graph::ActiveGraph;
pub use dataset::{Dataset, DEFAULT_DATASET_LOCK};
pub use error::{QueryEvaluationError, QueryTimeoutError, StorageError};

pub type QueryResult<T> = Result<T, QueryEvaluationError>;
