use rdf_eval_model::{NamedNode, ThinError, Variable};
use spargebra::SparqlSyntaxError;
use std::convert::Infallible;
use std::error::Error;
use std::io;
use std::time::Duration;

/// An error while evaluating a query.
///
/// Errors raised by expressions (see [QueryEvaluationError::is_absorbable]) are absorbed by
/// operators that treat a failing condition as `false` (e.g., `FILTER`). All other errors abort the
/// query.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum QueryEvaluationError {
    /// An error in SPARQL parsing.
    #[error(transparent)]
    Parsing(#[from] SparqlSyntaxError),
    /// An error from the storage.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The query exceeded its time budget.
    #[error(transparent)]
    Timeout(#[from] QueryTimeoutError),
    /// An expression referenced a variable that is unbound in the current solution.
    #[error("The variable {0} is unbound")]
    UnboundVariable(Variable),
    /// An expression could not be evaluated (e.g., due to a type mismatch).
    #[error("The expression could not be evaluated: {0}")]
    Expression(String),
    /// An expression called a function that is not known to the function registry.
    #[error("The function {0} is not supported")]
    UnknownFunction(NamedNode),
    /// Error when `FROM` or `FROM NAMED` references a graph that does not exist
    #[error("The graph {0} does not exist")]
    GraphDoesNotExist(NamedNode),
    /// A `BIND` tried to assign a variable that is already bound.
    #[error("The variable {0} is already bound")]
    VariableAlreadyBound(Variable),
    /// Error during `SERVICE` evaluation
    #[error("{0}")]
    Service(#[source] Box<dyn Error + Send + Sync + 'static>),
    /// The variable storing the `SERVICE` name is unbound
    #[error("The variable encoding the service name is unbound")]
    UnboundService,
    /// The given `SERVICE` is not supported
    #[error("The service {0} is not supported")]
    UnsupportedService(NamedNode),
    /// Another thread panicked while holding the dataset lock.
    #[error("The dataset lock has been poisoned")]
    DatasetLockPoisoned,
    #[error("A feature has not yet been implemented: {0}")]
    NotImplemented(String),
    #[error("An internal error that likely indicates towards a bug in RdfEval: {0}")]
    InternalError(String),
}

impl QueryEvaluationError {
    pub fn internal<T>(cause: String) -> Result<T, Self> {
        Err(QueryEvaluationError::InternalError(cause))
    }

    pub fn expression<T>(cause: impl Into<String>) -> Result<T, Self> {
        Err(QueryEvaluationError::Expression(cause.into()))
    }

    /// Returns whether the error stems from evaluating an expression for a single solution.
    ///
    /// `FILTER` and `OPTIONAL` conditions treat these errors as `false`. `BIND` and projection
    /// expressions propagate them.
    pub fn is_absorbable(&self) -> bool {
        matches!(
            self,
            QueryEvaluationError::UnboundVariable(_)
                | QueryEvaluationError::Expression(_)
                | QueryEvaluationError::UnknownFunction(_)
        )
    }
}

impl From<ThinError> for QueryEvaluationError {
    fn from(_: ThinError) -> Self {
        Self::Expression(String::from("A function received an invalid argument"))
    }
}

impl From<Infallible> for QueryEvaluationError {
    #[inline]
    fn from(error: Infallible) -> Self {
        match error {}
    }
}

/// The query did not finish within its configured timeout.
///
/// No partial results are returned once this error has been raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("The query exceeded its timeout of {timeout:?} after {elapsed:?}")]
pub struct QueryTimeoutError {
    timeout: Duration,
    elapsed: Duration,
}

impl QueryTimeoutError {
    pub fn new(timeout: Duration, elapsed: Duration) -> Self {
        Self { timeout, elapsed }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// An error related to storage operations (reads, writes...).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StorageError {
    /// Error from the OS I/O layer.
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl StorageError {
    /// Builds an error from a printable error message.
    #[inline]
    pub fn msg(msg: impl Into<String>) -> Self {
        Self::Other(msg.into().into())
    }
}

impl From<StorageError> for io::Error {
    #[inline]
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::Io(error) => error,
            StorageError::Other(error) => Self::other(error),
        }
    }
}
