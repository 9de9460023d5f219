//! Query errors

use thiserror::Error;

use crate::rewrite::RewriteError;

/// Result type for query building and execution
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors surfaced by query providers
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    /// Marker expansion rejected the tree
    #[error("{0}")]
    Rewrite(#[from] RewriteError),

    /// The translator met a construct it cannot express
    #[error("Untranslatable tree: {0}")]
    UntranslatableTree(String),

    #[error("Execution failed: {0}")]
    Execution(String),

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),
}

impl QueryError {
    /// Stable error code for logs
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::Rewrite(e) => e.code().code(),
            QueryError::UntranslatableTree(_) => "QUERY_UNTRANSLATABLE_TREE",
            QueryError::Execution(_) => "QUERY_EXECUTION_FAILED",
            QueryError::UnknownCollection(_) => "QUERY_UNKNOWN_COLLECTION",
        }
    }

    /// Returns the rewrite error, if expansion failed
    pub fn as_rewrite(&self) -> Option<&RewriteError> {
        match self {
            QueryError::Rewrite(e) => Some(e),
            _ => None,
        }
    }
}
