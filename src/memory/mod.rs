//! In-memory query provider
//!
//! A reference translator/executor over JSON rows. It rejects any tree a
//! row store could not run, including projection markers and captured
//! lambdas, so trees must be expanded before they reach it.

mod dataset;
mod evaluator;
mod translator;

pub use dataset::Dataset;
pub use evaluator::Evaluator;
pub use translator::Translator;

use std::sync::Arc;

use crate::observability::{log_event_with_fields, Event};
use crate::provider::{PreparedQuery, Query, QueryProvider, QueryResult};
use crate::tree::{Expr, TypeRef};

/// Provider executing queries against a [`Dataset`]
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    dataset: Dataset,
}

impl InMemoryProvider {
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Query over every row of `collection`
    pub fn query(self: &Arc<Self>, collection: &str, element: TypeRef) -> Query<InMemoryProvider> {
        Query::root(Arc::clone(self), collection, element)
    }

    fn translate(&self, tree: &Expr) -> QueryResult<()> {
        Translator::check(tree).inspect_err(|e| {
            log_event_with_fields(
                Event::QueryRejected,
                &[("code", e.code()), ("reason", &e.to_string())],
            );
        })
    }
}

impl QueryProvider for InMemoryProvider {
    fn build_query(&self, tree: Arc<Expr>) -> QueryResult<PreparedQuery> {
        self.translate(&tree)?;
        log_event_with_fields(Event::QueryBuilt, &[("tree", &tree.to_string())]);
        Ok(PreparedQuery::new(tree))
    }

    fn execute(&self, query: &PreparedQuery) -> QueryResult<Vec<serde_json::Value>> {
        // Prepared queries can be constructed directly, so check again
        self.translate(query.tree())?;
        let rows = Evaluator::new(&self.dataset).run(query.tree())?;
        log_event_with_fields(Event::QueryExecuted, &[("rows", &rows.len().to_string())]);
        Ok(rows)
    }
}
