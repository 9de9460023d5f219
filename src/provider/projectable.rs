//! Projection-supporting provider
//!
//! Wraps any provider so that every tree it is handed is expanded before
//! the inner provider sees it. Queries composed from a wrapped query stay
//! wrapped, and each composition step is expanded as it is made, so a bad
//! marker fails at the step that introduced it.
//!
//! Only trees that still contain markers reach the rewriter. A tree that
//! was expanded at composition is not expanded again by `build_query` or
//! `execute`, so each composition counts as at most one expansion.

use std::sync::Arc;

use crate::observability::{log_event_with_fields, Event, RewriteMetrics};
use crate::rewrite::{is_marker, RewriteConfig, Rewriter};
use crate::tree::Expr;

use super::errors::{QueryError, QueryResult};
use super::query::{PreparedQuery, Query, QueryProvider};

/// Decorator that expands projection markers, then delegates
pub struct ProjectionSupportingProvider<P: QueryProvider> {
    inner: Arc<P>,
    rewriter: Rewriter,
}

impl<P: QueryProvider> ProjectionSupportingProvider<P> {
    pub fn new(inner: Arc<P>) -> Self {
        Self::with_rewriter(inner, Rewriter::new(RewriteConfig::default()))
    }

    pub fn with_rewriter(inner: Arc<P>, rewriter: Rewriter) -> Self {
        Self { inner, rewriter }
    }

    pub fn inner(&self) -> &Arc<P> {
        &self.inner
    }

    pub fn rewriter(&self) -> &Rewriter {
        &self.rewriter
    }

    pub fn metrics(&self) -> &Arc<RewriteMetrics> {
        self.rewriter.metrics()
    }

    fn expand(&self, tree: &Arc<Expr>) -> QueryResult<Arc<Expr>> {
        if !tree.any(&is_marker) {
            return Ok(Arc::clone(tree));
        }
        self.rewriter.expand(tree).map_err(|e| {
            self.metrics().increment_queries_rejected();
            log_event_with_fields(
                Event::QueryRejected,
                &[("code", e.code().code()), ("reason", e.message())],
            );
            QueryError::from(e)
        })
    }
}

impl<P: QueryProvider> QueryProvider for ProjectionSupportingProvider<P> {
    fn create_query(&self, tree: Arc<Expr>) -> QueryResult<Arc<Expr>> {
        let expanded = self.expand(&tree)?;
        self.inner.create_query(expanded)
    }

    fn build_query(&self, tree: Arc<Expr>) -> QueryResult<PreparedQuery> {
        let expanded = self.expand(&tree)?;
        self.inner.build_query(expanded)
    }

    fn execute(&self, query: &PreparedQuery) -> QueryResult<Vec<serde_json::Value>> {
        let expanded = self.expand(query.tree())?;
        let rows = if Arc::ptr_eq(&expanded, query.tree()) {
            self.inner.execute(query)?
        } else {
            let prepared = self.inner.build_query(expanded)?;
            self.inner.execute(&prepared)?
        };

        self.metrics().increment_queries_executed();
        log_event_with_fields(Event::QueryExecuted, &[("rows", &rows.len().to_string())]);
        Ok(rows)
    }
}

impl<P: QueryProvider> Query<P> {
    /// Re-roots this query on a projection-supporting provider
    pub fn as_projectable(&self) -> Query<ProjectionSupportingProvider<P>> {
        self.as_projectable_with(Rewriter::new(RewriteConfig::default()))
    }

    /// Like [`Query::as_projectable`] with a configured rewriter
    pub fn as_projectable_with(&self, rewriter: Rewriter) -> Query<ProjectionSupportingProvider<P>> {
        let provider = ProjectionSupportingProvider::with_rewriter(Arc::clone(self.provider()), rewriter);
        Query::new(Arc::new(provider), Arc::clone(self.expression()))
    }
}
