//! Query provider seam and composable query handle

use std::fmt;
use std::sync::Arc;

use crate::tree::builder::{order_by, order_by_descending, select, where_};
use crate::tree::{Expr, Lambda, TypeRef, Value};

use super::errors::QueryResult;

/// A downstream translator/executor
///
/// `create_query` sees every composed tree, `build_query` accepts or
/// rejects a tree and `execute` runs an accepted one.
pub trait QueryProvider: Send + Sync {
    /// Called each time a query is extended; returns the tree to keep
    fn create_query(&self, tree: Arc<Expr>) -> QueryResult<Arc<Expr>> {
        Ok(tree)
    }

    fn build_query(&self, tree: Arc<Expr>) -> QueryResult<PreparedQuery>;

    fn execute(&self, query: &PreparedQuery) -> QueryResult<Vec<serde_json::Value>>;
}

/// A tree accepted by a provider
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedQuery {
    tree: Arc<Expr>,
}

impl PreparedQuery {
    pub fn new(tree: Arc<Expr>) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &Arc<Expr> {
        &self.tree
    }
}

impl fmt::Display for PreparedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tree)
    }
}

/// A query expression bound to the provider that will run it
///
/// Every composition passes the new tree through the provider's
/// `create_query` and returns a new handle on the same provider.
pub struct Query<P: QueryProvider> {
    provider: Arc<P>,
    expression: Arc<Expr>,
}

impl<P: QueryProvider> Clone for Query<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            expression: Arc::clone(&self.expression),
        }
    }
}

impl<P: QueryProvider> fmt::Debug for Query<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("expression", &self.expression.to_string())
            .finish()
    }
}

impl<P: QueryProvider> Query<P> {
    pub fn new(provider: Arc<P>, expression: Arc<Expr>) -> Self {
        Self {
            provider,
            expression,
        }
    }

    /// Query over every row of `collection`
    pub fn root(provider: Arc<P>, collection: &str, element: TypeRef) -> Self {
        let value = Value::Collection {
            name: collection.to_string(),
            element,
        };
        let ty = value.type_of();
        Self::new(provider, Arc::new(Expr::Constant { value, ty }))
    }

    pub fn expression(&self) -> &Arc<Expr> {
        &self.expression
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Row type of the sequence this query produces
    pub fn element_type(&self) -> TypeRef {
        let ty = self.expression.ty();
        ty.element().cloned().unwrap_or(ty)
    }

    fn compose(&self, expression: Arc<Expr>) -> QueryResult<Self> {
        let expression = self.provider.create_query(expression)?;
        Ok(Self::new(Arc::clone(&self.provider), expression))
    }

    pub fn filter(&self, predicate: Lambda) -> QueryResult<Self> {
        self.compose(where_(Arc::clone(&self.expression), predicate))
    }

    pub fn select(&self, selector: Lambda) -> QueryResult<Self> {
        self.compose(select(Arc::clone(&self.expression), selector))
    }

    pub fn order_by(&self, key: Lambda) -> QueryResult<Self> {
        self.compose(order_by(Arc::clone(&self.expression), key))
    }

    pub fn order_by_descending(&self, key: Lambda) -> QueryResult<Self> {
        self.compose(order_by_descending(Arc::clone(&self.expression), key))
    }

    /// Builds and executes the query
    pub fn to_vec(&self) -> QueryResult<Vec<serde_json::Value>> {
        let prepared = self.provider.build_query(Arc::clone(&self.expression))?;
        self.provider.execute(&prepared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::QueryError;
    use crate::tree::builder::*;
    use std::sync::Mutex;

    /// Records every tree it is handed
    #[derive(Default)]
    struct Recording {
        built: Mutex<Vec<String>>,
    }

    impl QueryProvider for Recording {
        fn build_query(&self, tree: Arc<Expr>) -> QueryResult<PreparedQuery> {
            self.built.lock().unwrap().push(tree.to_string());
            Ok(PreparedQuery::new(tree))
        }

        fn execute(&self, query: &PreparedQuery) -> QueryResult<Vec<serde_json::Value>> {
            Err(QueryError::Execution(query.to_string()))
        }
    }

    fn project() -> TypeRef {
        TypeRef::entity("Project")
    }

    #[test]
    fn test_root_is_sequence_of_element() {
        let q = Query::root(Arc::new(Recording::default()), "Projects", project());
        assert_eq!(q.expression().ty(), TypeRef::sequence(project()));
        assert_eq!(q.element_type(), project());
        assert_eq!(q.expression().to_string(), "Projects");
    }

    #[test]
    fn test_composition_leaves_original_untouched() {
        let q = Query::root(Arc::new(Recording::default()), "Projects", project());
        let filtered = q
            .filter(lambda("p", project(), |p| {
                eq(field(&p, "Name", TypeRef::String), constant("a"))
            }))
            .unwrap();
        let names = filtered
            .select(lambda("p", project(), |p| field(&p, "Name", TypeRef::String)))
            .unwrap();

        assert_eq!(q.expression().to_string(), "Projects");
        assert_eq!(
            names.expression().to_string(),
            "Projects.Where(p => (p.Name == \"a\")).Select(p => p.Name)"
        );
        assert_eq!(names.element_type(), TypeRef::String);
        assert!(Arc::ptr_eq(names.provider(), q.provider()));
    }

    #[test]
    fn test_to_vec_builds_then_executes() {
        let provider = Arc::new(Recording::default());
        let q = Query::root(Arc::clone(&provider), "Projects", project())
            .order_by_descending(lambda("p", project(), |p| field(&p, "Name", TypeRef::String)))
            .unwrap();
        let err = q.to_vec().unwrap_err();
        assert!(matches!(err, QueryError::Execution(_)));
        assert_eq!(
            provider.built.lock().unwrap().as_slice(),
            ["Projects.OrderByDescending(p => p.Name)"]
        );
    }
}
