//! exprproj - composable query-expression fragments
//!
//! Query authors keep small expression fragments (`user => user.Name +
//! "-suffix"`) in variables, fields or host functions and reference them
//! from a larger query through projection markers. Before the query reaches
//! a translator, the [`rewrite::Rewriter`] replaces each marker with the
//! fragment's body, bound to the right sub-expression of the query.
//!
//! # Layout
//!
//! - `tree`: expression model and the query-building DSL
//! - `rewrite`: marker recognition, resolution, validation and expansion
//! - `provider`: provider trait, composable queries, the expanding decorator
//! - `memory`: in-memory translator/executor over JSON rows
//! - `observability`: JSON logs and counters

pub mod memory;
pub mod observability;
pub mod provider;
pub mod rewrite;
pub mod tree;

pub use memory::{Dataset, InMemoryProvider};
pub use provider::{ProjectionSupportingProvider, Query, QueryError, QueryProvider, QueryResult};
pub use rewrite::{ExpansionReport, RewriteConfig, RewriteError, RewriteErrorCode, Rewriter};
