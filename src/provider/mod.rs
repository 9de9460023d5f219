//! Query surface
//!
//! - `QueryProvider`: the translator/executor seam
//! - `Query`: an immutable, composable query bound to a provider
//! - `ProjectionSupportingProvider`: expands projection markers before
//!   delegating to the provider it wraps
//!
//! A tree containing markers that reaches a provider without the decorator
//! is rejected by that provider's translator.

mod errors;
mod projectable;
mod query;

pub use errors::{QueryError, QueryResult};
pub use projectable::ProjectionSupportingProvider;
pub use query::{PreparedQuery, Query, QueryProvider};
