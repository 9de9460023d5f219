//! Query expression tree model
//!
//! Immutable, structurally comparable nodes representing a query
//! expression: constants, parameter references, member access, calls,
//! lambdas, operators, conditionals and record construction.
//!
//! # Invariants
//!
//! - Nodes are never mutated after construction
//! - Children are shared through `Arc`; a tree has no back-edges
//! - Parameter identity is the `ParamId`, never the name
//! - Every node is `Send + Sync`

pub mod builder;
mod builtins;
mod display;
mod node;
mod types;
mod value;

pub use builtins::{Builtin, SCALAR, SEQUENCE};
pub use node::{
    BinaryOp, Constructor, Expr, Lambda, Member, MemberStorage, Method, ParamId, Parameter,
    UnaryOp,
};
pub use types::TypeRef;
pub use value::{HostFn, HostObject, Value};
