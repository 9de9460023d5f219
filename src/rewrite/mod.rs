//! Projection marker expansion
//!
//! Turns a query tree that contains `project`/`project2` markers into a
//! flat, marker-free tree that a query translator can consume.
//!
//! # Components
//!
//! - `registry`: the two marker signatures, fixed at build time
//! - `recognizer`: matches call nodes against the registry
//! - `resolver`: reduces a marker's source to a lambda on the host side
//! - `validator`: arity, result type and argument type checks
//! - `substitute`: splices a binding in place of the lambda's parameter
//! - `walker`: the `Rewriter` driving all of the above
//!
//! # Guarantees
//!
//! - Expansion is a pure function of the input tree and the host values
//!   reachable from it; the input is never mutated
//! - A successful expansion contains no marker calls
//! - Every failure is raised before the tree reaches a translator

mod config;
mod errors;
mod recognizer;
mod registry;
mod resolver;
mod substitute;
mod validator;
mod walker;

pub use config::{ConfigError, ConfigResult, RewriteConfig};
pub use errors::{RewriteError, RewriteErrorCode, RewriteResult, Severity};
pub use recognizer::{count_markers, is_marker, recognize, MarkerCall};
pub use registry::{MarkerForm, MarkerRegistry, MarkerSignature, MARKERS, PROJECTION};
pub use resolver::{bind_implicit, resolve_target, Resolvable, ResolvedTarget};
pub use substitute::{substitute, SubstitutionMap};
pub use validator::validate;
pub use walker::{ExpansionReport, Rewriter};
