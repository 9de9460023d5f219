//! Parameter substitution
//!
//! Splices a binding expression in place of every reference to a lambda's
//! formal parameter. The binding is inserted structurally; neither side is
//! evaluated.

use std::convert::Infallible;
use std::sync::Arc;

use crate::tree::{Expr, Lambda, ParamId};

/// Single binding from a formal parameter to its replacement
#[derive(Debug, Clone)]
pub struct SubstitutionMap {
    parameter: ParamId,
    binding: Arc<Expr>,
}

impl SubstitutionMap {
    pub fn new(parameter: ParamId, binding: Arc<Expr>) -> Self {
        Self { parameter, binding }
    }

    /// Applies the binding to `node`, sharing every untouched subtree
    pub fn apply(&self, node: &Arc<Expr>) -> Arc<Expr> {
        match &**node {
            Expr::Parameter(p) if p.id == self.parameter => Arc::clone(&self.binding),
            _ => match Expr::map_children(node, |child| Ok::<_, Infallible>(self.apply(child))) {
                Ok(rebuilt) => rebuilt,
                Err(never) => match never {},
            },
        }
    }
}

/// Returns the body of a single-parameter `lambda` with its parameter
/// replaced by `binding`.
///
/// Callers validate arity first; a lambda without parameters yields its
/// body unchanged.
pub fn substitute(lambda: &Lambda, binding: Arc<Expr>) -> Arc<Expr> {
    match lambda.params.first() {
        Some(formal) => SubstitutionMap::new(formal.id, binding).apply(&lambda.body),
        None => Arc::clone(&lambda.body),
    }
}
