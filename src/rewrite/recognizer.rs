//! Marker recognition
//!
//! Pure pattern match of call nodes against the static marker registry.

use std::sync::Arc;

use crate::tree::{Expr, TypeRef};

use super::registry::{MarkerForm, MARKERS};

/// A recognized marker call site, borrowing from the tree
#[derive(Debug, Clone, Copy)]
pub struct MarkerCall<'a> {
    pub form: MarkerForm,
    /// Declared generic result type `R`
    pub result_type: &'a TypeRef,
    /// Receiver expression that must reduce to a lambda
    pub source: &'a Arc<Expr>,
    /// Binding supplied by the explicit form
    pub argument: Option<&'a Arc<Expr>>,
    /// The whole call node
    pub node: &'a Expr,
}

/// Returns the marker call if `node` is one of the two marker forms
pub fn recognize(node: &Expr) -> Option<MarkerCall<'_>> {
    let Expr::Call {
        target,
        method,
        args,
    } = node
    else {
        return None;
    };
    let sig = MARKERS.lookup(method, args.len(), target.is_some())?;
    let source = target.as_ref()?;
    let result_type = method.generic_args.first()?;

    Some(MarkerCall {
        form: sig.form,
        result_type,
        source,
        argument: match sig.form {
            MarkerForm::Implicit => None,
            MarkerForm::Explicit => args.first(),
        },
        node,
    })
}

/// Returns true if `node` is a marker call
pub fn is_marker(node: &Expr) -> bool {
    recognize(node).is_some()
}

/// Counts marker calls anywhere in a tree
pub fn count_markers(tree: &Expr) -> usize {
    tree.count(&is_marker)
}
