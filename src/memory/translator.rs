//! Translation check
//!
//! Accepts only what a row store can execute: scalar constants, collection
//! roots, bound parameters, instance member reads, the builtin operators
//! and plain operators. Host values, host calls, static members and any
//! unknown method (projection markers included) are untranslatable.

use crate::provider::{QueryError, QueryResult};
use crate::tree::{Builtin, Expr, ParamId, Value};

/// Checks that a tree can be executed
pub struct Translator;

impl Translator {
    pub fn check(tree: &Expr) -> QueryResult<()> {
        let mut bound = Vec::new();
        Self::check_node(tree, &mut bound)
    }

    fn check_node(node: &Expr, bound: &mut Vec<ParamId>) -> QueryResult<()> {
        match node {
            Expr::Constant { value, .. } => match value {
                Value::Collection { .. } => Ok(()),
                v if v.is_scalar() => Ok(()),
                other => Err(untranslatable(format!(
                    "Constant '{}' of type '{}' has no row-store equivalent",
                    other,
                    other.type_of()
                ))),
            },
            Expr::Parameter(p) => {
                if bound.contains(&p.id) {
                    Ok(())
                } else {
                    Err(untranslatable(format!("Parameter '{}' is not bound", p.name)))
                }
            }
            Expr::Member { target: None, member } => Err(untranslatable(format!(
                "Static member '{}.{}' cannot be translated",
                member.declaring, member.name
            ))),
            Expr::Call { method, args, .. } => {
                if let Some(host) = &method.host {
                    return Err(untranslatable(format!(
                        "Host method '{}.{}' cannot be translated",
                        method.declaring,
                        host.name()
                    )));
                }
                let Some(op) = Builtin::from_method(method) else {
                    return Err(untranslatable(format!(
                        "Method '{}.{}' is not supported",
                        method.declaring, method.name
                    )));
                };
                if args.len() != op.arity() {
                    return Err(untranslatable(format!(
                        "'{}' takes {} arguments, found {}",
                        op.name(),
                        op.arity(),
                        args.len()
                    )));
                }
                if op.arity() == 2 && args[1].as_lambda().map(|l| l.arity()) != Some(1) {
                    return Err(untranslatable(format!(
                        "'{}' expects an inline single-parameter lambda",
                        op.name()
                    )));
                }
                Self::check_children(node, bound)
            }
            Expr::Lambda(l) => {
                let mark = bound.len();
                bound.extend(l.params.iter().map(|p| p.id));
                let result = Self::check_node(&l.body, bound);
                bound.truncate(mark);
                result
            }
            _ => Self::check_children(node, bound),
        }
    }

    fn check_children(node: &Expr, bound: &mut Vec<ParamId>) -> QueryResult<()> {
        node.children()
            .into_iter()
            .try_for_each(|child| Self::check_node(child, bound))
    }
}

fn untranslatable(reason: String) -> QueryError {
    QueryError::UntranslatableTree(reason)
}
