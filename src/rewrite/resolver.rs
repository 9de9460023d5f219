//! Target resolution
//!
//! Reduces a marker's source expression to a concrete lambda by direct
//! evaluation on the host side: reading captured constants and fields and
//! invoking host functions. No row data exists at this point, so anything
//! that depends on a query parameter is unresolvable.

use std::sync::Arc;

use crate::tree::{Expr, HostFn, Lambda, Member, MemberStorage, Parameter, Value};

use super::errors::{RewriteError, RewriteResult};

/// A source expression that can be evaluated at rewrite time
#[derive(Debug)]
pub enum Resolvable<'a> {
    /// A constant captured by the query
    CapturedValue(&'a Value),
    /// A static field, or an instance field of a resolvable host object
    FieldRead {
        target: Option<Box<Resolvable<'a>>>,
        member: &'a Member,
    },
    /// A host function whose receiver and arguments are resolvable
    HostCall {
        receiver: Option<Box<Resolvable<'a>>>,
        function: &'a HostFn,
        args: Vec<Resolvable<'a>>,
    },
}

impl<'a> Resolvable<'a> {
    /// Classifies `expr`, or returns `None` if it cannot be evaluated here
    pub fn classify(expr: &'a Expr) -> Option<Self> {
        match expr {
            Expr::Constant { value, .. } => Some(Resolvable::CapturedValue(value)),
            Expr::Member {
                target: None,
                member,
            } if member.is_static() => Some(Resolvable::FieldRead {
                target: None,
                member,
            }),
            Expr::Member {
                target: Some(target),
                member,
            } => Some(Resolvable::FieldRead {
                target: Some(Box::new(Self::classify(target)?)),
                member,
            }),
            Expr::Call {
                target,
                method,
                args,
            } => {
                let function = method.host.as_ref()?;
                let receiver = match target {
                    Some(t) => Some(Box::new(Self::classify(t)?)),
                    None => None,
                };
                let args = args
                    .iter()
                    .map(|a| Self::classify(a))
                    .collect::<Option<Vec<_>>>()?;
                Some(Resolvable::HostCall {
                    receiver,
                    function,
                    args,
                })
            }
            _ => None,
        }
    }

    /// Kind name used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Resolvable::CapturedValue(_) => "captured value",
            Resolvable::FieldRead { target: None, .. } => "static field",
            Resolvable::FieldRead { .. } => "instance field",
            Resolvable::HostCall { .. } => "host call",
        }
    }

    /// Evaluates on the host side
    pub fn evaluate(&self) -> RewriteResult<Value> {
        match self {
            Resolvable::CapturedValue(value) => Ok((*value).clone()),
            Resolvable::FieldRead { target, member } => match (target, &member.storage) {
                (None, MemberStorage::Static(value)) => Ok(value.clone()),
                (None, MemberStorage::Instance) => Err(RewriteError::unresolvable_target(format!(
                    "Instance field '{}.{}' has no receiver",
                    member.declaring, member.name
                ))),
                (Some(target), _) => match target.evaluate()? {
                    Value::Object(object) => object.field(&member.name).cloned().ok_or_else(|| {
                        RewriteError::unresolvable_target(format!(
                            "Host object '{}' has no field '{}'",
                            object.type_name, member.name
                        ))
                    }),
                    other => Err(RewriteError::unresolvable_target(format!(
                        "Cannot read field '{}' from a value of type '{}'",
                        member.name,
                        other.type_of()
                    ))),
                },
            },
            Resolvable::HostCall {
                receiver,
                function,
                args,
            } => {
                let receiver = match receiver {
                    Some(r) => Some(r.evaluate()?),
                    None => None,
                };
                let args = args
                    .iter()
                    .map(|a| a.evaluate())
                    .collect::<RewriteResult<Vec<_>>>()?;
                function.invoke(receiver.as_ref(), &args).ok_or_else(|| {
                    RewriteError::unresolvable_target(format!(
                        "Host function '{}' returned no value",
                        function.name()
                    ))
                })
            }
        }
    }
}

/// The lambda a marker resolves to
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub lambda: Arc<Lambda>,
    /// How the lambda was obtained
    pub kind: &'static str,
}

/// Resolves a marker's source expression to a lambda
pub fn resolve_target(source: &Expr) -> RewriteResult<ResolvedTarget> {
    let Some(resolvable) = Resolvable::classify(source) else {
        if let Some(name) = first_parameter(source) {
            return Err(RewriteError::unresolvable_target(format!(
                "'{}' depends on query parameter '{}'; only expressions visible outside the query can be projected",
                source, name
            )));
        }
        return Err(RewriteError::unresolvable_target(format!(
            "'{}' ({}) is not a captured value, field read or host call",
            source,
            source.kind()
        )));
    };

    match resolvable.evaluate()? {
        Value::Lambda(lambda) => Ok(ResolvedTarget {
            lambda,
            kind: resolvable.kind(),
        }),
        other => Err(RewriteError::unresolvable_target(format!(
            "'{}' evaluates to a value of type '{}', not an expression",
            source,
            other.type_of()
        ))),
    }
}

/// Finds the single in-scope parameter matching the lambda's parameter type
pub fn bind_implicit(lambda: &Lambda, scope: &[Parameter]) -> RewriteResult<Arc<Expr>> {
    let Some(formal) = lambda.params.first() else {
        return Err(RewriteError::arity_mismatch(0));
    };
    let candidates: Vec<&Parameter> = scope.iter().filter(|p| p.ty == formal.ty).collect();
    match candidates.as_slice() {
        [only] => Ok(Arc::new(Expr::Parameter((*only).clone()))),
        _ => Err(RewriteError::parameter_binding(&formal.ty, candidates.len())),
    }
}

fn first_parameter(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Parameter(p) => Some(p.name.as_str()),
        _ => expr.children().into_iter().find_map(|c| first_parameter(c)),
    }
}
