//! Expression node variants
//!
//! Nodes are immutable. Children are held in `Arc` so that a rewrite can
//! hand back untouched subtrees without copying them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::types::TypeRef;
use super::value::{HostFn, Value};

static NEXT_PARAM_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique parameter identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamId(u64);

impl ParamId {
    fn fresh() -> Self {
        ParamId(NEXT_PARAM_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Formal parameter of a lambda. Identity is the id, never the name.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub id: ParamId,
    pub name: String,
    pub ty: TypeRef,
}

impl Parameter {
    /// Creates a parameter with a fresh id
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            id: ParamId::fresh(),
            name: name.into(),
            ty,
        }
    }
}

/// Where a member's value comes from
#[derive(Debug, Clone, PartialEq)]
pub enum MemberStorage {
    /// Read from the receiver (row data or host object)
    Instance,
    /// Static slot holding its value; accessed without a receiver
    Static(Value),
}

/// Field or property identity
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub declaring: String,
    pub name: String,
    pub ty: TypeRef,
    pub storage: MemberStorage,
}

impl Member {
    /// Instance member of `declaring`
    pub fn instance(declaring: impl Into<String>, name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            declaring: declaring.into(),
            name: name.into(),
            ty,
            storage: MemberStorage::Instance,
        }
    }

    /// Static member of `declaring` holding `value`
    pub fn static_field(declaring: impl Into<String>, name: impl Into<String>, value: Value) -> Self {
        Self {
            declaring: declaring.into(),
            name: name.into(),
            ty: value.type_of(),
            storage: MemberStorage::Static(value),
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self.storage, MemberStorage::Static(_))
    }
}

/// Method identity
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub declaring: String,
    pub name: String,
    pub generic_args: Vec<TypeRef>,
    pub return_type: TypeRef,
    /// Present when the method can be invoked at rewrite time
    pub host: Option<HostFn>,
}

impl Method {
    /// Method known by identity only (translated by the collaborator)
    pub fn named(declaring: impl Into<String>, name: impl Into<String>, return_type: TypeRef) -> Self {
        Self {
            declaring: declaring.into(),
            name: name.into(),
            generic_args: Vec::new(),
            return_type,
            host: None,
        }
    }

    /// Method backed by a host function
    pub fn host(declaring: impl Into<String>, return_type: TypeRef, f: HostFn) -> Self {
        Self {
            declaring: declaring.into(),
            name: f.name().to_string(),
            generic_args: Vec::new(),
            return_type,
            host: Some(f),
        }
    }

    /// Adds generic arguments
    pub fn with_generic_args(mut self, args: Vec<TypeRef>) -> Self {
        self.generic_args = args;
        self
    }

    /// Returns true if this method names `declaring.name`
    pub fn is(&self, declaring: &str, name: &str) -> bool {
        self.declaring == declaring && self.name == name
    }
}

/// Lambda expression
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub params: Vec<Parameter>,
    pub body: Arc<Expr>,
    pub ret: TypeRef,
}

impl Lambda {
    /// Creates a lambda whose return type is the type of its body
    pub fn new(params: Vec<Parameter>, body: Arc<Expr>) -> Self {
        let ret = body.ty();
        Self { params, body, ret }
    }

    /// Number of formal parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Function type of this lambda
    pub fn function_type(&self) -> TypeRef {
        TypeRef::function(
            self.params.iter().map(|p| p.ty.clone()).collect(),
            self.ret.clone(),
        )
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    AndAlso,
    OrElse,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEqual => ">=",
            BinaryOp::AndAlso => "&&",
            BinaryOp::OrElse => "||",
        }
    }

    /// Returns true for operators producing a boolean
    pub fn is_predicate(&self) -> bool {
        !matches!(
            self,
            BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide
        )
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Negate,
    /// Conversion to the node's type
    Convert,
}

/// Constructor of an anonymous or named record
#[derive(Debug, Clone, PartialEq)]
pub struct Constructor {
    pub ty: TypeRef,
    /// Member names, one per constructor argument
    pub members: Vec<String>,
}

/// Query expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant {
        value: Value,
        ty: TypeRef,
    },
    Parameter(Parameter),
    Member {
        target: Option<Arc<Expr>>,
        member: Member,
    },
    Call {
        target: Option<Arc<Expr>>,
        method: Method,
        args: Vec<Arc<Expr>>,
    },
    Lambda(Lambda),
    Binary {
        op: BinaryOp,
        left: Arc<Expr>,
        right: Arc<Expr>,
        ty: TypeRef,
    },
    Unary {
        op: UnaryOp,
        operand: Arc<Expr>,
        ty: TypeRef,
    },
    Conditional {
        test: Arc<Expr>,
        then: Arc<Expr>,
        otherwise: Arc<Expr>,
        ty: TypeRef,
    },
    New {
        ctor: Constructor,
        args: Vec<Arc<Expr>>,
    },
}

impl Expr {
    /// Static type of this node
    pub fn ty(&self) -> TypeRef {
        match self {
            Expr::Constant { ty, .. } => ty.clone(),
            Expr::Parameter(p) => p.ty.clone(),
            Expr::Member { member, .. } => member.ty.clone(),
            Expr::Call { method, .. } => method.return_type.clone(),
            Expr::Lambda(l) => l.function_type(),
            Expr::Binary { ty, .. } => ty.clone(),
            Expr::Unary { ty, .. } => ty.clone(),
            Expr::Conditional { ty, .. } => ty.clone(),
            Expr::New { ctor, .. } => ctor.ty.clone(),
        }
    }

    /// Short node-kind name used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Expr::Constant { .. } => "Constant",
            Expr::Parameter(_) => "Parameter",
            Expr::Member { .. } => "MemberAccess",
            Expr::Call { .. } => "Call",
            Expr::Lambda(_) => "Lambda",
            Expr::Binary { .. } => "Binary",
            Expr::Unary { .. } => "Unary",
            Expr::Conditional { .. } => "Conditional",
            Expr::New { .. } => "New",
        }
    }

    /// Returns the lambda if this node is one
    pub fn as_lambda(&self) -> Option<&Lambda> {
        match self {
            Expr::Lambda(l) => Some(l),
            _ => None,
        }
    }

    /// Direct children in evaluation order
    pub fn children(&self) -> Vec<&Arc<Expr>> {
        match self {
            Expr::Constant { .. } | Expr::Parameter(_) => Vec::new(),
            Expr::Member { target, .. } => target.iter().collect(),
            Expr::Call { target, args, .. } => target.iter().chain(args.iter()).collect(),
            Expr::Lambda(l) => vec![&l.body],
            Expr::Binary { left, right, .. } => vec![left, right],
            Expr::Unary { operand, .. } => vec![operand],
            Expr::Conditional {
                test,
                then,
                otherwise,
                ..
            } => vec![test, then, otherwise],
            Expr::New { args, .. } => args.iter().collect(),
        }
    }

    /// Rebuilds `node` with each direct child replaced by `f(child)`.
    ///
    /// If `f` hands back every child unchanged (same `Arc`), the original
    /// node is returned without allocating.
    pub fn map_children<E, F>(node: &Arc<Expr>, mut f: F) -> Result<Arc<Expr>, E>
    where
        F: FnMut(&Arc<Expr>) -> Result<Arc<Expr>, E>,
    {
        let mut changed = false;
        let mut visit = |child: &Arc<Expr>| -> Result<Arc<Expr>, E> {
            let new = f(child)?;
            changed |= !Arc::ptr_eq(child, &new);
            Ok(new)
        };

        let rebuilt = match &**node {
            Expr::Constant { .. } | Expr::Parameter(_) => return Ok(Arc::clone(node)),
            Expr::Member { target, member } => Expr::Member {
                target: target.as_ref().map(&mut visit).transpose()?,
                member: member.clone(),
            },
            Expr::Call {
                target,
                method,
                args,
            } => Expr::Call {
                target: target.as_ref().map(&mut visit).transpose()?,
                method: method.clone(),
                args: args.iter().map(&mut visit).collect::<Result<_, E>>()?,
            },
            Expr::Lambda(l) => Expr::Lambda(Lambda {
                params: l.params.clone(),
                body: visit(&l.body)?,
                ret: l.ret.clone(),
            }),
            Expr::Binary {
                op,
                left,
                right,
                ty,
            } => Expr::Binary {
                op: *op,
                left: visit(left)?,
                right: visit(right)?,
                ty: ty.clone(),
            },
            Expr::Unary { op, operand, ty } => Expr::Unary {
                op: *op,
                operand: visit(operand)?,
                ty: ty.clone(),
            },
            Expr::Conditional {
                test,
                then,
                otherwise,
                ty,
            } => Expr::Conditional {
                test: visit(test)?,
                then: visit(then)?,
                otherwise: visit(otherwise)?,
                ty: ty.clone(),
            },
            Expr::New { ctor, args } => Expr::New {
                ctor: ctor.clone(),
                args: args.iter().map(&mut visit).collect::<Result<_, E>>()?,
            },
        };

        if changed {
            Ok(Arc::new(rebuilt))
        } else {
            Ok(Arc::clone(node))
        }
    }

    /// Returns true if any node in this tree satisfies `pred`
    pub fn any(&self, pred: &dyn Fn(&Expr) -> bool) -> bool {
        pred(self) || self.children().into_iter().any(|c| c.any(pred))
    }

    /// Counts the nodes in this tree satisfying `pred`
    pub fn count(&self, pred: &dyn Fn(&Expr) -> bool) -> usize {
        let own = usize::from(pred(self));
        own + self
            .children()
            .into_iter()
            .map(|c| c.count(pred))
            .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str) -> Parameter {
        Parameter::new(name, TypeRef::entity("User"))
    }

    #[test]
    fn test_param_ids_are_unique() {
        let a = param("u");
        let b = param("u");
        assert_ne!(a.id, b.id);
        assert_ne!(a, b);
    }

    #[test]
    fn test_lambda_types() {
        let p = param("u");
        let body = Arc::new(Expr::Member {
            target: Some(Arc::new(Expr::Parameter(p.clone()))),
            member: Member::instance("User", "Name", TypeRef::String),
        });
        let lambda = Lambda::new(vec![p], body);

        assert_eq!(lambda.arity(), 1);
        assert_eq!(lambda.ret, TypeRef::String);
        assert_eq!(
            Expr::Lambda(lambda).ty(),
            TypeRef::function(vec![TypeRef::entity("User")], TypeRef::String)
        );
    }

    #[test]
    fn test_children_and_count() {
        let p = param("u");
        let name = Arc::new(Expr::Member {
            target: Some(Arc::new(Expr::Parameter(p))),
            member: Member::instance("User", "Name", TypeRef::String),
        });
        let suffix = Arc::new(Expr::Constant {
            value: Value::from("-x"),
            ty: TypeRef::String,
        });
        let concat = Expr::Binary {
            op: BinaryOp::Add,
            left: name,
            right: suffix,
            ty: TypeRef::String,
        };

        assert_eq!(concat.children().len(), 2);
        assert_eq!(concat.count(&|e| matches!(e, Expr::Parameter(_))), 1);
        assert!(concat.any(&|e| matches!(e, Expr::Constant { .. })));
    }

    #[test]
    fn test_map_children_preserves_identity() {
        let p = param("u");
        let tree = Arc::new(Expr::Member {
            target: Some(Arc::new(Expr::Parameter(p))),
            member: Member::instance("User", "Name", TypeRef::String),
        });

        let same = Expr::map_children(&tree, |c| Ok::<_, ()>(Arc::clone(c))).unwrap();
        assert!(Arc::ptr_eq(&tree, &same));

        let replaced = Expr::map_children(&tree, |_| {
            Ok::<_, ()>(Arc::new(Expr::Constant {
                value: Value::Null,
                ty: TypeRef::entity("User"),
            }))
        })
        .unwrap();
        assert!(!Arc::ptr_eq(&tree, &replaced));
        assert_eq!(replaced.count(&|e| matches!(e, Expr::Parameter(_))), 0);
    }

    #[test]
    fn test_static_member_type_from_value() {
        let m = Member::static_field("Limits", "Max", Value::Int(10));
        assert!(m.is_static());
        assert_eq!(m.ty, TypeRef::Int);
    }

    #[test]
    fn test_predicate_ops() {
        assert!(BinaryOp::LessThan.is_predicate());
        assert!(!BinaryOp::Add.is_predicate());
        assert_eq!(BinaryOp::GreaterThanOrEqual.symbol(), ">=");
    }
}
