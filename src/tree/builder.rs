//! Embedded query DSL
//!
//! Helpers that construct expression trees the way a query author writes
//! them, including the two projection markers `project` and `project2`.
//!
//! ```ignore
//! let user_label = lambda("user", TypeRef::entity("User"), |u| {
//!     add(field(&u, "Name", TypeRef::String), constant("-suffix"))
//! });
//! let slot = captured(user_label);
//! let selector = lambda("project", TypeRef::entity("Project"), |p| {
//!     project2(slot.clone(), field(&p, "CreatedBy", TypeRef::entity("User")), TypeRef::String)
//! });
//! ```

use std::sync::Arc;

use crate::rewrite::MARKERS;

use super::builtins::Builtin;
use super::node::{BinaryOp, Constructor, Expr, Lambda, Member, Method, Parameter, UnaryOp};
use super::types::TypeRef;
use super::value::{HostFn, HostObject, Value};

/// Scalar constant
pub fn constant(value: impl Into<Value>) -> Arc<Expr> {
    let value = value.into();
    let ty = value.type_of();
    Arc::new(Expr::Constant { value, ty })
}

/// Constant holding a captured lambda (a local variable captured by the query)
pub fn captured(lambda: Lambda) -> Arc<Expr> {
    constant_value(Value::lambda(lambda))
}

/// Constant holding any value
pub fn constant_value(value: Value) -> Arc<Expr> {
    let ty = value.type_of();
    Arc::new(Expr::Constant { value, ty })
}

/// Constant holding a host object
pub fn host_object(object: HostObject) -> Arc<Expr> {
    constant_value(Value::Object(Arc::new(object)))
}

/// Reference to a parameter
pub fn param_ref(param: &Parameter) -> Arc<Expr> {
    Arc::new(Expr::Parameter(param.clone()))
}

/// Instance member access; the declaring type is the target's static type
pub fn field(target: &Arc<Expr>, name: &str, ty: TypeRef) -> Arc<Expr> {
    let declaring = target.ty().to_string();
    Arc::new(Expr::Member {
        target: Some(Arc::clone(target)),
        member: Member::instance(declaring, name, ty),
    })
}

/// Static field read
pub fn static_field(declaring: &str, name: &str, value: Value) -> Arc<Expr> {
    Arc::new(Expr::Member {
        target: None,
        member: Member::static_field(declaring, name, value),
    })
}

/// Call of a host function (static when `target` is `None`)
pub fn host_call(
    target: Option<Arc<Expr>>,
    declaring: &str,
    return_type: TypeRef,
    f: HostFn,
    args: Vec<Arc<Expr>>,
) -> Arc<Expr> {
    Arc::new(Expr::Call {
        target,
        method: Method::host(declaring, return_type, f),
        args,
    })
}

/// Builds a single-parameter lambda; `body` receives the parameter reference
pub fn lambda(name: &str, ty: TypeRef, body: impl FnOnce(Arc<Expr>) -> Arc<Expr>) -> Lambda {
    let param = Parameter::new(name, ty);
    let body = body(param_ref(&param));
    Lambda::new(vec![param], body)
}

/// Lambda as a node
pub fn lambda_expr(lambda: Lambda) -> Arc<Expr> {
    Arc::new(Expr::Lambda(lambda))
}

/// Binary operation with the result type inferred from the operands.
///
/// Comparison and logical operators yield `bool`. Arithmetic yields
/// `string` if either side is a string (concatenation), `double` if
/// either side is a double, otherwise the left operand's type.
pub fn binary(op: BinaryOp, left: Arc<Expr>, right: Arc<Expr>) -> Arc<Expr> {
    let ty = if op.is_predicate() {
        TypeRef::Bool
    } else {
        let (l, r) = (left.ty(), right.ty());
        if l == TypeRef::String || r == TypeRef::String {
            TypeRef::String
        } else if l == TypeRef::Double || r == TypeRef::Double {
            TypeRef::Double
        } else {
            l
        }
    };
    Arc::new(Expr::Binary {
        op,
        left,
        right,
        ty,
    })
}

pub fn add(left: Arc<Expr>, right: Arc<Expr>) -> Arc<Expr> {
    binary(BinaryOp::Add, left, right)
}

pub fn lt(left: Arc<Expr>, right: Arc<Expr>) -> Arc<Expr> {
    binary(BinaryOp::LessThan, left, right)
}

pub fn eq(left: Arc<Expr>, right: Arc<Expr>) -> Arc<Expr> {
    binary(BinaryOp::Equal, left, right)
}

/// Logical negation
pub fn not(operand: Arc<Expr>) -> Arc<Expr> {
    Arc::new(Expr::Unary {
        op: UnaryOp::Not,
        operand,
        ty: TypeRef::Bool,
    })
}

/// Conversion to `ty`
pub fn convert(operand: Arc<Expr>, ty: TypeRef) -> Arc<Expr> {
    Arc::new(Expr::Unary {
        op: UnaryOp::Convert,
        operand,
        ty,
    })
}

/// `test ? then : otherwise`, typed after `then`
pub fn conditional(test: Arc<Expr>, then: Arc<Expr>, otherwise: Arc<Expr>) -> Arc<Expr> {
    let ty = then.ty();
    Arc::new(Expr::Conditional {
        test,
        then,
        otherwise,
        ty,
    })
}

/// Anonymous record `new { name = value, .. }`
pub fn new_object(fields: Vec<(&str, Arc<Expr>)>) -> Arc<Expr> {
    let ty = TypeRef::Anonymous(
        fields
            .iter()
            .map(|(name, e)| (name.to_string(), e.ty()))
            .collect(),
    );
    let members = fields.iter().map(|(name, _)| name.to_string()).collect();
    let args = fields.into_iter().map(|(_, e)| e).collect();
    Arc::new(Expr::New {
        ctor: Constructor { ty, members },
        args,
    })
}

/// Implicit-form marker: `source.project::<R>()`
pub fn project(source: Arc<Expr>, result: TypeRef) -> Arc<Expr> {
    Arc::new(Expr::Call {
        target: Some(source),
        method: MARKERS.implicit().method(result),
        args: Vec::new(),
    })
}

/// Explicit-form marker: `source.project2::<R>(argument)`
pub fn project2(source: Arc<Expr>, argument: Arc<Expr>, result: TypeRef) -> Arc<Expr> {
    Arc::new(Expr::Call {
        target: Some(source),
        method: MARKERS.explicit().method(result),
        args: vec![argument],
    })
}

fn sequence_op(op: Builtin, return_type: TypeRef, args: Vec<Arc<Expr>>) -> Arc<Expr> {
    Arc::new(Expr::Call {
        target: None,
        method: Method::named(op.declaring(), op.name(), return_type),
        args,
    })
}

/// `source.Where(predicate)`
pub fn where_(source: Arc<Expr>, predicate: Lambda) -> Arc<Expr> {
    let ty = source.ty();
    sequence_op(Builtin::Where, ty, vec![source, lambda_expr(predicate)])
}

/// `source.Select(selector)`
pub fn select(source: Arc<Expr>, selector: Lambda) -> Arc<Expr> {
    let ty = TypeRef::sequence(selector.ret.clone());
    sequence_op(Builtin::Select, ty, vec![source, lambda_expr(selector)])
}

/// `source.Average(selector)`
pub fn average(source: Arc<Expr>, selector: Lambda) -> Arc<Expr> {
    sequence_op(Builtin::Average, TypeRef::Double, vec![source, lambda_expr(selector)])
}

/// `source.Sum(selector)`
pub fn sum(source: Arc<Expr>, selector: Lambda) -> Arc<Expr> {
    let ty = selector.ret.clone();
    sequence_op(Builtin::Sum, ty, vec![source, lambda_expr(selector)])
}

/// `source.Count()`
pub fn count(source: Arc<Expr>) -> Arc<Expr> {
    sequence_op(Builtin::Count, TypeRef::Int, vec![source])
}

/// `source.OrderBy(key)`
pub fn order_by(source: Arc<Expr>, key: Lambda) -> Arc<Expr> {
    let ty = source.ty();
    sequence_op(Builtin::OrderBy, ty, vec![source, lambda_expr(key)])
}

/// `source.OrderByDescending(key)`
pub fn order_by_descending(source: Arc<Expr>, key: Lambda) -> Arc<Expr> {
    let ty = source.ty();
    sequence_op(Builtin::OrderByDescending, ty, vec![source, lambda_expr(key)])
}

/// `value.ToString()`
pub fn to_string(value: Arc<Expr>) -> Arc<Expr> {
    sequence_op(Builtin::ToString, TypeRef::String, vec![value])
}
