//! Static types carried by expression nodes
//!
//! Every node knows its type. The rewriter compares these when validating
//! a marker against the lambda it resolves to, so equality here is strict
//! structural equality.

use std::fmt;

use serde::Serialize;

/// Static type of an expression node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TypeRef {
    /// Accepts any value (top type)
    Any,
    Bool,
    Int,
    Double,
    String,
    /// Row type known to the execution collaborator
    Entity(String),
    /// Host type whose instances only exist at rewrite time
    Object(String),
    /// Anonymous record produced by a `New` node
    Anonymous(Vec<(String, TypeRef)>),
    /// Sequence of elements
    Sequence(Box<TypeRef>),
    /// Function (delegate) type
    Function {
        params: Vec<TypeRef>,
        ret: Box<TypeRef>,
    },
    /// Quoted lambda held as a value
    Expression(Box<TypeRef>),
}

impl TypeRef {
    /// Row type by name
    pub fn entity(name: impl Into<String>) -> Self {
        TypeRef::Entity(name.into())
    }

    /// Host object type by name
    pub fn object(name: impl Into<String>) -> Self {
        TypeRef::Object(name.into())
    }

    /// Sequence of `element`
    pub fn sequence(element: TypeRef) -> Self {
        TypeRef::Sequence(Box::new(element))
    }

    /// Function type `(params) -> ret`
    pub fn function(params: Vec<TypeRef>, ret: TypeRef) -> Self {
        TypeRef::Function {
            params,
            ret: Box::new(ret),
        }
    }

    /// Quoted function type, the static type of a stored lambda
    pub fn expression(params: Vec<TypeRef>, ret: TypeRef) -> Self {
        TypeRef::Expression(Box::new(TypeRef::function(params, ret)))
    }

    /// Returns the element type if this is a sequence
    pub fn element(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Sequence(elem) => Some(&**elem),
            _ => None,
        }
    }

    /// Returns true for `Int` and `Double`
    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeRef::Int | TypeRef::Double)
    }

    /// Returns the type of a named field of an anonymous record
    pub fn anonymous_field(&self, name: &str) -> Option<&TypeRef> {
        match self {
            TypeRef::Anonymous(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, t)| t),
            _ => None,
        }
    }

    /// Checks whether a value of type `source` may be bound where `self`
    /// is expected.
    ///
    /// Rules: identical types; `Any` accepts everything; sequences are
    /// covariant in their element type. There is no numeric widening.
    pub fn is_assignable_from(&self, source: &TypeRef) -> bool {
        if self == source {
            return true;
        }
        match (self, source) {
            (TypeRef::Any, _) => true,
            (TypeRef::Sequence(target), TypeRef::Sequence(src)) => target.is_assignable_from(src),
            _ => false,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Any => write!(f, "any"),
            TypeRef::Bool => write!(f, "bool"),
            TypeRef::Int => write!(f, "int"),
            TypeRef::Double => write!(f, "double"),
            TypeRef::String => write!(f, "string"),
            TypeRef::Entity(name) | TypeRef::Object(name) => write!(f, "{}", name),
            TypeRef::Anonymous(fields) => {
                write!(f, "{{ ")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, ty)?;
                }
                write!(f, " }}")
            }
            TypeRef::Sequence(elem) => write!(f, "seq<{}>", elem),
            TypeRef::Function { params, ret } => {
                write!(f, "fn(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") -> {}", ret)
            }
            TypeRef::Expression(func) => write!(f, "expr<{}>", func),
        }
    }
}
