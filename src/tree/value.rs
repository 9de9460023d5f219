//! Host values held by constants and produced by rewrite-time evaluation

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::node::Lambda;
use super::types::TypeRef;

/// Value carried by a `Constant` node.
///
/// Scalars are translatable by the execution collaborator. `Lambda` and
/// `Object` only exist on the host side and must be gone (inlined or
/// evaluated away) before a tree is executed.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    /// A fully built lambda captured by the query
    Lambda(Arc<Lambda>),
    /// A host instance (or closure scope) with readable fields
    Object(Arc<HostObject>),
    /// Query root: a named collection of rows
    Collection { name: String, element: TypeRef },
}

impl Value {
    /// Wraps a lambda so it can be captured by a constant or stored in a field
    pub fn lambda(lambda: Lambda) -> Self {
        Value::Lambda(Arc::new(lambda))
    }

    /// Returns the static type of this value
    pub fn type_of(&self) -> TypeRef {
        match self {
            Value::Null => TypeRef::Any,
            Value::Bool(_) => TypeRef::Bool,
            Value::Int(_) => TypeRef::Int,
            Value::Double(_) => TypeRef::Double,
            Value::String(_) => TypeRef::String,
            Value::Lambda(l) => TypeRef::Expression(Box::new(l.function_type())),
            Value::Object(o) => TypeRef::Object(o.type_name.clone()),
            Value::Collection { element, .. } => TypeRef::sequence(element.clone()),
        }
    }

    /// Returns the lambda if this value holds one
    pub fn as_lambda(&self) -> Option<&Arc<Lambda>> {
        match self {
            Value::Lambda(l) => Some(l),
            _ => None,
        }
    }

    /// Returns true for values the execution collaborator can translate
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Double(_) | Value::String(_)
        )
    }

    /// Converts a scalar into a JSON value. Host-only values yield `None`.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            Value::Null => Some(serde_json::Value::Null),
            Value::Bool(b) => Some(serde_json::Value::Bool(*b)),
            Value::Int(i) => Some(serde_json::Value::from(*i)),
            Value::Double(d) => serde_json::Number::from_f64(*d).map(serde_json::Value::Number),
            Value::String(s) => Some(serde_json::Value::String(s.clone())),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// A host instance whose fields can be read while rewriting.
///
/// Models both ordinary objects holding expression fields and the closure
/// scope that captures local variables.
#[derive(Debug, Clone, PartialEq)]
pub struct HostObject {
    pub type_name: String,
    pub fields: BTreeMap<String, Value>,
}

impl HostObject {
    /// Creates an object with no fields
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Adds a field
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Reads a field
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Static type of this object
    pub fn type_ref(&self) -> TypeRef {
        TypeRef::Object(self.type_name.clone())
    }
}

type HostCallable = dyn Fn(Option<&Value>, &[Value]) -> Option<Value> + Send + Sync;

/// A host function that can be invoked at rewrite time.
///
/// Receives the evaluated receiver (for instance methods) and arguments.
/// Returns `None` when it cannot produce a value for the given inputs.
#[derive(Clone)]
pub struct HostFn {
    name: String,
    callable: Arc<HostCallable>,
}

impl HostFn {
    /// Wraps a closure as a named host function
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Option<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            callable: Arc::new(f),
        }
    }

    /// Function name (used in diagnostics)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invokes the function
    pub fn invoke(&self, receiver: Option<&Value>, args: &[Value]) -> Option<Value> {
        (self.callable)(receiver, args)
    }
}

impl PartialEq for HostFn {
    fn eq(&self, other: &Self) -> bool {
        // Identity of the closure, not of its output
        self.name == other.name
            && Arc::as_ptr(&self.callable) as *const () == Arc::as_ptr(&other.callable) as *const ()
    }
}

impl fmt::Debug for HostFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFn").field("name", &self.name).finish()
    }
}
