//! Sequence and scalar operators understood by execution collaborators

use super::node::Method;

/// Declaring type of the sequence operators
pub const SEQUENCE: &str = "Sequence";

/// Declaring type of scalar helper methods
pub const SCALAR: &str = "Scalar";

/// Operators a translator may support. Identified by declaring type and name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Where,
    Select,
    Average,
    Sum,
    Count,
    OrderBy,
    OrderByDescending,
    ToString,
}

impl Builtin {
    pub const ALL: [Builtin; 8] = [
        Builtin::Where,
        Builtin::Select,
        Builtin::Average,
        Builtin::Sum,
        Builtin::Count,
        Builtin::OrderBy,
        Builtin::OrderByDescending,
        Builtin::ToString,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Where => "Where",
            Builtin::Select => "Select",
            Builtin::Average => "Average",
            Builtin::Sum => "Sum",
            Builtin::Count => "Count",
            Builtin::OrderBy => "OrderBy",
            Builtin::OrderByDescending => "OrderByDescending",
            Builtin::ToString => "ToString",
        }
    }

    pub fn declaring(&self) -> &'static str {
        match self {
            Builtin::ToString => SCALAR,
            _ => SEQUENCE,
        }
    }

    /// Number of arguments the operator takes (the sequence included)
    pub fn arity(&self) -> usize {
        match self {
            Builtin::Count | Builtin::ToString => 1,
            _ => 2,
        }
    }

    /// Maps a method identity to an operator
    pub fn from_method(method: &Method) -> Option<Builtin> {
        if method.host.is_some() {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|b| method.is(b.declaring(), b.name()))
    }
}
