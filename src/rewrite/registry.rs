//! Marker signature registry
//!
//! The two recognized marker methods are fixed at build time. The registry
//! is a `static` with no interior mutability, so concurrent rewrites can
//! read it without locking.

use crate::tree::{Method, TypeRef};

/// Declaring type of both marker methods
pub const PROJECTION: &str = "Projection";

/// The two marker forms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerForm {
    /// `source.project::<R>()`: binding taken from the enclosing scope
    Implicit,
    /// `source.project2::<R>(arg)`: binding supplied by `arg`
    Explicit,
}

impl MarkerForm {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerForm::Implicit => "implicit",
            MarkerForm::Explicit => "explicit",
        }
    }
}

/// Identity of one marker method
#[derive(Debug, PartialEq, Eq)]
pub struct MarkerSignature {
    pub form: MarkerForm,
    pub declaring: &'static str,
    pub name: &'static str,
    /// Explicit arguments, the receiver excluded
    pub explicit_args: usize,
}

impl MarkerSignature {
    /// Checks a call site against this signature.
    ///
    /// Matches on declaring type, name token, explicit arity, a single
    /// generic argument and the presence of a receiver.
    pub fn matches(&self, method: &Method, arg_count: usize, has_receiver: bool) -> bool {
        method.host.is_none()
            && method.is(self.declaring, self.name)
            && method.generic_args.len() == 1
            && arg_count == self.explicit_args
            && has_receiver
    }

    /// Builds the method identity for result type `result`
    pub fn method(&self, result: TypeRef) -> Method {
        Method::named(self.declaring, self.name, result.clone()).with_generic_args(vec![result])
    }
}

/// Read-only set of marker signatures
#[derive(Debug)]
pub struct MarkerRegistry {
    implicit: MarkerSignature,
    explicit: MarkerSignature,
}

/// Process-wide registry
pub static MARKERS: MarkerRegistry = MarkerRegistry {
    implicit: MarkerSignature {
        form: MarkerForm::Implicit,
        declaring: PROJECTION,
        name: "project",
        explicit_args: 0,
    },
    explicit: MarkerSignature {
        form: MarkerForm::Explicit,
        declaring: PROJECTION,
        name: "project2",
        explicit_args: 1,
    },
};

impl MarkerRegistry {
    pub fn implicit(&self) -> &MarkerSignature {
        &self.implicit
    }

    pub fn explicit(&self) -> &MarkerSignature {
        &self.explicit
    }

    /// All signatures
    pub fn signatures(&self) -> [&MarkerSignature; 2] {
        [&self.implicit, &self.explicit]
    }

    /// Finds the signature matching a call site
    pub fn lookup(
        &self,
        method: &Method,
        arg_count: usize,
        has_receiver: bool,
    ) -> Option<&MarkerSignature> {
        self.signatures()
            .into_iter()
            .find(|sig| sig.matches(method, arg_count, has_receiver))
    }

    /// Returns true if the method carries a marker name, whatever its shape.
    ///
    /// Used by translators to report leftover markers precisely.
    pub fn is_marker_name(&self, method: &Method) -> bool {
        self.signatures()
            .into_iter()
            .any(|sig| method.is(sig.declaring, sig.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_arity() {
        let implicit = MARKERS.implicit().method(TypeRef::Double);
        let explicit = MARKERS.explicit().method(TypeRef::String);

        assert_eq!(
            MARKERS.lookup(&implicit, 0, true).map(|s| s.form),
            Some(MarkerForm::Implicit)
        );
        assert_eq!(
            MARKERS.lookup(&explicit, 1, true).map(|s| s.form),
            Some(MarkerForm::Explicit)
        );
        // Wrong arity for the name
        assert!(MARKERS.lookup(&implicit, 1, true).is_none());
        assert!(MARKERS.lookup(&explicit, 0, true).is_none());
    }

    #[test]
    fn test_receiver_required() {
        let implicit = MARKERS.implicit().method(TypeRef::Double);
        assert!(MARKERS.lookup(&implicit, 0, false).is_none());
    }

    #[test]
    fn test_generic_argument_required() {
        let bare = Method::named(PROJECTION, "project", TypeRef::Double);
        assert!(MARKERS.lookup(&bare, 0, true).is_none());
        assert!(MARKERS.is_marker_name(&bare));
    }

    #[test]
    fn test_unrelated_method() {
        let m = Method::named("Sequence", "Select", TypeRef::Any).with_generic_args(vec![TypeRef::Int]);
        assert!(MARKERS.lookup(&m, 0, true).is_none());
        assert!(!MARKERS.is_marker_name(&m));
    }
}
