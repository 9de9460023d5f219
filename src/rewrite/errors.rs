//! Rewrite error types
//!
//! Error codes:
//! - PROJ_UNRESOLVABLE_TARGET (REJECT)
//! - PROJ_PARAMETER_BINDING (REJECT)
//! - PROJ_TYPE_MISMATCH (REJECT)
//! - PROJ_PARAMETER_TYPE_MISMATCH (REJECT)
//! - PROJ_REWRITE_DEPTH_EXCEEDED (REJECT)
//!
//! All rewrite failures are deterministic: retrying the same tree yields
//! the same error.

use std::fmt;

/// Severity levels for rewrite errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Query construction rejected
    Reject,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
        }
    }
}

/// Rewrite error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RewriteErrorCode {
    /// Marker source cannot be reduced to a lambda at rewrite time
    UnresolvableTarget,
    /// Implicit form found zero or several candidate parameters
    AmbiguousOrMissingParameterBinding,
    /// Declared result type differs from the lambda's return type
    TypeMismatch,
    /// Explicit binding not assignable to the lambda's parameter
    ParameterTypeMismatch,
    /// Nested expansion exceeded the depth bound or looped
    RewriteDepthExceeded,
}

impl RewriteErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            RewriteErrorCode::UnresolvableTarget => "PROJ_UNRESOLVABLE_TARGET",
            RewriteErrorCode::AmbiguousOrMissingParameterBinding => "PROJ_PARAMETER_BINDING",
            RewriteErrorCode::TypeMismatch => "PROJ_TYPE_MISMATCH",
            RewriteErrorCode::ParameterTypeMismatch => "PROJ_PARAMETER_TYPE_MISMATCH",
            RewriteErrorCode::RewriteDepthExceeded => "PROJ_REWRITE_DEPTH_EXCEEDED",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        Severity::Reject
    }

    /// Returns the rule violated by this error
    pub fn rule(&self) -> &'static str {
        match self {
            RewriteErrorCode::UnresolvableTarget => "target must reduce to a lambda",
            RewriteErrorCode::AmbiguousOrMissingParameterBinding => {
                "exactly one in-scope parameter must match"
            }
            RewriteErrorCode::TypeMismatch => "result type must equal lambda return type",
            RewriteErrorCode::ParameterTypeMismatch => {
                "binding must be assignable to lambda parameter"
            }
            RewriteErrorCode::RewriteDepthExceeded => "marker references must be acyclic",
        }
    }
}

impl fmt::Display for RewriteErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Rewrite error with the failing marker for context
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteError {
    code: RewriteErrorCode,
    message: String,
    marker: Option<String>,
}

impl RewriteError {
    fn new(code: RewriteErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            marker: None,
        }
    }

    /// Marker source is not a captured value, field read or host call
    pub fn unresolvable_target(reason: impl Into<String>) -> Self {
        Self::new(RewriteErrorCode::UnresolvableTarget, reason.into())
    }

    /// Implicit binding failed; `found` is the number of candidates
    pub fn parameter_binding(parameter_type: impl fmt::Display, found: usize) -> Self {
        let message = if found == 0 {
            format!("No parameter of type '{}' is in scope", parameter_type)
        } else {
            format!(
                "{} parameters of type '{}' are in scope; use the explicit form",
                found, parameter_type
            )
        };
        Self::new(RewriteErrorCode::AmbiguousOrMissingParameterBinding, message)
    }

    /// Declared result type differs from the lambda's return type
    pub fn type_mismatch(declared: impl fmt::Display, actual: impl fmt::Display) -> Self {
        Self::new(
            RewriteErrorCode::TypeMismatch,
            format!(
                "Declared result type '{}' does not match lambda return type '{}'",
                declared, actual
            ),
        )
    }

    /// Lambda does not take exactly one parameter
    pub fn arity_mismatch(arity: usize) -> Self {
        Self::new(
            RewriteErrorCode::TypeMismatch,
            format!("Projected lambda must take exactly one parameter, found {}", arity),
        )
    }

    /// Explicit binding not assignable to the parameter type
    pub fn parameter_type_mismatch(
        parameter_type: impl fmt::Display,
        binding_type: impl fmt::Display,
    ) -> Self {
        Self::new(
            RewriteErrorCode::ParameterTypeMismatch,
            format!(
                "Binding of type '{}' is not assignable to parameter of type '{}'",
                binding_type, parameter_type
            ),
        )
    }

    /// Depth bound reached
    pub fn depth_exceeded(limit: usize) -> Self {
        Self::new(
            RewriteErrorCode::RewriteDepthExceeded,
            format!("Nested projection depth exceeded limit of {}", limit),
        )
    }

    /// A lambda's markers resolve back to itself
    pub fn cycle(lambda: impl fmt::Display) -> Self {
        Self::new(
            RewriteErrorCode::RewriteDepthExceeded,
            format!("Projection of '{}' refers back to itself", lambda),
        )
    }

    /// Attaches the rendered marker call, keeping the innermost one
    pub fn at_marker(mut self, marker: impl fmt::Display) -> Self {
        if self.marker.is_none() {
            self.marker = Some(marker.to_string());
        }
        self
    }

    /// Returns the error code
    pub fn code(&self) -> RewriteErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the rendered marker call, if known
    pub fn marker(&self) -> Option<&str> {
        self.marker.as_deref()
    }
}

impl fmt::Display for RewriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(marker) = &self.marker {
            write!(f, " at {}", marker)?;
        }
        Ok(())
    }
}

impl std::error::Error for RewriteError {}

/// Result type for rewrite operations
pub type RewriteResult<T> = Result<T, RewriteError>;
