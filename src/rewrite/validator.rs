//! Type and shape validation of a marker against its resolved lambda
//!
//! Runs before any substitution. Checks, in order:
//! 1. The lambda takes exactly one parameter
//! 2. The declared result type equals the lambda's return type
//! 3. For the explicit form, the argument is assignable to the parameter

use super::errors::{RewriteError, RewriteResult};
use super::recognizer::MarkerCall;
use super::resolver::ResolvedTarget;

/// Validates a marker call against the lambda it resolved to
pub fn validate(marker: &MarkerCall<'_>, target: &ResolvedTarget) -> RewriteResult<()> {
    let lambda = &target.lambda;

    let [formal] = lambda.params.as_slice() else {
        return Err(RewriteError::arity_mismatch(lambda.arity()));
    };

    if *marker.result_type != lambda.ret {
        return Err(RewriteError::type_mismatch(marker.result_type, &lambda.ret));
    }

    if let Some(argument) = marker.argument {
        let binding_type = argument.ty();
        if !formal.ty.is_assignable_from(&binding_type) {
            return Err(RewriteError::parameter_type_mismatch(&formal.ty, binding_type));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::recognizer::recognize;
    use crate::rewrite::resolver::resolve_target;
    use crate::rewrite::RewriteErrorCode;
    use crate::tree::builder::*;
    use crate::tree::{Lambda, Parameter, TypeRef};

    fn suffix() -> Lambda {
        lambda("s", TypeRef::String, |s| add(s, constant("-suffix")))
    }

    fn check(marker: &crate::tree::Expr) -> RewriteResult<()> {
        let call = recognize(marker).expect("marker");
        let target = resolve_target(call.source)?;
        validate(&call, &target)
    }

    #[test]
    fn test_matching_types_pass() {
        let marker = project2(captured(suffix()), constant("hello"), TypeRef::String);
        assert!(check(&marker).is_ok());
    }

    #[test]
    fn test_result_type_mismatch() {
        let marker = project2(captured(suffix()), constant("hello"), TypeRef::Int);
        let err = check(&marker).unwrap_err();
        assert_eq!(err.code(), RewriteErrorCode::TypeMismatch);
    }

    #[test]
    fn test_parameter_type_mismatch() {
        let marker = project2(captured(suffix()), constant(12i64), TypeRef::String);
        let err = check(&marker).unwrap_err();
        assert_eq!(err.code(), RewriteErrorCode::ParameterTypeMismatch);
    }

    #[test]
    fn test_result_type_checked_before_parameter_type() {
        let marker = project2(captured(suffix()), constant(12i64), TypeRef::Double);
        let err = check(&marker).unwrap_err();
        assert_eq!(err.code(), RewriteErrorCode::TypeMismatch);
    }

    #[test]
    fn test_arity_mismatch() {
        let a = Parameter::new("a", TypeRef::String);
        let b = Parameter::new("b", TypeRef::String);
        let body = add(param_ref(&a), param_ref(&b));
        let pair = Lambda::new(vec![a, b], body);
        let marker = project(captured(pair), TypeRef::String);
        let err = check(&marker).unwrap_err();
        assert_eq!(err.code(), RewriteErrorCode::TypeMismatch);
        assert!(err.message().contains("exactly one parameter"));
    }

    #[test]
    fn test_implicit_form_skips_argument_check() {
        let marker = project(captured(suffix()), TypeRef::String);
        assert!(check(&marker).is_ok());
    }
}
