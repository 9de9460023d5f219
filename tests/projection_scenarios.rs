//! End-to-end projection scenarios over the in-memory provider

mod common;

use std::sync::Arc;

use common::*;
use exprproj::tree::builder::*;
use exprproj::tree::{Expr, HostFn, HostObject, TypeRef, Value};
use serde_json::json;

/// `projects.Select(p => new { Name = p.Name, AEA = <source>.project<double>() })`
fn average_by(source: Arc<Expr>) -> Vec<serde_json::Value> {
    let rows = projects()
        .as_projectable()
        .select(lambda("p", project_ty(), |p| {
            new_object(vec![
                ("Name", field(&p, "Name", TypeRef::String)),
                ("AEA", project(source, TypeRef::Double)),
            ])
        }))
        .unwrap()
        .to_vec()
        .unwrap();
    assert_eq!(column(&rows, "Name"), vec![json!("p1"), json!("p2")]);
    column(&rows, "AEA")
}

#[test]
fn explicit_projection_over_member_chains() {
    let label = captured(user_label());
    let rows = projects()
        .as_projectable()
        .select(lambda("project", project_ty(), |p| {
            new_object(vec![
                (
                    "testResult1",
                    project2(label.clone(), field(&p, "CreatedBy", user_ty()), TypeRef::String),
                ),
                (
                    "testResult2",
                    project2(label, field(&p, "ModifiedBy", user_ty()), TypeRef::String),
                ),
            ])
        }))
        .unwrap()
        .to_vec()
        .unwrap();

    assert_eq!(
        rows,
        vec![
            json!({"testResult1": "user1-suffix", "testResult2": "user3-suffix"}),
            json!({"testResult1": "user2-suffix", "testResult2": "user4-suffix"}),
        ]
    );
}

#[test]
fn implicit_projection_of_captured_local() {
    assert_eq!(
        average_by(captured(average_effective_area())),
        vec![json!(150.0), json!(400.0)]
    );
}

#[test]
fn implicit_projection_of_static_field() {
    let source = static_field(
        "Fixture",
        "ProjectAverageEffectiveAreaSelectorStatic",
        Value::lambda(average_effective_area()),
    );
    assert_eq!(average_by(source), vec![json!(150.0), json!(400.0)]);
}

#[test]
fn implicit_projection_of_instance_field() {
    let fixture = HostObject::new("Fixture")
        .with_field("averageEffectiveArea", Value::lambda(average_effective_area()));
    let source = field(
        &host_object(fixture),
        "averageEffectiveArea",
        TypeRef::expression(vec![project_ty()], TypeRef::Double),
    );
    assert_eq!(average_by(source), vec![json!(150.0), json!(400.0)]);
}

#[test]
fn implicit_projection_of_static_function() {
    let f = HostFn::new("GetAverageEffectiveArea", |_, _| {
        Some(Value::lambda(average_effective_area()))
    });
    let source = host_call(
        None,
        "Fixture",
        TypeRef::expression(vec![project_ty()], TypeRef::Double),
        f,
        vec![],
    );
    assert_eq!(average_by(source), vec![json!(150.0), json!(400.0)]);
}

#[test]
fn implicit_projection_of_instance_function() {
    let fixture = HostObject::new("Fixture")
        .with_field("selector", Value::lambda(average_effective_area()));
    // Reads the selector off its receiver
    let f = HostFn::new("GetSelector", |receiver, _| match receiver {
        Some(Value::Object(o)) => o.field("selector").cloned(),
        _ => None,
    });
    let source = host_call(
        Some(host_object(fixture)),
        "Fixture",
        TypeRef::expression(vec![project_ty()], TypeRef::Double),
        f,
        vec![],
    );
    assert_eq!(average_by(source), vec![json!(150.0), json!(400.0)]);
}

#[test]
fn host_function_argument_selects_the_lambda() {
    let with_logic = HostFn::new("GetSelectorWithLogic", |_, args| match args {
        [Value::Bool(true)] => Some(Value::lambda(average_effective_area())),
        [Value::Bool(false)] => Some(Value::lambda(average_area())),
        _ => None,
    });
    let call = |include_over_thousand: bool| {
        host_call(
            None,
            "Fixture",
            TypeRef::expression(vec![project_ty()], TypeRef::Double),
            with_logic.clone(),
            vec![constant(include_over_thousand)],
        )
    };

    assert_eq!(average_by(call(false)), vec![json!(150.0), json!(3600.0)]);
    assert_eq!(average_by(call(true)), vec![json!(150.0), json!(400.0)]);
}

#[test]
fn explicit_projection_of_literals() {
    let suffix = captured(string_suffix());
    let rows = projects()
        .as_projectable()
        .select(lambda("project", project_ty(), |_| {
            new_object(vec![
                (
                    "testResult1",
                    project2(suffix.clone(), constant("hello world"), TypeRef::String),
                ),
                (
                    "testResult2",
                    project2(
                        suffix,
                        to_string(add(constant(2i64), constant(10i64))),
                        TypeRef::String,
                    ),
                ),
            ])
        }))
        .unwrap()
        .to_vec()
        .unwrap();

    assert_eq!(rows.len(), 2);
    for row in rows {
        assert_eq!(row["testResult1"], "hello world-suffix");
        assert_eq!(row["testResult2"], "12-suffix");
    }
}

#[test]
fn explicit_projection_of_row_parameter() {
    let area_label = static_field(
        "TestExpressions",
        "BasicMemberExpression",
        Value::lambda(lambda("subProject", subproject_ty(), |sp| {
            add(constant("Area: "), field(&sp, "Area", TypeRef::Int))
        })),
    );
    let rows = subprojects()
        .as_projectable()
        .select(lambda("subproject", subproject_ty(), |sp| {
            project2(area_label, sp, TypeRef::String)
        }))
        .unwrap()
        .to_vec()
        .unwrap();

    assert_eq!(rows[0], "Area: 100");
    assert_eq!(rows[3], "Area: 450");
}

#[test]
fn implicit_projection_inside_select_over_subprojects() {
    let basic = static_field(
        "Subproject",
        "StaticFieldOnType_BasicExpression",
        Value::lambda(lambda("sp", subproject_ty(), |sp| {
            add(
                constant("StaticFieldOnType_BasicExpression - Area: "),
                field(&sp, "Area", TypeRef::Int),
            )
        })),
    );
    let rows = subprojects()
        .as_projectable()
        .select(lambda("subproject", subproject_ty(), |_| {
            project(basic, TypeRef::String)
        }))
        .unwrap()
        .to_vec()
        .unwrap();

    assert_eq!(rows[0], "StaticFieldOnType_BasicExpression - Area: 100");
    assert_eq!(rows[3], "StaticFieldOnType_BasicExpression - Area: 450");
}

#[test]
fn explicit_projection_of_member_of_member() {
    let count_label = static_field(
        "TestExpressions",
        "MemberOfMemberExpression",
        Value::lambda(lambda("project", project_ty(), |p| {
            add(
                constant("Subprojects Count: "),
                count(field(&p, "Subprojects", TypeRef::sequence(subproject_ty()))),
            )
        })),
    );
    let rows = subprojects()
        .as_projectable()
        .select(lambda("subproject", subproject_ty(), |sp| {
            new_object(vec![
                ("Area", field(&sp, "Area", TypeRef::Int)),
                (
                    "testResult",
                    project2(count_label, field(&sp, "Project", project_ty()), TypeRef::String),
                ),
            ])
        }))
        .unwrap()
        .to_vec()
        .unwrap();

    assert_eq!(
        column(&rows, "testResult"),
        vec![
            json!("Subprojects Count: 2"),
            json!("Subprojects Count: 2"),
            json!("Subprojects Count: 3"),
            json!("Subprojects Count: 3"),
            json!("Subprojects Count: 3"),
        ]
    );
}

#[test]
fn projection_composes_with_filter_and_order() {
    let label = captured(user_label());
    let rows = projects()
        .as_projectable()
        .order_by_descending(lambda("p", project_ty(), |p| field(&p, "Name", TypeRef::String)))
        .unwrap()
        .filter(lambda("p", project_ty(), |p| {
            lt(
                project2(captured(average_effective_area()), p, TypeRef::Double),
                constant(1000.0),
            )
        }))
        .unwrap()
        .select(lambda("p", project_ty(), |p| {
            project2(label, field(&p, "CreatedBy", user_ty()), TypeRef::String)
        }))
        .unwrap()
        .to_vec()
        .unwrap();

    assert_eq!(rows, vec![json!("user2-suffix"), json!("user1-suffix")]);
}
