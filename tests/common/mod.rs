//! Shared fixture: two projects, their users and subprojects
//!
//! | project | CreatedBy | ModifiedBy | subproject areas  |
//! |---------|-----------|------------|-------------------|
//! | p1      | user1     | user3      | 100, 200          |
//! | p2      | user2     | user4      | 350, 450, 10000   |

#![allow(dead_code)]

use std::sync::Arc;

use exprproj::tree::builder::*;
use exprproj::tree::{Lambda, TypeRef};
use exprproj::{Dataset, InMemoryProvider, Query};
use serde_json::{json, Value as Json};

pub fn user_ty() -> TypeRef {
    TypeRef::entity("User")
}

pub fn project_ty() -> TypeRef {
    TypeRef::entity("Project")
}

pub fn subproject_ty() -> TypeRef {
    TypeRef::entity("Subproject")
}

fn project_row(name: &str, created: &str, modified: &str, areas: &[i64]) -> Json {
    json!({
        "Name": name,
        "CreatedBy": { "Name": created },
        "ModifiedBy": { "Name": modified },
        "Subprojects": areas.iter().map(|a| json!({ "Area": a })).collect::<Vec<_>>(),
    })
}

pub fn dataset() -> Dataset {
    let p1 = project_row("p1", "user1", "user3", &[100, 200]);
    let p2 = project_row("p2", "user2", "user4", &[350, 450, 10000]);

    let subprojects = [(100, &p1), (200, &p1), (350, &p2), (450, &p2), (10000, &p2)]
        .into_iter()
        .map(|(area, owner)| json!({ "Area": area, "Project": owner }))
        .collect();

    Dataset::new()
        .with_collection(
            "Users",
            ["user1", "user2", "user3", "user4"]
                .into_iter()
                .map(|n| json!({ "Name": n }))
                .collect(),
        )
        .with_collection("Projects", vec![p1, p2])
        .with_collection("Subprojects", subprojects)
}

pub fn provider() -> Arc<InMemoryProvider> {
    Arc::new(InMemoryProvider::new(dataset()))
}

pub fn projects() -> Query<InMemoryProvider> {
    provider().query("Projects", project_ty())
}

pub fn subprojects() -> Query<InMemoryProvider> {
    provider().query("Subprojects", subproject_ty())
}

/// `proj => proj.Subprojects.Where(sp => sp.Area < 1000).Average(sp => (double)sp.Area)`
pub fn average_effective_area() -> Lambda {
    lambda("proj", project_ty(), |proj| {
        let small = where_(
            field(&proj, "Subprojects", TypeRef::sequence(subproject_ty())),
            lambda("sp", subproject_ty(), |sp| {
                lt(field(&sp, "Area", TypeRef::Int), constant(1000i64))
            }),
        );
        average(small, area_as_double())
    })
}

/// `proj => proj.Subprojects.Average(sp => (double)sp.Area)`
pub fn average_area() -> Lambda {
    lambda("proj", project_ty(), |proj| {
        average(
            field(&proj, "Subprojects", TypeRef::sequence(subproject_ty())),
            area_as_double(),
        )
    })
}

fn area_as_double() -> Lambda {
    lambda("sp", subproject_ty(), |sp| {
        convert(field(&sp, "Area", TypeRef::Int), TypeRef::Double)
    })
}

/// `user => user.Name + "-suffix"`
pub fn user_label() -> Lambda {
    lambda("user", user_ty(), |u| {
        add(field(&u, "Name", TypeRef::String), constant("-suffix"))
    })
}

/// `s => s + "-suffix"`
pub fn string_suffix() -> Lambda {
    lambda("s", TypeRef::String, |s| add(s, constant("-suffix")))
}

/// Values of `key` across result rows
pub fn column(rows: &[Json], key: &str) -> Vec<Json> {
    rows.iter().map(|r| r[key].clone()).collect()
}
