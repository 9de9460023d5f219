//! Structural properties of marker expansion

mod common;

use std::sync::Arc;
use std::thread;

use common::*;
use exprproj::rewrite::{count_markers, RewriteConfig, Rewriter};
use exprproj::tree::builder::*;
use exprproj::tree::{Expr, TypeRef};

fn rewriter() -> Rewriter {
    Rewriter::new(RewriteConfig::default())
}

/// `Projects.Select(p => new { Created = label(p.CreatedBy), AEA = aea(p) })`
fn query_with_markers() -> Arc<Expr> {
    let label = captured(user_label());
    let aea = captured(average_effective_area());
    select(
        projects().expression().clone(),
        lambda("p", project_ty(), |p| {
            new_object(vec![
                (
                    "Created",
                    project2(label, field(&p, "CreatedBy", user_ty()), TypeRef::String),
                ),
                ("AEA", project(aea, TypeRef::Double)),
            ])
        }),
    )
}

#[test]
fn expansion_removes_every_marker() {
    let tree = query_with_markers();
    assert_eq!(count_markers(&tree), 2);

    let expanded = rewriter().expand(&tree).unwrap();
    assert_eq!(count_markers(&expanded), 0);
}

#[test]
fn expansion_is_idempotent() {
    let rw = rewriter();
    let once = rw.expand(&query_with_markers()).unwrap();
    let twice = rw.expand(&once).unwrap();
    assert_eq!(once, twice);
    assert!(Arc::ptr_eq(&once, &twice));
}

#[test]
fn input_tree_is_not_modified() {
    let tree = query_with_markers();
    let before = tree.to_string();
    let copy = (*tree).clone();

    rewriter().expand(&tree).unwrap();

    assert_eq!(tree.to_string(), before);
    assert_eq!(*tree, copy);
}

#[test]
fn expansion_matches_hand_written_tree() {
    let expanded = rewriter().expand(&query_with_markers()).unwrap();

    let hand_written = select(
        projects().expression().clone(),
        lambda("p", project_ty(), |p| {
            let inlined = average_effective_area();
            new_object(vec![
                (
                    "Created",
                    add(
                        field(&field(&p, "CreatedBy", user_ty()), "Name", TypeRef::String),
                        constant("-suffix"),
                    ),
                ),
                (
                    "AEA",
                    exprproj::rewrite::substitute(&inlined, p.clone()),
                ),
            ])
        }),
    );

    assert_eq!(expanded.to_string(), hand_written.to_string());
}

#[test]
fn expanded_and_hand_written_queries_return_the_same_rows() {
    let expanded = rewriter().expand(&query_with_markers()).unwrap();
    let via_markers = exprproj::provider::Query::new(provider(), expanded)
        .to_vec()
        .unwrap();

    let hand_written = projects()
        .select(lambda("p", project_ty(), |p| {
            new_object(vec![
                (
                    "Created",
                    add(
                        field(&field(&p, "CreatedBy", user_ty()), "Name", TypeRef::String),
                        constant("-suffix"),
                    ),
                ),
                (
                    "AEA",
                    exprproj::rewrite::substitute(&average_effective_area(), p.clone()),
                ),
            ])
        }))
        .unwrap()
        .to_vec()
        .unwrap();

    assert_eq!(via_markers, hand_written);
}

#[test]
fn untouched_subtrees_are_shared() {
    let root = projects().expression().clone();
    let filter = lambda("p", project_ty(), |p| {
        eq(field(&p, "Name", TypeRef::String), constant("p1"))
    });
    let filtered = where_(root, filter);
    let label = captured(user_label());
    let tree = select(
        filtered.clone(),
        lambda("p", project_ty(), |p| {
            project2(label, field(&p, "CreatedBy", user_ty()), TypeRef::String)
        }),
    );

    let expanded = rewriter().expand(&tree).unwrap();
    let Expr::Call { args, .. } = &*expanded else {
        panic!("expected Select call");
    };
    assert!(Arc::ptr_eq(&args[0], &filtered));
}

#[test]
fn fragments_compose_through_nested_markers() {
    // A fragment that itself projects another fragment
    let label = captured(user_label());
    let creator_label = captured(lambda("project", project_ty(), |p| {
        project2(label, field(&p, "CreatedBy", user_ty()), TypeRef::String)
    }));
    let rows = projects()
        .as_projectable()
        .select(lambda("p", project_ty(), |p| {
            project2(creator_label, p, TypeRef::String)
        }))
        .unwrap()
        .to_vec()
        .unwrap();

    assert_eq!(rows, vec!["user1-suffix", "user2-suffix"]);
}

/// `proj => aea.project<double>()`: the implicit marker belongs to `proj`
fn wrapped_average() -> Arc<Expr> {
    captured(lambda("proj", project_ty(), |_| {
        project(captured(average_effective_area()), TypeRef::Double)
    }))
}

#[test]
fn wrapped_fragment_binds_its_own_parameter_not_the_call_site() {
    // The call site only has a Subproject in scope
    let rows = subprojects()
        .as_projectable()
        .select(lambda("sp", subproject_ty(), |sp| {
            project2(wrapped_average(), field(&sp, "Project", project_ty()), TypeRef::Double)
        }))
        .unwrap()
        .to_vec()
        .unwrap();

    assert_eq!(rows, vec![150.0, 150.0, 400.0, 400.0, 400.0]);
}

#[test]
fn wrapped_fragment_ignores_a_same_typed_call_site_parameter() {
    let tree = lambda_expr(lambda("p", project_ty(), |p| {
        project2(wrapped_average(), field(&p, "Parent", project_ty()), TypeRef::Double)
    }));

    let expanded = rewriter().expand(&tree).unwrap();
    assert_eq!(
        expanded.to_string(),
        "p => p.Parent.Subprojects.Where(sp => (sp.Area < 1000)).Average(sp => (double)sp.Area)"
    );
    assert_eq!(count_markers(&expanded), 0);
}

#[test]
fn concurrent_expansion_of_a_shared_tree() {
    let tree = query_with_markers();
    let rw = rewriter();
    let expected = rw.expand(&tree).unwrap().to_string();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let tree = Arc::clone(&tree);
            let rw = rw.clone();
            thread::spawn(move || rw.expand(&tree).map(|t| t.to_string()))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), expected);
    }
    assert_eq!(rw.metrics().snapshot().expansions, 9);
    assert_eq!(rw.metrics().snapshot().markers_expanded, 18);
}

#[test]
fn explain_reports_the_expansion() {
    let report = rewriter().explain(&query_with_markers());
    assert!(report.accepted);
    assert_eq!(report.markers_expanded, 2);
    assert_eq!(report.max_nesting, 1);
    assert!(report.input.contains("project2<string>"));
    assert!(!report.output.as_deref().unwrap_or("").contains(".project"));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["accepted"], true);
    assert_eq!(json["id"].as_str().map(str::len), Some(36));
}
