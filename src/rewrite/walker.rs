//! Tree walker
//!
//! Rewrites a query tree bottom-up, replacing every marker call with its
//! expanded fragment. Nodes whose children are unchanged are returned as the
//! same `Arc`, so a marker-free tree comes back pointer-identical.
//!
//! # Expansion of one marker
//!
//! 1. Recognize the marker and resolve its source to a lambda
//! 2. Validate arity, result type and (explicit form) argument type
//! 3. Pick the binding: the expanded argument, or the single in-scope
//!    parameter of the lambda's parameter type
//! 4. Expand markers in the lambda body one level deeper, with only the
//!    lambda's own parameter in scope
//! 5. Substitute the binding into the expanded body
//!
//! Nesting is bounded by `max_expansion_depth`. A lambda that is already
//! being expanded further up the chain fails immediately.

use std::fmt;
use std::mem;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::observability::{Event, Logger, ObservationScope, RewriteMetrics};
use crate::tree::{Expr, Lambda, Parameter};

use super::config::RewriteConfig;
use super::errors::{RewriteError, RewriteResult};
use super::recognizer::{recognize, MarkerCall};
use super::resolver::{bind_implicit, resolve_target};
use super::substitute::substitute;
use super::validator::validate;

/// Expands projection markers
///
/// Cheap to clone; clones share the same metrics.
#[derive(Debug, Clone, Default)]
pub struct Rewriter {
    config: RewriteConfig,
    metrics: Arc<RewriteMetrics>,
}

impl Rewriter {
    pub fn new(config: RewriteConfig) -> Self {
        Self::with_metrics(config, Arc::new(RewriteMetrics::new()))
    }

    pub fn with_metrics(config: RewriteConfig, metrics: Arc<RewriteMetrics>) -> Self {
        Self { config, metrics }
    }

    pub fn config(&self) -> &RewriteConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<RewriteMetrics> {
        &self.metrics
    }

    /// Returns `tree` with every marker expanded
    pub fn expand(&self, tree: &Arc<Expr>) -> RewriteResult<Arc<Expr>> {
        Ok(self.run(tree)?.tree)
    }

    /// Expands `tree` and reports what happened instead of failing
    pub fn explain(&self, tree: &Arc<Expr>) -> ExpansionReport {
        let input = tree.to_string();
        match self.run(tree) {
            Ok(outcome) => ExpansionReport {
                id: outcome.id,
                accepted: true,
                markers_expanded: outcome.markers,
                max_nesting: outcome.max_nesting,
                input,
                output: Some(outcome.tree.to_string()),
                rejection_code: None,
                rejection_reason: None,
                marker: None,
            },
            Err(failure) => ExpansionReport {
                id: failure.id,
                accepted: false,
                markers_expanded: failure.markers,
                max_nesting: failure.max_nesting,
                input,
                output: None,
                rejection_code: Some(failure.error.code().code().to_string()),
                rejection_reason: Some(failure.error.message().to_string()),
                marker: failure.error.marker().map(str::to_string),
            },
        }
    }

    fn run(&self, tree: &Arc<Expr>) -> Result<Outcome, Failure> {
        let id = Uuid::new_v4().to_string();
        let scope = ObservationScope::begin(&[("id", &id)]);

        let mut walk = Walk::new(self, &id);
        let result = walk.visit(tree, 0);
        let (markers, max_nesting) = (walk.markers, walk.max_nesting);

        match result {
            Ok(expanded) => {
                self.metrics.record_expansion(markers);
                scope.complete(&[
                    ("markers", &markers.to_string()),
                    ("max_nesting", &max_nesting.to_string()),
                ]);
                Ok(Outcome {
                    id,
                    tree: expanded,
                    markers,
                    max_nesting,
                })
            }
            Err(error) => {
                self.metrics.record_rejection();
                scope.fail(&error.to_string());
                Err(Failure {
                    id,
                    error,
                    markers,
                    max_nesting,
                })
            }
        }
    }
}

struct Outcome {
    id: String,
    tree: Arc<Expr>,
    markers: usize,
    max_nesting: usize,
}

/// Markers expanded before the error are still reported
struct Failure {
    id: String,
    error: RewriteError,
    markers: usize,
    max_nesting: usize,
}

impl From<Failure> for RewriteError {
    fn from(failure: Failure) -> Self {
        failure.error
    }
}

/// State of one expansion
struct Walk<'r> {
    rewriter: &'r Rewriter,
    id: &'r str,
    /// Parameters of the lambdas enclosing the current node
    scope: Vec<Parameter>,
    /// Lambdas currently being expanded, outermost first
    chain: Vec<Arc<Lambda>>,
    markers: usize,
    max_nesting: usize,
}

impl<'r> Walk<'r> {
    fn new(rewriter: &'r Rewriter, id: &'r str) -> Self {
        Self {
            rewriter,
            id,
            scope: Vec::new(),
            chain: Vec::new(),
            markers: 0,
            max_nesting: 0,
        }
    }

    fn visit(&mut self, node: &Arc<Expr>, depth: usize) -> RewriteResult<Arc<Expr>> {
        if let Some(marker) = recognize(node) {
            return self
                .expand_marker(marker, depth)
                .map_err(|e| e.at_marker(marker.node));
        }

        match &**node {
            Expr::Lambda(l) => {
                let mark = self.scope.len();
                self.scope.extend(l.params.iter().cloned());
                let result = Expr::map_children(node, |child| self.visit(child, depth));
                self.scope.truncate(mark);
                result
            }
            _ => Expr::map_children(node, |child| self.visit(child, depth)),
        }
    }

    fn expand_marker(&mut self, marker: MarkerCall<'_>, depth: usize) -> RewriteResult<Arc<Expr>> {
        let limit = self.rewriter.config.max_expansion_depth;
        let nesting = depth + 1;
        if nesting > limit {
            return Err(RewriteError::depth_exceeded(limit));
        }

        let target = resolve_target(marker.source)?;
        validate(&marker, &target)?;

        if self.chain.iter().any(|active| **active == *target.lambda) {
            return Err(RewriteError::cycle(&*target.lambda));
        }

        let binding = match marker.argument {
            Some(argument) => self.visit(argument, depth)?,
            None => bind_implicit(&target.lambda, &self.scope)?,
        };

        // Markers in the body bind against the lambda's own parameter
        let outer_scope = mem::replace(&mut self.scope, target.lambda.params.clone());
        self.chain.push(Arc::clone(&target.lambda));
        let body = self.visit(&target.lambda.body, nesting);
        self.chain.pop();
        self.scope = outer_scope;

        let expanded_lambda = Lambda {
            params: target.lambda.params.clone(),
            body: body?,
            ret: target.lambda.ret.clone(),
        };
        let expanded = substitute(&expanded_lambda, binding);

        self.markers += 1;
        self.max_nesting = self.max_nesting.max(nesting);

        if self.rewriter.config.trace_markers {
            Logger::log(
                Event::MarkerExpanded.severity(),
                Event::MarkerExpanded.as_str(),
                &[
                    ("id", self.id),
                    ("form", marker.form.as_str()),
                    ("source", target.kind),
                    ("depth", &nesting.to_string()),
                    ("marker", &marker.node.to_string()),
                    ("fragment", &expanded.to_string()),
                ],
            );
        }

        Ok(expanded)
    }
}

/// Outcome of [`Rewriter::explain`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpansionReport {
    /// Correlation id shared with the expansion's log events
    pub id: String,
    pub accepted: bool,
    pub markers_expanded: usize,
    pub max_nesting: usize,
    pub input: String,
    pub output: Option<String>,
    pub rejection_code: Option<String>,
    pub rejection_reason: Option<String>,
    /// Innermost marker at which expansion failed
    pub marker: Option<String>,
}

impl fmt::Display for ExpansionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPANSION ===")?;
        writeln!(f, "Id: {}", self.id)?;
        writeln!(f, "Input: {}", self.input)?;

        if self.accepted {
            writeln!(f, "Status: ACCEPTED")?;
            writeln!(f, "Markers Expanded: {}", self.markers_expanded)?;
            writeln!(f, "Max Nesting: {}", self.max_nesting)?;
            if let Some(output) = &self.output {
                writeln!(f, "Output: {}", output)?;
            }
        } else {
            writeln!(f, "Status: REJECTED")?;
            if let Some(code) = &self.rejection_code {
                writeln!(f, "Error Code: {}", code)?;
            }
            if let Some(reason) = &self.rejection_reason {
                writeln!(f, "Reason: {}", reason)?;
            }
            if let Some(marker) = &self.marker {
                writeln!(f, "Marker: {}", marker)?;
            }
        }

        Ok(())
    }
}
