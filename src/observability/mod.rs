//! Observability
//!
//! - Structured logging (one JSON line per event)
//! - Counter metrics
//! - Scoped begin/complete tracing of expansions
//!
//! Observability is read-only: it never changes a rewrite result, and a
//! failed write to stdout/stderr is ignored.
//!
//! ```ignore
//! use exprproj::observability::{Logger, Severity};
//!
//! Logger::set_min_severity(Severity::Trace);
//! Logger::info("QUERY_EXECUTED", &[("rows", "2")]);
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsSnapshot, RewriteMetrics};
pub use scope::ObservationScope;

/// Log an event at its default severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log an event with fields at its default severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
