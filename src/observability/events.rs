//! Observable events
//!
//! Events are explicit and typed; each carries its default severity.

use std::fmt;

use super::logger::Severity;

/// Observable events of the rewriter and the query surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Expansion
    /// Expansion of a tree started
    ExpandBegin,
    /// Expansion produced a marker-free tree
    ExpandComplete,
    /// Expansion rejected the tree
    ExpandFailed,
    /// One marker replaced by its fragment
    MarkerExpanded,

    // Query surface
    /// Collaborator accepted a tree
    QueryBuilt,
    /// Query executed successfully
    QueryExecuted,
    /// Query rejected by the rewriter or the collaborator
    QueryRejected,

    // Configuration
    /// Configuration loaded from disk
    ConfigLoaded,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ExpandBegin => "EXPAND_BEGIN",
            Event::ExpandComplete => "EXPAND_COMPLETE",
            Event::ExpandFailed => "EXPAND_FAILED",
            Event::MarkerExpanded => "MARKER_EXPANDED",
            Event::QueryBuilt => "QUERY_BUILT",
            Event::QueryExecuted => "QUERY_EXECUTED",
            Event::QueryRejected => "QUERY_REJECTED",
            Event::ConfigLoaded => "CONFIG_LOADED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::MarkerExpanded | Event::QueryBuilt => Severity::Trace,
            Event::ExpandFailed | Event::QueryRejected => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
