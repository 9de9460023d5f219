//! ObservationScope brackets one expansion with BEGIN and COMPLETE/FAILED
//! events carrying the same correlation fields.

use std::time::Instant;

use super::events::Event;
use super::logger::Logger;

/// Logs a begin event on creation and exactly one terminal event.
///
/// ```ignore
/// let scope = ObservationScope::begin(&[("id", &id)]);
/// match result {
///     Ok(_) => scope.complete(&[("markers", "2")]),
///     Err(e) => scope.fail(&e.to_string()),
/// }
/// ```
///
/// A scope dropped without a terminal call logs `EXPAND_FAILED` with reason
/// `incomplete`.
pub struct ObservationScope {
    fields: Vec<(&'static str, String)>,
    started: Instant,
    finished: bool,
}

impl ObservationScope {
    /// Logs `EXPAND_BEGIN` with `fields`
    pub fn begin(fields: &[(&'static str, &str)]) -> Self {
        Logger::log(Event::ExpandBegin.severity(), Event::ExpandBegin.as_str(), fields);
        Self {
            fields: fields.iter().map(|(k, v)| (*k, v.to_string())).collect(),
            started: Instant::now(),
            finished: false,
        }
    }

    /// Microseconds since the scope began
    pub fn elapsed_us(&self) -> u128 {
        self.started.elapsed().as_micros()
    }

    /// Logs `EXPAND_COMPLETE` with the scope's fields plus `extra`
    pub fn complete(mut self, extra: &[(&str, &str)]) {
        self.finish(Event::ExpandComplete, extra);
    }

    /// Logs `EXPAND_FAILED` with a reason
    pub fn fail(mut self, reason: &str) {
        self.finish(Event::ExpandFailed, &[("reason", reason)]);
    }

    fn finish(&mut self, event: Event, extra: &[(&str, &str)]) {
        self.finished = true;
        let elapsed = self.elapsed_us().to_string();
        let mut fields: Vec<(&str, &str)> =
            self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
        fields.extend_from_slice(extra);
        fields.push(("elapsed_us", &elapsed));
        Logger::log(event.severity(), event.as_str(), &fields);
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.finished {
            self.finish(Event::ExpandFailed, &[("reason", "incomplete")]);
        }
    }
}
