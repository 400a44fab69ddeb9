#![forbid(unsafe_code)]

//! Feedback-loop suppression for property reports.
//!
//! The filter keeps one [`LastChangeRecord`] per property name. A report is
//! suppressed when its value equals the recorded value (loose equality with
//! JSON fallback) **and** the record is younger than the window.
//!
//! # Invariants
//!
//! 1. A record exists only for tracked properties; untracked names are never
//!    recorded.
//! 2. A delivered report always overwrites both timestamp and value.
//! 3. A suppressed report never changes the recorded value. Whether it moves
//!    the timestamp is governed by [`SuppressedReportPolicy`].
//! 4. A freshly tracked record has no timestamp and so cannot suppress.

use std::collections::HashMap;
use std::time::Duration;

use apollo_core::config::SuppressedReportPolicy;
use apollo_core::value::is_value_equals;
use serde_json::Value;
use web_time::Instant;

/// Last accepted report for one property.
#[derive(Debug, Clone, PartialEq)]
pub struct LastChangeRecord {
    /// When the record was last touched; `None` until the first report.
    pub at: Option<Instant>,
    /// Value of the last delivered report.
    pub value: Value,
}

impl Default for LastChangeRecord {
    fn default() -> Self {
        Self {
            at: None,
            value: Value::Null,
        }
    }
}

/// Outcome of running a report through the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Deliver,
    Suppress,
}

/// Per-property value/time dedup.
#[derive(Debug, Clone)]
pub struct ChangeDedupFilter {
    window: Duration,
    policy: SuppressedReportPolicy,
    records: HashMap<String, LastChangeRecord>,
}

impl ChangeDedupFilter {
    #[must_use]
    pub fn new(window: Duration, policy: SuppressedReportPolicy) -> Self {
        Self {
            window,
            policy,
            records: HashMap::new(),
        }
    }

    /// Start tracking `property` if it is not tracked yet.
    pub fn track(&mut self, property: &str) {
        if !self.records.contains_key(property) {
            self.records
                .insert(property.to_owned(), LastChangeRecord::default());
        }
    }

    /// Stop tracking `property`, discarding its record.
    pub fn forget(&mut self, property: &str) -> bool {
        self.records.remove(property).is_some()
    }

    #[must_use]
    pub fn record(&self, property: &str) -> Option<&LastChangeRecord> {
        self.records.get(property)
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    #[must_use]
    pub fn policy(&self) -> SuppressedReportPolicy {
        self.policy
    }

    /// Decide whether a report of `value` at `now` should fan out, updating
    /// the record accordingly. Untracked properties are tracked on demand.
    pub fn admit(&mut self, property: &str, value: &Value, now: Instant) -> Verdict {
        self.track(property);
        let Some(record) = self.records.get_mut(property) else {
            return Verdict::Deliver;
        };

        let fresh = record
            .at
            .is_some_and(|at| now.saturating_duration_since(at) < self.window);
        if fresh && is_value_equals(value, &record.value, true) {
            if self.policy == SuppressedReportPolicy::RefreshTimestamp {
                record.at = Some(now);
            }
            return Verdict::Suppress;
        }

        record.at = Some(now);
        record.value = value.clone();
        Verdict::Deliver
    }
}

impl Default for ChangeDedupFilter {
    fn default() -> Self {
        Self::new(
            apollo_core::config::DEFAULT_DEDUP_WINDOW,
            SuppressedReportPolicy::default(),
        )
    }
}
