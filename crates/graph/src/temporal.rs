use chrono::NaiveDate;
use record::TimeSpan;
use serde::{Deserialize, Serialize};

/// The date window requested by the caller. Both bounds are independently
/// optional; the window is echoed back verbatim as `filter_applied`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(default)]
    pub date_start: Option<NaiveDate>,
    #[serde(default)]
    pub date_end: Option<NaiveDate>,
}

impl TimeWindow {
    pub fn new(date_start: Option<NaiveDate>, date_end: Option<NaiveDate>) -> TimeWindow {
        TimeWindow {
            date_start,
            date_end,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.date_start.is_none() && self.date_end.is_none()
    }

    /// Apply the overlap test to an optional fact time span.
    pub fn contains(&self, span: Option<&TimeSpan>) -> bool {
        let (start, end) = match span {
            Some(span) => (span.start, span.end),
            None => (None, None),
        };
        in_range(start, end, self.date_start, self.date_end)
    }
}

/// The single interval-overlap policy of the system.
///
/// Undated facts always pass. A fact with one known endpoint is treated as a
/// zero-width interval at that point. Boundaries are inclusive: a fact that
/// merely touches the window edge is kept.
pub fn in_range(
    fact_start: Option<NaiveDate>,
    fact_end: Option<NaiveDate>,
    window_start: Option<NaiveDate>,
    window_end: Option<NaiveDate>,
) -> bool {
    if window_start.is_none() && window_end.is_none() {
        return true;
    }
    let (effective_start, effective_end) = match (fact_start, fact_end) {
        (None, None) => return true,
        (Some(s), None) => (s, s),
        (None, Some(e)) => (e, e),
        (Some(s), Some(e)) => (s, e),
    };
    if let Some(ws) = window_start {
        if effective_end < ws {
            return false;
        }
    }
    if let Some(we) = window_end {
        if effective_start > we {
            return false;
        }
    }
    true
}
