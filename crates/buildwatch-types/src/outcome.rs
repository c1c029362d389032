//! Run outcomes and the end-of-run summary.

use chrono::{DateTime, Local};

/// How a run ended. None of these are internal faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The top-level invocation left the object directory before input ended.
    Completed,
    /// An error line was seen; the rest of the log was echoed verbatim.
    Failed,
    /// Input ended without a completion line.
    Truncated,
}

impl BuildOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, BuildOutcome::Completed)
    }
}

impl std::fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildOutcome::Completed => write!(f, "completed"),
            BuildOutcome::Failed => write!(f, "failed"),
            BuildOutcome::Truncated => write!(f, "truncated"),
        }
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub outcome: BuildOutcome,
    /// Plain and tools tiers rendered, in order.
    pub tiers: Vec<String>,
    /// Input lines consumed, including echoed ones.
    pub lines: u64,
    /// Error lines seen; everything after the first was echoed.
    pub errors: u32,
}

impl BuildSummary {
    /// Elapsed wall time formatted as `H:MM:SS`.
    pub fn elapsed(&self) -> String {
        format_elapsed(self.started_at, self.finished_at)
    }
}

/// Format the time between two instants as `H:MM:SS`, whole seconds only.
pub fn format_elapsed(start: DateTime<Local>, end: DateTime<Local>) -> String {
    let total = (end - start).num_seconds().max(0);
    let (rest, seconds) = (total / 60, total % 60);
    let (hours, minutes) = (rest / 60, rest % 60);
    format!("{}:{:02}:{:02}", hours, minutes, seconds)
}
