//! Error types for buildwatch.

use thiserror::Error;

/// Internal faults. A failed or truncated build is not one of these; see
/// [`buildwatch_types::BuildOutcome`].
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid pattern for object directory {objdir:?}: {source}")]
    Pattern {
        objdir: String,
        #[source]
        source: regex::Error,
    },
}
