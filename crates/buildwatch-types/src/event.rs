//! Classified log line events.

/// The meaning assigned to a single line of build output.
///
/// Every input line produces exactly one event. Lines with no special
/// meaning classify as [`LineEvent::RawLine`] and still count as progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// The root configure step started.
    MainConfigureStart,
    /// A configure step for a subdirectory started.
    SubConfigureStart(String),
    /// The object directory was announced by the first recursive invocation.
    ObjdirDetected(String),
    /// A plain tier started with its fixed directory list.
    TierStart { name: String, dirs: Vec<String> },
    /// A tools tier started; its directories are discovered by a scan.
    ToolsTierStart(String),
    /// The libs pass of the named tier started.
    LibsPhaseStart(String),
    /// The build tool entered a directory below the object directory.
    DirectoryEntered(String),
    /// A makefile was regenerated during a tools tier directory scan.
    MakefileUpToDate(String),
    /// The build tool left a directory (only classified during a scan).
    DirectoryLeft,
    /// A tool invocation reported a non-zero exit.
    BuildErrorDetected,
    /// The top-level invocation left the object directory.
    BuildDoneDetected,
    /// No special meaning.
    RawLine,
}

impl LineEvent {
    /// Short name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            LineEvent::MainConfigureStart => "main_configure_start",
            LineEvent::SubConfigureStart(_) => "sub_configure_start",
            LineEvent::ObjdirDetected(_) => "objdir_detected",
            LineEvent::TierStart { .. } => "tier_start",
            LineEvent::ToolsTierStart(_) => "tools_tier_start",
            LineEvent::LibsPhaseStart(_) => "libs_phase_start",
            LineEvent::DirectoryEntered(_) => "directory_entered",
            LineEvent::MakefileUpToDate(_) => "makefile_up_to_date",
            LineEvent::DirectoryLeft => "directory_left",
            LineEvent::BuildErrorDetected => "build_error",
            LineEvent::BuildDoneDetected => "build_done",
            LineEvent::RawLine => "raw",
        }
    }

    /// Whether this event starts a new tier of either kind.
    pub fn is_tier_boundary(&self) -> bool {
        matches!(self, LineEvent::TierStart { .. } | LineEvent::ToolsTierStart(_))
    }
}
