//! Progress state for configure steps, tier directories and tools directories.

/// The eight base terminal colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

/// Lifecycle of a single tracked lane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LaneState {
    /// Not reached yet.
    #[default]
    Pending,
    /// Currently being built.
    InProgress,
    /// Finished, inferred from the next item starting.
    Complete,
}

impl LaneState {
    /// Display color for a lane in this state with `count` sub-events seen.
    ///
    /// A pending lane that already recorded sub-events is shown as active.
    pub fn color(self, count: u32) -> Color {
        match self {
            LaneState::Complete => Color::Green,
            LaneState::InProgress => Color::Yellow,
            LaneState::Pending if count > 0 => Color::Yellow,
            LaneState::Pending => Color::Red,
        }
    }
}

/// One pass over a directory: its state plus the number of recursive
/// descents into untracked subdirectories seen while it was open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lane {
    pub state: LaneState,
    pub count: u32,
}

impl Lane {
    pub fn color(&self) -> Color {
        self.state.color(self.count)
    }
}

/// A directory listed on a plain tier line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryProgress {
    pub name: String,
    pub export: Lane,
    pub libs: Lane,
}

impl DirectoryProgress {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            export: Lane::default(),
            libs: Lane::default(),
        }
    }
}

/// A directory discovered by a tools tier scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolsDirectoryProgress {
    pub name: String,
    pub lane: Lane,
}

impl ToolsDirectoryProgress {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lane: Lane::default(),
        }
    }
}

/// A configure step run before the tiers start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureStep {
    pub name: String,
    pub state: LaneState,
}

impl ConfigureStep {
    pub fn started(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: LaneState::InProgress,
        }
    }
}

/// Which pass of a plain tier is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierPass {
    Export,
    Libs,
}

impl TierPass {
    pub fn as_str(self) -> &'static str {
        match self {
            TierPass::Export => "export",
            TierPass::Libs => "libs",
        }
    }
}
