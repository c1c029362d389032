//! Build progress model: configure steps, plain tiers and tools tiers.
//!
//! Nothing in a build log says "directory done". A directory is complete
//! when the next tracked directory starts, when the pass changes, or when
//! the tier ends. [`SuccessionTier::advance_to`] is the one place that rule
//! is applied.

use buildwatch_types::{
    ConfigureStep, DirectoryProgress, Lane, LaneState, TierPass, ToolsDirectoryProgress,
};
use tracing::debug;

/// Result of moving the open item of a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advance {
    /// Item marked complete, if one was open.
    pub finalized: Option<usize>,
    /// Item now in progress.
    pub opened: usize,
}

/// What a `DirectoryEntered` line did to a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entered {
    /// A tracked directory started.
    Advanced(Advance),
    /// An untracked subdirectory of the open directory; its count went up.
    Descended(usize),
}

/// A tier whose directories complete by succession.
pub trait SuccessionTier {
    fn name(&self) -> &str;
    fn len(&self) -> usize;
    fn current(&self) -> Option<usize>;
    fn set_current(&mut self, index: Option<usize>);
    /// Index of a tracked directory, by exact name.
    fn position(&self, dir: &str) -> Option<usize>;
    /// The lane the current pass updates for the directory at `index`.
    fn lane_mut(&mut self, index: usize) -> &mut Lane;

    /// Called when a directory opens, after its lane became in progress.
    fn on_open(&mut self, _index: usize) {}

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mark the open directory complete and close it.
    fn finish_current(&mut self) -> Option<usize> {
        let index = self.current()?;
        self.set_current(None);
        self.lane_mut(index).state = LaneState::Complete;
        Some(index)
    }

    /// Finalize whatever is open, then open `next`.
    fn advance_to(&mut self, next: usize) -> Advance {
        let finalized = self.finish_current();
        self.lane_mut(next).state = LaneState::InProgress;
        self.on_open(next);
        self.set_current(Some(next));
        Advance {
            finalized,
            opened: next,
        }
    }

    /// Apply a directory entry. Returns `None` when the path is untracked
    /// and nothing is open to attribute it to.
    fn enter(&mut self, dir: &str) -> Option<Entered> {
        if let Some(index) = self.position(dir) {
            return Some(Entered::Advanced(self.advance_to(index)));
        }
        let index = self.current()?;
        self.lane_mut(index).count += 1;
        Some(Entered::Descended(index))
    }
}

/// A tier with an export pass followed by a libs pass.
#[derive(Debug, Clone)]
pub struct PlainTier {
    name: String,
    dirs: Vec<DirectoryProgress>,
    pass: TierPass,
    current: Option<usize>,
}

impl PlainTier {
    pub fn new(name: impl Into<String>, dirs: &[String]) -> Self {
        Self {
            name: name.into(),
            dirs: dirs.iter().map(DirectoryProgress::new).collect(),
            pass: TierPass::Export,
            current: None,
        }
    }

    pub fn dirs(&self) -> &[DirectoryProgress] {
        &self.dirs
    }

    pub fn dir(&self, index: usize) -> &DirectoryProgress {
        &self.dirs[index]
    }

    pub fn pass(&self) -> TierPass {
        self.pass
    }

    /// Switch to the libs pass, finalizing the open export directory.
    ///
    /// With no export directory open this only flips the pass.
    pub fn start_libs(&mut self) -> Option<usize> {
        let finalized = self.finish_current();
        if finalized.is_none() {
            debug!(target: "buildwatch::model", tier = %self.name, "libs pass started with no open export directory");
        }
        self.pass = TierPass::Libs;
        finalized
    }
}

impl SuccessionTier for PlainTier {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> usize {
        self.dirs.len()
    }

    fn current(&self) -> Option<usize> {
        self.current
    }

    fn set_current(&mut self, index: Option<usize>) {
        self.current = index;
    }

    fn position(&self, dir: &str) -> Option<usize> {
        self.dirs.iter().position(|d| d.name == dir)
    }

    fn lane_mut(&mut self, index: usize) -> &mut Lane {
        let dir = &mut self.dirs[index];
        match self.pass {
            TierPass::Export => &mut dir.export,
            TierPass::Libs => &mut dir.libs,
        }
    }

    /// Opening a directory for libs means its export pass is over.
    fn on_open(&mut self, index: usize) {
        if self.pass == TierPass::Libs {
            self.dirs[index].export.state = LaneState::Complete;
        }
    }
}

/// A tier with a single pass over directories found by a scan.
#[derive(Debug, Clone)]
pub struct ToolsTier {
    name: String,
    dirs: Vec<ToolsDirectoryProgress>,
    current: Option<usize>,
}

impl ToolsTier {
    pub fn new(name: impl Into<String>, dirs: &[String]) -> Self {
        Self {
            name: name.into(),
            dirs: dirs.iter().map(ToolsDirectoryProgress::new).collect(),
            current: None,
        }
    }

    pub fn dirs(&self) -> &[ToolsDirectoryProgress] {
        &self.dirs
    }

    pub fn dir(&self, index: usize) -> &ToolsDirectoryProgress {
        &self.dirs[index]
    }
}

impl SuccessionTier for ToolsTier {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> usize {
        self.dirs.len()
    }

    fn current(&self) -> Option<usize> {
        self.current
    }

    fn set_current(&mut self, index: Option<usize>) {
        self.current = index;
    }

    fn position(&self, dir: &str) -> Option<usize> {
        self.dirs.iter().position(|d| d.name == dir)
    }

    fn lane_mut(&mut self, index: usize) -> &mut Lane {
        &mut self.dirs[index].lane
    }
}

/// Configure steps run before the first tier. Only the newest step is ever
/// in progress.
#[derive(Debug, Clone, Default)]
pub struct ConfigurePhase {
    steps: Vec<ConfigureStep>,
}

impl ConfigurePhase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[ConfigureStep] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> &ConfigureStep {
        &self.steps[index]
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Mark the newest step complete if it is still running.
    pub fn finish_last(&mut self) -> Option<usize> {
        let index = self.steps.len().checked_sub(1)?;
        let step = &mut self.steps[index];
        if step.state != LaneState::InProgress {
            return None;
        }
        step.state = LaneState::Complete;
        Some(index)
    }

    /// Start a new step after finishing the previous one.
    pub fn start(&mut self, name: impl Into<String>) -> Advance {
        let finalized = self.finish_last();
        self.steps.push(ConfigureStep::started(name));
        Advance {
            finalized,
            opened: self.steps.len() - 1,
        }
    }
}
