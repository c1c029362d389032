//! The log-driven state machine.
//!
//! A [`Session`] consumes one line at a time with no lookahead:
//!
//! ```text
//! Prebuild ──objdir──> Building { Idle | PlainTier | ScanningTools | ToolsTier } ──eof──> Finished
//!     └────────────────────────── error line ──> ErrorDumping ─────────eof──────────┘
//! ```
//!
//! `ErrorDumping` is absorbing: every later line is echoed verbatim and the
//! model is never touched again.

use crate::classifier::{classify, Scope};
use crate::grammar::SessionGrammar;
use crate::model::{ConfigurePhase, Entered, PlainTier, SuccessionTier, ToolsTier};
use crate::recent::{RecentLines, DEFAULT_RECENT_LINES};
use crate::renderer::Renderer;
use crate::terminal::Terminal;
use crate::Result;
use buildwatch_types::{BuildOutcome, BuildSummary, LineEvent};
use chrono::{DateTime, Local};
use std::io::BufRead;
use tracing::{debug, info, trace, warn};

/// Session behavior knobs.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Lines replayed above the failure banner.
    pub recent_lines: usize,
    /// Whether to set the terminal title.
    pub set_title: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            recent_lines: DEFAULT_RECENT_LINES,
            set_title: true,
        }
    }
}

/// Tier processing stage once the object directory is known.
#[derive(Debug)]
enum Stage {
    /// Between tiers.
    Idle,
    /// Collecting the directories of a tools tier.
    ScanningTools { name: String, found: Vec<String> },
    PlainTier(PlainTier),
    ToolsTier(ToolsTier),
}

#[derive(Debug)]
enum Phase {
    Prebuild(ConfigurePhase),
    Building {
        grammar: SessionGrammar,
        stage: Stage,
    },
    ErrorDumping,
    Finished,
}

/// One run over one build log.
pub struct Session<T: Terminal> {
    renderer: Renderer<T>,
    started_at: DateTime<Local>,
    recent: RecentLines,
    phase: Phase,
    reached_done: bool,
    tiers: Vec<String>,
    lines: u64,
    errors: u32,
    summary: Option<BuildSummary>,
}

impl<T: Terminal> Session<T> {
    /// Clear the display and print the start line.
    pub fn start(term: T, options: SessionOptions) -> Result<Self> {
        let started_at = Local::now();
        let mut renderer = Renderer::new(term, options.set_title);
        renderer.start(&started_at)?;
        renderer.flush()?;
        debug!(target: "buildwatch::session", recent_lines = options.recent_lines, "session started");

        Ok(Self {
            renderer,
            started_at,
            recent: RecentLines::new(options.recent_lines),
            phase: Phase::Prebuild(ConfigurePhase::new()),
            reached_done: false,
            tiers: Vec::new(),
            lines: 0,
            errors: 0,
            summary: None,
        })
    }

    /// Process one raw input line.
    pub fn feed_line(&mut self, line: &str) -> Result<()> {
        match self.phase {
            Phase::Finished => {
                trace!(target: "buildwatch::session", "line after finish ignored");
                return Ok(());
            }
            Phase::ErrorDumping => {
                self.lines += 1;
                if classify(line, Scope::DirectoryScan) == LineEvent::BuildErrorDetected {
                    self.errors += 1;
                }
                self.renderer.echo(line)?;
                return self.renderer.flush();
            }
            _ => {}
        }

        self.lines += 1;
        self.renderer.tick()?;
        self.recent.push(line);

        let event = classify(line, self.scope());
        if event == LineEvent::BuildErrorDetected {
            self.enter_error_dump()?;
        } else {
            self.apply(event)?;
        }
        self.renderer.flush()
    }

    /// End of input: finalize the open directory and print the banner.
    ///
    /// Calling this again returns the same summary without drawing anything.
    pub fn finish(&mut self) -> Result<BuildSummary> {
        if let Some(summary) = &self.summary {
            return Ok(summary.clone());
        }

        let outcome = match &mut self.phase {
            Phase::ErrorDumping => BuildOutcome::Failed,
            Phase::Building { stage, .. } => {
                close_stage(&mut self.renderer, stage)?;
                if self.reached_done {
                    BuildOutcome::Completed
                } else {
                    BuildOutcome::Truncated
                }
            }
            Phase::Prebuild(_) | Phase::Finished => BuildOutcome::Truncated,
        };

        if outcome == BuildOutcome::Truncated {
            warn!(target: "buildwatch::session", "input ended without a completion line");
            self.renderer.begin_failure(std::iter::empty())?;
        }
        let finished_at = Local::now();
        self.renderer.banner(outcome, &self.started_at, &finished_at)?;
        self.phase = Phase::Finished;

        let summary = BuildSummary {
            started_at: self.started_at,
            finished_at,
            outcome,
            tiers: self.tiers.clone(),
            lines: self.lines,
            errors: self.errors,
        };
        info!(
            target: "buildwatch::session",
            outcome = %summary.outcome,
            elapsed = %summary.elapsed(),
            lines = summary.lines,
            tiers = summary.tiers.len(),
            "build finished"
        );
        self.summary = Some(summary.clone());
        Ok(summary)
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    pub fn terminal(&self) -> &T {
        self.renderer.terminal()
    }

    pub fn renderer(&self) -> &Renderer<T> {
        &self.renderer
    }

    /// Whether an error line was seen. Never cleared.
    pub fn is_failed(&self) -> bool {
        matches!(self.phase, Phase::ErrorDumping)
            || self
                .summary
                .as_ref()
                .is_some_and(|s| s.outcome == BuildOutcome::Failed)
    }

    pub fn reached_done(&self) -> bool {
        self.reached_done
    }

    pub fn recent(&self) -> &RecentLines {
        &self.recent
    }

    pub fn phase_name(&self) -> &'static str {
        match &self.phase {
            Phase::Prebuild(_) => "prebuild",
            Phase::Building { stage, .. } => match stage {
                Stage::Idle => "idle",
                Stage::ScanningTools { .. } => "scanning_tools",
                Stage::PlainTier(_) => "plain_tier",
                Stage::ToolsTier(_) => "tools_tier",
            },
            Phase::ErrorDumping => "error_dumping",
            Phase::Finished => "finished",
        }
    }

    pub fn configure(&self) -> Option<&ConfigurePhase> {
        match &self.phase {
            Phase::Prebuild(configure) => Some(configure),
            _ => None,
        }
    }

    pub fn grammar(&self) -> Option<&SessionGrammar> {
        match &self.phase {
            Phase::Building { grammar, .. } => Some(grammar),
            _ => None,
        }
    }

    pub fn plain_tier(&self) -> Option<&PlainTier> {
        match &self.phase {
            Phase::Building {
                stage: Stage::PlainTier(tier),
                ..
            } => Some(tier),
            _ => None,
        }
    }

    pub fn tools_tier(&self) -> Option<&ToolsTier> {
        match &self.phase {
            Phase::Building {
                stage: Stage::ToolsTier(tier),
                ..
            } => Some(tier),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    fn scope(&self) -> Scope<'_> {
        match &self.phase {
            Phase::Building {
                stage: Stage::ScanningTools { .. },
                ..
            } => Scope::DirectoryScan,
            Phase::Building { grammar, .. } => Scope::Tiers(grammar),
            _ => Scope::Prebuild,
        }
    }

    fn enter_error_dump(&mut self) -> Result<()> {
        warn!(target: "buildwatch::session", line = self.lines, "build error detected; dumping remaining output");
        self.errors += 1;
        self.phase = Phase::ErrorDumping;
        self.renderer.begin_failure(self.recent.iter())
    }

    fn apply(&mut self, event: LineEvent) -> Result<()> {
        let Self {
            phase,
            renderer,
            reached_done,
            tiers,
            ..
        } = self;

        match phase {
            Phase::Prebuild(configure) => match event {
                LineEvent::MainConfigureStart => {
                    start_configure(renderer, configure, "configure".to_string())
                }
                LineEvent::SubConfigureStart(sub) => {
                    start_configure(renderer, configure, format!("{}/configure", sub))
                }
                LineEvent::ObjdirDetected(objdir) => {
                    let grammar = SessionGrammar::for_objdir(&objdir)?;
                    if let Some(index) = configure.finish_last() {
                        renderer.redraw_configure_step(configure, index)?;
                    }
                    info!(target: "buildwatch::session", objdir = grammar.objdir(), windows = grammar.is_windows(), "object directory detected");
                    *phase = Phase::Building {
                        grammar,
                        stage: Stage::Idle,
                    };
                    Ok(())
                }
                _ => Ok(()),
            },
            Phase::Building { stage, .. } => apply_building(renderer, stage, event, reached_done, tiers),
            Phase::ErrorDumping | Phase::Finished => Ok(()),
        }
    }
}

impl<T: Terminal> Drop for Session<T> {
    /// Abandoned before [`Session::finish`]: leave the terminal usable.
    fn drop(&mut self) {
        if matches!(self.phase, Phase::Finished) {
            return;
        }
        warn!(target: "buildwatch::session", "session abandoned; restoring terminal");
        if !matches!(self.phase, Phase::ErrorDumping) {
            let _ = self.renderer.begin_failure(std::iter::empty());
        }
        let _ = self
            .renderer
            .banner(BuildOutcome::Failed, &self.started_at, &Local::now());
        self.phase = Phase::Finished;
    }
}

fn start_configure<T: Terminal>(
    renderer: &mut Renderer<T>,
    configure: &mut ConfigurePhase,
    name: String,
) -> Result<()> {
    if configure.is_empty() {
        renderer.start_prebuild()?;
    } else if let Some(index) = configure.finish_last() {
        renderer.redraw_configure_step(configure, index)?;
    }
    debug!(target: "buildwatch::model", step = %name, "configure step");
    configure.start(name);
    renderer.append_configure_step(configure)
}

fn apply_building<T: Terminal>(
    renderer: &mut Renderer<T>,
    stage: &mut Stage,
    event: LineEvent,
    reached_done: &mut bool,
    tiers: &mut Vec<String>,
) -> Result<()> {
    match event {
        LineEvent::BuildDoneDetected => {
            debug!(target: "buildwatch::session", "completion line seen");
            *reached_done = true;
        }
        LineEvent::TierStart { name, dirs } => {
            close_stage(renderer, stage)?;
            debug!(target: "buildwatch::model", tier = %name, dirs = dirs.len(), "tier start");
            let tier = PlainTier::new(name.clone(), &dirs);
            renderer.start_tier(&tier)?;
            tiers.push(name);
            *stage = Stage::PlainTier(tier);
        }
        LineEvent::ToolsTierStart(name) => {
            close_stage(renderer, stage)?;
            debug!(target: "buildwatch::model", tier = %name, "tools tier scan");
            *stage = Stage::ScanningTools {
                name,
                found: Vec::new(),
            };
        }
        LineEvent::LibsPhaseStart(name) => match stage {
            Stage::PlainTier(tier) if tier.name() == name => {
                if let Some(index) = tier.start_libs() {
                    renderer.redraw_directory(tier, index, false)?;
                }
            }
            _ => trace!(target: "buildwatch::model", tier = %name, "libs line for inactive tier"),
        },
        LineEvent::DirectoryEntered(dir) => match stage {
            Stage::PlainTier(tier) => {
                apply_entered(tier, &dir, |t, i, opened| renderer.redraw_directory(t, i, opened))?
            }
            Stage::ToolsTier(tier) => apply_entered(tier, &dir, |t, i, opened| {
                renderer.redraw_tools_directory(t, i, opened)
            })?,
            _ => {}
        },
        LineEvent::MakefileUpToDate(dir) => {
            if let Stage::ScanningTools { found, .. } = stage {
                found.push(dir);
            }
        }
        LineEvent::DirectoryLeft => {
            if let Stage::ScanningTools { name, found } = stage {
                let name = std::mem::take(name);
                let found = std::mem::take(found);
                if found.is_empty() {
                    debug!(target: "buildwatch::model", tier = %name, "tools tier has no directories");
                    *stage = Stage::Idle;
                } else {
                    debug!(target: "buildwatch::model", tier = %name, dirs = found.len(), "tools tier start");
                    let tier = ToolsTier::new(name.clone(), &found);
                    renderer.start_tools(&tier)?;
                    tiers.push(name);
                    *stage = Stage::ToolsTier(tier);
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// Apply a directory entry and redraw whatever it changed.
fn apply_entered<S, F>(tier: &mut S, dir: &str, mut redraw: F) -> Result<()>
where
    S: SuccessionTier,
    F: FnMut(&S, usize, bool) -> Result<()>,
{
    match tier.enter(dir) {
        Some(Entered::Advanced(advance)) => {
            if let Some(previous) = advance.finalized {
                redraw(tier, previous, false)?;
            }
            redraw(tier, advance.opened, true)
        }
        Some(Entered::Descended(index)) => redraw(tier, index, false),
        None => {
            trace!(target: "buildwatch::model", dir, "untracked directory with nothing open");
            Ok(())
        }
    }
}

/// Finalize the open directory of the current tier, if any.
fn close_stage<T: Terminal>(renderer: &mut Renderer<T>, stage: &mut Stage) -> Result<()> {
    match stage {
        Stage::PlainTier(tier) => {
            if let Some(index) = tier.finish_current() {
                renderer.redraw_directory(tier, index, false)?;
            }
        }
        Stage::ToolsTier(tier) => {
            if let Some(index) = tier.finish_current() {
                renderer.redraw_tools_directory(tier, index, false)?;
            }
        }
        Stage::Idle | Stage::ScanningTools { .. } => {}
    }
    Ok(())
}

/// Drive a session over `input` until it is exhausted.
///
/// Lines are decoded lossily. If reading or rendering fails the session is
/// dropped, which prints the failure banner, and the error is returned.
pub fn watch<R: BufRead, T: Terminal>(
    mut input: R,
    term: T,
    options: SessionOptions,
) -> Result<BuildSummary> {
    let mut session = Session::start(term, options)?;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        session.feed_line(&line)?;
    }
    session.finish()
}
