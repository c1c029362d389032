//! In-place progress display.
//!
//! Content is only ever appended at the bottom. Rows already on screen are
//! patched by walking the cursor up with relative motions, since absolute
//! addressing is not available below the top of the screen. The renderer
//! tracks the cursor as a row offset from the bottom anchor (zero is the
//! row new content will be appended on, negative is above it); every move
//! is computed from the last known offset, and returning to the bottom is
//! deferred until something needs to be appended.

use crate::model::{ConfigurePhase, PlainTier, SuccessionTier, ToolsTier};
use crate::terminal::Terminal;
use crate::Result;
use buildwatch_types::{BuildOutcome, Lane};
use chrono::{DateTime, Local};
use tracing::trace;

/// Column the cursor parks on between redraws; rows are one column narrower.
pub const PARKING_COLUMN: u16 = 79;

const THROBBER: [&str; 4] = ["-", "\\", "|", "/"];

const NAME_WIDTH: usize = 45;

pub struct Renderer<T: Terminal> {
    term: T,
    /// Cursor row relative to the bottom anchor.
    pos: i64,
    throb: usize,
    titles: bool,
}

impl<T: Terminal> Renderer<T> {
    pub fn new(term: T, titles: bool) -> Self {
        Self {
            term,
            pos: 0,
            throb: 0,
            titles,
        }
    }

    pub fn terminal(&self) -> &T {
        &self.term
    }

    /// Cursor row relative to the bottom anchor.
    pub fn cursor_offset(&self) -> i64 {
        self.pos
    }

    /// Index of the next throbber glyph.
    pub fn throbber_phase(&self) -> usize {
        self.throb
    }

    pub fn flush(&mut self) -> Result<()> {
        self.term.flush()?;
        Ok(())
    }

    /// Reset the display and print the start line.
    pub fn start(&mut self, started_at: &DateTime<Local>) -> Result<()> {
        self.clear_title()?;
        self.term.reset_color()?;
        self.term.clear_screen()?;
        self.term
            .write_text(&format!("Build started at {}\n", started_at.format("%H:%M:%S")))?;
        self.pos = 0;
        self.park()
    }

    // ------------------------------------------------------------------
    // Cursor bookkeeping
    // ------------------------------------------------------------------

    fn park(&mut self) -> Result<()> {
        self.term.right(PARKING_COLUMN)?;
        Ok(())
    }

    fn line_home(&mut self) -> Result<()> {
        self.term.left(PARKING_COLUMN)?;
        Ok(())
    }

    fn up(&mut self, rows: i64) -> Result<()> {
        if rows > 0 {
            self.term.up(motion(rows))?;
            self.pos -= rows;
        }
        Ok(())
    }

    fn down(&mut self, rows: i64) -> Result<()> {
        if rows > 0 {
            self.term.down(motion(rows))?;
            self.pos += rows;
        }
        Ok(())
    }

    /// Move to column zero of `row`, from wherever the last redraw left the cursor.
    fn go_to_row(&mut self, row: i64) -> Result<()> {
        self.clear_throbber()?;
        if row > self.pos {
            self.down(row - self.pos)?;
        } else if row < self.pos {
            self.up(self.pos - row)?;
        }
        self.line_home()
    }

    fn go_to_end(&mut self) -> Result<()> {
        self.go_to_row(0)
    }

    /// Append `rows` at the bottom, then walk back up so the cursor parks on
    /// the first of them.
    fn append_block<F>(&mut self, header: Option<String>, rows: usize, mut draw: F) -> Result<()>
    where
        F: FnMut(&mut Self, usize) -> Result<()>,
    {
        self.go_to_end()?;
        self.term.reset_color()?;
        if let Some(header) = header {
            self.term.write_text(&header)?;
        }
        for index in 0..rows {
            draw(self, index)?;
            self.term.write_text("\n")?;
        }
        self.up(rows as i64)?;
        self.park()
    }

    // ------------------------------------------------------------------
    // Throbber
    // ------------------------------------------------------------------

    /// Redraw the activity glyph; once per processed line.
    pub fn tick(&mut self) -> Result<()> {
        self.term.left(1)?;
        self.term.write_text(THROBBER[self.throb])?;
        self.advance_throbber();
        Ok(())
    }

    fn advance_throbber(&mut self) {
        self.throb = (self.throb + 1) % THROBBER.len();
    }

    fn clear_throbber(&mut self) -> Result<()> {
        self.term.left(1)?;
        self.term.write_text(" ")?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Titles
    // ------------------------------------------------------------------

    fn set_title(&mut self, title: &str) -> Result<()> {
        if self.titles {
            self.term.set_title(title)?;
        }
        Ok(())
    }

    fn clear_title(&mut self) -> Result<()> {
        if self.titles {
            self.term.clear_title()?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Prebuild
    // ------------------------------------------------------------------

    pub fn start_prebuild(&mut self) -> Result<()> {
        self.append_block(Some("\nprebuild:\n".to_string()), 0, |_, _| Ok(()))
    }

    /// Append the newest configure step as a new row.
    pub fn append_configure_step(&mut self, phase: &ConfigurePhase) -> Result<()> {
        let Some(index) = phase.len().checked_sub(1) else {
            return Ok(());
        };
        self.set_title(&phase.step(index).name)?;
        self.append_block(None, 1, |r, _| r.draw_configure_row(phase, index))
    }

    pub fn redraw_configure_step(&mut self, phase: &ConfigurePhase, index: usize) -> Result<()> {
        self.go_to_row(row_offset(index, phase.len()))?;
        self.draw_configure_row(phase, index)
    }

    fn draw_configure_row(&mut self, phase: &ConfigurePhase, index: usize) -> Result<()> {
        let step = phase.step(index);
        self.term.set_color(step.state.color(0), true, None)?;
        self.term.write_text(&format!("  {:<77}", step.name))?;
        self.term.reset_color()?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Plain tiers
    // ------------------------------------------------------------------

    pub fn start_tier(&mut self, tier: &PlainTier) -> Result<()> {
        trace!(target: "buildwatch::render", tier = tier.name(), dirs = tier.len(), "tier block");
        let header = format!("\ntier {} - {} dirs:\n", tier.name(), tier.len());
        self.append_block(Some(header), tier.len(), |r, index| r.draw_tier_row(tier, index))
    }

    /// Redraw one directory row, and retitle when it just opened.
    pub fn redraw_directory(&mut self, tier: &PlainTier, index: usize, opened: bool) -> Result<()> {
        self.go_to_row(row_offset(index, tier.len()))?;
        if opened {
            let title = format!(
                "{} {} [{}/{}] {}",
                tier.name(),
                tier.pass().as_str(),
                index + 1,
                tier.len(),
                tier.dir(index).name
            );
            self.set_title(&title)?;
        }
        self.draw_tier_row(tier, index)
    }

    fn draw_tier_row(&mut self, tier: &PlainTier, index: usize) -> Result<()> {
        let dir = tier.dir(index);
        self.term.set_color(dir.export.color(), true, None)?;
        self.term.write_text(&format!("  export {}", count_field(dir.export)))?;
        self.term.set_color(dir.libs.color(), true, None)?;
        self.term.write_text(&format!("libs {}", count_field(dir.libs)))?;
        self.term.reset_color()?;
        self.term.write_text(&format!("{:<width$}", dir.name, width = NAME_WIDTH))?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Tools tiers
    // ------------------------------------------------------------------

    pub fn start_tools(&mut self, tier: &ToolsTier) -> Result<()> {
        trace!(target: "buildwatch::render", tier = tier.name(), dirs = tier.len(), "tools block");
        let header = format!("\ntools tier {} - {} dirs:\n", tier.name(), tier.len());
        self.append_block(Some(header), tier.len(), |r, index| r.draw_tools_row(tier, index))
    }

    pub fn redraw_tools_directory(
        &mut self,
        tier: &ToolsTier,
        index: usize,
        opened: bool,
    ) -> Result<()> {
        self.go_to_row(row_offset(index, tier.len()))?;
        if opened {
            let title = format!(
                "{} tools [{}/{}] {}",
                tier.name(),
                index + 1,
                tier.len(),
                tier.dir(index).name
            );
            self.set_title(&title)?;
        }
        self.draw_tools_row(tier, index)
    }

    fn draw_tools_row(&mut self, tier: &ToolsTier, index: usize) -> Result<()> {
        let dir = tier.dir(index);
        self.term.set_color(dir.lane.color(), true, None)?;
        let count = if dir.lane.count > 0 {
            format!("[{:>2}]", dir.lane.count)
        } else {
            " ".repeat(4)
        };
        let text = format!("  {} {}", dir.name, count);
        let width = text.chars().count();
        self.term.write_text(&text)?;
        self.term.reset_color()?;
        let pad = usize::from(PARKING_COLUMN).saturating_sub(width);
        self.term.right(motion(pad as i64))?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Failure and completion
    // ------------------------------------------------------------------

    /// Leave the tracked display for good: move below all content, clear
    /// the title and colors, and replay `recent` lines verbatim.
    pub fn begin_failure<'a>(&mut self, recent: impl IntoIterator<Item = &'a str>) -> Result<()> {
        self.go_to_end()?;
        self.clear_title()?;
        self.term.reset_color()?;
        self.term.write_text("\n")?;
        for line in recent {
            self.term.write_text(line)?;
            self.term.write_text("\n")?;
        }
        Ok(())
    }

    /// Echo a line while dumping after a failure. The throbber state still
    /// advances but nothing is drawn for it.
    pub fn echo(&mut self, line: &str) -> Result<()> {
        self.term.write_text(line.trim_end_matches(['\n', '\r']))?;
        self.term.write_text("\n")?;
        self.advance_throbber();
        Ok(())
    }

    /// Print the final banner. For failures [`begin_failure`] must already
    /// have moved the cursor below the display.
    ///
    /// [`begin_failure`]: Renderer::begin_failure
    pub fn banner(
        &mut self,
        outcome: BuildOutcome,
        started_at: &DateTime<Local>,
        finished_at: &DateTime<Local>,
    ) -> Result<()> {
        let verb = if outcome.is_success() {
            self.go_to_end()?;
            self.clear_title()?;
            self.term.reset_color()?;
            "completed"
        } else {
            "failed"
        };
        self.term.write_text(&format!(
            "\nBuild {} at {} taking {}\n\n",
            verb,
            finished_at.format("%H:%M:%S"),
            buildwatch_types::format_elapsed(*started_at, *finished_at)
        ))?;
        self.term.flush()?;
        Ok(())
    }
}

/// Row of item `index` in a block of `len` rows ending at the bottom anchor.
fn row_offset(index: usize, len: usize) -> i64 {
    index as i64 - len as i64
}

fn motion(rows: i64) -> u16 {
    u16::try_from(rows.max(0)).unwrap_or(u16::MAX)
}

/// Bracketed sub-event count of a tier lane, or blanks of the same width.
fn count_field(lane: Lane) -> String {
    if lane.count > 0 {
        format!("[{:>2}]      ", lane.count)
    } else {
        " ".repeat(10)
    }
}
