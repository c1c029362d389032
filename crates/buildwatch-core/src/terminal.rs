//! Terminal primitives used by the renderer.
//!
//! The renderer only needs relative cursor motion, colors, titles and raw
//! text. [`AnsiTerminal`] emits them through crossterm to any writer;
//! [`RecordingTerminal`] captures them for tests.

use buildwatch_types::Color;
use crossterm::{
    cursor::{MoveDown, MoveLeft, MoveRight, MoveTo, MoveUp},
    queue,
    style::{
        Attribute, Color as TermColor, Print, ResetColor, SetAttribute, SetBackgroundColor,
        SetForegroundColor,
    },
    terminal::{Clear, ClearType, SetTitle},
};
use std::io::{self, Write};

/// Output operations the renderer relies on.
///
/// Motions with a count of zero must be no-ops; ANSI terminals treat a
/// zero count as one.
pub trait Terminal {
    /// Clear the screen and home the cursor.
    fn clear_screen(&mut self) -> io::Result<()>;
    fn set_title(&mut self, title: &str) -> io::Result<()>;
    fn set_color(&mut self, fg: Color, bright: bool, bg: Option<Color>) -> io::Result<()>;
    fn reset_color(&mut self) -> io::Result<()>;
    fn up(&mut self, n: u16) -> io::Result<()>;
    fn down(&mut self, n: u16) -> io::Result<()>;
    fn left(&mut self, n: u16) -> io::Result<()>;
    fn right(&mut self, n: u16) -> io::Result<()>;
    fn write_text(&mut self, text: &str) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;

    fn clear_title(&mut self) -> io::Result<()> {
        self.set_title("")
    }
}

impl<T: Terminal + ?Sized> Terminal for &mut T {
    fn clear_screen(&mut self) -> io::Result<()> {
        (**self).clear_screen()
    }
    fn set_title(&mut self, title: &str) -> io::Result<()> {
        (**self).set_title(title)
    }
    fn set_color(&mut self, fg: Color, bright: bool, bg: Option<Color>) -> io::Result<()> {
        (**self).set_color(fg, bright, bg)
    }
    fn reset_color(&mut self) -> io::Result<()> {
        (**self).reset_color()
    }
    fn up(&mut self, n: u16) -> io::Result<()> {
        (**self).up(n)
    }
    fn down(&mut self, n: u16) -> io::Result<()> {
        (**self).down(n)
    }
    fn left(&mut self, n: u16) -> io::Result<()> {
        (**self).left(n)
    }
    fn right(&mut self, n: u16) -> io::Result<()> {
        (**self).right(n)
    }
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        (**self).write_text(text)
    }
    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// Base colors map to the normal (30-37) SGR range; brightness is bold.
fn term_color(color: Color) -> TermColor {
    match color {
        Color::Black => TermColor::Black,
        Color::Red => TermColor::DarkRed,
        Color::Green => TermColor::DarkGreen,
        Color::Yellow => TermColor::DarkYellow,
        Color::Blue => TermColor::DarkBlue,
        Color::Magenta => TermColor::DarkMagenta,
        Color::Cyan => TermColor::DarkCyan,
        Color::White => TermColor::Grey,
    }
}

/// ANSI terminal over any writer, usually locked stdout.
///
/// Commands are queued; nothing reaches the writer's sink until [`flush`].
///
/// [`flush`]: Terminal::flush
pub struct AnsiTerminal<W: Write> {
    out: W,
}

impl<W: Write> AnsiTerminal<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Terminal for AnsiTerminal<W> {
    fn clear_screen(&mut self) -> io::Result<()> {
        queue!(self.out, MoveTo(0, 0), Clear(ClearType::All))
    }

    fn set_title(&mut self, title: &str) -> io::Result<()> {
        queue!(self.out, SetTitle(title))
    }

    fn set_color(&mut self, fg: Color, bright: bool, bg: Option<Color>) -> io::Result<()> {
        if bright {
            queue!(self.out, SetAttribute(Attribute::Bold))?;
        }
        queue!(self.out, SetForegroundColor(term_color(fg)))?;
        if let Some(bg) = bg {
            queue!(self.out, SetBackgroundColor(term_color(bg)))?;
        }
        Ok(())
    }

    fn reset_color(&mut self) -> io::Result<()> {
        queue!(self.out, ResetColor)
    }

    fn up(&mut self, n: u16) -> io::Result<()> {
        if n > 0 {
            queue!(self.out, MoveUp(n))?;
        }
        Ok(())
    }

    fn down(&mut self, n: u16) -> io::Result<()> {
        if n > 0 {
            queue!(self.out, MoveDown(n))?;
        }
        Ok(())
    }

    fn left(&mut self, n: u16) -> io::Result<()> {
        if n > 0 {
            queue!(self.out, MoveLeft(n))?;
        }
        Ok(())
    }

    fn right(&mut self, n: u16) -> io::Result<()> {
        if n > 0 {
            queue!(self.out, MoveRight(n))?;
        }
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> io::Result<()> {
        queue!(self.out, Print(text))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// A captured terminal operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermOp {
    ClearScreen,
    Title(String),
    Color {
        fg: Color,
        bright: bool,
        bg: Option<Color>,
    },
    Reset,
    Up(u16),
    Down(u16),
    Left(u16),
    Right(u16),
    Text(String),
    Flush,
}

/// In-memory terminal that records operations and follows the cursor.
///
/// Rows are counted from where the recording started; writing a newline
/// moves down a row and back to column zero.
#[derive(Debug, Default)]
pub struct RecordingTerminal {
    ops: Vec<TermOp>,
    row: i64,
    col: i64,
    title: String,
    colored: bool,
}

impl RecordingTerminal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[TermOp] {
        &self.ops
    }

    /// Remove and return everything recorded so far. Cursor tracking is kept.
    pub fn take_ops(&mut self) -> Vec<TermOp> {
        std::mem::take(&mut self.ops)
    }

    /// Concatenation of all written text.
    pub fn text(&self) -> String {
        self.ops
            .iter()
            .filter_map(|op| match op {
                TermOp::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Current cursor row relative to where recording started.
    pub fn row(&self) -> i64 {
        self.row
    }

    pub fn col(&self) -> i64 {
        self.col
    }

    /// Last title set, empty once cleared.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Whether a color is active (set and not yet reset).
    pub fn is_colored(&self) -> bool {
        self.colored
    }

    /// Net vertical cursor motion from up/down operations only.
    pub fn vertical_motion(ops: &[TermOp]) -> i64 {
        ops.iter()
            .map(|op| match op {
                TermOp::Up(n) => -i64::from(*n),
                TermOp::Down(n) => i64::from(*n),
                _ => 0,
            })
            .sum()
    }
}

impl Terminal for RecordingTerminal {
    fn clear_screen(&mut self) -> io::Result<()> {
        self.ops.push(TermOp::ClearScreen);
        self.row = 0;
        self.col = 0;
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> io::Result<()> {
        self.ops.push(TermOp::Title(title.to_string()));
        self.title = title.to_string();
        Ok(())
    }

    fn set_color(&mut self, fg: Color, bright: bool, bg: Option<Color>) -> io::Result<()> {
        self.ops.push(TermOp::Color { fg, bright, bg });
        self.colored = true;
        Ok(())
    }

    fn reset_color(&mut self) -> io::Result<()> {
        self.ops.push(TermOp::Reset);
        self.colored = false;
        Ok(())
    }

    fn up(&mut self, n: u16) -> io::Result<()> {
        if n > 0 {
            self.ops.push(TermOp::Up(n));
            self.row -= i64::from(n);
        }
        Ok(())
    }

    fn down(&mut self, n: u16) -> io::Result<()> {
        if n > 0 {
            self.ops.push(TermOp::Down(n));
            self.row += i64::from(n);
        }
        Ok(())
    }

    fn left(&mut self, n: u16) -> io::Result<()> {
        if n > 0 {
            self.ops.push(TermOp::Left(n));
            self.col = (self.col - i64::from(n)).max(0);
        }
        Ok(())
    }

    fn right(&mut self, n: u16) -> io::Result<()> {
        if n > 0 {
            self.ops.push(TermOp::Right(n));
            self.col += i64::from(n);
        }
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> io::Result<()> {
        for ch in text.chars() {
            if ch == '\n' {
                self.row += 1;
                self.col = 0;
            } else {
                self.col += 1;
            }
        }
        self.ops.push(TermOp::Text(text.to_string()));
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.ops.push(TermOp::Flush);
        Ok(())
    }
}
