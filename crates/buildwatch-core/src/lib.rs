//! Live, in-place progress display for tiered recursive make build logs.

mod classifier;
mod error;
mod grammar;
mod model;
mod recent;
mod renderer;
mod session;
mod terminal;

pub use classifier::{classify, Scope};
pub use error::WatchError;
pub use grammar::SessionGrammar;
pub use model::{Advance, ConfigurePhase, Entered, PlainTier, SuccessionTier, ToolsTier};
pub use recent::{RecentLines, DEFAULT_RECENT_LINES};
pub use renderer::{Renderer, PARKING_COLUMN};
pub use session::{watch, Session, SessionOptions};
pub use terminal::{AnsiTerminal, RecordingTerminal, TermOp, Terminal};

/// Result type for buildwatch operations.
pub type Result<T> = std::result::Result<T, WatchError>;
