//! Shared types for the buildwatch log renderer.

mod event;
mod outcome;
mod progress;

pub use event::*;
pub use outcome::*;
pub use progress::*;
