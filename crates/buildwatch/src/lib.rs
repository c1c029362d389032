//! buildwatch - live progress display for tiered make builds.

pub mod config;
pub mod logging;
