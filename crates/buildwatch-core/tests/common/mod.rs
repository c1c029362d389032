//! Common test utilities for integration tests.

#![allow(dead_code)]

use buildwatch_core::{RecordingTerminal, Session, SessionOptions};
use std::path::PathBuf;

/// Load a build log fixture from the fixtures directory.
pub fn load_fixture(name: &str) -> String {
    let fixture_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(format!("{}.log", name));

    std::fs::read_to_string(&fixture_path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", fixture_path.display(), e))
}

/// Fixture lines with their newlines kept, as they arrive on stdin.
pub fn fixture_lines(name: &str) -> Vec<String> {
    load_fixture(name)
        .split_inclusive('\n')
        .map(str::to_string)
        .collect()
}

pub fn new_session() -> Session<RecordingTerminal> {
    Session::start(RecordingTerminal::new(), SessionOptions::default())
        .expect("session should start on a recording terminal")
}

/// Feed every line of a fixture without finishing the session.
pub fn feed_fixture(session: &mut Session<RecordingTerminal>, name: &str) {
    for line in fixture_lines(name) {
        session.feed_line(&line).expect("feeding a fixture line");
    }
}
