//! Whole build logs driven through a session on a recording terminal.

mod common;

use buildwatch_core::{watch, RecordingTerminal, SessionOptions, SuccessionTier, TermOp};
use buildwatch_types::{BuildOutcome, Color, LaneState, TierPass};
use common::{feed_fixture, fixture_lines, load_fixture, new_session};

#[test]
fn test_full_build_completes_with_all_lanes_done() {
    let mut s = new_session();
    let lines = fixture_lines("full_build");
    let (body, last) = lines.split_at(lines.len() - 1);
    for line in body {
        s.feed_line(line).unwrap();
    }

    let tier = s.plain_tier().unwrap();
    assert_eq!(tier.name(), "t1");
    assert_eq!(tier.pass(), TierPass::Libs);
    assert_eq!(tier.dir(0).export.state, LaneState::Complete);
    assert_eq!(tier.dir(0).libs.state, LaneState::Complete);
    assert_eq!(tier.dir(1).export.state, LaneState::Complete);
    assert_eq!(tier.dir(1).export.count, 1);
    assert_eq!(tier.dir(1).libs.state, LaneState::InProgress);

    s.feed_line(&last[0]).unwrap();
    assert!(s.reached_done());
    assert!(!s.is_failed());

    let before = s.terminal().ops().len();
    let summary = s.finish().unwrap();
    assert_eq!(summary.outcome, BuildOutcome::Completed);
    assert_eq!(summary.tiers, vec!["t1".to_string()]);
    assert_eq!(summary.errors, 0);
    assert_eq!(summary.lines, lines.len() as u64);

    // dirB is redrawn with both lanes green before the banner
    let ops = &s.terminal().ops()[before..];
    let banner = ops
        .iter()
        .position(|op| matches!(op, TermOp::Text(t) if t.contains("Build completed at")))
        .unwrap();
    let colors: Vec<Color> = ops[..banner]
        .iter()
        .filter_map(|op| match op {
            TermOp::Color { fg, .. } => Some(*fg),
            _ => None,
        })
        .collect();
    assert_eq!(colors, vec![Color::Green, Color::Green]);
    assert!(ops[..banner]
        .iter()
        .any(|op| matches!(op, TermOp::Text(t) if t.starts_with("dirB"))));

    let text = s.terminal().text();
    assert!(text.starts_with("Build started at "));
    assert!(text.contains("\nprebuild:\n"));
    assert!(text.contains("  configure "));
    assert!(text.contains("  nsprpub/configure "));
    assert!(text.contains("\ntier t1 - 2 dirs:\n"));
    assert!(!text.contains("Build failed"));
    assert_eq!(s.terminal().title(), "");
    assert!(!s.terminal().is_colored());
    assert_eq!(s.renderer().cursor_offset(), 0);
}

#[test]
fn test_windows_object_directory() {
    let mut s = new_session();
    let lines = fixture_lines("windows_build");
    let (body, last) = lines.split_at(lines.len() - 1);
    for line in body {
        s.feed_line(line).unwrap();
    }

    assert!(s.grammar().unwrap().is_windows());
    let tier = s.plain_tier().unwrap();
    assert_eq!(tier.dir(0).name, "config");
    assert_eq!(tier.dir(0).export.state, LaneState::Complete);
    assert_eq!(tier.dir(1).name, "build");
    assert_eq!(tier.dir(1).export.state, LaneState::InProgress);
    assert_eq!(tier.dir(1).export.count, 1);

    s.feed_line(&last[0]).unwrap();
    assert_eq!(s.finish().unwrap().outcome, BuildOutcome::Completed);
}

#[test]
fn test_failed_build_replays_context_and_echoes_rest() {
    let mut term = RecordingTerminal::new();
    let log = load_fixture("failed_build");
    let summary = watch(log.as_bytes(), &mut term, SessionOptions::default()).unwrap();

    assert_eq!(summary.outcome, BuildOutcome::Failed);
    assert_eq!(summary.errors, 2);
    assert_eq!(summary.lines, 10);

    let text = term.text();
    assert!(text.contains(concat!(
        "\ntier_t1: A B\n",
        "make[2]: Entering directory `/obj/A'\n",
        "cc -o a.o -c a.c\n",
        "a.c:1:1: error: expected identifier\n",
        "make[3]: *** [a.o] Error 1\n",
        "make[2]: *** [libs] Error 2\n",
        "tier_t2: C\n",
        "make[2]: Entering directory `/obj/B'\n",
        "make[1]: Leaving directory `/obj'\n",
        "\nBuild failed at ",
    )));
    assert!(!text.contains("tier t2 - "));
    assert!(!text.contains("Build completed"));
    assert_eq!(term.title(), "");
}

#[test]
fn test_failure_context_size_is_configurable() {
    let mut term = RecordingTerminal::new();
    let log = load_fixture("failed_build");
    let options = SessionOptions {
        recent_lines: 2,
        ..SessionOptions::default()
    };
    watch(log.as_bytes(), &mut term, options).unwrap();

    let text = term.text();
    assert!(text.contains(" \na.c:1:1: error: expected identifier\nmake[3]: *** [a.o] Error 1\n"));
    assert!(!text.contains("\ncc -o a.o -c a.c\n"));
}

#[test]
fn test_empty_tools_tier_consumes_through_leaving_line() {
    let mut s = new_session();
    let lines = fixture_lines("empty_tools_tier");
    for line in &lines[..4] {
        s.feed_line(line).unwrap();
    }
    assert_eq!(s.phase_name(), "scanning_tools");

    s.feed_line(&lines[4]).unwrap();
    assert_eq!(s.phase_name(), "idle");
    assert!(!s.terminal().text().contains("tools tier"));

    s.feed_line(&lines[5]).unwrap();
    assert_eq!(s.phase_name(), "plain_tier");

    for line in &lines[6..] {
        s.feed_line(line).unwrap();
    }
    let summary = s.finish().unwrap();
    assert_eq!(summary.outcome, BuildOutcome::Completed);
    assert_eq!(summary.tiers, vec!["t2".to_string()]);
}

#[test]
fn test_tools_tier_progress() {
    let mut s = new_session();
    feed_fixture(&mut s, "tools_tier");

    let tier = s.tools_tier().unwrap();
    assert_eq!(tier.len(), 2);
    assert_eq!(tier.dir(0).name, "tools/x");
    assert_eq!(tier.dir(0).lane.state, LaneState::Complete);
    assert_eq!(tier.dir(0).lane.count, 2);
    assert_eq!(tier.dir(1).lane.state, LaneState::InProgress);
    assert!(s.reached_done());

    let text = s.terminal().text();
    assert!(text.contains("\ntools tier tools - 2 dirs:\n"));
    assert!(text.contains("  tools/x [ 2]"));

    let summary = s.finish().unwrap();
    assert_eq!(summary.outcome, BuildOutcome::Completed);
    assert_eq!(summary.tiers, vec!["tools".to_string()]);
}

#[test]
fn test_truncated_log_ends_with_failure_banner() {
    let mut s = new_session();
    let lines = fixture_lines("full_build");
    for line in &lines[..lines.len() - 1] {
        s.feed_line(line).unwrap();
    }
    let summary = s.finish().unwrap();
    assert_eq!(summary.outcome, BuildOutcome::Truncated);

    let text = s.terminal().text();
    assert!(text.contains("\nBuild failed at "));
    assert!(!text.contains("Build completed"));
    assert!(!s.terminal().is_colored());
}

#[test]
fn test_titles_can_be_disabled() {
    let mut term = RecordingTerminal::new();
    let options = SessionOptions {
        set_title: false,
        ..SessionOptions::default()
    };
    let log = load_fixture("full_build");
    watch(log.as_bytes(), &mut term, options).unwrap();
    assert!(!term.ops().iter().any(|op| matches!(op, TermOp::Title(_))));
}
