//! Classifies raw log lines into [`LineEvent`]s.
//!
//! Which patterns apply depends on where the session is: configure output
//! before the object directory is known, tier output after it, or the short
//! directory scan that opens a tools tier. The error pattern applies
//! everywhere and is always checked first.

use crate::grammar::{
    SessionGrammar, ERROR_RE, LEAVING_RE, LIBS_TIER_RE, MAIN_CONFIGURE_RE,
    MAKEFILE_UP_TO_DATE_RE, OBJDIR_ENTER_RE, OBJDIR_FLAG_RE, SUB_CONFIGURE_RE, TIER_RE,
    TOOLS_TIER_RE,
};
use buildwatch_types::LineEvent;
use tracing::trace;

/// Parse context for a single line.
#[derive(Debug, Clone, Copy)]
pub enum Scope<'g> {
    /// Configure steps; the object directory is not known yet.
    Prebuild,
    /// Tier processing with the object directory grammar installed.
    Tiers(&'g SessionGrammar),
    /// Collecting the directory set of a tools tier.
    DirectoryScan,
}

/// Classify one line. Never fails: unmatched lines are [`LineEvent::RawLine`].
pub fn classify(line: &str, scope: Scope<'_>) -> LineEvent {
    let line = line.trim_end_matches(['\n', '\r']);

    if ERROR_RE.is_match(line) {
        return LineEvent::BuildErrorDetected;
    }

    let event = match scope {
        Scope::Prebuild => classify_prebuild(line),
        Scope::Tiers(grammar) => classify_tiers(line, grammar),
        Scope::DirectoryScan => classify_scan(line),
    };

    if event != LineEvent::RawLine {
        trace!(target: "buildwatch::classifier", kind = event.kind(), "{}", line);
    }
    event
}

fn classify_prebuild(line: &str) -> LineEvent {
    if MAIN_CONFIGURE_RE.is_match(line) {
        return LineEvent::MainConfigureStart;
    }
    if let Some(caps) = SUB_CONFIGURE_RE.captures(line) {
        return LineEvent::SubConfigureStart(caps[1].to_string());
    }
    if let Some(caps) = OBJDIR_FLAG_RE
        .captures(line)
        .or_else(|| OBJDIR_ENTER_RE.captures(line))
    {
        return LineEvent::ObjdirDetected(caps[1].trim_end().to_string());
    }
    LineEvent::RawLine
}

fn classify_tiers(line: &str, grammar: &SessionGrammar) -> LineEvent {
    if grammar.is_done(line) {
        return LineEvent::BuildDoneDetected;
    }
    if let Some(caps) = TIER_RE.captures(line) {
        let dirs = caps[2].split_whitespace().map(str::to_string).collect();
        return LineEvent::TierStart {
            name: caps[1].to_string(),
            dirs,
        };
    }
    if let Some(caps) = TOOLS_TIER_RE.captures(line) {
        return LineEvent::ToolsTierStart(caps[1].to_string());
    }
    if let Some(caps) = LIBS_TIER_RE.captures(line) {
        return LineEvent::LibsPhaseStart(caps[1].to_string());
    }
    if let Some(dir) = grammar.entered_directory(line) {
        return LineEvent::DirectoryEntered(dir);
    }
    LineEvent::RawLine
}

fn classify_scan(line: &str) -> LineEvent {
    if LEAVING_RE.is_match(line) {
        return LineEvent::DirectoryLeft;
    }
    if let Some(caps) = MAKEFILE_UP_TO_DATE_RE.captures(line) {
        return LineEvent::MakefileUpToDate(caps[1].to_string());
    }
    LineEvent::RawLine
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar() -> SessionGrammar {
        SessionGrammar::for_objdir("/src/obj").unwrap()
    }

    #[test]
    fn test_prebuild_events() {
        assert_eq!(
            classify("Adding configure options from /src/.mozconfig:\n", Scope::Prebuild),
            LineEvent::MainConfigureStart
        );
        assert_eq!(
            classify("configuring in nsprpub\n", Scope::Prebuild),
            LineEvent::SubConfigureStart("nsprpub".to_string())
        );
        assert_eq!(
            classify("checking for gcc... gcc\n", Scope::Prebuild),
            LineEvent::RawLine
        );
    }

    #[test]
    fn test_objdir_from_flag() {
        assert_eq!(
            classify("make -j4 -C /src/obj\n", Scope::Prebuild),
            LineEvent::ObjdirDetected("/src/obj".to_string())
        );
        assert_eq!(
            classify("gmake -f client.mk -C /src/obj \r\n", Scope::Prebuild),
            LineEvent::ObjdirDetected("/src/obj".to_string())
        );
    }

    #[test]
    fn test_objdir_from_driver_announcement() {
        assert_eq!(
            classify("make.py[0]: Entering directory '/obj'\n", Scope::Prebuild),
            LineEvent::ObjdirDetected("/obj".to_string())
        );
    }

    #[test]
    fn test_directory_lines_ignored_before_objdir() {
        assert_eq!(
            classify("make[2]: Entering directory `/src/obj/js'\n", Scope::Prebuild),
            LineEvent::RawLine
        );
    }

    #[test]
    fn test_tier_events() {
        let grammar = grammar();
        let scope = Scope::Tiers(&grammar);
        assert_eq!(
            classify("tier_base: config build  probes\n", scope),
            LineEvent::TierStart {
                name: "base".to_string(),
                dirs: vec!["config".into(), "build".into(), "probes".into()],
            }
        );
        assert_eq!(
            classify("tools_tier_testharness\n", scope),
            LineEvent::ToolsTierStart("testharness".to_string())
        );
        assert_eq!(
            classify("libs_tier_base\n", scope),
            LineEvent::LibsPhaseStart("base".to_string())
        );
        assert_eq!(
            classify("make[2]: Entering directory `/src/obj/config'\n", scope),
            LineEvent::DirectoryEntered("config".to_string())
        );
        assert_eq!(
            classify("make[1]: Leaving directory `/src/obj'\n", scope),
            LineEvent::BuildDoneDetected
        );
        assert_eq!(classify("cc -o foo.o foo.c\n", scope), LineEvent::RawLine);
    }

    #[test]
    fn test_configure_lines_are_raw_during_tiers() {
        let grammar = grammar();
        assert_eq!(
            classify("configuring in js/src\n", Scope::Tiers(&grammar)),
            LineEvent::RawLine
        );
    }

    #[test]
    fn test_scan_events() {
        assert_eq!(
            classify("make[2]: `tools/trace-malloc/Makefile' is up to date.\n", Scope::DirectoryScan),
            LineEvent::MakefileUpToDate("tools/trace-malloc".to_string())
        );
        assert_eq!(
            classify("make[2]: Leaving directory `/src/obj'\n", Scope::DirectoryScan),
            LineEvent::DirectoryLeft
        );
        assert_eq!(
            classify("tier_base: config\n", Scope::DirectoryScan),
            LineEvent::RawLine
        );
    }

    #[test]
    fn test_error_checked_first_in_every_scope() {
        let grammar = grammar();
        let line = "make[4]: *** [export] Error 2\n";
        for scope in [Scope::Prebuild, Scope::Tiers(&grammar), Scope::DirectoryScan] {
            assert_eq!(classify(line, scope), LineEvent::BuildErrorDetected);
        }
    }
}
