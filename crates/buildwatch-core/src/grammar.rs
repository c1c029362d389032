//! Line patterns for make-driven tiered build logs.
//!
//! Most patterns are fixed. The "entered directory" and "build done" patterns
//! depend on the object directory, which is only known once the first
//! recursive make invocation names it; those live in [`SessionGrammar`].

use crate::error::WatchError;
use crate::Result;
use once_cell::sync::Lazy;
use regex::Regex;

/// Tool name spellings: native make, GNU make and the pymake driver.
const TOOL: &str = r"(?:g?make|make\.py)";

/// A tool invocation exiting non-zero, at any recursion depth.
pub(crate) static ERROR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^{TOOL}\[\d+\]: .+ Error \d+$")).expect("Invalid error regex")
});

pub(crate) static MAIN_CONFIGURE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Adding configure options from").expect("Invalid main configure regex")
});

pub(crate) static SUB_CONFIGURE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^configuring in (.+)$").expect("Invalid sub configure regex")
});

/// Top-level invocation naming the object directory with `-C`.
pub(crate) static OBJDIR_FLAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^{TOOL} .*-C (.+)$")).expect("Invalid objdir flag regex")
});

/// Depth-zero "Entering directory" announcement printed by drivers that
/// do not pass `-C`.
pub(crate) static OBJDIR_ENTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^{TOOL}\[0\]: Entering directory [`'](.+)'$"))
        .expect("Invalid objdir enter regex")
});

pub(crate) static TIER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^tier_([^:]+): (.+)$").expect("Invalid tier regex")
});

pub(crate) static TOOLS_TIER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^tools_tier_(.+)$").expect("Invalid tools tier regex")
});

pub(crate) static LIBS_TIER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^libs_tier_(.+)$").expect("Invalid libs tier regex")
});

/// Makefile regeneration notice, one per directory of a tools tier.
pub(crate) static MAKEFILE_UP_TO_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^{TOOL}\[\d+\]: [`'](.+)/Makefile' is up to date\.$"))
        .expect("Invalid makefile regex")
});

pub(crate) static LEAVING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^{TOOL}\[\d+\]: Leaving directory")).expect("Invalid leaving regex")
});

/// Patterns anchored to a discovered object directory.
///
/// Built once when the object directory is detected and never changed
/// afterwards.
#[derive(Debug, Clone)]
pub struct SessionGrammar {
    objdir: String,
    windows: bool,
    entered: Regex,
    done: Regex,
}

impl SessionGrammar {
    /// Build the grammar for `objdir` as it appears in the log.
    ///
    /// Paths that do not start with `/` are Windows-style: the separator
    /// between the object directory and a subdirectory is a backslash,
    /// which make may print doubled.
    pub fn for_objdir(objdir: &str) -> Result<Self> {
        let objdir = objdir.trim_end();
        let windows = !objdir.starts_with('/');
        let escaped = regex::escape(objdir);
        let sep = if windows { r"\\\\?" } else { "/" };

        let compile = |pattern: String| {
            Regex::new(&pattern).map_err(|source| WatchError::Pattern {
                objdir: objdir.to_string(),
                source,
            })
        };

        let entered = compile(format!(
            r"(?:^|\x07){TOOL}\[\d+\]: Entering directory [`']{escaped}{sep}(.+)'$"
        ))?;
        let done = compile(format!(r"^{TOOL}\[1\]: Leaving directory [`']{escaped}'$"))?;

        Ok(Self {
            objdir: objdir.to_string(),
            windows,
            entered,
            done,
        })
    }

    pub fn objdir(&self) -> &str {
        &self.objdir
    }

    pub fn is_windows(&self) -> bool {
        self.windows
    }

    /// Subdirectory (relative to the object directory) entered by this line.
    ///
    /// Windows-style names come back with `/` separators so they compare
    /// equal to the names listed on tier lines.
    pub fn entered_directory(&self, line: &str) -> Option<String> {
        let caps = self.entered.captures(line)?;
        let dir = caps.get(1)?.as_str();
        if self.windows {
            Some(dir.replace("\\\\", "/").replace('\\', "/"))
        } else {
            Some(dir.to_string())
        }
    }

    /// Whether this line is the top-level invocation leaving the object directory.
    pub fn is_done(&self, line: &str) -> bool {
        self.done.is_match(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_pattern_both_tool_spellings() {
        assert!(ERROR_RE.is_match("make[3]: *** [libxul.so] Error 1"));
        assert!(ERROR_RE.is_match("gmake[12]: *** [export] Error 2"));
        assert!(ERROR_RE.is_match("make.py[2]: *** [libs] Error 1"));
        assert!(!ERROR_RE.is_match("make[3]: Nothing to be done for `libs'."));
        assert!(!ERROR_RE.is_match("error: expected ';'"));
    }

    #[test]
    fn test_unix_objdir_entered() {
        let grammar = SessionGrammar::for_objdir("/src/obj").unwrap();
        assert!(!grammar.is_windows());
        assert_eq!(
            grammar.entered_directory("make[2]: Entering directory `/src/obj/tier1'"),
            Some("tier1".to_string())
        );
        assert_eq!(
            grammar.entered_directory("gmake[4]: Entering directory '/src/obj/xpcom/base'"),
            Some("xpcom/base".to_string())
        );
        assert_eq!(
            grammar.entered_directory("make[2]: Entering directory `/elsewhere/tier1'"),
            None
        );
    }

    #[test]
    fn test_entered_after_bell() {
        let grammar = SessionGrammar::for_objdir("/src/obj").unwrap();
        assert_eq!(
            grammar.entered_directory("\x07make[2]: Entering directory `/src/obj/js'"),
            Some("js".to_string())
        );
    }

    #[test]
    fn test_objdir_is_matched_literally() {
        let grammar = SessionGrammar::for_objdir("/src/obj.debug+x").unwrap();
        assert_eq!(
            grammar.entered_directory("make[2]: Entering directory `/src/obj.debug+x/js'"),
            Some("js".to_string())
        );
        assert_eq!(
            grammar.entered_directory("make[2]: Entering directory `/src/objXdebug+x/js'"),
            None
        );
    }

    #[test]
    fn test_windows_objdir_doubled_backslashes() {
        let grammar = SessionGrammar::for_objdir(r"c:\\mozilla\\obj").unwrap();
        assert!(grammar.is_windows());
        assert_eq!(
            grammar.entered_directory(r"make[2]: Entering directory `c:\\mozilla\\obj\\xpcom'"),
            Some("xpcom".to_string())
        );
        assert_eq!(
            grammar.entered_directory(r"make[3]: Entering directory `c:\\mozilla\\obj\\xpcom\\base'"),
            Some("xpcom/base".to_string())
        );
    }

    #[test]
    fn test_done_pattern() {
        let grammar = SessionGrammar::for_objdir("/obj").unwrap();
        assert!(grammar.is_done("make[1]: Leaving directory `/obj'"));
        assert!(grammar.is_done("make.py[1]: Leaving directory '/obj'"));
        assert!(!grammar.is_done("make[2]: Leaving directory `/obj'"));
        assert!(!grammar.is_done("make[1]: Leaving directory `/obj/js'"));
    }

    #[test]
    fn test_objdir_trailing_whitespace_ignored() {
        let grammar = SessionGrammar::for_objdir("/obj  ").unwrap();
        assert_eq!(grammar.objdir(), "/obj");
    }
}
