//! Translation of Unix-style command vectors for Windows hosts.
//!
//! The adapter is a total function over a small fixed vocabulary: commands
//! outside the translation table pass through untouched, and no input ever
//! produces an error. Translated commands that are `cmd.exe` built-ins get
//! wrapped so a direct process launch can still run them: built-ins have no
//! standalone executable and only exist inside the interpreter.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Host family a command vector is adapted for.
///
/// Injected as a parameter (rather than read from ambient global state) so
/// adaptation is deterministically testable on any host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetOs {
    /// Unix-like host; command vectors run as written.
    Unix,
    /// Windows host; Unix commands need translation.
    Windows,
}

impl TargetOs {
    /// The host this process is running on.
    #[must_use]
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Unix
        }
    }

    /// String form for diagnostics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unix => "unix",
            Self::Windows => "windows",
        }
    }
}

/// Unix commands and their Windows replacements.
static COMMAND_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("ls", "dir"),
        ("grep", "findstr"),
        ("cat", "type"),
        ("rm", "del"),
        ("cp", "copy"),
        ("mv", "move"),
        ("touch", "echo.>"),
        ("mkdir", "md"),
    ])
});

/// Commands built into `cmd.exe`. These do not correspond to standalone
/// executables and must be invoked through the interpreter.
static CMD_BUILTINS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from(["dir", "copy", "move", "del", "type", "echo.>", "md"])
});

/// Unix option tokens and their Windows equivalents, keyed by the original
/// command name. Only options listed here are translated; everything else
/// passes through unchanged.
static OPTION_MAP: Lazy<HashMap<&'static str, HashMap<&'static str, &'static str>>> =
    Lazy::new(|| {
        HashMap::from([
            ("ls", HashMap::from([("-l", "/p"), ("-a", "/a"), ("-R", "/s")])),
            ("grep", HashMap::from([("-i", "/i"), ("-r", "/s")])),
        ])
    });

/// The Windows command interpreter and its single-command-execution flag.
const CMD_INTERPRETER: &str = "cmd.exe";
const CMD_RUN_FLAG: &str = "/c";

/// Adapt a command vector for the target host.
///
/// On a Unix target (or for an empty vector, or a command outside the fixed
/// vocabulary) this returns an equal copy of the input. On a Windows target
/// it translates the command name, translates any option tokens with an
/// exact-string match in the option table, and wraps the result in
/// `["cmd.exe", "/c", ...]` when the translated command is a shell built-in.
///
/// Option matching is exact per element: a flag fused with its value in one
/// token is never matched or translated, and option *arguments* are treated
/// the same as any other element.
#[must_use]
pub fn adapt_command(target: TargetOs, command: &[String]) -> Vec<String> {
    if target != TargetOs::Windows {
        return command.to_vec();
    }

    let Some(name) = command.first() else {
        return Vec::new();
    };

    let Some(&replacement) = COMMAND_MAP.get(name.as_str()) else {
        return command.to_vec();
    };

    tracing::debug!(
        target: "llm_bridge::platform",
        command = %name,
        replacement = %replacement,
        "adapting command for Windows host"
    );

    let mut adapted = command.to_vec();
    adapted[0] = replacement.to_string();

    if let Some(options) = OPTION_MAP.get(name.as_str()) {
        for token in adapted.iter_mut().skip(1) {
            if let Some(&mapped) = options.get(token.as_str()) {
                *token = mapped.to_string();
            }
        }
    }

    tracing::debug!(
        target: "llm_bridge::platform",
        adapted = %adapted.join(" "),
        "adapted command"
    );

    if CMD_BUILTINS.contains(adapted[0].as_str()) {
        // Built-ins cannot be located by a direct spawn; route them through
        // the interpreter.
        let mut wrapped = Vec::with_capacity(adapted.len() + 2);
        wrapped.push(CMD_INTERPRETER.to_string());
        wrapped.push(CMD_RUN_FLAG.to_string());
        wrapped.extend(adapted);
        return wrapped;
    }

    adapted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_unix_target_is_identity() {
        let command = vector(&["ls", "-l", "-a"]);
        assert_eq!(adapt_command(TargetOs::Unix, &command), command);
    }

    #[test]
    fn test_empty_vector_unchanged() {
        assert_eq!(adapt_command(TargetOs::Windows, &[]), Vec::<String>::new());
        assert_eq!(adapt_command(TargetOs::Unix, &[]), Vec::<String>::new());
    }

    #[test]
    fn test_unknown_command_unchanged() {
        let command = vector(&["git", "status", "-s"]);
        assert_eq!(adapt_command(TargetOs::Windows, &command), command);
    }

    #[test]
    fn test_translates_command_and_options() {
        let command = vector(&["ls", "-l", "-a"]);
        assert_eq!(
            adapt_command(TargetOs::Windows, &command),
            vector(&["dir", "/p", "/a"])
        );
    }

    #[test]
    fn test_unmapped_option_passes_through() {
        let command = vector(&["ls", "-z"]);
        assert_eq!(
            adapt_command(TargetOs::Windows, &command),
            vector(&["dir", "-z"])
        );
    }

    #[test]
    fn test_builtin_is_wrapped_in_interpreter() {
        let command = vector(&["rm", "file.txt"]);
        assert_eq!(
            adapt_command(TargetOs::Windows, &command),
            vector(&["cmd.exe", "/c", "del", "file.txt"])
        );
    }

    #[test]
    fn test_non_builtin_is_not_wrapped() {
        // findstr ships as a real executable, no interpreter needed.
        let command = vector(&["grep", "-i", "needle", "haystack.txt"]);
        assert_eq!(
            adapt_command(TargetOs::Windows, &command),
            vector(&["findstr", "/i", "needle", "haystack.txt"])
        );
    }

    #[test]
    fn test_fused_option_token_not_matched() {
        // "-la" is not an exact table entry even though "-l" and "-a" are.
        let command = vector(&["ls", "-la"]);
        assert_eq!(
            adapt_command(TargetOs::Windows, &command),
            vector(&["dir", "-la"])
        );
    }

    #[test]
    fn test_option_argument_matching_is_literal() {
        // An argument whose literal text equals a mapped flag is translated
        // too; matching is exact-string, not positional.
        let command = vector(&["grep", "-r", "-i", "-r"]);
        assert_eq!(
            adapt_command(TargetOs::Windows, &command),
            vector(&["findstr", "/s", "/i", "/s"])
        );
    }

    #[test]
    fn test_input_vector_not_mutated() {
        let command = vector(&["rm", "-rf", "dir"]);
        let before = command.clone();
        let _ = adapt_command(TargetOs::Windows, &command);
        assert_eq!(command, before);
    }

    #[test]
    fn test_current_matches_cfg() {
        let target = TargetOs::current();
        if cfg!(target_os = "windows") {
            assert_eq!(target, TargetOs::Windows);
        } else {
            assert_eq!(target, TargetOs::Unix);
        }
    }
}
