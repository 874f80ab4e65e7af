//! Argv-style command specification for backend launches.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;
use tokio::process::Command;

/// Specification for a backend process to launch.
///
/// Arguments cross the process boundary as discrete `OsString` elements and
/// are never evaluated by a shell. When the platform adapter wraps a
/// `cmd.exe` built-in, the interpreter and its single-command flag arrive
/// here as ordinary argv elements, so the launch itself stays argv-style.
///
/// # Example
///
/// ```rust
/// use llm_bridge::CommandSpec;
///
/// let spec = CommandSpec::new("python3")
///     .arg("scripts/call_backend.py")
///     .cwd("/srv/agent");
/// assert_eq!(spec.args.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    /// Program to execute.
    pub program: OsString,
    /// Arguments as discrete elements.
    pub args: Vec<OsString>,
    /// Working directory override, if any.
    pub cwd: Option<PathBuf>,
    /// Environment overrides, if any.
    pub env: Option<HashMap<OsString, OsString>>,
}

impl CommandSpec {
    /// Create a new spec for `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: None,
        }
    }

    /// Append a single argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory for the child.
    #[must_use]
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Set an environment variable for the child.
    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Build a spec from a command vector: element 0 is the program, the
    /// rest are arguments. Returns `None` for an empty vector.
    #[must_use]
    pub fn from_vector(command: &[String]) -> Option<Self> {
        let (program, rest) = command.split_first()?;
        Some(Self::new(program).args(rest))
    }

    /// Convert into a [`tokio::process::Command`] for launching.
    #[must_use]
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        if let Some(ref env) = self.env {
            for (key, value) in env {
                cmd.env(key, value);
            }
        }

        cmd
    }
}
