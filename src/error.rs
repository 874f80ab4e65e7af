//! Error types for command launch and record streaming

use thiserror::Error;

/// Errors surfaced by the execution bridge.
///
/// An abnormal child exit is deliberately *not* a variant here: a non-zero
/// exit status after output has been drained is out-of-band information
/// carried by [`ExitReport`](crate::stream::ExitReport), since valid records
/// may already have been delivered before the child failed.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The child process could not be started (program not found,
    /// permission denied). Surfaced before any record is produced and
    /// never retried.
    #[error("failed to launch '{program}': {reason}")]
    Launch { program: String, reason: String },

    /// The command vector was empty; there is nothing to launch.
    #[error("no command specified to run")]
    EmptyCommand,

    /// A line of child output was not valid JSON. Terminal for the stream;
    /// carries the raw offending line for diagnosis.
    #[error("output line is not valid JSON: {line:?}")]
    Decode {
        line: String,
        #[source]
        source: serde_json::Error,
    },

    /// I/O failure while exchanging data with the child.
    #[error("child I/O failed: {reason}")]
    Io { reason: String },
}
