//! llm-bridge - cross-platform command adaptation and streaming NDJSON
//! bridge for external LLM backends.
//!
//! Two small pieces share the OS-process boundary and compose for the
//! "run an external backend" path:
//!
//! - [`adapt_command`] rewrites a Unix-style command vector into a
//!   functionally equivalent vector on a Windows host, wrapping `cmd.exe`
//!   built-ins so a direct process launch can still run them. A pure, total
//!   function over a fixed vocabulary; commands outside it pass through
//!   untouched.
//! - [`StreamRunner`] launches an external program, delivers an input
//!   payload on stdin, and exposes stdout as a lazy, ordered sequence of
//!   decoded JSON records ([`RecordStream`]): one record per NDJSON line,
//!   pulled on demand, never buffered whole.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use llm_bridge::{StreamRunner, TargetOs};
//!
//! # async fn example() -> Result<(), llm_bridge::BridgeError> {
//! let runner = StreamRunner::new();
//! let command = vec!["python3".to_string(), "backend.py".to_string()];
//! let mut stream = runner
//!     .run_adapted(TargetOs::current(), &command, Some(r#"{"input":[]}"#))
//!     .await?;
//!
//! while let Some(record) = stream.next_record().await {
//!     println!("{}", record?);
//! }
//!
//! let report = stream.finish().await?;
//! if !report.success() {
//!     eprintln!("backend failed: {}", report.stderr_tail);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Exit status is out-of-band by design: a backend that emits valid records
//! and then dies still delivers every record before the failure becomes
//! visible through [`ExitReport`].

pub mod command_spec;
pub mod error;
pub mod platform;
pub mod stream;
pub mod tail_buffer;
pub mod tokens;

pub use command_spec::CommandSpec;
pub use error::BridgeError;
pub use platform::{TargetOs, adapt_command};
pub use stream::{BufferConfig, ExitReport, RecordStream, StreamRunner};
pub use tail_buffer::TailBuffer;
pub use tokens::approximate_tokens_used;
