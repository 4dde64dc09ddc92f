//! Scoped timing-and-logging for named operations.
//!
//! Wraps a block of caller code, starts a monotonic timer on entry, and on
//! exit emits exactly one log line through [`tracing`]: a completion line on
//! success (unless the caller suppressed it) or a failure line with the
//! failure details attached. Errors and panics propagate unchanged; the
//! wrapper never swallows them.
//!
//! Line formats, kept stable for log correlation:
//!
//! - success, no message: `[{tag}] 完成, 耗时 {elapsed:.2}s`
//! - success, with message: `[{tag}] 完成: {message}, 耗时 {elapsed:.2}s`
//! - failure: `[{tag}] 失败, 耗时 {elapsed:.2}s` (details in the `error`,
//!   `panic`, or `cause` field)
//!
//! The logging backend is whatever [`tracing::Subscriber`] the host installed;
//! the `log` compatibility feature keeps `log`-based backends reachable.
//!
//! # Examples
//!
//! ```
//! fn main() -> Result<(), String> {
//!     let loaded = op_timer::scoped("cache.warm", |op| {
//!         op.set_message("3 entries");
//!         Ok::<_, String>(3)
//!     })?;
//!     assert_eq!(loaded, 3);
//!     Ok(())
//! }
//! ```
//!
//! Wrapped operations may await; elapsed time covers the suspension:
//!
//! ```no_run
//! # async fn demo() -> Result<(), String> {
//! let rows = op_timer::scoped_async("index.refresh", async |op| {
//!     op.set_message("42 行");
//!     Ok::<_, String>(42)
//! })
//! .await?;
//! assert_eq!(rows, 42);
//! # Ok(())
//! # }
//! ```

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod handle;
pub mod scope;

pub use handle::OpHandle;
pub use scope::{OpScope, scoped, scoped_async};
pub use tracing::Level;
