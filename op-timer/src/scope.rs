//! The operation timer scope: wraps a block, times it, and logs exactly one
//! line on exit.

use std::any::Any;
use std::fmt::Display;
use std::panic::{AssertUnwindSafe, catch_unwind, resume_unwind};
use std::time::{Duration, Instant};

use futures::FutureExt;
use tracing::Level;

use crate::handle::OpHandle;

/// Scope constructor for a named operation.
///
/// `tag` is the correlation prefix of every line the scope emits. The
/// completion line is logged at `Level::INFO` unless overridden with
/// [`OpScope::with_level`]; the failure line is always logged at
/// `Level::ERROR`.
#[derive(Debug, Clone, Copy)]
pub struct OpScope<'a> {
    tag: &'a str,
    level: Level,
}

impl<'a> OpScope<'a> {
    /// Create a scope for `tag` with the default completion severity.
    pub fn new(tag: &'a str) -> Self {
        Self {
            tag,
            level: Level::INFO,
        }
    }

    /// Override the severity of the completion line.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Run `f` inside the scope.
    ///
    /// Exactly one line is emitted on exit, whichever way the block leaves:
    ///
    /// - `Err(e)`: the failure line, with `e` attached as the `error` field;
    ///   the error is returned unchanged.
    /// - panic: the failure line, with the payload attached as the `panic`
    ///   field; the original payload is then re-raised unchanged.
    /// - `Ok(v)` after [`OpHandle::suppress_completion`]: nothing is logged;
    ///   the caller owns its own reporting.
    /// - `Ok(v)` otherwise: the completion line, including the last message
    ///   set via [`OpHandle::set_message`] if any.
    pub fn run<T, E, F>(self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut OpHandle) -> Result<T, E>,
        E: Display,
    {
        let start = Instant::now();
        let mut handle = OpHandle::new();
        let outcome = catch_unwind(AssertUnwindSafe(|| f(&mut handle)));
        let elapsed = start.elapsed();
        match outcome {
            Ok(result) => {
                finish(self.tag, self.level, &handle, elapsed, &result);
                result
            }
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                emit_failure(self.tag, elapsed, Failure::Panic(&msg));
                resume_unwind(payload)
            }
        }
    }

    /// Run `f` inside the scope, awaiting the wrapped operation.
    ///
    /// Same exit behavior as [`OpScope::run`]; elapsed time spans entry to
    /// exit including any suspension. Two exits are specific to futures:
    /// dropping the scope future before the operation completes (external
    /// cancellation) emits the failure line with `cause = "cancelled"`, and
    /// a scope future that is never polled never entered the scope and emits
    /// nothing.
    pub async fn run_async<T, E, F>(self, f: F) -> Result<T, E>
    where
        F: AsyncFnOnce(&mut OpHandle) -> Result<T, E>,
        E: Display,
    {
        let start = Instant::now();
        let mut handle = OpHandle::new();
        let mut guard = CancelGuard {
            tag: self.tag,
            start,
            armed: true,
        };
        let outcome = AssertUnwindSafe(f(&mut handle)).catch_unwind().await;
        guard.disarm();
        let elapsed = start.elapsed();
        match outcome {
            Ok(result) => {
                finish(self.tag, self.level, &handle, elapsed, &result);
                result
            }
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                emit_failure(self.tag, elapsed, Failure::Panic(&msg));
                resume_unwind(payload)
            }
        }
    }
}

/// Run `f` inside an operation scope, logging completion at `Level::INFO`.
///
/// # Examples
///
/// ```
/// fn main() -> Result<(), String> {
///     let n = op_timer::scoped("svc.price", |op| {
///         op.set_message("成功 5只");
///         Ok::<_, String>(5)
///     })?;
///     assert_eq!(n, 5);
///     Ok(())
/// }
/// ```
pub fn scoped<T, E, F>(tag: &str, f: F) -> Result<T, E>
where
    F: FnOnce(&mut OpHandle) -> Result<T, E>,
    E: Display,
{
    OpScope::new(tag).run(f)
}

/// Async counterpart of [`scoped`]; the wrapped operation may await.
pub async fn scoped_async<T, E, F>(tag: &str, f: F) -> Result<T, E>
where
    F: AsyncFnOnce(&mut OpHandle) -> Result<T, E>,
    E: Display,
{
    OpScope::new(tag).run_async(f).await
}

/// Logs the failure line if the scope future is dropped before the wrapped
/// operation finishes.
struct CancelGuard<'a> {
    tag: &'a str,
    start: Instant,
    armed: bool,
}

impl CancelGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for CancelGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            emit_failure(self.tag, self.start.elapsed(), Failure::Cancelled);
        }
    }
}

/// Failure detail attached to the error event. Never spliced into the
/// message text, which stays format-stable.
enum Failure<'a> {
    Error(&'a dyn Display),
    Panic(&'a str),
    Cancelled,
}

fn finish<T, E>(
    tag: &str,
    level: Level,
    handle: &OpHandle,
    elapsed: Duration,
    result: &Result<T, E>,
) where
    E: Display,
{
    match result {
        Ok(_) => emit_completion(tag, level, handle, elapsed),
        Err(err) => emit_failure(tag, elapsed, Failure::Error(err)),
    }
}

fn emit_completion(tag: &str, level: Level, handle: &OpHandle, elapsed: Duration) {
    if handle.is_suppressed() {
        return;
    }
    let text = completion_text(tag, handle.message(), elapsed);
    match level {
        Level::ERROR => tracing::error!("{text}"),
        Level::WARN => tracing::warn!("{text}"),
        Level::INFO => tracing::info!("{text}"),
        Level::DEBUG => tracing::debug!("{text}"),
        _ => tracing::trace!("{text}"),
    }
}

fn emit_failure(tag: &str, elapsed: Duration, failure: Failure<'_>) {
    let text = failure_text(tag, elapsed);
    match failure {
        Failure::Error(err) => tracing::error!(error = %err, "{text}"),
        Failure::Panic(msg) => tracing::error!(panic = %msg, "{text}"),
        Failure::Cancelled => tracing::error!(cause = "cancelled", "{text}"),
    }
}

fn completion_text(tag: &str, message: Option<&str>, elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    match message.filter(|m| !m.is_empty()) {
        Some(msg) => format!("[{tag}] 完成: {msg}, 耗时 {secs:.2}s"),
        None => format!("[{tag}] 完成, 耗时 {secs:.2}s"),
    }
}

fn failure_text(tag: &str, elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    format!("[{tag}] 失败, 耗时 {secs:.2}s")
}

/// Best-effort text for a panic payload, for attachment to the failure line.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
