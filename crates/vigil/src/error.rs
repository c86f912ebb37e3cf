//! Error model shared by every console command.
//!
//! Commands fail in two ways. A [`UserError`] is an expected, operator
//! actionable failure: bad arguments, a missing file, a daemon that is already
//! running. The engine renders it as a single styled line and exits with
//! status 1. A [`Fault`] is a programming or unexpected failure; the engine
//! never reformats it and the top-level runner prints it in full.

use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::io;

use thiserror::Error;

use crate::telemetry::TelemetryError;

/// Boxed error used for wrapped sources.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result returned by a command's `handle` hook.
///
/// `Ok(Some(text))` is written to the output stream, `Ok(None)` writes
/// nothing.
pub type Outcome = Result<Option<String>, CommandError>;

/// Expected failure carrying an operator-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct UserError {
    message: String,
    #[source]
    source: Option<BoxError>,
    trace: Box<Backtrace>,
}

impl UserError {
    /// Builds an error from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
            trace: Box::new(Backtrace::force_capture()),
        }
    }

    /// Builds an error from a message and the failure that caused it.
    #[must_use]
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
            trace: Box::new(Backtrace::force_capture()),
        }
    }

    /// Operator-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Stack captured where the error was raised.
    #[must_use]
    pub fn backtrace(&self) -> &Backtrace {
        &self.trace
    }

    /// Renders the message, its cause chain, and the captured stack.
    #[must_use]
    pub fn render_trace(&self) -> String {
        let mut rendered = format!("Error: {}\n", self.message);
        append_causes(&mut rendered, self.source.as_deref().map(as_dyn));
        rendered.push_str(&format!("Stack backtrace:\n{}", self.trace));
        if !rendered.ends_with('\n') {
            rendered.push('\n');
        }
        rendered
    }
}

/// Failure that is not the operator's to fix.
#[derive(Debug, Error)]
pub enum Fault {
    /// A required command hook was never implemented.
    #[error("command hook `{hook}` is not implemented")]
    Unimplemented {
        /// Name of the missing hook.
        hook: &'static str,
    },
    /// Reading or writing a stream failed.
    #[error("I/O failure: {0}")]
    Io(#[from] io::Error),
    /// Telemetry could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    /// Any other unexpected failure.
    #[error("unexpected failure: {source}")]
    Unexpected {
        /// Underlying error.
        #[source]
        source: BoxError,
        /// Stack captured where the failure was wrapped.
        trace: Box<Backtrace>,
    },
}

impl Fault {
    /// Wraps an arbitrary error as an unexpected fault.
    #[must_use]
    pub fn unexpected(source: impl Into<BoxError>) -> Self {
        Self::Unexpected {
            source: source.into(),
            trace: Box::new(Backtrace::force_capture()),
        }
    }

    /// Renders the fault with its full cause chain, and the captured stack
    /// when one exists.
    #[must_use]
    pub fn render_trace(&self) -> String {
        let mut rendered = format!("Error: {self}\n");
        append_causes(&mut rendered, self.source());
        if let Self::Unexpected { trace, .. } = self {
            rendered.push_str(&format!("Stack backtrace:\n{trace}"));
        }
        if !rendered.ends_with('\n') {
            rendered.push('\n');
        }
        rendered
    }
}

/// Failure returned from a command hook.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Expected failure, rendered as a one-line diagnostic.
    #[error(transparent)]
    User(#[from] UserError),
    /// Unexpected failure, propagated to the caller.
    #[error(transparent)]
    Fault(#[from] Fault),
}

impl CommandError {
    /// Shorthand for a [`UserError`] built from a message.
    #[must_use]
    pub fn user(message: impl Into<String>) -> Self {
        Self::User(UserError::new(message))
    }

    /// Shorthand for [`Fault::Unimplemented`].
    #[must_use]
    pub const fn unimplemented(hook: &'static str) -> Self {
        Self::Fault(Fault::Unimplemented { hook })
    }
}

impl From<io::Error> for CommandError {
    fn from(error: io::Error) -> Self {
        Self::Fault(Fault::Io(error))
    }
}

fn as_dyn<'a>(error: &'a (dyn StdError + Send + Sync + 'static)) -> &'a (dyn StdError + 'static) {
    error
}

fn append_causes(rendered: &mut String, first: Option<&(dyn StdError + 'static)>) {
    let mut cause = first;
    if cause.is_none() {
        return;
    }
    rendered.push_str("Caused by:\n");
    let mut depth = 0_usize;
    while let Some(error) = cause {
        rendered.push_str(&format!("    {depth}: {error}\n"));
        depth += 1;
        cause = error.source();
    }
}
