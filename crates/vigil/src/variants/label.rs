use std::fmt;

use clap::Args;

use crate::command::{ConsoleCommand, OptionsRecord};
use crate::error::{CommandError, Outcome};
use crate::io::IoStreams;

/// Per-argument hook of a [`LabelCommand`].
pub trait LabelHandler {
    /// Command-specific option schema.
    type Options: Args + fmt::Debug;

    /// Name of one argument, used in usage and error text.
    fn label(&self) -> &str {
        "label"
    }

    /// Positional arguments accepted, as shown in the usage line.
    fn args_hint(&self) -> &str {
        "<label label ...>"
    }

    /// Short description shown under the usage line.
    fn help(&self) -> &str {
        ""
    }

    /// Handles one argument, exactly as given on the command line.
    fn handle_label(
        &mut self,
        label: &str,
        options: &OptionsRecord<Self::Options>,
        io: &mut IoStreams<'_>,
    ) -> Outcome;
}

/// Command taking one or more arbitrary arguments and handling each in turn.
///
/// Non-empty outputs of the individual calls are joined with newlines. An
/// invocation without arguments fails with `Enter at least one <label>.`
#[derive(Debug, Clone, Default)]
pub struct LabelCommand<H> {
    handler: H,
}

impl<H: LabelHandler> LabelCommand<H> {
    /// Wraps `handler`.
    #[must_use]
    pub const fn new(handler: H) -> Self {
        Self { handler }
    }

    /// The wrapped handler.
    #[must_use]
    pub const fn handler(&self) -> &H {
        &self.handler
    }
}

impl<H: LabelHandler> ConsoleCommand for LabelCommand<H> {
    type Options = H::Options;

    fn help(&self) -> &str {
        self.handler.help()
    }

    fn args_hint(&self) -> &str {
        self.handler.args_hint()
    }

    fn handle(
        &mut self,
        args: &[String],
        options: &OptionsRecord<Self::Options>,
        io: &mut IoStreams<'_>,
    ) -> Outcome {
        if args.is_empty() {
            return Err(CommandError::user(format!(
                "Enter at least one {}.",
                self.handler.label()
            )));
        }

        let mut output = Vec::with_capacity(args.len());
        for label in args {
            if let Some(text) = self.handler.handle_label(label, options, io)?
                && !text.is_empty()
            {
                output.push(text);
            }
        }
        Ok((!output.is_empty()).then(|| output.join("\n")))
    }
}
