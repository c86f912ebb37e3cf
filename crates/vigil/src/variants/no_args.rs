use std::fmt;

use clap::Args;

use crate::command::{ConsoleCommand, OptionsRecord};
use crate::error::{CommandError, Outcome};
use crate::io::IoStreams;

/// Hook of a [`NoArgsCommand`].
pub trait NoArgsHandler {
    /// Command-specific option schema.
    type Options: Args + fmt::Debug;

    /// Short description shown under the usage line.
    fn help(&self) -> &str {
        ""
    }

    /// Performs the command.
    fn handle_noargs(
        &mut self,
        options: &OptionsRecord<Self::Options>,
        io: &mut IoStreams<'_>,
    ) -> Outcome;
}

/// Command that accepts options but no positional arguments.
#[derive(Debug, Clone, Default)]
pub struct NoArgsCommand<H> {
    handler: H,
}

impl<H: NoArgsHandler> NoArgsCommand<H> {
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

impl<H: NoArgsHandler> ConsoleCommand for NoArgsCommand<H> {
    type Options = H::Options;

    fn help(&self) -> &str {
        self.handler.help()
    }

    fn handle(
        &mut self,
        args: &[String],
        options: &OptionsRecord<Self::Options>,
        io: &mut IoStreams<'_>,
    ) -> Outcome {
        if !args.is_empty() {
            return Err(CommandError::user("Command doesn't accept any arguments."));
        }
        self.handler.handle_noargs(options, io)
    }
}
