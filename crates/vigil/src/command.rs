//! The contract every console command implements.

use std::fmt;

use clap::{Args, Parser};

use vigil_config::CommonOptions;

use crate::error::{CommandError, Outcome};
use crate::io::IoStreams;

/// Parsed options of one invocation: the options shared by every command
/// plus the command's own schema.
#[derive(Debug, Clone, Default, Args)]
pub struct OptionsRecord<O: Args> {
    /// Options recognised by every command.
    #[command(flatten)]
    pub common: CommonOptions,
    /// Options declared by the command itself.
    #[command(flatten)]
    pub extra: O,
}

impl<O: Args> OptionsRecord<O> {
    /// Pairs the shared options with a command's own options.
    #[must_use]
    pub const fn new(common: CommonOptions, extra: O) -> Self {
        Self { common, extra }
    }
}

/// Per-command parser: the options record followed by the residual
/// positional arguments.
#[derive(Debug, Parser)]
#[command(disable_version_flag = true)]
pub(crate) struct CommandLine<O: Args> {
    #[command(flatten)]
    pub(crate) options: OptionsRecord<O>,
    #[arg(value_name = "ARGS")]
    pub(crate) args: Vec<String>,
}

/// Empty option schema for commands that only use the shared options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Args)]
pub struct NoOptions {}

/// A console command.
///
/// The engine parses the command line against [`OptionsRecord`] with the
/// command's `Options`, then calls [`handle`](Self::handle) with the residual
/// positional arguments. Returned text is written to the output stream; a
/// [`UserError`](crate::UserError) becomes a one-line diagnostic and exit
/// status 1.
pub trait ConsoleCommand {
    /// Command-specific option schema.
    type Options: Args + fmt::Debug;

    /// Short description shown under the usage line.
    fn help(&self) -> &str {
        ""
    }

    /// Positional arguments accepted, as shown in the usage line.
    fn args_hint(&self) -> &str {
        ""
    }

    /// Version reported by `--version`, when the command has one.
    fn version(&self) -> Option<&str> {
        None
    }

    /// Runs the command.
    ///
    /// The default reports [`Fault::Unimplemented`](crate::Fault::Unimplemented);
    /// every concrete command overrides it.
    fn handle(
        &mut self,
        args: &[String],
        options: &OptionsRecord<Self::Options>,
        io: &mut IoStreams<'_>,
    ) -> Outcome {
        let _ = (args, options, io);
        Err(CommandError::unimplemented("handle"))
    }

    /// Usage text for `subcommand`: the usage line, then a blank line and the
    /// help text when there is any.
    fn usage(&self, subcommand: &str) -> String {
        let line = usage_line(subcommand, self.args_hint());
        match self.help() {
            "" => line,
            help => format!("{line}\n\n{help}"),
        }
    }
}

/// Formats `"<subcommand> [options] <hint>"`.
#[must_use]
pub fn usage_line(subcommand: &str, hint: &str) -> String {
    if hint.is_empty() {
        format!("{subcommand} [options]")
    } else {
        format!("{subcommand} [options] {hint}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;

    impl ConsoleCommand for Bare {
        type Options = NoOptions;
    }

    struct Described;

    impl ConsoleCommand for Described {
        type Options = NoOptions;

        fn help(&self) -> &str {
            "Does a thing"
        }

        fn args_hint(&self) -> &str {
            "<thing thing ...>"
        }
    }

    #[test]
    fn usage_without_help_is_single_line() {
        assert_eq!(Bare.usage("bare"), "bare [options]");
    }

    #[test]
    fn usage_appends_help_after_blank_line() {
        assert_eq!(
            Described.usage("described"),
            "described [options] <thing thing ...>\n\nDoes a thing"
        );
    }

    #[test]
    fn default_handle_is_unimplemented() {
        let mut input: &[u8] = b"";
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut io = IoStreams::new(&mut input, &mut stdout, &mut stderr);
        let result = Bare.handle(&[], &OptionsRecord::default(), &mut io);
        assert!(matches!(
            result,
            Err(CommandError::Fault(crate::Fault::Unimplemented { hook: "handle" }))
        ));
    }

    #[test]
    fn command_line_splits_options_from_positionals() {
        let parsed = CommandLine::<NoOptions>::try_parse_from([
            "prog",
            "first",
            "--traceback",
            "second",
        ])
        .expect("command line parses");
        assert!(parsed.options.common.traceback);
        assert_eq!(parsed.args, ["first", "second"]);
    }

    #[test]
    fn command_line_rejects_unknown_flags() {
        let result = CommandLine::<NoOptions>::try_parse_from(["prog", "--bogus"]);
        assert!(result.is_err());
    }
}
