use std::path::PathBuf;

use clap::Args;
use vigil::output::write_out;
use vigil::{ConsoleCommand, IoStreams, OptionsRecord, Outcome, UserError};

/// Options of [`Inspect`].
#[derive(Debug, Clone, Default, Args)]
pub struct InspectOptions {
    /// A value to echo back; may be repeated.
    #[arg(short = 'o', long = "option", value_name = "VALUE")]
    pub values: Vec<String>,
    /// Fail with this message instead of reporting.
    #[arg(long, value_name = "MESSAGE")]
    pub fail: Option<String>,
    /// Write the report to this file instead of the output stream.
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
    /// Replace an existing output file without asking.
    #[arg(short = 'f', long)]
    pub force: bool,
}

/// Reports the arguments and options it was called with.
#[derive(Debug, Clone, Copy, Default)]
pub struct Inspect;

impl ConsoleCommand for Inspect {
    type Options = InspectOptions;

    fn help(&self) -> &str {
        "Report the arguments and options this command received"
    }

    fn args_hint(&self) -> &str {
        "[arg ...]"
    }

    fn handle(
        &mut self,
        args: &[String],
        options: &OptionsRecord<InspectOptions>,
        io: &mut IoStreams<'_>,
    ) -> Outcome {
        if let Some(message) = &options.extra.fail {
            return Err(UserError::new(message.clone()).into());
        }
        let lines = [
            format!("args: {}", args.join(", ")),
            format!("options: {}", options.extra.values.join(", ")),
            format!("verbosity: {}", options.common.verbosity),
            format!("traceback: {}", options.common.traceback),
        ];
        let report = lines.join("\n");
        match options.extra.output.as_deref() {
            Some(path) => {
                write_out(Some(path), &[report.as_str(), ""], options.extra.force, io)?;
                Ok(None)
            }
            None => Ok(Some(report)),
        }
    }
}
