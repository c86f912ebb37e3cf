use std::fmt;
use std::fs::File;
use std::path::Path;

use clap::Args;
use tracing::debug;

use crate::command::{ConsoleCommand, OptionsRecord};
use crate::engine::ENGINE_TARGET;
use crate::error::{CommandError, Outcome};
use crate::io::IoStreams;

/// Per-path hook of a [`FilePathCommand`].
pub trait PathHandler {
    /// Command-specific option schema.
    type Options: Args + fmt::Debug;

    /// Name of one argument, used in usage and diagnostic text.
    fn label(&self) -> &str {
        "path"
    }

    /// Positional arguments accepted, as shown in the usage line.
    fn args_hint(&self) -> &str {
        "<path path ...>"
    }

    /// Short description shown under the usage line.
    fn help(&self) -> &str {
        ""
    }

    /// Handles one readable path.
    fn handle_path(
        &mut self,
        path: &Path,
        options: &OptionsRecord<Self::Options>,
        io: &mut IoStreams<'_>,
    ) -> Outcome;
}

/// Command taking one or more file paths.
///
/// Every path is checked before the handler sees it. A path that cannot be
/// opened for reading contributes the line `<path> is not a valid <label>`
/// to the report and the remaining paths are still processed. The report
/// always ends with a newline.
#[derive(Debug, Clone, Default)]
pub struct FilePathCommand<H> {
    handler: H,
}

impl<H: PathHandler> FilePathCommand<H> {
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

impl<H: PathHandler> ConsoleCommand for FilePathCommand<H> {
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
                "Provide at least one {}.",
                self.handler.label()
            )));
        }

        let mut report = Vec::with_capacity(args.len() + 1);
        for arg in args {
            let path = Path::new(arg);
            if !is_readable_file(path) {
                debug!(target: ENGINE_TARGET, path = %path.display(), "skipping unreadable path");
                report.push(format!("{arg} is not a valid {}", self.handler.label()));
                continue;
            }
            if let Some(text) = self.handler.handle_path(path, options, io)?
                && !text.is_empty()
            {
                report.push(text);
            }
        }
        report.push(String::new());
        Ok(Some(report.join("\n")))
    }
}

fn is_readable_file(path: &Path) -> bool {
    File::open(path)
        .and_then(|file| file.metadata())
        .is_ok_and(|metadata| !metadata.is_dir())
}
