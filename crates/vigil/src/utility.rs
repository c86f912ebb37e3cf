//! Multi-command dispatcher: `prog <subcommand> [options] [args]`.

use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Args;
use tracing::debug;
use vigil_config::CommonOptions;

use crate::engine::{ENGINE_TARGET, SEARCH_PATH_VAR, prepend_search_path};
use crate::error::Fault;
use crate::io::IoStreams;
use crate::registry::{CommandRegistry, RegistryError};
use crate::version::Version;

const SEARCH_PATH_FLAGS: [&str; 2] = ["--search-path", "--pythonpath"];

/// Entry point of a tool exposing several registered commands.
///
/// `argv[1]` names the subcommand and defaults to `help`. The rest of the
/// line belongs to the subcommand, which parses it strictly; the dispatcher
/// only scans it laxly for the search path so the path is in effect before
/// the command is built.
#[derive(Debug)]
pub struct ConsoleUtility<R> {
    prog: String,
    version: Option<Version>,
    registry: R,
}

impl<R: CommandRegistry> ConsoleUtility<R> {
    /// Builds a dispatcher named `prog` over `registry`.
    pub fn new(prog: impl Into<String>, registry: R) -> Self {
        Self {
            prog: prog.into(),
            version: None,
            registry,
        }
    }

    /// Sets the version printed by `version` and `--version`.
    #[must_use]
    pub const fn with_version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Program name used in usage text.
    #[must_use]
    pub fn prog(&self) -> &str {
        &self.prog
    }

    /// Global help text, or just the sorted command names when
    /// `commands_only` is set.
    #[must_use]
    pub fn main_help_text(&self, commands_only: bool) -> String {
        let names = self.registry.names();
        if commands_only {
            return names.join("\n");
        }
        let options = CommonOptions::augment_args(
            clap::Command::new(self.prog.clone())
                .override_usage(format!("{} <subcommand> [options] [args]", self.prog)),
        )
        .render_help();
        let mut text = format!(
            "{options}\nType '{} help <subcommand>' for help on a specific subcommand.\n\n\
             Available subcommands:",
            self.prog
        );
        for name in names {
            text.push_str(&format!("\n    {name}"));
        }
        text
    }

    /// Dispatches `argv` and returns the exit status.
    ///
    /// Faults raised by the subcommand are returned untouched.
    pub fn execute(&self, argv: &[String], io: &mut IoStreams<'_>) -> Result<ExitCode, Fault> {
        let rest = argv.get(2..).unwrap_or_default();
        if let Some(dir) = scan_search_path(rest) {
            apply_search_path(&dir);
        }

        let subcommand = argv.get(1).map_or("help", String::as_str);
        debug!(target: ENGINE_TARGET, subcommand, "dispatching");
        match (subcommand, rest) {
            ("help", []) => self.print_help(false, io),
            ("help", [flag, ..]) if flag == "--commands" => self.print_help(true, io),
            ("help", [name, ..]) => self.print_command_help(name, io),
            ("version" | "--version", _) => {
                io.stdout_line(format_args!("{}", self.version_text()))?;
                Ok(ExitCode::SUCCESS)
            }
            ("--help" | "-h", []) => self.print_help(false, io),
            (name, args) => match self.registry.fetch(name) {
                Ok(mut program) => program.load_subcommand(&self.prog, name, args, io),
                Err(error) => self.report_registry_error(&error, io),
            },
        }
    }

    /// Like [`execute`](Self::execute), but renders faults with their full
    /// trace on the error stream and exits with status 1.
    pub fn run(&self, argv: &[String], io: &mut IoStreams<'_>) -> ExitCode {
        match self.execute(argv, io) {
            Ok(code) => code,
            Err(fault) => {
                let _ = io.stderr.write_all(fault.render_trace().as_bytes());
                let _ = io.stderr.flush();
                ExitCode::FAILURE
            }
        }
    }

    fn version_text(&self) -> String {
        self.version
            .map_or_else(|| String::from("unknown"), |version| version.to_string())
    }

    fn print_help(&self, commands_only: bool, io: &mut IoStreams<'_>) -> Result<ExitCode, Fault> {
        io.stdout_line(format_args!("{}", self.main_help_text(commands_only)))?;
        Ok(ExitCode::SUCCESS)
    }

    fn print_command_help(&self, name: &str, io: &mut IoStreams<'_>) -> Result<ExitCode, Fault> {
        match self.registry.fetch(name) {
            Ok(program) => {
                program.write_help(&self.prog, name, io.stdout)?;
                io.stdout.flush()?;
                Ok(ExitCode::SUCCESS)
            }
            Err(error) => self.report_registry_error(&error, io),
        }
    }

    fn report_registry_error(
        &self,
        error: &RegistryError,
        io: &mut IoStreams<'_>,
    ) -> Result<ExitCode, Fault> {
        match error {
            RegistryError::Unknown { .. } => {
                io.stderr_line(format_args!("{error}"))?;
                io.stderr_line(format_args!("Type '{} help' for usage.", self.prog))?;
            }
            RegistryError::Construct { .. } => {
                let line = io.palette().error(&format!("Error: {error}"));
                io.stderr_line(format_args!("{line}"))?;
            }
        }
        Ok(ExitCode::FAILURE)
    }
}

fn scan_search_path(args: &[String]) -> Option<PathBuf> {
    let mut found = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if SEARCH_PATH_FLAGS.contains(&arg.as_str()) {
            if let Some(value) = iter.next() {
                found = Some(PathBuf::from(value));
            }
        } else if let Some((flag, value)) = arg.split_once('=')
            && SEARCH_PATH_FLAGS.contains(&flag)
        {
            found = Some(PathBuf::from(value));
        }
    }
    found
}

fn apply_search_path(dir: &Path) {
    let current = env::var_os(SEARCH_PATH_VAR);
    if let Ok(updated) = prepend_search_path(dir, current.as_deref()) {
        // SAFETY: dispatch happens before any command spawns threads.
        unsafe { env::set_var(SEARCH_PATH_VAR, updated) };
    }
}
