//! Drives one invocation of a command: `load → parse → execute → handle`.
//!
//! [`load`] and [`load_subcommand`] build the per-command parser, apply the
//! shared default options, and hand over to [`execute`]. [`execute`] calls the
//! command's `handle` hook and translates its outcome: output is written to
//! the output stream, a user error becomes one styled line on the error
//! stream (or a full trace with `--traceback`) and exit status 1, and faults
//! are returned to the caller untouched.

use std::env;
use std::ffi::{OsStr, OsString};
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use clap::{CommandFactory, FromArgMatches};
use tracing::debug;

use vigil_config::CommonOptions;

use crate::command::{CommandLine, ConsoleCommand, OptionsRecord, usage_line};
use crate::error::{CommandError, Fault, Outcome, UserError};
use crate::io::IoStreams;
use crate::telemetry::{self, TelemetryError};

pub(crate) const ENGINE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::engine");

pub(crate) const SEARCH_PATH_VAR: &str = "PATH";

/// A command that can be loaded from raw arguments.
///
/// Implemented for every [`ConsoleCommand`]; registries hand out boxed
/// programs so a dispatcher can drive commands with different option
/// schemas.
pub trait Program {
    /// Loads a standalone program. `argv[0]` names the program and the rest
    /// are its arguments.
    fn load(&mut self, argv: &[String], io: &mut IoStreams<'_>) -> Result<ExitCode, Fault>;

    /// Loads the program as `subcommand` of the multi-command tool `prog`.
    fn load_subcommand(
        &mut self,
        prog: &str,
        subcommand: &str,
        args: &[String],
        io: &mut IoStreams<'_>,
    ) -> Result<ExitCode, Fault>;

    /// Writes the help text for `subcommand` of `prog`.
    fn write_help(&self, prog: &str, subcommand: &str, out: &mut dyn Write)
    -> std::io::Result<()>;
}

impl<C: ConsoleCommand> Program for C {
    fn load(&mut self, argv: &[String], io: &mut IoStreams<'_>) -> Result<ExitCode, Fault> {
        load(self, argv, io)
    }

    fn load_subcommand(
        &mut self,
        prog: &str,
        subcommand: &str,
        args: &[String],
        io: &mut IoStreams<'_>,
    ) -> Result<ExitCode, Fault> {
        load_subcommand(self, prog, subcommand, args, io)
    }

    fn write_help(
        &self,
        prog: &str,
        subcommand: &str,
        out: &mut dyn Write,
    ) -> std::io::Result<()> {
        let usage = format!("{prog} {}", usage_line(subcommand, self.args_hint()));
        let help = build_parser(self, format!("{prog} {subcommand}"), usage).render_help();
        write!(out, "{help}")
    }
}

/// Parses `argv` for a standalone program and runs it.
pub fn load<C: ConsoleCommand + ?Sized>(
    command: &mut C,
    argv: &[String],
    io: &mut IoStreams<'_>,
) -> Result<ExitCode, Fault> {
    let (prog, args) = match argv.split_first() {
        Some((prog, args)) => (prog.as_str(), args),
        None => ("", argv),
    };
    let usage = usage_line(prog, command.args_hint());
    run_parsed(command, prog.to_owned(), usage, args, io)
}

/// Parses `args` for `subcommand` of `prog` and runs it.
pub fn load_subcommand<C: ConsoleCommand + ?Sized>(
    command: &mut C,
    prog: &str,
    subcommand: &str,
    args: &[String],
    io: &mut IoStreams<'_>,
) -> Result<ExitCode, Fault> {
    let usage = format!("{prog} {}", usage_line(subcommand, command.args_hint()));
    run_parsed(command, format!("{prog} {subcommand}"), usage, args, io)
}

fn run_parsed<C: ConsoleCommand + ?Sized>(
    command: &mut C,
    display_name: String,
    usage: String,
    args: &[String],
    io: &mut IoStreams<'_>,
) -> Result<ExitCode, Fault> {
    let argv = std::iter::once(display_name.clone()).chain(args.iter().cloned());
    let result = build_parser(command, display_name, usage)
        .try_get_matches_from(argv)
        .and_then(|matches| CommandLine::<C::Options>::from_arg_matches(&matches));
    let parsed = match result {
        Ok(parsed) => parsed,
        Err(error) => return report_usage_error(&error, io),
    };

    let traceback = parsed.options.common.traceback;
    if let Err(error) = handle_default_options(&parsed.options.common) {
        return conclude(Err(error), traceback, io);
    }
    execute(command, &parsed.args, &parsed.options, io)
}

fn build_parser<C: ConsoleCommand + ?Sized>(
    command: &C,
    display_name: String,
    usage: String,
) -> clap::Command {
    let mut parser = CommandLine::<C::Options>::command()
        .name(display_name.clone())
        .bin_name(display_name)
        .override_usage(usage);
    if !command.help().is_empty() {
        parser = parser.about(command.help().to_owned());
    }
    if let Some(version) = command.version() {
        parser = parser
            .version(version.to_owned())
            .disable_version_flag(false);
    }
    parser
}

fn report_usage_error(error: &clap::Error, io: &mut IoStreams<'_>) -> Result<ExitCode, Fault> {
    let rendered = error.render();
    if error.use_stderr() {
        write!(io.stderr, "{rendered}")?;
        io.stderr.flush()?;
    } else {
        write!(io.stdout, "{rendered}")?;
        io.stdout.flush()?;
    }
    let code = u8::try_from(error.exit_code()).unwrap_or(2);
    Ok(ExitCode::from(code))
}

/// Runs `handle` and translates its outcome into an exit code.
///
/// Non-empty output is written to the output stream with a single trailing
/// newline added when missing. A user error is reported on the error stream
/// and yields exit status 1. Faults are returned unmodified.
pub fn execute<C: ConsoleCommand + ?Sized>(
    command: &mut C,
    args: &[String],
    options: &OptionsRecord<C::Options>,
    io: &mut IoStreams<'_>,
) -> Result<ExitCode, Fault> {
    debug!(
        target: ENGINE_TARGET,
        args = args.len(),
        options = ?options,
        "executing command"
    );
    let outcome = command.handle(args, options, io);
    conclude(outcome, options.common.traceback, io)
}

fn conclude(outcome: Outcome, traceback: bool, io: &mut IoStreams<'_>) -> Result<ExitCode, Fault> {
    match outcome {
        Ok(output) => {
            if let Some(text) = output.filter(|text| !text.is_empty()) {
                io.stdout.write_all(text.as_bytes())?;
                if !text.ends_with('\n') {
                    io.stdout.write_all(b"\n")?;
                }
            }
            io.stdout.flush()?;
            Ok(ExitCode::SUCCESS)
        }
        Err(CommandError::User(error)) => {
            report_user_error(&error, traceback, io)?;
            Ok(ExitCode::FAILURE)
        }
        Err(CommandError::Fault(fault)) => Err(fault),
    }
}

/// Writes a user error to the error stream: one styled line, or the full
/// trace when `traceback` is set.
pub fn report_user_error(
    error: &UserError,
    traceback: bool,
    io: &mut IoStreams<'_>,
) -> std::io::Result<()> {
    if traceback {
        io.stderr.write_all(error.render_trace().as_bytes())?;
        return io.stderr.flush();
    }
    let line = io.palette().error(&format!("Error: {}", error.message()));
    io.stderr_line(format_args!("{line}"))
}

/// Applies the options every command accepts: prepends the search path to
/// `PATH` and installs telemetry.
pub fn handle_default_options(options: &CommonOptions) -> Result<(), CommandError> {
    if let Some(dir) = options.search_path.as_deref() {
        let current = env::var_os(SEARCH_PATH_VAR);
        let updated = prepend_search_path(dir, current.as_deref()).map_err(|source| {
            UserError::with_source(
                format!("Cannot add {} to the search path", dir.display()),
                source,
            )
        })?;
        // SAFETY: commands run single-threaded; no other thread reads the
        // environment while it is updated.
        unsafe { env::set_var(SEARCH_PATH_VAR, &updated) };
    }

    match telemetry::initialise(options) {
        Ok(_) => Ok(()),
        Err(TelemetryError::Filter(message)) => Err(UserError::new(format!(
            "invalid log filter: {message}"
        ))
        .into()),
        Err(error) => Err(Fault::from(error).into()),
    }
}

/// Returns `current` with `dir` placed first. A `dir` that already leads the
/// list is not repeated.
pub fn prepend_search_path(
    dir: &Path,
    current: Option<&OsStr>,
) -> Result<OsString, env::JoinPathsError> {
    let existing: Vec<_> = current.map(env::split_paths).into_iter().flatten().collect();
    if existing.first().is_some_and(|first| first == dir) {
        return env::join_paths(existing);
    }
    env::join_paths(std::iter::once(dir.to_path_buf()).chain(existing))
}
