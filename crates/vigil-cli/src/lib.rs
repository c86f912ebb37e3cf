//! Demonstration tool bundling one command of every kind.
//!
//! `inspect` is a plain command, `greet` a label command, `digest` a
//! file-path command, `settings` a no-arguments command, and `heartbeat` a
//! daemon that appends numbered entries to a log file until stopped.

use std::io::{BufRead, Write};
use std::process::ExitCode;

use vigil::{ConsoleUtility, IoStreams, Palette, ReleaseLevel, StaticRegistry, Version};

mod commands;

pub use commands::registry;

/// Version of the tool.
pub const VERSION: Version = Version::new(0, 1, 0, ReleaseLevel::Alpha, 1);

/// Program name shown in usage text.
pub const PROG: &str = "vigil";

/// Builds the dispatcher over every bundled command.
#[must_use]
pub fn utility() -> ConsoleUtility<StaticRegistry> {
    ConsoleUtility::new(PROG, registry()).with_version(VERSION)
}

/// Runs the tool with `argv` against the given streams.
pub fn run(
    argv: &[String],
    stdin: &mut dyn BufRead,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> ExitCode {
    let mut io = IoStreams::new(stdin, stdout, stderr).with_palette(Palette::detect());
    utility().run(argv, &mut io)
}
