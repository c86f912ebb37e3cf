//! Stream bundle handed to every command invocation.

use std::fmt;
use std::io::{self, BufRead, Write};

use crate::style::Palette;

/// The three standard streams of one invocation plus the palette used to
/// style diagnostics.
///
/// Each stream is independently replaceable so tests can capture output in
/// memory while the binary passes locked process streams.
pub struct IoStreams<'a> {
    /// Input stream.
    pub stdin: &'a mut dyn BufRead,
    /// Output stream.
    pub stdout: &'a mut dyn Write,
    /// Error stream.
    pub stderr: &'a mut dyn Write,
    palette: Palette,
}

impl<'a> IoStreams<'a> {
    /// Bundles the streams with an unstyled palette.
    pub fn new(
        stdin: &'a mut dyn BufRead,
        stdout: &'a mut dyn Write,
        stderr: &'a mut dyn Write,
    ) -> Self {
        Self {
            stdin,
            stdout,
            stderr,
            palette: Palette::plain(),
        }
    }

    /// Replaces the palette used for diagnostics.
    #[must_use]
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Palette used for diagnostics.
    #[must_use]
    pub const fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Writes one line to the output stream and flushes it.
    pub fn stdout_line(&mut self, args: fmt::Arguments<'_>) -> io::Result<()> {
        self.stdout.write_fmt(args)?;
        self.stdout.write_all(b"\n")?;
        self.stdout.flush()
    }

    /// Writes one line to the error stream and flushes it.
    pub fn stderr_line(&mut self, args: fmt::Arguments<'_>) -> io::Result<()> {
        self.stderr.write_fmt(args)?;
        self.stderr.write_all(b"\n")?;
        self.stderr.flush()
    }

    /// Flushes the output and error streams.
    pub fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()?;
        self.stderr.flush()
    }
}

impl fmt::Debug for IoStreams<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("IoStreams")
            .field("palette", &self.palette)
            .finish_non_exhaustive()
    }
}
