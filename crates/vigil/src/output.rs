//! Writing command results to a file or the output stream.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::CommandError;
use crate::io::IoStreams;

/// Writes `lines` joined with newlines to `path`, or to the output stream
/// when no path is given. An existing file is only replaced after
/// [`confirm_overwrite`](crate::prompt::confirm_overwrite) agrees.
pub fn write_out<S: AsRef<str>>(
    path: Option<&Path>,
    lines: &[S],
    force: bool,
    io: &mut IoStreams<'_>,
) -> Result<(), CommandError> {
    let text = lines
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n");
    match path {
        Some(target) => {
            crate::prompt::confirm_overwrite(io, target, force)?;
            let mut file = File::create(target)?;
            file.write_all(text.as_bytes())?;
            file.sync_all()?;
        }
        None => {
            io.stdout.write_all(text.as_bytes())?;
            io.stdout.flush()?;
        }
    }
    Ok(())
}
