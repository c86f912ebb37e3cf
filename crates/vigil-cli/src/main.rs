//! Entry point of the `vigil` demonstration tool.
//!
//! Delegates to [`vigil_cli::run`] with the process's locked standard
//! streams.

use std::io::{self, BufReader};
use std::process::ExitCode;

fn main() -> ExitCode {
    let argv: Vec<String> = std::env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    let mut stdin = BufReader::new(io::stdin().lock());
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    vigil_cli::run(&argv, &mut stdin, &mut stdout, &mut stderr)
}
