use std::process::ExitCode;

use crate::{IoStreams, Program};

/// Streams and status of one captured invocation.
#[derive(Debug)]
pub struct Captured {
    pub code: ExitCode,
    pub stdout: String,
    pub stderr: String,
}

/// Runs `program` as `vigil <subcommand> <args>` against in-memory streams.
pub fn run_subcommand(
    program: &mut dyn Program,
    subcommand: &str,
    args: &[&str],
    input: &str,
) -> Captured {
    let owned: Vec<String> = args.iter().map(|arg| (*arg).to_owned()).collect();
    let mut stdin = input.as_bytes();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = {
        let mut io = IoStreams::new(&mut stdin, &mut stdout, &mut stderr);
        program
            .load_subcommand("vigil", subcommand, &owned, &mut io)
            .expect("command does not fault")
    };
    Captured {
        code,
        stdout: String::from_utf8(stdout).expect("stdout is UTF-8"),
        stderr: String::from_utf8(stderr).expect("stderr is UTF-8"),
    }
}

/// Asserts two exit codes are equal.
pub fn assert_exit(actual: ExitCode, expected: ExitCode) {
    assert_eq!(format!("{actual:?}"), format!("{expected:?}"));
}
