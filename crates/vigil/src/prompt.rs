//! Interactive yes/no prompts on the invocation's streams.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::error::{CommandError, UserError};
use crate::io::IoStreams;

/// Asks `prompt` until the answer is yes or no.
///
/// An empty answer selects `default`, as does end of input.
pub fn confirm(io: &mut IoStreams<'_>, prompt: &str, default: bool) -> io::Result<bool> {
    let choices = if default { "yes|no" } else { "no|yes" };
    loop {
        write!(io.stdout, "{prompt} ({choices}): ")?;
        io.stdout.flush()?;
        let mut answer = String::new();
        if io.stdin.read_line(&mut answer)? == 0 {
            io.stdout.write_all(b"\n")?;
            return Ok(default);
        }
        match answer.trim().to_ascii_lowercase().as_str() {
            "" => return Ok(default),
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => io.stdout_line(format_args!("Please answer yes or no."))?,
        }
    }
}

/// Clears the way for writing `path`.
///
/// When a file exists there, a warning is printed and, unless `force` is
/// set, the operator must confirm before the file is removed. Refusing is a
/// user error.
pub fn confirm_overwrite(
    io: &mut IoStreams<'_>,
    path: &Path,
    force: bool,
) -> Result<(), CommandError> {
    if !path.exists() {
        return Ok(());
    }
    let warning = io
        .palette()
        .warning(&format!("File exists at {}!", path.display()));
    io.stderr_line(format_args!("{warning}"))?;
    if !force && !confirm(io, "Overwrite the file and permanently destroy its contents?", false)? {
        return Err(UserError::new(format!(
            "Unable to write to file at {}",
            path.display()
        ))
        .into());
    }
    fs::remove_file(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    fn ask(input: &str, default: bool) -> (bool, String) {
        let mut stdin = input.as_bytes();
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut io = IoStreams::new(&mut stdin, &mut stdout, &mut stderr);
        let answer = confirm(&mut io, "Proceed?", default).expect("prompt answered");
        (answer, String::from_utf8(stdout).expect("UTF-8 output"))
    }

    #[rstest]
    #[case("yes\n", false, true)]
    #[case("Y\n", false, true)]
    #[case("no\n", true, false)]
    #[case("\n", true, true)]
    #[case("\n", false, false)]
    #[case("", true, true)]
    fn answers(#[case] input: &str, #[case] default: bool, #[case] expected: bool) {
        assert_eq!(ask(input, default).0, expected);
    }

    #[test]
    fn choice_order_follows_the_default() {
        assert!(ask("y\n", true).1.starts_with("Proceed? (yes|no): "));
        assert!(ask("y\n", false).1.starts_with("Proceed? (no|yes): "));
    }

    #[test]
    fn invalid_answers_are_asked_again() {
        let (answer, transcript) = ask("maybe\nyes\n", false);
        assert!(answer);
        assert_eq!(
            transcript,
            "Proceed? (no|yes): Please answer yes or no.\nProceed? (no|yes): "
        );
    }

    #[test]
    fn overwrite_refusal_keeps_the_file() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("out.txt");
        fs::write(&path, "keep").expect("seed file");

        let mut stdin: &[u8] = b"no\n";
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut io = IoStreams::new(&mut stdin, &mut stdout, &mut stderr);
        let error = confirm_overwrite(&mut io, &path, false).expect_err("refused");

        assert_eq!(
            error.to_string(),
            format!("Unable to write to file at {}", path.display())
        );
        assert!(path.exists());
        let warning = String::from_utf8(stderr).expect("UTF-8");
        assert_eq!(warning, format!("File exists at {}!\n", path.display()));
    }

    #[test]
    fn forced_overwrite_removes_without_asking() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("out.txt");
        fs::write(&path, "gone").expect("seed file");

        let mut stdin: &[u8] = b"";
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut io = IoStreams::new(&mut stdin, &mut stdout, &mut stderr);
        confirm_overwrite(&mut io, &path, true).expect("forced");

        assert!(!path.exists());
        assert!(stdout.is_empty());
    }
}
