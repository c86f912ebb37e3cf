use std::fs::File;
use std::io;
use std::path::Path;

use sha2::{Digest as _, Sha256};
use vigil::{IoStreams, NoOptions, OptionsRecord, Outcome, PathHandler};

/// Prints the SHA-256 digest of each file, `sha256sum` style.
#[derive(Debug, Clone, Copy, Default)]
pub struct Digest;

impl PathHandler for Digest {
    type Options = NoOptions;

    fn label(&self) -> &str {
        "file"
    }

    fn args_hint(&self) -> &str {
        "<file file ...>"
    }

    fn help(&self) -> &str {
        "Print the SHA-256 digest of each file"
    }

    fn handle_path(
        &mut self,
        path: &Path,
        _options: &OptionsRecord<NoOptions>,
        _io: &mut IoStreams<'_>,
    ) -> Outcome {
        let mut file = File::open(path)?;
        let mut hasher = Sha256::new();
        io::copy(&mut file, &mut hasher)?;
        Ok(Some(format!("{:x}  {}", hasher.finalize(), path.display())))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn digests_files_larger_than_one_read() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("large.bin");
        fs::write(&path, b"0123456789abcdef".repeat(16_384)).expect("write file");

        let mut stdin: &[u8] = b"";
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut io = IoStreams::new(&mut stdin, &mut stdout, &mut stderr);
        let line = Digest
            .handle_path(&path, &OptionsRecord::default(), &mut io)
            .expect("digest computed")
            .expect("line produced");

        assert_eq!(
            line,
            format!(
                "cb8690e393200318a9f52ec1ea9c05cc48ea63eae57be5bb36ae4388f08270bb  {}",
                path.display()
            )
        );
    }
}
