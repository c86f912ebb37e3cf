use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::DAEMON_TARGET;

/// Errors raised while managing a pidfile.
#[derive(Debug, Error)]
pub enum PidFileError {
    /// The pidfile is already present.
    #[error("A pidfile {path} already exists. Perhaps the daemon is already running?")]
    Exists {
        /// Pidfile path.
        path: Utf8PathBuf,
    },
    /// The pidfile could not be created or written.
    #[error("Cannot write to pidfile {path}: {source}")]
    Write {
        /// Pidfile path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The pidfile could not be removed.
    #[error("Cannot remove pidfile {path}: {source}")]
    Remove {
        /// Pidfile path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Location of a daemon's pidfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidFile {
    path: Utf8PathBuf,
}

impl PidFile {
    /// Refers to the pidfile at `path`.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Pidfile path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Whether the pidfile is present.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Reads the recorded pid. Missing files, unparsable contents and pid 0
    /// all read as `None`.
    #[must_use]
    pub fn read(&self) -> Option<u32> {
        fs::read_to_string(&self.path)
            .ok()?
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|pid| *pid != 0)
    }

    /// Whether the pidfile is present but holds nothing yet, as it does
    /// between another process creating it and recording its pid.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        fs::read_to_string(&self.path).is_ok_and(|text| text.trim().is_empty())
    }

    /// Creates the pidfile exclusively and records `pid` in it, failing when
    /// the file already exists.
    ///
    /// The returned claim removes the file when dropped.
    pub fn reserve(&self, pid: u32) -> Result<PidClaim, PidFileError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| self.write_error(source))?;
        }
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o644)
            .open(&self.path)
            .map_err(|source| {
                if source.kind() == io::ErrorKind::AlreadyExists {
                    PidFileError::Exists {
                        path: self.path.clone(),
                    }
                } else {
                    self.write_error(source)
                }
            })?;
        let claim = PidClaim {
            path: self.path.clone(),
            pid,
        };
        claim.record(file)?;
        Ok(claim)
    }

    /// Removes the pidfile. Returns `false` when it was already gone.
    pub fn remove(&self) -> Result<bool, PidFileError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(PidFileError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write_error(&self, source: io::Error) -> PidFileError {
        PidFileError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

/// Exclusive ownership of a freshly created pidfile.
#[derive(Debug)]
pub struct PidClaim {
    path: Utf8PathBuf,
    pid: u32,
}

impl PidClaim {
    fn record(&self, mut file: File) -> Result<(), PidFileError> {
        let write_error = |source| PidFileError::Write {
            path: self.path.clone(),
            source,
        };
        writeln!(file, "{}", self.pid).map_err(write_error)?;
        file.sync_all().map_err(write_error)?;
        info!(target: DAEMON_TARGET, pid = self.pid, file = %self.path, "pidfile written");
        Ok(())
    }

    /// Pid recorded in the file.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Claimed path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Drop for PidClaim {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Err(error) if error.kind() != io::ErrorKind::NotFound => {
                warn!(
                    target: DAEMON_TARGET,
                    file = %self.path,
                    error = %error,
                    "failed to remove pidfile"
                );
            }
            _ => {}
        }
    }
}
