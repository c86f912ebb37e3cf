//! Construction-time settings for daemon commands.
//!
//! A daemon's pidfile and stream targets are fixed when the command is built,
//! not per invocation: once the process has detached, the invoking terminal
//! is gone and there is nothing left to read overrides from.
//!
//! [`SettingsLayers`] is loaded through `ortho_config`: a configuration file
//! (named by `--config-path` or `VIGIL_CONFIG_PATH`, otherwise discovered in
//! the usual locations), then `VIGIL_*` environment variables, then command
//! line flags. [`DaemonSettings`] fills whatever the layers leave unset with
//! the defaults for the named daemon.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::defaults::{NULL_DEVICE, default_pidfile};

const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
const DEFAULT_KILL_AFTER: u32 = 100;
const DEFAULT_ABANDON_AFTER: u32 = 150;

/// Escalation policy followed by `stop` while waiting for a daemon to exit.
///
/// Attempts are counted in termination signals delivered. With both limits
/// unset, `stop` keeps signalling until the process is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StopPolicy {
    /// Delay between signal deliveries, in milliseconds.
    pub poll_interval_ms: u64,
    /// Switch from `SIGTERM` to `SIGKILL` after this many deliveries.
    pub kill_after: Option<u32>,
    /// Give up with an error after this many deliveries.
    pub abandon_after: Option<u32>,
}

impl StopPolicy {
    /// Policy that never escalates and never gives up.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            kill_after: None,
            abandon_after: None,
        }
    }

    /// Delay between signal deliveries.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for StopPolicy {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            kill_after: Some(DEFAULT_KILL_AFTER),
            abandon_after: Some(DEFAULT_ABANDON_AFTER),
        }
    }
}

/// Pidfile location, stream targets, and stop policy for one daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaemonSettings {
    pidfile: Utf8PathBuf,
    stdin: Utf8PathBuf,
    stdout: Utf8PathBuf,
    stderr: Utf8PathBuf,
    stop: StopPolicy,
}

/// Daemon settings as supplied by the configuration layers. Every key is
/// optional; unset keys fall back to the daemon's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "VIGIL")]
pub struct SettingsLayers {
    /// Pidfile path.
    #[ortho_config(cli_short = 'p')]
    pub pidfile: Option<Utf8PathBuf>,
    /// Source for the daemon's standard input.
    #[ortho_config(cli_short = 'i')]
    pub stdin: Option<Utf8PathBuf>,
    /// Target for the daemon's standard output.
    #[ortho_config(cli_short = 'o')]
    pub stdout: Option<Utf8PathBuf>,
    /// Target for the daemon's standard error.
    #[ortho_config(cli_short = 'e')]
    pub stderr: Option<Utf8PathBuf>,
    /// Delay between stop signals, in milliseconds.
    #[ortho_config(cli_short = 'n')]
    pub poll_interval_ms: Option<u64>,
    /// Stop signals sent before escalating to `SIGKILL`; 0 never escalates.
    #[ortho_config(cli_short = 'k')]
    pub kill_after: Option<u32>,
    /// Stop signals sent before giving up; 0 never gives up.
    #[ortho_config(cli_short = 'a')]
    pub abandon_after: Option<u32>,
}

impl DaemonSettings {
    /// Default settings for the named daemon: a pidfile in the runtime
    /// directory and every stream sent to the null device.
    #[must_use]
    pub fn defaults(daemon: &str) -> Self {
        Self {
            pidfile: default_pidfile(daemon),
            stdin: Utf8PathBuf::from(NULL_DEVICE),
            stdout: Utf8PathBuf::from(NULL_DEVICE),
            stderr: Utf8PathBuf::from(NULL_DEVICE),
            stop: StopPolicy::default(),
        }
    }

    /// Settings for the named daemon with `layers` applied over the
    /// defaults.
    #[must_use]
    pub fn from_layers(daemon: &str, layers: SettingsLayers) -> Self {
        let defaults = Self::defaults(daemon);
        let limit = |value: Option<u32>, fallback: Option<u32>| match value {
            Some(0) => None,
            Some(count) => Some(count),
            None => fallback,
        };
        Self {
            pidfile: layers.pidfile.unwrap_or(defaults.pidfile),
            stdin: layers.stdin.unwrap_or(defaults.stdin),
            stdout: layers.stdout.unwrap_or(defaults.stdout),
            stderr: layers.stderr.unwrap_or(defaults.stderr),
            stop: StopPolicy {
                poll_interval_ms: layers
                    .poll_interval_ms
                    .unwrap_or(defaults.stop.poll_interval_ms),
                kill_after: limit(layers.kill_after, defaults.stop.kill_after),
                abandon_after: limit(layers.abandon_after, defaults.stop.abandon_after),
            },
        }
    }

    /// Loads the layers from `args`, the environment, and the configuration
    /// file, and applies them for the named daemon. `args` starts with the
    /// program name, as in `std::env::args_os`.
    pub fn load_from_iter<I>(daemon: &str, args: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = OsString>,
    {
        let args: Vec<OsString> = args.into_iter().collect();
        let layers = SettingsLayers::load_from_iter(args).map_err(SettingsError::Load)?;
        Ok(Self::from_layers(daemon, layers))
    }

    /// Loads settings for the named daemon with `path` as the configuration
    /// file.
    pub fn load(daemon: &str, path: &Path) -> Result<Self, SettingsError> {
        Self::load_from_iter(
            daemon,
            [
                OsString::from(daemon),
                OsString::from("--config-path"),
                path.as_os_str().to_owned(),
            ],
        )
    }

    /// Resolves settings for the named daemon from the environment and the
    /// discovered configuration file, falling back to the defaults.
    pub fn discover(daemon: &str) -> Result<Self, SettingsError> {
        Self::load_from_iter(daemon, [OsString::from(daemon)])
    }

    /// Replaces the pidfile path.
    #[must_use]
    pub fn with_pidfile(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.pidfile = path.into();
        self
    }

    /// Replaces the standard input source.
    #[must_use]
    pub fn with_stdin(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.stdin = path.into();
        self
    }

    /// Replaces the standard output target.
    #[must_use]
    pub fn with_stdout(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.stdout = path.into();
        self
    }

    /// Replaces the standard error target.
    #[must_use]
    pub fn with_stderr(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.stderr = path.into();
        self
    }

    /// Replaces the stop escalation policy.
    #[must_use]
    pub const fn with_stop_policy(mut self, policy: StopPolicy) -> Self {
        self.stop = policy;
        self
    }

    /// Resolves every path against the current directory.
    ///
    /// Detaching changes the working directory to `/`, so relative paths
    /// must be fixed before the first fork.
    pub fn absolutize(self) -> Result<Self, SettingsError> {
        Ok(Self {
            pidfile: absolute(&self.pidfile)?,
            stdin: absolute(&self.stdin)?,
            stdout: absolute(&self.stdout)?,
            stderr: absolute(&self.stderr)?,
            stop: self.stop,
        })
    }

    /// Path of the pidfile.
    #[must_use]
    pub fn pidfile(&self) -> &Utf8Path {
        &self.pidfile
    }

    /// Source for the daemon's standard input.
    #[must_use]
    pub fn stdin(&self) -> &Utf8Path {
        &self.stdin
    }

    /// Target for the daemon's standard output.
    #[must_use]
    pub fn stdout(&self) -> &Utf8Path {
        &self.stdout
    }

    /// Target for the daemon's standard error.
    #[must_use]
    pub fn stderr(&self) -> &Utf8Path {
        &self.stderr
    }

    /// Escalation policy used by `stop`.
    #[must_use]
    pub const fn stop_policy(&self) -> StopPolicy {
        self.stop
    }
}

fn absolute(path: &Utf8Path) -> Result<Utf8PathBuf, SettingsError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let resolved = std::path::absolute(path).map_err(|source| SettingsError::Resolve {
        path: path.as_std_path().to_path_buf(),
        source,
    })?;
    Utf8PathBuf::from_path_buf(resolved).map_err(|path| SettingsError::NonUtf8Path { path })
}

/// Errors raised while loading daemon settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The configuration layers could not be loaded.
    #[error("failed to load daemon settings: {0}")]
    Load(#[source] Arc<OrthoError>),
    /// A relative path could not be resolved.
    #[error("failed to resolve '{path}': {source}", path = path.display())]
    Resolve {
        /// Path that could not be resolved.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// A resolved path was not valid UTF-8.
    #[error("path '{path}' is not valid UTF-8", path = path.display())]
    NonUtf8Path {
        /// Offending path.
        path: PathBuf,
    },
}
