//! Options accepted by every console command.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::logging::LogFormat;

/// How much output a command should produce.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Deserialize,
    Serialize,
    EnumString,
    Display,
    ValueEnum,
)]
pub enum Verbosity {
    /// Minimal output.
    #[strum(serialize = "0")]
    #[serde(rename = "0")]
    #[value(name = "0")]
    Minimal,
    /// Normal output.
    #[default]
    #[strum(serialize = "1")]
    #[serde(rename = "1")]
    #[value(name = "1")]
    Normal,
    /// Verbose output.
    #[strum(serialize = "2")]
    #[serde(rename = "2")]
    #[value(name = "2")]
    Verbose,
    /// Very verbose output.
    #[strum(serialize = "3")]
    #[serde(rename = "3")]
    #[value(name = "3")]
    Debug,
}

impl Verbosity {
    /// Numeric level between 0 and 3.
    #[must_use]
    pub const fn level(self) -> u8 {
        match self {
            Self::Minimal => 0,
            Self::Normal => 1,
            Self::Verbose => 2,
            Self::Debug => 3,
        }
    }

    /// Tracing filter matching this verbosity.
    #[must_use]
    pub const fn log_filter(self) -> &'static str {
        match self {
            Self::Minimal => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
            Self::Debug => "debug",
        }
    }
}

/// Options recognised by every command, regardless of its own schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct CommonOptions {
    /// Verbosity level; 0=minimal output, 1=normal output, 2=verbose output,
    /// 3=very verbose output.
    #[arg(
        short = 'v',
        long,
        value_enum,
        value_name = "LEVEL",
        default_value_t = Verbosity::Normal
    )]
    pub verbosity: Verbosity,
    /// A directory to prepend to the executable search path, e.g.
    /// "/home/user/projects/myproject/bin".
    #[arg(long, alias = "pythonpath", value_name = "DIR")]
    pub search_path: Option<PathBuf>,
    /// Print the full diagnostic trace when the command fails.
    #[arg(long)]
    pub traceback: bool,
    /// Tracing filter directive; overrides the filter implied by verbosity.
    #[arg(long, env = "VIGIL_LOG", value_name = "FILTER")]
    pub log_filter: Option<String>,
    /// Log output format.
    #[arg(long, env = "VIGIL_LOG_FORMAT", value_name = "FORMAT", default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

impl CommonOptions {
    /// Returns the tracing filter to install for this invocation.
    #[must_use]
    pub fn effective_log_filter(&self) -> &str {
        self.log_filter
            .as_deref()
            .unwrap_or(self.verbosity.log_filter())
    }
}
