//! Shared configuration for Vigil console programs.
//!
//! Two surfaces live here. [`CommonOptions`] is the option schema every
//! command accepts on its command line (verbosity, search path, traceback
//! and the logging knobs). [`DaemonSettings`] is the construction-time
//! configuration of a daemon command: where its pidfile lives, where its
//! standard streams are redirected once it detaches, and how `stop` escalates
//! when the daemon does not exit.

mod defaults;
mod logging;
mod options;
mod settings;

pub use defaults::{
    CONFIG_ENV_VAR, DEFAULT_LOG_FILTER, LOG_FILTER_ENV_VAR, LOG_FORMAT_ENV_VAR, NULL_DEVICE,
    default_pidfile,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use options::{CommonOptions, Verbosity};
pub use settings::{DaemonSettings, SettingsError, SettingsLayers, StopPolicy};
