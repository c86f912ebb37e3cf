//! Console command framework.
//!
//! A command implements [`ConsoleCommand`]: it declares a `clap` option
//! schema and a `handle` hook, and the engine ([`load`], [`execute`]) takes
//! care of parsing, the options every command shares, output, and error
//! reporting. Three reusable variants cover the common argument shapes
//! ([`LabelCommand`], [`NoArgsCommand`], [`FilePathCommand`]), and
//! [`daemon::DaemonProgram`] adds `start`/`stop`/`restart` management of a
//! detached background process.
//!
//! Several commands can be bundled into one tool with [`ConsoleUtility`] and
//! a [`CommandRegistry`].

mod command;
mod engine;
mod error;
mod io;
pub mod output;
pub mod prompt;
mod registry;
pub mod style;
pub mod telemetry;
mod utility;
mod variants;
mod version;

#[cfg(unix)]
pub mod daemon;

#[cfg(test)]
mod tests;

pub use command::{ConsoleCommand, NoOptions, OptionsRecord, usage_line};
pub use engine::{
    Program, execute, handle_default_options, load, load_subcommand, prepend_search_path,
    report_user_error,
};
pub use error::{BoxError, CommandError, Fault, Outcome, UserError};
pub use io::IoStreams;
pub use registry::{CommandRegistry, RegistryError, StaticRegistry};
pub use style::{Palette, StyleRole};
pub use utility::ConsoleUtility;
pub use variants::{
    FilePathCommand, LabelCommand, LabelHandler, NoArgsCommand, NoArgsHandler, PathHandler,
};
pub use version::{ReleaseLevel, Version, VersionParseError};
pub use vigil_config::{CommonOptions, DaemonSettings, LogFormat, StopPolicy, Verbosity};
