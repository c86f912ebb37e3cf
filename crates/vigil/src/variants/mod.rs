//! Reusable specialisations of [`ConsoleCommand`](crate::ConsoleCommand).
//!
//! Each variant wraps a small handler trait and supplies the argument
//! checking around it:
//! - [`LabelCommand`] calls its handler once per positional argument.
//! - [`NoArgsCommand`] rejects positional arguments outright.
//! - [`FilePathCommand`] checks every path is readable before handing it on
//!   and reports unreadable paths without failing the batch.

mod file_path;
mod label;
mod no_args;

pub use file_path::{FilePathCommand, PathHandler};
pub use label::{LabelCommand, LabelHandler};
pub use no_args::{NoArgsCommand, NoArgsHandler};
