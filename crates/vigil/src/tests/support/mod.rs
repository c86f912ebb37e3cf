//! Test doubles shared by the suites.

mod capture;
#[cfg(unix)]
mod process;

pub use capture::{Captured, assert_exit, run_subcommand};
#[cfg(unix)]
pub use process::{FakeProcess, ProcessCall};
