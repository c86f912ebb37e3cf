//! Daemon lifecycle management.
//!
//! [`DaemonProgram`] turns a [`DaemonHandler`] into a console command with
//! `start`, `stop`, and `restart` actions. The pidfile is the single source of
//! truth for whether the daemon runs: `start` claims it exclusively after the
//! double fork and the claim removes it again when the daemon body returns.
//! Process primitives sit behind [`ProcessControl`] so the lifecycle can be
//! driven without forking in tests.

mod action;
mod daemonize;
mod lifecycle;
mod pidfile;
mod process;

pub(crate) const DAEMON_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::daemon");

pub use action::DaemonAction;
pub use daemonize::{DaemonizeError, Role, daemonize};
pub use lifecycle::{DaemonContext, DaemonHandler, DaemonProgram};
pub use pidfile::{PidClaim, PidFile, PidFileError};
pub use process::{Delivery, Fork, ProcessControl, ProcessError, SystemProcess};
