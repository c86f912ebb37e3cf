use thiserror::Error;
use tracing::debug;
use vigil_config::DaemonSettings;

use super::DAEMON_TARGET;
use super::pidfile::{PidClaim, PidFile, PidFileError};
use super::process::{Fork, ProcessControl, ProcessError};
use crate::error::UserError;
use crate::io::IoStreams;

/// Which side of the double fork the caller ended up on.
#[derive(Debug)]
pub enum Role {
    /// The invoking process or the intermediate session leader. Returns
    /// without running the daemon body.
    Parent,
    /// The detached daemon, owning its pidfile.
    Daemon(PidClaim),
}

/// Failures while detaching.
#[derive(Debug, Error)]
pub enum DaemonizeError {
    /// Pending output could not be flushed before forking.
    #[error("Failed to flush output before forking: {0}")]
    Flush(#[source] std::io::Error),
    /// The first fork failed.
    #[error("Fork #1 failed: {0}")]
    FirstFork(#[source] ProcessError),
    /// The session could not be detached.
    #[error("Failed to detach from the controlling terminal: {0}")]
    Detach(#[source] ProcessError),
    /// The second fork failed.
    #[error("Fork #2 failed: {0}")]
    SecondFork(#[source] ProcessError),
    /// The pidfile could not be claimed.
    #[error(transparent)]
    PidFile(#[from] PidFileError),
    /// The standard streams could not be redirected.
    #[error("Failed to redirect standard streams: {0}")]
    Redirect(#[source] ProcessError),
}

impl From<DaemonizeError> for UserError {
    fn from(error: DaemonizeError) -> Self {
        Self::new(error.to_string())
    }
}

/// Detaches the current process with the classic double fork.
///
/// Both parents return [`Role::Parent`]. The grandchild starts a new session,
/// claims the pidfile exclusively with its pid already recorded, then points
/// its standard streams at the configured targets before returning
/// [`Role::Daemon`].
pub fn daemonize<P: ProcessControl + ?Sized>(
    process: &P,
    pidfile: &PidFile,
    settings: &DaemonSettings,
    io: &mut IoStreams<'_>,
) -> Result<Role, DaemonizeError> {
    io.flush().map_err(DaemonizeError::Flush)?;
    if let Fork::Parent { child } = process.fork().map_err(DaemonizeError::FirstFork)? {
        debug!(target: DAEMON_TARGET, child, "first fork complete");
        return Ok(Role::Parent);
    }

    process.detach().map_err(DaemonizeError::Detach)?;
    if let Fork::Parent { child } = process.fork().map_err(DaemonizeError::SecondFork)? {
        debug!(target: DAEMON_TARGET, child, "second fork complete");
        return Ok(Role::Parent);
    }

    let claim = pidfile.reserve(process.current_pid())?;
    io.flush().map_err(DaemonizeError::Flush)?;
    process
        .redirect(settings)
        .map_err(DaemonizeError::Redirect)?;
    Ok(Role::Daemon(claim))
}
