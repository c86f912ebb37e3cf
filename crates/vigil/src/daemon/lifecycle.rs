use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use nix::sys::signal::Signal;
use tracing::{debug, info, warn};
use vigil_config::{DaemonSettings, SettingsError};

use super::DAEMON_TARGET;
use super::action::DaemonAction;
use super::daemonize::{Role, daemonize};
use super::pidfile::{PidClaim, PidFile, PidFileError};
use super::process::{Delivery, ProcessControl, ProcessError, SystemProcess};
use crate::command::{ConsoleCommand, OptionsRecord};
use crate::error::{CommandError, Outcome, UserError};
use crate::io::IoStreams;

const WAIT_SLICE: Duration = Duration::from_millis(50);

/// Long-running body of a daemon command.
pub trait DaemonHandler {
    /// Command-specific option schema.
    type Options: Args + fmt::Debug;

    /// Short description shown under the usage line.
    fn help(&self) -> &str {
        "A daemon process"
    }

    /// Runs in the invoking process before detaching. Relative paths in
    /// `options` should be resolved here since the daemon runs from `/`.
    fn prepare(&mut self, options: &OptionsRecord<Self::Options>) -> Result<(), CommandError> {
        let _ = options;
        Ok(())
    }

    /// Body of the detached daemon. Returning ends the daemon and removes
    /// its pidfile.
    fn handle_daemon(
        &mut self,
        options: &OptionsRecord<Self::Options>,
        context: &DaemonContext,
    ) -> Result<(), CommandError>;
}

/// What the daemon body knows about its own process.
#[derive(Debug, Clone)]
pub struct DaemonContext {
    pid: u32,
    pidfile: Utf8PathBuf,
    shutdown: Arc<AtomicBool>,
}

impl DaemonContext {
    /// Builds a context; the lifecycle does this after detaching.
    #[must_use]
    pub const fn new(pid: u32, pidfile: Utf8PathBuf, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            pid,
            pidfile,
            shutdown,
        }
    }

    /// Pid of the daemon.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Pidfile owned by the daemon.
    #[must_use]
    pub fn pidfile(&self) -> &Utf8Path {
        &self.pidfile
    }

    /// Whether a termination signal has arrived.
    #[must_use]
    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Sleeps for up to `duration`, waking early on shutdown. Returns whether
    /// shutdown was requested.
    #[must_use]
    pub fn wait(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        while !self.shutdown_requested() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            thread::sleep(remaining.min(WAIT_SLICE));
        }
        true
    }
}

/// Console command that manages a background process through a pidfile.
///
/// The single positional argument selects the action:
///
/// - `start` refuses when the pidfile names a live process or is still being
///   claimed, clears a stale one, then detaches and runs
///   [`DaemonHandler::handle_daemon`];
/// - `stop` signals the recorded pid until it is gone, escalating from
///   `SIGTERM` to `SIGKILL` per the configured [`StopPolicy`], then removes
///   the pidfile;
/// - `restart` stops, then starts.
///
/// [`StopPolicy`]: vigil_config::StopPolicy
#[derive(Debug)]
pub struct DaemonProgram<H, P = SystemProcess> {
    handler: H,
    settings: DaemonSettings,
    pidfile: PidFile,
    process: P,
}

impl<H: DaemonHandler> DaemonProgram<H> {
    /// Builds a daemon command backed by the real operating system.
    ///
    /// Relative settings paths are resolved against the current directory.
    pub fn new(handler: H, settings: DaemonSettings) -> Result<Self, SettingsError> {
        Self::with_process(handler, settings, SystemProcess)
    }
}

impl<H: DaemonHandler, P: ProcessControl> DaemonProgram<H, P> {
    /// Builds a daemon command on top of `process`.
    pub fn with_process(
        handler: H,
        settings: DaemonSettings,
        process: P,
    ) -> Result<Self, SettingsError> {
        let resolved = settings.absolutize()?;
        let pidfile = PidFile::new(resolved.pidfile().to_path_buf());
        Ok(Self {
            handler,
            settings: resolved,
            pidfile,
            process,
        })
    }

    /// The daemon body.
    #[must_use]
    pub const fn handler(&self) -> &H {
        &self.handler
    }

    /// The daemon's pidfile.
    #[must_use]
    pub const fn pidfile(&self) -> &PidFile {
        &self.pidfile
    }

    /// Settings the daemon was built with.
    #[must_use]
    pub const fn settings(&self) -> &DaemonSettings {
        &self.settings
    }

    /// Starts the daemon.
    ///
    /// Returns `Ok(None)` in every process that comes back from the fork:
    /// the invoking parent, the intermediate session leader, and the daemon
    /// once its body finishes.
    pub fn start(
        &mut self,
        options: &OptionsRecord<H::Options>,
        io: &mut IoStreams<'_>,
    ) -> Outcome {
        self.clear_stale_pidfile()?;
        self.handler.prepare(options)?;
        match daemonize(&self.process, &self.pidfile, &self.settings, io).map_err(UserError::from)?
        {
            Role::Parent => Ok(None),
            Role::Daemon(claim) => self.run_daemon(claim, options),
        }
    }

    /// Stops the running daemon and removes its pidfile.
    pub fn stop(&mut self) -> Result<(), UserError> {
        let Some(pid) = self.pidfile.read() else {
            return Err(UserError::new(format!(
                "The pidfile {} does not exist. Perhaps the daemon is not running?",
                self.pidfile.path()
            )));
        };

        let policy = self.settings.stop_policy();
        let mut attempts: u32 = 0;
        loop {
            if policy.abandon_after.is_some_and(|limit| attempts >= limit) {
                warn!(target: DAEMON_TARGET, pid, attempts, "daemon ignored stop requests");
                return Err(UserError::new(format!(
                    "Daemon process {pid} did not exit after {attempts} attempts; \
                     leaving pidfile {} in place",
                    self.pidfile.path()
                )));
            }
            let signal = if policy.kill_after.is_some_and(|limit| attempts >= limit) {
                Signal::SIGKILL
            } else {
                Signal::SIGTERM
            };
            debug!(target: DAEMON_TARGET, pid, attempt = attempts, %signal, "signalling daemon");
            match self.process.signal(pid, signal).map_err(process_error)? {
                Delivery::NoSuchProcess => break,
                Delivery::Delivered => {}
            }
            attempts = attempts.saturating_add(1);
            self.process.pause(policy.poll_interval());
            if !self.process.is_alive(pid).map_err(process_error)? {
                break;
            }
        }

        self.pidfile.remove().map_err(pidfile_error)?;
        info!(target: DAEMON_TARGET, pid, attempts, "daemon stopped");
        Ok(())
    }

    /// Stops the daemon, then starts it again. A failing stop is returned
    /// without starting.
    pub fn restart(
        &mut self,
        options: &OptionsRecord<H::Options>,
        io: &mut IoStreams<'_>,
    ) -> Outcome {
        self.stop()?;
        self.start(options, io)
    }

    fn clear_stale_pidfile(&self) -> Result<(), UserError> {
        if !self.pidfile.exists() {
            return Ok(());
        }
        if let Some(pid) = self.pidfile.read() {
            if self.process.is_alive(pid).map_err(process_error)? {
                return Err(self.already_running());
            }
            warn!(target: DAEMON_TARGET, pid, file = %self.pidfile.path(), "removing stale pidfile");
        } else if self.pidfile.is_blank() {
            debug!(target: DAEMON_TARGET, file = %self.pidfile.path(), "pidfile is being claimed");
            return Err(self.already_running());
        } else {
            warn!(target: DAEMON_TARGET, file = %self.pidfile.path(), "removing unreadable pidfile");
        }
        self.pidfile.remove().map_err(pidfile_error)?;
        Ok(())
    }

    fn already_running(&self) -> UserError {
        pidfile_error(PidFileError::Exists {
            path: self.pidfile.path().to_path_buf(),
        })
    }

    fn run_daemon(&mut self, claim: PidClaim, options: &OptionsRecord<H::Options>) -> Outcome {
        let shutdown = self
            .process
            .install_shutdown_flag()
            .map_err(process_error)?;
        let pid = claim.pid();
        let context = DaemonContext::new(pid, claim.path().to_path_buf(), shutdown);
        info!(target: DAEMON_TARGET, pid, file = %claim.path(), "daemon started");
        let result = self.handler.handle_daemon(options, &context);
        drop(claim);
        info!(target: DAEMON_TARGET, pid, "daemon exiting");
        result.map(|()| None)
    }
}

impl<H: DaemonHandler, P: ProcessControl> ConsoleCommand for DaemonProgram<H, P> {
    type Options = H::Options;

    fn help(&self) -> &str {
        self.handler.help()
    }

    fn args_hint(&self) -> &str {
        "start|stop|restart"
    }

    fn handle(
        &mut self,
        args: &[String],
        options: &OptionsRecord<Self::Options>,
        io: &mut IoStreams<'_>,
    ) -> Outcome {
        match DaemonAction::from_args(args)? {
            DaemonAction::Start => self.start(options, io),
            DaemonAction::Stop => self.stop().map(|()| None).map_err(CommandError::from),
            DaemonAction::Restart => self.restart(options, io),
        }
    }
}

fn process_error(error: ProcessError) -> UserError {
    UserError::new(error.to_string())
}

fn pidfile_error(error: PidFileError) -> UserError {
    UserError::new(error.to_string())
}
