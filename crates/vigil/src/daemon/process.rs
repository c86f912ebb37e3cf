//! Process primitives used by the daemon lifecycle.
//!
//! [`ProcessControl`] is the seam between the lifecycle state machine and the
//! operating system: forking, detaching, stream redirection, and signal
//! delivery. [`SystemProcess`] implements it with `nix` and `signal-hook`; tests
//! substitute doubles so the state machine can be exercised without forking.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::thread;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::sys::stat::{Mode, umask};
use nix::unistd::{ForkResult, Pid, chdir, dup2, fork, setsid};
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
use signal_hook::flag;
use thiserror::Error;
use vigil_config::DaemonSettings;

/// Outcome of a fork, seen from the calling process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fork {
    /// The original process; `child` is the new process id.
    Parent {
        /// Process id of the child.
        child: u32,
    },
    /// The newly created process.
    Child,
}

/// Result of delivering a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The signal reached the process.
    Delivered,
    /// No process with the id exists.
    NoSuchProcess,
}

/// Errors raised by process primitives.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// `fork(2)` failed.
    #[error("fork failed: {0}")]
    Fork(#[source] Errno),
    /// `setsid(2)` failed.
    #[error("failed to start a new session: {0}")]
    Session(#[source] Errno),
    /// Changing to the root directory failed.
    #[error("failed to change directory to /: {0}")]
    Chdir(#[source] Errno),
    /// A redirection target could not be opened.
    #[error("failed to open {path} for {stream}: {source}")]
    Open {
        /// Stream being redirected.
        stream: &'static str,
        /// Target path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Duplicating a descriptor onto a standard stream failed.
    #[error("failed to redirect {stream}: {source}")]
    Redirect {
        /// Stream being redirected.
        stream: &'static str,
        /// Underlying errno.
        #[source]
        source: Errno,
    },
    /// A process id does not fit the platform's `pid_t`.
    #[error("process id {pid} is out of range")]
    PidRange {
        /// Offending id.
        pid: u32,
    },
    /// A signal could not be delivered for a reason other than the process
    /// being gone.
    #[error("failed to signal process {pid}: {source}")]
    Signal {
        /// Target process.
        pid: u32,
        /// Underlying errno.
        #[source]
        source: Errno,
    },
    /// Probing a process for liveness failed.
    #[error("failed to probe process {pid}: {source}")]
    Probe {
        /// Target process.
        pid: u32,
        /// Underlying errno.
        #[source]
        source: Errno,
    },
    /// Installing the shutdown signal handlers failed.
    #[error("failed to install signal handlers: {0}")]
    Handlers(#[source] io::Error),
}

/// Operating-system operations the daemon lifecycle depends on.
#[cfg_attr(test, mockall::automock)]
pub trait ProcessControl {
    /// Forks the current process.
    fn fork(&self) -> Result<Fork, ProcessError>;

    /// Starts a new session, changes to `/`, and clears the file mode
    /// creation mask.
    fn detach(&self) -> Result<(), ProcessError>;

    /// Points the standard streams at the targets in `settings`: input is
    /// opened for reading, output and error for appending.
    fn redirect(&self, settings: &DaemonSettings) -> Result<(), ProcessError>;

    /// Id of the current process.
    fn current_pid(&self) -> u32;

    /// Sends `signal` to `pid`.
    fn signal(&self, pid: u32, signal: Signal) -> Result<Delivery, ProcessError>;

    /// Returns whether `pid` names a live process. Zombies count as dead.
    fn is_alive(&self, pid: u32) -> Result<bool, ProcessError>;

    /// Sleeps for `duration`.
    fn pause(&self, duration: Duration);

    /// Installs termination handlers and returns the flag they raise.
    ///
    /// `SIGTERM`, `SIGINT` and `SIGHUP` set the flag. `SIGTERM` and `SIGHUP`
    /// may repeat while the daemon winds down; a second `SIGINT` terminates
    /// the process.
    fn install_shutdown_flag(&self) -> Result<Arc<AtomicBool>, ProcessError>;
}

/// [`ProcessControl`] backed by the real operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcess;

impl ProcessControl for SystemProcess {
    fn fork(&self) -> Result<Fork, ProcessError> {
        // SAFETY: commands are single-threaded, so the child inherits no
        // locks held by other threads.
        match unsafe { fork() }.map_err(ProcessError::Fork)? {
            ForkResult::Parent { child } => Ok(Fork::Parent {
                child: child.as_raw().unsigned_abs(),
            }),
            ForkResult::Child => Ok(Fork::Child),
        }
    }

    fn detach(&self) -> Result<(), ProcessError> {
        setsid().map_err(ProcessError::Session)?;
        chdir(Path::new("/")).map_err(ProcessError::Chdir)?;
        umask(Mode::empty());
        Ok(())
    }

    fn redirect(&self, settings: &DaemonSettings) -> Result<(), ProcessError> {
        let input = open_target("stdin", settings.stdin(), OpenOptions::new().read(true))?;
        let output = open_target(
            "stdout",
            settings.stdout(),
            OpenOptions::new().append(true).create(true),
        )?;
        let error = open_target(
            "stderr",
            settings.stderr(),
            OpenOptions::new().append(true).create(true),
        )?;
        duplicate_onto("stdin", &input, io::stdin().as_raw_fd())?;
        duplicate_onto("stdout", &output, io::stdout().as_raw_fd())?;
        duplicate_onto("stderr", &error, io::stderr().as_raw_fd())
    }

    fn current_pid(&self) -> u32 {
        std::process::id()
    }

    fn signal(&self, pid: u32, signal: Signal) -> Result<Delivery, ProcessError> {
        match kill(to_pid(pid)?, signal) {
            Ok(()) => Ok(Delivery::Delivered),
            Err(Errno::ESRCH) => Ok(Delivery::NoSuchProcess),
            Err(source) => Err(ProcessError::Signal { pid, source }),
        }
    }

    fn is_alive(&self, pid: u32) -> Result<bool, ProcessError> {
        match kill(to_pid(pid)?, None) {
            Ok(()) | Err(Errno::EPERM) => Ok(!is_zombie(pid)),
            Err(Errno::ESRCH) => Ok(false),
            Err(source) => Err(ProcessError::Probe { pid, source }),
        }
    }

    fn pause(&self, duration: Duration) {
        thread::sleep(duration);
    }

    fn install_shutdown_flag(&self) -> Result<Arc<AtomicBool>, ProcessError> {
        let requested = Arc::new(AtomicBool::new(false));
        flag::register_conditional_shutdown(SIGINT, 1, Arc::clone(&requested))
            .map_err(ProcessError::Handlers)?;
        for signal in [SIGTERM, SIGINT, SIGHUP] {
            flag::register(signal, Arc::clone(&requested)).map_err(ProcessError::Handlers)?;
        }
        Ok(requested)
    }
}

fn to_pid(pid: u32) -> Result<Pid, ProcessError> {
    i32::try_from(pid)
        .map(Pid::from_raw)
        .map_err(|_| ProcessError::PidRange { pid })
}

fn open_target(
    stream: &'static str,
    path: &Utf8Path,
    options: &OpenOptions,
) -> Result<File, ProcessError> {
    options.open(path).map_err(|source| ProcessError::Open {
        stream,
        path: path.to_path_buf(),
        source,
    })
}

fn duplicate_onto(stream: &'static str, file: &File, target: RawFd) -> Result<(), ProcessError> {
    dup2(file.as_raw_fd(), target)
        .map(drop)
        .map_err(|source| ProcessError::Redirect { stream, source })
}

#[cfg(target_os = "linux")]
fn is_zombie(pid: u32) -> bool {
    std::fs::read_to_string(format!("/proc/{pid}/stat"))
        .ok()
        .and_then(|stat| {
            stat.rsplit_once(')')
                .map(|(_, rest)| rest.trim_start().starts_with('Z'))
        })
        .unwrap_or(false)
}

#[cfg(not(target_os = "linux"))]
fn is_zombie(_pid: u32) -> bool {
    false
}
