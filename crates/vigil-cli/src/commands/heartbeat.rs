//! Demonstration daemon appending numbered entries to a log file.

use std::fs::OpenOptions;
use std::io::Write;
use std::thread;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Args;
use tracing::debug;
use vigil::daemon::{DaemonContext, DaemonHandler, DaemonProgram};
use vigil::{BoxError, CommandError, OptionsRecord, Program, UserError};
use vigil_config::DaemonSettings;

const DAEMON_NAME: &str = "heartbeat";
const STOPPED_LINE: &str = "Heartbeat stopped";

/// Options of [`Heartbeat`].
#[derive(Debug, Clone, Args)]
pub struct HeartbeatOptions {
    /// Milliseconds between entries.
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    pub interval_ms: u64,
    /// File the entries are appended to; standard output when omitted.
    #[arg(short = 'w', long, value_name = "PATH")]
    pub logfile: Option<Utf8PathBuf>,
    /// Milliseconds spent winding down after a stop request.
    #[arg(long, value_name = "MS", default_value_t = 0)]
    pub drain_ms: u64,
}

/// Writes `This is entry number N` every interval until stopped, then
/// `Heartbeat stopped` once it has wound down.
#[derive(Debug, Clone, Default)]
pub struct Heartbeat {
    logfile: Option<Utf8PathBuf>,
}

pub(super) fn build() -> Result<Box<dyn Program>, BoxError> {
    let settings = DaemonSettings::discover(DAEMON_NAME)?;
    Ok(Box::new(DaemonProgram::new(Heartbeat::default(), settings)?))
}

impl Heartbeat {
    fn append(&self, line: &str) -> Result<(), CommandError> {
        match &self.logfile {
            Some(path) => {
                let mut file = OpenOptions::new().append(true).create(true).open(path)?;
                writeln!(file, "{line}")?;
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{line}")?;
                stdout.flush()?;
            }
        }
        Ok(())
    }
}

impl DaemonHandler for Heartbeat {
    type Options = HeartbeatOptions;

    fn help(&self) -> &str {
        "Append a numbered entry to a log file at a fixed interval"
    }

    fn prepare(&mut self, options: &OptionsRecord<HeartbeatOptions>) -> Result<(), CommandError> {
        self.logfile = match &options.extra.logfile {
            Some(path) => {
                let absolute = std::path::absolute(path).map_err(|source| {
                    UserError::with_source(format!("Cannot resolve log file {path}"), source)
                })?;
                let resolved = Utf8PathBuf::from_path_buf(absolute).map_err(|raw| {
                    UserError::new(format!("Log file {} is not valid UTF-8", raw.display()))
                })?;
                Some(resolved)
            }
            None => None,
        };
        Ok(())
    }

    fn handle_daemon(
        &mut self,
        options: &OptionsRecord<HeartbeatOptions>,
        context: &DaemonContext,
    ) -> Result<(), CommandError> {
        let interval = Duration::from_millis(options.extra.interval_ms);
        let mut entry: u64 = 0;
        loop {
            entry = entry.saturating_add(1);
            self.append(&format!("This is entry number {entry}"))?;
            debug!(pid = context.pid(), entry, "heartbeat");
            if context.wait(interval) {
                break;
            }
        }
        thread::sleep(Duration::from_millis(options.extra.drain_ms));
        self.append(STOPPED_LINE)
    }
}
