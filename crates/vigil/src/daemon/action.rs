use strum::{Display, EnumString};

use crate::error::UserError;

/// Lifecycle action requested on a daemon command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum DaemonAction {
    /// Detach and run the daemon body.
    Start,
    /// Signal the running daemon until it exits.
    Stop,
    /// Stop, then start.
    Restart,
}

impl DaemonAction {
    /// Parses the positional arguments of a daemon command, which must be
    /// exactly one action name.
    pub fn from_args(args: &[String]) -> Result<Self, UserError> {
        let [arg] = args else {
            return Err(UserError::new(format!(
                "Expected exactly one daemon action (start|stop|restart), got {}",
                args.len()
            )));
        };
        arg.parse()
            .map_err(|_| UserError::new(format!("Unknown daemon action '{arg}'")))
    }
}
