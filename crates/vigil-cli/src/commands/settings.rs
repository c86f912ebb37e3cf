use clap::Args;
use vigil::{Fault, IoStreams, NoArgsHandler, OptionsRecord, Outcome, UserError};
use vigil_config::DaemonSettings;

/// Options of [`ShowSettings`].
#[derive(Debug, Clone, Args)]
pub struct SettingsOptions {
    /// Daemon whose settings are shown.
    #[arg(long, value_name = "NAME", default_value = "heartbeat")]
    pub daemon: String,
}

/// Prints the resolved settings of a daemon as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShowSettings;

impl NoArgsHandler for ShowSettings {
    type Options = SettingsOptions;

    fn help(&self) -> &str {
        "Show the resolved daemon settings as JSON"
    }

    fn handle_noargs(
        &mut self,
        options: &OptionsRecord<SettingsOptions>,
        _io: &mut IoStreams<'_>,
    ) -> Outcome {
        let settings = DaemonSettings::discover(&options.extra.daemon)
            .map_err(|error| UserError::new(error.to_string()))?;
        let rendered = serde_json::to_string_pretty(&settings).map_err(Fault::unexpected)?;
        Ok(Some(rendered))
    }
}
