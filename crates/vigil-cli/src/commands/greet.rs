use clap::Args;
use vigil::{IoStreams, LabelHandler, OptionsRecord, Outcome};

/// Options of [`Greet`].
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct GreetOptions {
    /// Greet loudly.
    #[arg(long)]
    pub shout: bool,
}

/// Greets every name it is given.
#[derive(Debug, Clone, Copy, Default)]
pub struct Greet;

impl LabelHandler for Greet {
    type Options = GreetOptions;

    fn label(&self) -> &str {
        "name"
    }

    fn args_hint(&self) -> &str {
        "<name name ...>"
    }

    fn help(&self) -> &str {
        "Greet each named person"
    }

    fn handle_label(
        &mut self,
        label: &str,
        options: &OptionsRecord<GreetOptions>,
        _io: &mut IoStreams<'_>,
    ) -> Outcome {
        let greeting = format!("Hello, {label}!");
        Ok(Some(if options.extra.shout {
            greeting.to_uppercase()
        } else {
            greeting
        }))
    }
}
