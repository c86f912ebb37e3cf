//! Terminal styling for diagnostics.
//!
//! A [`Palette`] maps each [`StyleRole`] to an optional `owo-colors` style.
//! Styling is switched off entirely when the error stream is not a terminal
//! or `NO_COLOR` is set, and individual roles can be restyled through
//! `VIGIL_COLORS`, for example `error=magenta/black,bold;notice=blue`.

use std::env;
use std::io::{self, IsTerminal};

use owo_colors::{AnsiColors, Style};
use strum::{Display, EnumString};

/// Environment variable holding role overrides.
pub const COLORS_ENV_VAR: &str = "VIGIL_COLORS";

/// Environment variable that disables styling when set.
pub const NO_COLOR_ENV_VAR: &str = "NO_COLOR";

/// Semantic role of a piece of console text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StyleRole {
    /// Failures.
    Error,
    /// Conditions that need attention.
    Warning,
    /// Informational notes.
    Notice,
    /// Headline text.
    Strong,
    /// Emphasised text.
    Emphasis,
}

/// Styles applied per role. A role without a style renders as plain text.
#[derive(Debug, Clone, Default)]
pub struct Palette {
    error: Option<Style>,
    warning: Option<Style>,
    notice: Option<Style>,
    strong: Option<Style>,
    emphasis: Option<Style>,
}

impl Palette {
    /// Palette that never styles.
    #[must_use]
    pub fn plain() -> Self {
        Self::default()
    }

    /// Built-in colour scheme.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            error: Some(Style::new().red().bold()),
            warning: Some(Style::new().yellow().bold()),
            notice: Some(Style::new().cyan()),
            strong: Some(Style::new().green()),
            emphasis: Some(Style::new().underline()),
        }
    }

    /// Chooses a palette for the current process from its environment.
    #[must_use]
    pub fn detect() -> Self {
        let overrides = env::var(COLORS_ENV_VAR).ok();
        Self::from_environment(
            env::var_os(NO_COLOR_ENV_VAR).is_some(),
            io::stderr().is_terminal(),
            overrides.as_deref(),
        )
    }

    /// Chooses a palette from explicit environment facts.
    #[must_use]
    pub fn from_environment(no_color: bool, is_terminal: bool, overrides: Option<&str>) -> Self {
        if no_color || !is_terminal {
            return Self::plain();
        }
        match overrides {
            Some(spec) if !spec.trim().is_empty() => Self::standard().with_overrides(spec),
            _ => Self::standard(),
        }
    }

    /// Applies `role=fg/bg,option;...` definitions on top of this palette.
    ///
    /// Unknown roles, colours, and options are ignored, as are definitions
    /// that end up with no styling at all.
    #[must_use]
    pub fn with_overrides(mut self, spec: &str) -> Self {
        for part in spec.to_ascii_lowercase().split(';') {
            let Some((role, instructions)) = part.split_once('=') else {
                continue;
            };
            let Ok(role) = role.trim().parse::<StyleRole>() else {
                continue;
            };
            if let Some(style) = parse_definition(instructions) {
                *self.slot(role) = Some(style);
            }
        }
        self
    }

    /// Renders `text` in the style of `role`.
    #[must_use]
    pub fn paint(&self, role: StyleRole, text: &str) -> String {
        match self.style(role) {
            Some(style) => style.style(text).to_string(),
            None => text.to_owned(),
        }
    }

    /// Renders `text` as an error.
    #[must_use]
    pub fn error(&self, text: &str) -> String {
        self.paint(StyleRole::Error, text)
    }

    /// Renders `text` as a warning.
    #[must_use]
    pub fn warning(&self, text: &str) -> String {
        self.paint(StyleRole::Warning, text)
    }

    /// Renders `text` as headline text.
    #[must_use]
    pub fn strong(&self, text: &str) -> String {
        self.paint(StyleRole::Strong, text)
    }

    /// Returns whether `role` carries any styling.
    #[must_use]
    pub const fn is_styled(&self, role: StyleRole) -> bool {
        self.style(role).is_some()
    }

    const fn style(&self, role: StyleRole) -> Option<&Style> {
        match role {
            StyleRole::Error => self.error.as_ref(),
            StyleRole::Warning => self.warning.as_ref(),
            StyleRole::Notice => self.notice.as_ref(),
            StyleRole::Strong => self.strong.as_ref(),
            StyleRole::Emphasis => self.emphasis.as_ref(),
        }
    }

    const fn slot(&mut self, role: StyleRole) -> &mut Option<Style> {
        match role {
            StyleRole::Error => &mut self.error,
            StyleRole::Warning => &mut self.warning,
            StyleRole::Notice => &mut self.notice,
            StyleRole::Strong => &mut self.strong,
            StyleRole::Emphasis => &mut self.emphasis,
        }
    }
}

fn parse_definition(instructions: &str) -> Option<Style> {
    let mut parts = instructions.split(',');
    let colours = parts.next().unwrap_or_default();
    let (foreground, background) = match colours.split_once('/') {
        Some((fg, bg)) => (fg, Some(bg)),
        None => (colours, None),
    };

    let mut style = Style::new();
    let mut styled = false;
    if let Some(colour) = ansi_colour(foreground) {
        style = style.color(colour);
        styled = true;
    }
    if let Some(colour) = background.and_then(ansi_colour) {
        style = style.on_color(colour);
        styled = true;
    }
    for option in parts.map(str::trim) {
        style = match option {
            "bold" => style.bold(),
            "underscore" => style.underline(),
            "blink" => style.blink(),
            "reverse" => style.reversed(),
            "conceal" => style.hidden(),
            _ => continue,
        };
        styled = true;
    }
    styled.then_some(style)
}

fn ansi_colour(name: &str) -> Option<AnsiColors> {
    match name.trim() {
        "black" => Some(AnsiColors::Black),
        "red" => Some(AnsiColors::Red),
        "green" => Some(AnsiColors::Green),
        "yellow" => Some(AnsiColors::Yellow),
        "blue" => Some(AnsiColors::Blue),
        "magenta" => Some(AnsiColors::Magenta),
        "cyan" => Some(AnsiColors::Cyan),
        "white" => Some(AnsiColors::White),
        _ => None,
    }
}
