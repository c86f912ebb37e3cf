//! Commands bundled with the tool.

mod digest;
mod greet;
#[cfg(unix)]
mod heartbeat;
mod inspect;
mod settings;

use vigil::{FilePathCommand, LabelCommand, NoArgsCommand, StaticRegistry};

pub use digest::Digest;
pub use greet::Greet;
#[cfg(unix)]
pub use heartbeat::Heartbeat;
pub use inspect::Inspect;
pub use settings::ShowSettings;

/// Registry holding every bundled command.
#[must_use]
pub fn registry() -> StaticRegistry {
    let registry = StaticRegistry::new()
        .register("inspect", || Ok(Box::new(Inspect)))
        .register("greet", || Ok(Box::new(LabelCommand::new(Greet))))
        .register("digest", || Ok(Box::new(FilePathCommand::new(Digest))))
        .register("settings", || {
            Ok(Box::new(NoArgsCommand::new(ShowSettings)))
        });
    with_platform_commands(registry)
}

#[cfg(unix)]
fn with_platform_commands(registry: StaticRegistry) -> StaticRegistry {
    registry.register("heartbeat", heartbeat::build)
}

#[cfg(not(unix))]
const fn with_platform_commands(registry: StaticRegistry) -> StaticRegistry {
    registry
}
