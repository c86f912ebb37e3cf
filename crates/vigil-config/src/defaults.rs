use std::env;

use camino::Utf8PathBuf;

#[cfg(unix)]
use libc::geteuid;

/// Environment variable naming an explicit daemon settings file.
pub const CONFIG_ENV_VAR: &str = "VIGIL_CONFIG_PATH";

/// Environment variable overriding the tracing filter.
pub const LOG_FILTER_ENV_VAR: &str = "VIGIL_LOG";

/// Environment variable overriding the log output format.
pub const LOG_FORMAT_ENV_VAR: &str = "VIGIL_LOG_FORMAT";

/// Log filter used when neither a filter nor a verbosity is supplied.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Platform null device used as the default daemon stream target.
#[cfg(unix)]
pub const NULL_DEVICE: &str = "/dev/null";

/// Platform null device used as the default daemon stream target.
#[cfg(not(unix))]
pub const NULL_DEVICE: &str = "NUL";

const NAMESPACE: &str = "vigil";

/// Computes the default pidfile path for the named daemon.
///
/// The file lives in the user's runtime directory when one is available and
/// otherwise in a per-user directory under the system temporary directory.
#[must_use]
pub fn default_pidfile(daemon: &str) -> Utf8PathBuf {
    let (mut base, apply_namespace) = match runtime_base_directory() {
        Some(dir) => (dir, false),
        None => (fallback_base_directory(), true),
    };

    base.push(NAMESPACE);
    if apply_namespace {
        base.push(user_namespace());
    }
    base.join(format!("{daemon}.pid"))
}

fn runtime_base_directory() -> Option<Utf8PathBuf> {
    dirs::runtime_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
}

fn fallback_base_directory() -> Utf8PathBuf {
    let candidate = env::temp_dir();
    Utf8PathBuf::from_path_buf(candidate).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}

#[cfg(unix)]
fn user_namespace() -> String {
    // SAFETY: `geteuid` has no preconditions and cannot fail.
    let uid = unsafe { geteuid() };
    format!("uid-{uid}")
}

#[cfg(not(unix))]
fn user_namespace() -> String {
    String::from("user")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pidfile_is_named_after_daemon() {
        let path = default_pidfile("heartbeat");
        assert_eq!(path.file_name(), Some("heartbeat.pid"));
        assert!(path.components().any(|part| part.as_str() == NAMESPACE));
    }
}
