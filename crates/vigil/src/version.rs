//! Release version numbers of the form `1.0`, `1.0.3`, `1.0a1`, `1.0rc2`.

use std::fmt;
use std::str::FromStr;

use strum::{Display, EnumString};
use thiserror::Error;

/// Maturity of a release.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString)]
pub enum ReleaseLevel {
    /// Alpha pre-release, rendered `a`.
    #[strum(serialize = "a")]
    Alpha,
    /// Beta pre-release, rendered `b`.
    #[strum(serialize = "b")]
    Beta,
    /// Release candidate, rendered `rc`.
    #[strum(serialize = "rc")]
    Rc,
    /// Final release, rendered without a suffix.
    #[default]
    #[strum(serialize = "")]
    Final,
}

/// Version number of a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    /// Major component.
    pub major: u32,
    /// Minor component.
    pub minor: u32,
    /// Micro component; omitted from the rendering when zero.
    pub micro: u32,
    /// Release level.
    pub level: ReleaseLevel,
    /// Pre-release serial; ignored for final releases.
    pub serial: u32,
}

impl Version {
    /// Builds a version from all of its components.
    #[must_use]
    pub const fn new(major: u32, minor: u32, micro: u32, level: ReleaseLevel, serial: u32) -> Self {
        Self {
            major,
            minor,
            micro,
            level,
            serial,
        }
    }

    /// Builds a final release version.
    #[must_use]
    pub const fn final_release(major: u32, minor: u32, micro: u32) -> Self {
        Self::new(major, minor, micro, ReleaseLevel::Final, 0)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}.{}", self.major, self.minor)?;
        if self.micro != 0 {
            write!(formatter, ".{}", self.micro)?;
        }
        if self.level != ReleaseLevel::Final {
            write!(formatter, "{}{}", self.level, self.serial)?;
        }
        Ok(())
    }
}

/// A string that is not a version number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid version '{input}'")]
pub struct VersionParseError {
    input: String,
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || VersionParseError {
            input: input.to_owned(),
        };
        let split = input
            .find(|ch: char| ch.is_ascii_alphabetic())
            .unwrap_or(input.len());
        let (numbers, suffix) = input.split_at(split);

        let mut parts = numbers.split('.').map(str::parse::<u32>);
        let major = parts.next().and_then(Result::ok).ok_or_else(invalid)?;
        let minor = parts.next().and_then(Result::ok).ok_or_else(invalid)?;
        let micro = match parts.next() {
            Some(part) => part.map_err(|_| invalid())?,
            None => 0,
        };
        if parts.next().is_some() {
            return Err(invalid());
        }

        if suffix.is_empty() {
            return Ok(Self::final_release(major, minor, micro));
        }
        let digits = suffix
            .find(|ch: char| ch.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (tag, serial) = suffix.split_at(digits);
        let level = tag
            .parse::<ReleaseLevel>()
            .ok()
            .filter(|level| *level != ReleaseLevel::Final)
            .ok_or_else(invalid)?;
        let serial = serial.parse::<u32>().map_err(|_| invalid())?;
        Ok(Self::new(major, minor, micro, level, serial))
    }
}
