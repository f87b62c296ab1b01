//! Host runtime version numbers
//!
//! A runtime release is identified by `major.minor.micro` plus a release
//! level (alpha, beta, release candidate, final) and a serial. Versions are
//! totally ordered, which is all the gate needs.
//!
//! The runtime also publishes its version packed into a single word:
//! ```text
//! 0x MM mm uu L S
//!    |  |  |  | +- serial (4 bits)
//!    |  |  |  +--- release level: 0xA alpha, 0xB beta, 0xC candidate, 0xF final
//!    |  |  +------ micro
//!    |  +--------- minor
//!    +------------ major
//! ```
//!
//! This file is also compiled into `build.rs`, so it only depends on `regex`
//! and `thiserror`.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Release level of a runtime version
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReleaseLevel {
    Alpha = 0xA,
    Beta = 0xB,
    Candidate = 0xC,
    Final = 0xF,
}

impl ReleaseLevel {
    /// Decode the 4-bit level nibble of a packed version
    pub const fn from_nibble(nibble: u8) -> Option<Self> {
        match nibble {
            0xA => Some(ReleaseLevel::Alpha),
            0xB => Some(ReleaseLevel::Beta),
            0xC => Some(ReleaseLevel::Candidate),
            0xF => Some(ReleaseLevel::Final),
            _ => None,
        }
    }

    /// Suffix used in version text (`a`, `b`, `rc`, or nothing)
    pub const fn suffix(self) -> &'static str {
        match self {
            ReleaseLevel::Alpha => "a",
            ReleaseLevel::Beta => "b",
            ReleaseLevel::Candidate => "rc",
            ReleaseLevel::Final => "",
        }
    }
}

/// A host runtime release
///
/// Field order matters: the derived `Ord` compares major, minor, micro,
/// level and serial in that order, which is the runtime's release order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuntimeVersion {
    pub major: u8,
    pub minor: u8,
    pub micro: u8,
    pub level: ReleaseLevel,
    pub serial: u8,
}

/// Error from parsing a runtime version
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("malformed runtime version `{0}`")]
    Malformed(String),
    #[error("runtime version component out of range in `{0}`")]
    OutOfRange(String),
    #[error("unknown release level nibble {0:#x}")]
    UnknownLevel(u8),
}

impl RuntimeVersion {
    /// Create a version from all of its components
    pub const fn new(major: u8, minor: u8, micro: u8, level: ReleaseLevel, serial: u8) -> Self {
        RuntimeVersion {
            major,
            minor,
            micro,
            level,
            serial,
        }
    }

    /// `major.minor.0aN`
    pub const fn alpha(major: u8, minor: u8, serial: u8) -> Self {
        Self::new(major, minor, 0, ReleaseLevel::Alpha, serial)
    }

    /// `major.minor.0bN`
    pub const fn beta(major: u8, minor: u8, serial: u8) -> Self {
        Self::new(major, minor, 0, ReleaseLevel::Beta, serial)
    }

    /// `major.minor.micro` final release
    pub const fn release(major: u8, minor: u8, micro: u8) -> Self {
        Self::new(major, minor, micro, ReleaseLevel::Final, 0)
    }

    /// Pack into the runtime's single-word version number
    pub const fn hex(self) -> u32 {
        ((self.major as u32) << 24)
            | ((self.minor as u32) << 16)
            | ((self.micro as u32) << 8)
            | ((self.level as u32) << 4)
            | (self.serial as u32 & 0xF)
    }

    /// Unpack a single-word version number
    pub fn from_hex(hex: u32) -> Result<Self, VersionError> {
        let nibble = ((hex >> 4) & 0xF) as u8;
        match ReleaseLevel::from_nibble(nibble) {
            Some(level) => Ok(RuntimeVersion {
                major: (hex >> 24) as u8,
                minor: (hex >> 16) as u8,
                micro: (hex >> 8) as u8,
                level,
                serial: (hex & 0xF) as u8,
            }),
            None => Err(VersionError::UnknownLevel(nibble)),
        }
    }

    /// Parse version text
    ///
    /// Accepts dotted forms (`3.9`, `3.9.0a4`, `3.10.0rc1`, `3.8.10+`) and
    /// packed hex (`0x030900A4`).
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        let text = text.trim();

        if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            let packed = u32::from_str_radix(hex, 16)
                .map_err(|_| VersionError::Malformed(text.to_string()))?;
            return Self::from_hex(packed);
        }

        static DOTTED: OnceLock<Regex> = OnceLock::new();
        let re = DOTTED.get_or_init(|| {
            Regex::new(r"^(\d+)\.(\d+)(?:\.(\d+))?(?:(a|b|rc)(\d+))?\+?$")
                .expect("version pattern is valid")
        });

        let caps = re
            .captures(text)
            .ok_or_else(|| VersionError::Malformed(text.to_string()))?;

        let component = |idx: usize| -> Result<u8, VersionError> {
            match caps.get(idx) {
                Some(m) => m
                    .as_str()
                    .parse::<u8>()
                    .map_err(|_| VersionError::OutOfRange(text.to_string())),
                None => Ok(0),
            }
        };

        let level = match caps.get(4).map(|m| m.as_str()) {
            Some("a") => ReleaseLevel::Alpha,
            Some("b") => ReleaseLevel::Beta,
            Some("rc") => ReleaseLevel::Candidate,
            _ => ReleaseLevel::Final,
        };

        let serial = component(5)?;
        if serial > 0xF {
            return Err(VersionError::OutOfRange(text.to_string()));
        }

        Ok(RuntimeVersion {
            major: component(1)?,
            minor: component(2)?,
            micro: component(3)?,
            level,
            serial,
        })
    }
}

impl FromStr for RuntimeVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuntimeVersion::parse(s)
    }
}

impl fmt::Display for RuntimeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if self.level != ReleaseLevel::Final {
            write!(f, "{}{}", self.level.suffix(), self.serial)?;
        }
        Ok(())
    }
}
