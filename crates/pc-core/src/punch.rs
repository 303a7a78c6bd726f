//! Punch kinds and the raw clock events fed to the reconstructor.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction of a single attendance-terminal punch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PunchKind {
    In,
    Out,
}

impl PunchKind {
    /// Returns the wire representation used by the HR service.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::Out => "OUT",
        }
    }
}

impl fmt::Display for PunchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PunchKind {
    type Err = UnknownPunchKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("in") {
            Ok(Self::In)
        } else if trimmed.eq_ignore_ascii_case("out") {
            Ok(Self::Out)
        } else {
            Err(UnknownPunchKind(s.to_string()))
        }
    }
}

impl Serialize for PunchKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PunchKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown punch kind strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown punch kind: {0}")]
pub struct UnknownPunchKind(pub String);

/// A clock event suitable for session reconstruction.
///
/// This trait allows reconstruction to work with different record shapes
/// (API payloads, cached database rows, or test fixtures) without copying.
pub trait PunchEvent {
    /// Returns whether this is a punch in or a punch out.
    fn kind(&self) -> PunchKind;

    /// Returns the raw timestamp text as supplied by the terminal.
    fn clock_time(&self) -> &str;
}

/// Minimal owned clock event.
///
/// Deserializes from the HR wire shape; fields other than the punch kind and
/// the clock time (device, office, coordinates) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockEvent {
    #[serde(rename = "inOutType")]
    pub kind: PunchKind,
    pub clock_time: String,
}

impl ClockEvent {
    pub fn new(kind: PunchKind, clock_time: impl Into<String>) -> Self {
        Self {
            kind,
            clock_time: clock_time.into(),
        }
    }
}

impl PunchEvent for ClockEvent {
    fn kind(&self) -> PunchKind {
        self.kind
    }

    fn clock_time(&self) -> &str {
        &self.clock_time
    }
}

impl<T: PunchEvent + ?Sized> PunchEvent for &T {
    fn kind(&self) -> PunchKind {
        (**self).kind()
    }

    fn clock_time(&self) -> &str {
        (**self).clock_time()
    }
}
