//! Clock modes and their storage/sync names

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Prefix shared by storage namespaces and sync signal names.
pub const NAME_PREFIX: &str = "tickwatch";

/// Which clock a piece of state belongs to. Each mode is fully independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Counts up from zero
    Stopwatch,
    /// Counts down from a configured duration
    Timer,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Stopwatch, Mode::Timer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Stopwatch => "stopwatch",
            Mode::Timer => "timer",
        }
    }

    /// Storage namespace; the two modes never share keys.
    pub fn namespace(&self) -> String {
        format!("{}.{}", NAME_PREFIX, self.as_str())
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stopwatch" => Ok(Mode::Stopwatch),
            "timer" => Ok(Mode::Timer),
            other => Err(Error::UnknownMode(other.to_string())),
        }
    }
}
