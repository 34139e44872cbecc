//! Sync signal names and the datagram frame

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    state::{mode::NAME_PREFIX, Mode},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// "State for this mode changed; re-read storage."
    Update,
    /// "Please broadcast an update for this mode now."
    Query,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Update => "update",
            SignalKind::Query => "query",
        }
    }
}

/// A named signal such as `tickwatch.stopwatch.update`. Carries no state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Signal {
    pub kind: SignalKind,
    pub mode: Mode,
}

impl Signal {
    pub fn update(mode: Mode) -> Self {
        Self { kind: SignalKind::Update, mode }
    }

    pub fn query(mode: Mode) -> Self {
        Self { kind: SignalKind::Query, mode }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", NAME_PREFIX, self.mode, self.kind.as_str())
    }
}

impl FromStr for Signal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let unknown = || Error::UnknownSignal(s.to_string());
        let rest = s
            .strip_prefix(NAME_PREFIX)
            .and_then(|rest| rest.strip_prefix('.'))
            .ok_or_else(unknown)?;
        let (mode, kind) = rest.split_once('.').ok_or_else(unknown)?;
        let mode = mode.parse::<Mode>().map_err(|_| unknown())?;
        let kind = match kind {
            "update" => SignalKind::Update,
            "query" => SignalKind::Query,
            _ => return Err(unknown()),
        };
        Ok(Self { kind, mode })
    }
}

impl TryFrom<String> for Signal {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Signal> for String {
    fn from(signal: Signal) -> Self {
        signal.to_string()
    }
}

/// One datagram on the sync bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Node that sent the frame; receivers ignore their own frames
    pub origin: String,
    pub signal: Signal,
}

impl Frame {
    pub fn new(origin: impl Into<String>, signal: Signal) -> Self {
        Self { origin: origin.into(), signal }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::Transport(format!("encode frame: {}", e)))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::Transport(format!("decode frame: {}", e)))
    }
}
