//! Voice identifiers for the Flite synthesis adapter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Built-in Flite voices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FliteVoice {
    /// Female, American. Soft.
    Slt,
    /// Male, American. Robotic.
    Kal,
    /// Male, Scottish. Expressive.
    #[default]
    Awb,
    /// Male, American. Deep and formal.
    Rms,
}

impl FliteVoice {
    /// The name passed to `flite -voice`.
    pub fn as_str(self) -> &'static str {
        match self {
            FliteVoice::Slt => "slt",
            FliteVoice::Kal => "kal",
            FliteVoice::Awb => "awb",
            FliteVoice::Rms => "rms",
        }
    }
}

impl fmt::Display for FliteVoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing a voice name Flite does not ship.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown flite voice: {0}")]
pub struct UnknownVoice(pub String);

impl FromStr for FliteVoice {
    type Err = UnknownVoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slt" => Ok(FliteVoice::Slt),
            "kal" => Ok(FliteVoice::Kal),
            "awb" => Ok(FliteVoice::Awb),
            "rms" => Ok(FliteVoice::Rms),
            other => Err(UnknownVoice(other.to_string())),
        }
    }
}
