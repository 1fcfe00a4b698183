//! The two teams a player can be checked in to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Red,
    Green,
}

impl Team {
    pub const ALL: [Team; 2] = [Team::Red, Team::Green];

    pub fn as_str(self) -> &'static str {
        match self {
            Team::Red => "Red",
            Team::Green => "Green",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Team {
    type Err = CoreError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" => Ok(Team::Red),
            "green" => Ok(Team::Green),
            other => Err(CoreError::InvalidInput(format!(
                "Unknown team '{other}', expected Red or Green"
            ))),
        }
    }
}
