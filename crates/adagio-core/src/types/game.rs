//! Game states reported by screen detection and the moods used to pick music.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// In-game situation produced once per detection tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum GameState {
    #[serde(rename = "conflictZone")]
    ConflictZone,
    #[serde(rename = "conflictDogFight")]
    ConflictDogFight,
    #[serde(rename = "planetaryLanding")]
    PlanetaryLanding,
    #[serde(rename = "docking")]
    Docking,
    #[serde(rename = "travel")]
    Travel,
    #[serde(rename = "canyonRunning")]
    CanyonRunning,
    #[serde(rename = "planetaryExploration")]
    PlanetaryExploration,
    #[serde(rename = "slowTravel")]
    SlowTravel,
    #[serde(rename = "Menu")]
    Menu,
    /// Detection ran but rejected the frame.
    #[serde(rename = "False")]
    Rejected,
    /// Nothing detected.
    #[serde(rename = "None")]
    #[default]
    Unknown,
}

impl GameState {
    pub const ALL: [Self; 11] = [
        Self::ConflictZone,
        Self::ConflictDogFight,
        Self::PlanetaryLanding,
        Self::Docking,
        Self::Travel,
        Self::CanyonRunning,
        Self::PlanetaryExploration,
        Self::SlowTravel,
        Self::Menu,
        Self::Rejected,
        Self::Unknown,
    ];

    /// The token used by the detection subsystem.
    pub const fn token(self) -> &'static str {
        match self {
            Self::ConflictZone => "conflictZone",
            Self::ConflictDogFight => "conflictDogFight",
            Self::PlanetaryLanding => "planetaryLanding",
            Self::Docking => "docking",
            Self::Travel => "travel",
            Self::CanyonRunning => "canyonRunning",
            Self::PlanetaryExploration => "planetaryExploration",
            Self::SlowTravel => "slowTravel",
            Self::Menu => "Menu",
            Self::Rejected => "False",
            Self::Unknown => "None",
        }
    }

    /// Whether the player is actually flying around in the game.
    pub const fn is_in_game(self) -> bool {
        !matches!(self, Self::Menu | Self::Rejected | Self::Unknown)
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for GameState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|state| state.token() == s)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown game state '{s}'")))
    }
}

/// Search key handed to the similarity search.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Mood {
    Dark,
    Chill,
    Epic,
    Scary,
    Ethereal,
    Calm,
    Sad,
    Romantic,
}

impl Mood {
    pub const ALL: [Self; 8] = [
        Self::Dark,
        Self::Chill,
        Self::Epic,
        Self::Scary,
        Self::Ethereal,
        Self::Calm,
        Self::Sad,
        Self::Romantic,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "Dark",
            Self::Chill => "Chill",
            Self::Epic => "Epic",
            Self::Scary => "Scary",
            Self::Ethereal => "Ethereal",
            Self::Calm => "Calm",
            Self::Sad => "Sad",
            Self::Romantic => "Romantic",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|mood| mood.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidArgument(format!("unknown mood '{s}'")))
    }
}
