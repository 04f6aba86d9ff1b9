//! Difficulty levels and their parsing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Selects story tone, question budget and validation strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(rename = "facil", alias = "easy")]
    Easy,
    #[serde(rename = "media", alias = "medium")]
    Medium,
    #[serde(rename = "dificil", alias = "hard")]
    Hard,
    #[serde(rename = "fight", alias = "fight_mode")]
    Fight,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "facil",
            Difficulty::Medium => "media",
            Difficulty::Hard => "dificil",
            Difficulty::Fight => "fight",
        }
    }

    /// Parse a level a player can pick. `fight` belongs to fight games only.
    pub fn parse_player(raw: &str) -> Result<Self, String> {
        match raw.parse::<Difficulty>()? {
            Difficulty::Fight => Err(format!(
                "difficulty '{}' is reserved for fight games (expected facil, media or dificil)",
                raw.trim()
            )),
            level => Ok(level),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "facil" | "fácil" | "easy" => Ok(Difficulty::Easy),
            "media" | "medio" | "medium" => Ok(Difficulty::Medium),
            "dificil" | "difícil" | "hard" => Ok(Difficulty::Hard),
            "fight" | "fight_mode" | "pelea" => Ok(Difficulty::Fight),
            other => Err(format!(
                "unknown difficulty '{other}' (expected facil, media, dificil or fight)"
            )),
        }
    }
}
