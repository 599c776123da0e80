use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// CEFR proficiency band, ordered from easiest to hardest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
    #[serde(rename = "C2+")]
    C2Plus,
}

impl CefrLevel {
    pub const ALL: [CefrLevel; 7] = [
        CefrLevel::A1,
        CefrLevel::A2,
        CefrLevel::B1,
        CefrLevel::B2,
        CefrLevel::C1,
        CefrLevel::C2,
        CefrLevel::C2Plus,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CefrLevel::A1 => "A1",
            CefrLevel::A2 => "A2",
            CefrLevel::B1 => "B1",
            CefrLevel::B2 => "B2",
            CefrLevel::C1 => "C1",
            CefrLevel::C2 => "C2",
            CefrLevel::C2Plus => "C2+",
        }
    }

    /// Scoring weight, 1 for A1 up to 7 for C2+.
    pub fn weight(self) -> u8 {
        self as u8 + 1
    }

    /// Token usable in a class attribute (`C2+` is not).
    pub fn css_class(self) -> &'static str {
        match self {
            CefrLevel::A1 => "a1",
            CefrLevel::A2 => "a2",
            CefrLevel::B1 => "b1",
            CefrLevel::B2 => "b2",
            CefrLevel::C1 => "c1",
            CefrLevel::C2 => "c2",
            CefrLevel::C2Plus => "c2plus",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            CefrLevel::A1 => "#4CAF50",
            CefrLevel::A2 => "#8BC34A",
            CefrLevel::B1 => "#FFC107",
            CefrLevel::B2 => "#FF9800",
            CefrLevel::C1 => "#FF5722",
            CefrLevel::C2 => "#F44336",
            CefrLevel::C2Plus => "#9C27B0",
        }
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid CEFR level: {0}")]
pub struct ParseLevelError(pub String);

impl FromStr for CefrLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        CefrLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseLevelError(s.to_string()))
    }
}

/// The level half of the filter: either every level or exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelFilter {
    #[default]
    All,
    #[serde(untagged)]
    Only(CefrLevel),
}

impl LevelFilter {
    pub fn admits(self, level: CefrLevel) -> bool {
        match self {
            LevelFilter::All => true,
            LevelFilter::Only(wanted) => wanted == level,
        }
    }
}

impl FromStr for LevelFilter {
    type Err = ParseLevelError;

    /// Parses the selector values `all, A1, A2, B1, B2, C1, C2, C2+`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(LevelFilter::All)
        } else {
            s.parse().map(LevelFilter::Only)
        }
    }
}

impl fmt::Display for LevelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelFilter::All => f.write_str("all"),
            LevelFilter::Only(level) => level.fmt(f),
        }
    }
}
