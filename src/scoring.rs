//! Composite difficulty score computed from the statistics block of a result.
//!
//! The score multiplies a level-weighted base by three modifiers (lexical
//! diversity, phrasal density, text length) and maps the result onto five
//! fixed bands.

use crate::analysis::Statistics;
use crate::cefr::CefrLevel;
use serde::Serialize;

/// Word count at which the length factor reaches 1 - 1/e.
const LENGTH_SCALE: f64 = 300.0;
/// Diversity at which the diversity factor is neutral.
const NEUTRAL_DIVERSITY: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DifficultyBand {
    Beginner,
    Intermediate,
    UpperIntermediate,
    Advanced,
    Proficient,
}

impl DifficultyBand {
    pub fn for_score(score: f64) -> Self {
        match score {
            s if s < 20.0 => DifficultyBand::Beginner,
            s if s < 40.0 => DifficultyBand::Intermediate,
            s if s < 60.0 => DifficultyBand::UpperIntermediate,
            s if s < 80.0 => DifficultyBand::Advanced,
            _ => DifficultyBand::Proficient,
        }
    }

    pub fn level_range(self) -> &'static str {
        match self {
            DifficultyBand::Beginner => "A1-A2",
            DifficultyBand::Intermediate => "B1",
            DifficultyBand::UpperIntermediate => "B2-C1",
            DifficultyBand::Advanced => "C1-C2",
            DifficultyBand::Proficient => "C2+",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DifficultyBand::Beginner => "Easy",
            DifficultyBand::Intermediate => "Moderate",
            DifficultyBand::UpperIntermediate => "Challenging",
            DifficultyBand::Advanced => "Difficult",
            DifficultyBand::Proficient => "Very difficult",
        }
    }

    pub fn audience(self) -> &'static str {
        match self {
            DifficultyBand::Beginner => "Beginners who know everyday vocabulary",
            DifficultyBand::Intermediate => "Learners comfortable with familiar topics",
            DifficultyBand::UpperIntermediate => "Independent readers of general texts",
            DifficultyBand::Advanced => "Advanced learners reading complex material",
            DifficultyBand::Proficient => "Near-native readers of specialist or literary text",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreFactors {
    /// Level-weighted mean, normalized to [0, 1].
    pub base_score: f64,
    pub diversity_factor: f64,
    pub phrasal_factor: f64,
    pub length_factor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DifficultyScore {
    pub value: f64,
    pub band: DifficultyBand,
    pub factors: ScoreFactors,
}

/// Level-weighted mean of the distribution, in [1, 7] when shares sum to 100.
pub fn weighted_level_mean(stats: &Statistics) -> f64 {
    CefrLevel::ALL
        .into_iter()
        .map(|level| stats.share(level).percentage / 100.0 * f64::from(level.weight()))
        .sum()
}

pub fn score(stats: &Statistics) -> DifficultyScore {
    let total_words = stats.total_word_occurrences as f64;
    let unique_words = stats.total_unique_words as f64;
    let phrases = stats.total_unique_phrases as f64;

    let base_score = (weighted_level_mean(stats) - 1.0) / 6.0;

    let diversity = if total_words > 0.0 { unique_words / total_words } else { 0.0 };
    let diversity_factor = (1.0 + 0.5 * (diversity - NEUTRAL_DIVERSITY)).clamp(0.7, 1.5);

    let phrasal_ratio = if unique_words > 0.0 { phrases / unique_words } else { 0.0 };
    let phrasal_factor = (1.0 + 0.5 * phrasal_ratio).min(1.3);

    let length_factor = 1.0 - (-total_words / LENGTH_SCALE).exp();

    let value = (base_score * diversity_factor * phrasal_factor * length_factor * 100.0).clamp(0.0, 100.0);

    DifficultyScore {
        value,
        band: DifficultyBand::for_score(value),
        factors: ScoreFactors {
            base_score,
            diversity_factor,
            phrasal_factor,
            length_factor,
        },
    }
}
