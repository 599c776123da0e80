//! Wire shape of the analysis result document fetched after a job completes.
//!
//! Only the fields this client consumes are modelled; anything else the
//! server sends is ignored. Optional annotation fields default to empty so a
//! sparse entry still loads.

use crate::cefr::CefrLevel;
use crate::error::{ClientError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WordEntry {
    pub word: String,
    pub level: CefrLevel,
    #[serde(default, deserialize_with = "null_as_default")]
    pub frequency: u32,
    #[serde(default)]
    pub definition_cn: Option<String>,
    #[serde(default)]
    pub phonetic: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub examples: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub original_forms: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PhraseEntry {
    pub phrase: String,
    pub level: CefrLevel,
    #[serde(default, deserialize_with = "null_as_default")]
    pub frequency: u32,
    #[serde(default)]
    pub definition_cn: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq)]
pub struct LevelShare {
    #[serde(default)]
    pub count: u64,
    /// Share of word occurrences, 0-100.
    #[serde(default)]
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Statistics {
    #[serde(default)]
    pub total_word_occurrences: u64,
    #[serde(default)]
    pub total_unique_words: u64,
    #[serde(default)]
    pub total_unique_phrases: u64,
    #[serde(default)]
    pub level_distribution: HashMap<CefrLevel, LevelShare>,
}

impl Statistics {
    /// Share for a level, zero when the server omitted it.
    pub fn share(&self, level: CefrLevel) -> LevelShare {
        self.level_distribution.get(&level).copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(from = "WireResult")]
pub struct AnalysisResult {
    pub words: Vec<WordEntry>,
    pub phrases: Vec<PhraseEntry>,
    pub statistics: Option<Statistics>,
    pub processed_text: String,
}

/// Older servers name the phrase list `phrasal_verbs`; some send both.
#[derive(Deserialize)]
struct WireResult {
    #[serde(default, deserialize_with = "null_as_default")]
    words: Vec<WordEntry>,
    #[serde(default)]
    phrases: Option<Vec<PhraseEntry>>,
    #[serde(default)]
    phrasal_verbs: Option<Vec<PhraseEntry>>,
    #[serde(default)]
    statistics: Option<Statistics>,
    #[serde(default, deserialize_with = "null_as_default")]
    processed_text: String,
}

impl From<WireResult> for AnalysisResult {
    fn from(wire: WireResult) -> Self {
        Self {
            words: wire.words,
            phrases: wire.phrases.or(wire.phrasal_verbs).unwrap_or_default(),
            statistics: wire.statistics,
            processed_text: wire.processed_text,
        }
    }
}

/// Treats an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl AnalysisResult {
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| ClientError::InvalidResult(e.to_string()))
    }

    /// Statistics are required to score the document; a result without them is unusable.
    pub fn require_statistics(&self) -> Result<&Statistics> {
        self.statistics.as_ref().ok_or(ClientError::MissingStatistics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_result_loads() {
        let body = r#"{
            "words": [{"word": "run", "level": "B1", "frequency": 3, "original_forms": ["ran", "running"]},
                      {"word": "cat", "level": "A1"}],
            "phrasal_verbs": [{"phrase": "give up", "level": "B2", "frequency": 1}],
            "statistics": {"total_word_occurrences": 10, "total_unique_words": 2,
                           "level_distribution": {"A1": {"count": 1, "percentage": 50.0},
                                                  "C2+": {"count": 1, "percentage": 50.0}}},
            "processed_text": "The cat ran."
        }"#;
        let result = AnalysisResult::from_json(body).unwrap();

        assert_eq!(result.words.len(), 2);
        assert!(result.words[1].examples.is_empty());
        assert!(result.words[1].definition_cn.is_none());
        assert_eq!(result.phrases[0].phrase, "give up");

        let stats = result.require_statistics().unwrap();
        assert_eq!(stats.total_unique_phrases, 0);
        assert_eq!(stats.share(CefrLevel::C2Plus).count, 1);
        assert_eq!(stats.share(CefrLevel::B2), LevelShare::default());
    }

    #[test]
    fn test_missing_statistics_is_an_error() {
        let result = AnalysisResult::from_json(r#"{"words": [], "processed_text": ""}"#).unwrap();
        assert!(matches!(result.require_statistics(), Err(ClientError::MissingStatistics)));
    }

    #[test]
    fn test_unknown_level_is_rejected() {
        let err = AnalysisResult::from_json(r#"{"words": [{"word": "x", "level": "Z9"}]}"#).unwrap_err();
        assert!(matches!(err, ClientError::InvalidResult(_)));
    }

    #[test]
    fn test_null_annotation_fields_degrade_to_empty() {
        let body = r#"{
            "words": [{"word": "cat", "level": "A1", "frequency": null, "definition_cn": null,
                       "phonetic": null, "examples": null, "original_forms": null}],
            "phrasal_verbs": [{"phrase": "give up", "level": "B2", "frequency": null, "examples": null}],
            "processed_text": null
        }"#;
        let result = AnalysisResult::from_json(body).unwrap();

        let cat = &result.words[0];
        assert_eq!(cat.frequency, 0);
        assert!(cat.examples.is_empty());
        assert!(cat.original_forms.is_empty());
        assert!(cat.phonetic.is_none());
        assert!(result.phrases[0].examples.is_empty());
        assert_eq!(result.processed_text, "");
    }

    #[test]
    fn test_phrases_preferred_over_phrasal_verbs() {
        let body = r#"{
            "phrases": [{"phrase": "look after", "level": "A2"}],
            "phrasal_verbs": [{"phrase": "give up", "level": "B2"}]
        }"#;
        let result = AnalysisResult::from_json(body).unwrap();
        assert_eq!(result.phrases.len(), 1);
        assert_eq!(result.phrases[0].phrase, "look after");

        let both_empty = AnalysisResult::from_json(r#"{"phrases": [], "phrasal_verbs": []}"#).unwrap();
        assert!(both_empty.phrases.is_empty());

        let legacy = AnalysisResult::from_json(r#"{"phrasal_verbs": [{"phrase": "give up", "level": "B2"}]}"#).unwrap();
        assert_eq!(legacy.phrases[0].phrase, "give up");
    }
}
