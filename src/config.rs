use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Client tunables. Durations are stored in milliseconds so the JSON form
/// stays readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub connect_timeout_ms: u64,
    /// Pause between the `complete` event and fetching the result.
    pub completion_delay_ms: u64,
    /// Quiet window before a search term is applied.
    pub search_debounce_ms: u64,
    /// How long the reading view may render before a skeleton is shown.
    pub render_budget_ms: u64,
    /// Paragraphs shorter than this (trimmed, in characters) are dropped as noise.
    pub min_paragraph_len: usize,
    pub word_list_limit: usize,
    pub phrase_list_limit: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            connect_timeout_ms: 10_000,
            completion_delay_ms: 500,
            search_debounce_ms: 300,
            render_budget_ms: 50,
            min_paragraph_len: 3,
            word_list_limit: 200,
            phrase_list_limit: 100,
        }
    }
}

impl ClientConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn completion_delay(&self) -> Duration {
        Duration::from_millis(self.completion_delay_ms)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn render_budget(&self) -> Duration {
        Duration::from_millis(self.render_budget_ms)
    }
}
