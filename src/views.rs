use crate::analysis::Statistics;
use crate::annotation::AnnotationIndex;
use crate::cefr::CefrLevel;
use crate::filter::{FilterEngine, Filterable};
use ammonia::clean_text;
use serde::{Deserialize, Serialize};

/// Which list tab was last in front. The one preference kept between sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveList {
    #[default]
    Words,
    Phrases,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListMarkup {
    /// Full filtered counts, before the display cap.
    pub word_count: usize,
    pub phrase_count: usize,
    pub words: String,
    pub phrases: String,
}

pub fn render_lists(engine: &FilterEngine, index: &AnnotationIndex, word_limit: usize, phrase_limit: usize) -> ListMarkup {
    let words = engine.apply(index.words());
    let phrases = engine.apply(index.phrases());

    ListMarkup {
        word_count: words.len(),
        phrase_count: phrases.len(),
        words: render_items(words.iter().copied().take(word_limit)),
        phrases: render_items(phrases.iter().copied().take(phrase_limit)),
    }
}

fn render_items<'a, T, I>(items: I) -> String
where
    T: Filterable + 'a + ?Sized,
    I: Iterator<Item = &'a T>,
{
    let mut html = String::new();
    for item in items {
        let text = clean_text(item.filter_text());
        let level = item.level();
        html.push_str(&format!(
            "<div class=\"word-item\" data-word=\"{text}\" tabindex=\"0\"><div class=\"word-text\">{text}</div><div class=\"word-level cefr-{class}\">{level}</div></div>\n",
            class = level.css_class(),
            level = clean_text(level.as_str()),
        ));
    }
    html
}

/// Rendered output tagged with the filter revision it was produced at.
#[derive(Debug)]
pub struct ViewCache<T> {
    revision: Option<u64>,
    value: Option<T>,
}

impl<T> Default for ViewCache<T> {
    fn default() -> Self {
        Self { revision: None, value: None }
    }
}

impl<T> ViewCache<T> {
    pub fn is_stale(&self, revision: u64) -> bool {
        self.revision != Some(revision)
    }

    pub fn store(&mut self, revision: u64, value: T) -> &T {
        self.revision = Some(revision);
        self.value.insert(value)
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn invalidate(&mut self) {
        self.revision = None;
        self.value = None;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelRow {
    pub level: CefrLevel,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSummary {
    pub total_words: u64,
    pub unique_words: u64,
    pub phrases: u64,
    /// Every level in order, zero-filled where the result had no entry.
    pub distribution: Vec<LevelRow>,
}

impl From<&Statistics> for StatsSummary {
    fn from(stats: &Statistics) -> Self {
        Self {
            total_words: stats.total_word_occurrences,
            unique_words: stats.total_unique_words,
            phrases: stats.total_unique_phrases,
            distribution: CefrLevel::ALL
                .into_iter()
                .map(|level| {
                    let share = stats.share(level);
                    LevelRow {
                        level,
                        count: share.count,
                        percentage: share.percentage,
                    }
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{LevelShare, PhraseEntry, WordEntry};
    use crate::cefr::LevelFilter;
    use std::time::Duration;

    fn word(w: &str, level: CefrLevel) -> WordEntry {
        WordEntry {
            word: w.to_string(),
            level,
            frequency: 1,
            definition_cn: None,
            phonetic: None,
            examples: Vec::new(),
            original_forms: Vec::new(),
        }
    }

    #[test]
    fn test_lists_are_capped_but_counted_in_full() {
        let words: Vec<WordEntry> = (0..5).map(|i| word(&format!("w{i}"), CefrLevel::A1)).collect();
        let phrases = vec![PhraseEntry {
            phrase: "look after".to_string(),
            level: CefrLevel::B1,
            frequency: 1,
            definition_cn: None,
            examples: Vec::new(),
        }];
        let index = AnnotationIndex::build(&words, &phrases);
        let engine = FilterEngine::new(Duration::from_millis(300));

        let lists = render_lists(&engine, &index, 2, 100);
        assert_eq!(lists.word_count, 5);
        assert_eq!(lists.words.matches("class=\"word-item\"").count(), 2);
        assert_eq!(lists.phrase_count, 1);
        assert!(lists.phrases.contains("cefr-b1"));
    }

    #[test]
    fn test_lists_follow_level_filter() {
        let index = AnnotationIndex::build(&[word("cat", CefrLevel::A1), word("feline", CefrLevel::C1)], &[]);
        let mut engine = FilterEngine::new(Duration::from_millis(300));
        engine.set_level(LevelFilter::Only(CefrLevel::C1));

        let lists = render_lists(&engine, &index, 200, 100);
        assert_eq!(lists.word_count, 1);
        assert!(lists.words.contains("feline"));
        assert!(!lists.words.contains("cat"));
    }

    #[test]
    fn test_view_cache_tracks_revision() {
        let mut cache = ViewCache::default();
        assert!(cache.is_stale(0));
        cache.store(0, "markup");
        assert!(!cache.is_stale(0));
        assert!(cache.is_stale(1));
        cache.invalidate();
        assert!(cache.get().is_none());
    }

    #[test]
    fn test_summary_zero_fills_levels() {
        let mut stats = Statistics::default();
        stats
            .level_distribution
            .insert(CefrLevel::B2, LevelShare { count: 3, percentage: 30.0 });
        let summary = StatsSummary::from(&stats);
        assert_eq!(summary.distribution.len(), 7);
        assert_eq!(summary.distribution[3].count, 3);
        assert_eq!(summary.distribution[0].count, 0);
    }

    #[test]
    fn test_active_list_wire_format() {
        assert_eq!(serde_json::to_string(&ActiveList::Phrases).unwrap(), "\"phrases\"");
    }
}
