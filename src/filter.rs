use crate::annotation::{Annotation, PhraseAnnotation, WordAnnotation};
use crate::cefr::{CefrLevel, LevelFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub level: LevelFilter,
    pub search_term: String,
}

impl FilterState {
    pub fn admits_level(&self, level: CefrLevel) -> bool {
        self.level.admits(level)
    }

    /// Case-insensitive substring match; an empty term matches everything.
    pub fn matches_search(&self, text: &str) -> bool {
        self.search_term.is_empty() || contains_ignore_case(text, &self.search_term)
    }

    pub fn admits<T: Filterable + ?Sized>(&self, item: &T) -> bool {
        self.admits_level(item.level()) && self.matches_search(item.filter_text())
    }
}

pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Anything the level/search predicate can be applied to.
pub trait Filterable {
    fn level(&self) -> CefrLevel;
    fn filter_text(&self) -> &str;
}

impl Filterable for WordAnnotation {
    fn level(&self) -> CefrLevel {
        self.level
    }

    fn filter_text(&self) -> &str {
        &self.lemma
    }
}

impl Filterable for PhraseAnnotation {
    fn level(&self) -> CefrLevel {
        self.level
    }

    fn filter_text(&self) -> &str {
        &self.phrase
    }
}

impl Filterable for Annotation {
    fn level(&self) -> CefrLevel {
        Annotation::level(self)
    }

    fn filter_text(&self) -> &str {
        self.text()
    }
}

impl<T: Filterable + ?Sized> Filterable for Arc<T> {
    fn level(&self) -> CefrLevel {
        (**self).level()
    }

    fn filter_text(&self) -> &str {
        (**self).filter_text()
    }
}

/// Owner of the one filter shared by the list view and the reading view.
///
/// Every effective change bumps `revision`; views remember the revision they
/// were rendered at and re-render when it moves.
#[derive(Debug)]
pub struct FilterEngine {
    state: FilterState,
    revision: u64,
    debounce: SearchDebounce,
}

impl FilterEngine {
    pub fn new(search_quiet: Duration) -> Self {
        Self {
            state: FilterState::default(),
            revision: 0,
            debounce: SearchDebounce::new(search_quiet),
        }
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn apply<'a, T: Filterable>(&self, items: &'a [T]) -> Vec<&'a T> {
        items.iter().filter(|item| self.state.admits(*item)).collect()
    }

    /// Level changes take effect at once. Returns whether anything changed.
    pub fn set_level(&mut self, level: LevelFilter) -> bool {
        if self.state.level == level {
            return false;
        }
        self.state.level = level;
        self.bump();
        true
    }

    /// Records a keystroke; nothing is recomputed until the input goes quiet.
    pub fn input_search(&mut self, term: impl Into<String>, now: Instant) {
        self.debounce.push(term.into(), now);
    }

    /// When the next debounced search can settle, if one is pending.
    pub fn search_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    /// Applies the pending search term once the quiet window has passed.
    pub fn settle_search(&mut self, now: Instant) -> bool {
        match self.debounce.take_ready(now) {
            Some(term) if term != self.state.search_term => {
                self.state.search_term = term;
                self.bump();
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.debounce.clear();
        if self.state != FilterState::default() {
            self.state = FilterState::default();
            self.bump();
        }
    }

    fn bump(&mut self) {
        self.revision += 1;
        tracing::debug!(revision = self.revision, level = %self.state.level, term = %self.state.search_term, "filter changed");
    }
}

/// Keeps only the last search input and releases it after a quiet interval.
#[derive(Debug)]
pub struct SearchDebounce {
    quiet: Duration,
    pending: Option<(String, Instant)>,
}

impl SearchDebounce {
    pub fn new(quiet: Duration) -> Self {
        Self { quiet, pending: None }
    }

    pub fn push(&mut self, term: String, now: Instant) {
        self.pending = Some((term, now));
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at + self.quiet)
    }

    pub fn take_ready(&mut self, now: Instant) -> Option<String> {
        match self.deadline() {
            Some(deadline) if now >= deadline => self.pending.take().map(|(term, _)| term),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }
}
