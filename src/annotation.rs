use crate::analysis::{PhraseEntry, WordEntry};
use crate::cefr::CefrLevel;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

/// Phonetic strings the dictionary lookup emits when it matched the wrong entry.
const BAD_PHONETIC_SENTINELS: &[&str] = &["n/a", "na", "none", "null", "undefined", "nan", "-", "?"];

#[derive(Debug, Clone, PartialEq)]
pub struct WordAnnotation {
    pub lemma: String,
    pub level: CefrLevel,
    pub frequency: u32,
    pub definition: Option<String>,
    /// Already validated; implausible transcriptions are dropped at build time.
    pub phonetic: Option<String>,
    pub examples: Vec<String>,
    pub original_forms: BTreeSet<String>,
}

impl From<&WordEntry> for WordAnnotation {
    fn from(entry: &WordEntry) -> Self {
        Self {
            lemma: entry.word.clone(),
            level: entry.level,
            frequency: entry.frequency,
            definition: non_empty(entry.definition_cn.as_deref()),
            phonetic: entry
                .phonetic
                .as_deref()
                .and_then(|p| plausible_phonetic(&entry.word, p)),
            examples: entry.examples.clone(),
            original_forms: entry.original_forms.iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhraseAnnotation {
    pub phrase: String,
    pub level: CefrLevel,
    pub frequency: u32,
    pub definition: Option<String>,
    pub examples: Vec<String>,
}

impl From<&PhraseEntry> for PhraseAnnotation {
    fn from(entry: &PhraseEntry) -> Self {
        Self {
            phrase: entry.phrase.clone(),
            level: entry.level,
            frequency: entry.frequency,
            definition: non_empty(entry.definition_cn.as_deref()),
            examples: entry.examples.clone(),
        }
    }
}

/// What a normalized token resolves to. Clones share the underlying annotation.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    Word(Arc<WordAnnotation>),
    Phrase(Arc<PhraseAnnotation>),
}

impl Annotation {
    pub fn text(&self) -> &str {
        match self {
            Annotation::Word(w) => &w.lemma,
            Annotation::Phrase(p) => &p.phrase,
        }
    }

    pub fn level(&self) -> CefrLevel {
        match self {
            Annotation::Word(w) => w.level,
            Annotation::Phrase(p) => p.level,
        }
    }

    pub fn frequency(&self) -> u32 {
        match self {
            Annotation::Word(w) => w.frequency,
            Annotation::Phrase(p) => p.frequency,
        }
    }

    pub fn definition(&self) -> Option<&str> {
        match self {
            Annotation::Word(w) => w.definition.as_deref(),
            Annotation::Phrase(p) => p.definition.as_deref(),
        }
    }

    pub fn phonetic(&self) -> Option<&str> {
        match self {
            Annotation::Word(w) => w.phonetic.as_deref(),
            Annotation::Phrase(_) => None,
        }
    }

    pub fn examples(&self) -> &[String] {
        match self {
            Annotation::Word(w) => &w.examples,
            Annotation::Phrase(p) => &p.examples,
        }
    }

    /// True when both values point at the same annotation object.
    pub fn same_object(&self, other: &Annotation) -> bool {
        match (self, other) {
            (Annotation::Word(a), Annotation::Word(b)) => Arc::ptr_eq(a, b),
            (Annotation::Phrase(a), Annotation::Phrase(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Case-insensitive lookup from any surface form to its annotation.
///
/// Built once per analysis result and never updated; loading a new result
/// means building a new index.
#[derive(Debug, Default)]
pub struct AnnotationIndex {
    entries: HashMap<String, Annotation>,
    words: Vec<Arc<WordAnnotation>>,
    phrases: Vec<Arc<PhraseAnnotation>>,
}

impl AnnotationIndex {
    pub fn build(words: &[WordEntry], phrases: &[PhraseEntry]) -> Self {
        let mut index = Self {
            entries: HashMap::with_capacity(words.len() * 2 + phrases.len()),
            words: Vec::with_capacity(words.len()),
            phrases: Vec::with_capacity(phrases.len()),
        };

        for entry in words {
            let word = Arc::new(WordAnnotation::from(entry));
            index.register(&word.lemma, Annotation::Word(Arc::clone(&word)));
            for form in &word.original_forms {
                index.register(form, Annotation::Word(Arc::clone(&word)));
            }
            index.words.push(word);
        }

        for entry in phrases {
            let phrase = Arc::new(PhraseAnnotation::from(entry));
            index.register(&phrase.phrase, Annotation::Phrase(Arc::clone(&phrase)));
            index.phrases.push(phrase);
        }

        tracing::debug!(
            keys = index.entries.len(),
            words = index.words.len(),
            phrases = index.phrases.len(),
            "annotation index built"
        );
        index
    }

    /// Later registrations win when two lemmas claim the same surface form.
    fn register(&mut self, key: &str, annotation: Annotation) {
        let key = normalize(key);
        if key.is_empty() {
            return;
        }
        if let Some(previous) = self.entries.insert(key, annotation) {
            tracing::debug!(form = previous.text(), "surface form claimed twice, keeping the later lemma");
        }
    }

    pub fn get(&self, token: &str) -> Option<&Annotation> {
        self.entries.get(&normalize(token))
    }

    pub fn words(&self) -> &[Arc<WordAnnotation>] {
        &self.words
    }

    pub fn phrases(&self) -> &[Arc<PhraseAnnotation>] {
        &self.phrases
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

fn normalize(token: &str) -> String {
    token.trim().to_lowercase()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Returns the transcription when it looks like real IPA for `word`, `None` otherwise.
pub fn plausible_phonetic(word: &str, phonetic: &str) -> Option<String> {
    let trimmed = phonetic.trim();
    let core = trimmed.trim_matches(|c| matches!(c, '/' | '[' | ']')).trim();

    if core.is_empty() {
        return None;
    }
    let symbols = core.graphemes(true).count();
    if symbols < 2 {
        return None;
    }
    if !core.chars().all(is_latin_or_ipa) {
        return None;
    }
    if BAD_PHONETIC_SENTINELS.iter().any(|s| s.eq_ignore_ascii_case(core)) {
        return None;
    }
    // A transcription covering less than a third of a long word belongs to some other word.
    let letters = word.chars().filter(|c| c.is_alphabetic()).count();
    if letters >= 6 && symbols * 3 < letters {
        return None;
    }

    Some(trimmed.to_string())
}

fn is_latin_or_ipa(c: char) -> bool {
    matches!(c as u32,
        0x0020..=0x007E      // ASCII
        | 0x00A0..=0x024F    // Latin-1 supplement, Latin Extended-A/B
        | 0x0250..=0x02FF    // IPA extensions, spacing modifiers
        | 0x0300..=0x036F    // combining diacritics
        | 0x1D00..=0x1DBF    // phonetic extensions
        | 0x1E00..=0x1EFF    // Latin extended additional
    ) || matches!(c, 'θ' | 'β' | 'χ')
}
