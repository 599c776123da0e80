//! Reading view: the full document re-rendered with every known word tagged
//! by level.
//!
//! Rendering is a pure function of (text, index, filter). Displaying it is
//! the surface's job, including the skeleton shown while a large document is
//! still being processed.

use crate::annotation::AnnotationIndex;
use crate::error::{ClientError, Result};
use crate::filter::{contains_ignore_case, FilterState};
use crate::surface::{ReadingContent, Surface};
use ammonia::clean_text;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedDocument {
    pub markup: String,
    pub paragraphs: usize,
    /// Words emitted as interactive spans.
    pub annotated: usize,
    /// Interactive spans that also matched the search term.
    pub search_matches: usize,
}

/// Splits on blank lines, falling back to single line breaks when the text
/// has no blank-line paragraphs.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    let mut paragraphs = Vec::new();
    let mut start: Option<usize> = None;
    let mut end = 0;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        if line.trim().is_empty() {
            if let Some(s) = start.take() {
                paragraphs.push(&text[s..end]);
            }
        } else {
            start.get_or_insert(line_start);
            end = line_start + line.trim_end_matches(['\n', '\r']).len();
        }
    }
    if let Some(s) = start {
        paragraphs.push(&text[s..end]);
    }

    if paragraphs.len() <= 1 {
        return text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect();
    }
    paragraphs
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Word(&'a str),
    /// Whitespace, punctuation, or a candidate that is not a plain ASCII word.
    Text(&'a str),
}

fn is_separator(c: char) -> bool {
    c.is_whitespace()
        || (c.is_ascii_punctuation() && c != '\'' && c != '-')
        || ('\u{2010}'..='\u{205E}').contains(&c)
}

fn is_word(candidate: &str) -> bool {
    candidate
        .chars()
        .all(|c| c.is_ascii_alphabetic() || c == '\'' || c == '-')
}

/// Alternating runs of candidates and separators, in document order.
pub fn tokenize(paragraph: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut run_start = 0;
    let mut in_separator: Option<bool> = None;

    for (i, c) in paragraph.char_indices() {
        let sep = is_separator(c);
        match in_separator {
            Some(current) if current != sep => {
                tokens.push(classify(&paragraph[run_start..i], current));
                run_start = i;
            }
            _ => {}
        }
        in_separator = Some(sep);
    }
    if let Some(current) = in_separator {
        tokens.push(classify(&paragraph[run_start..], current));
    }
    tokens
}

fn classify(run: &str, separator: bool) -> Token<'_> {
    if !separator && is_word(run) {
        Token::Word(run)
    } else {
        Token::Text(run)
    }
}

pub fn render(text: &str, index: &AnnotationIndex, filter: &FilterState, min_paragraph_len: usize) -> RenderedDocument {
    let mut doc = RenderedDocument {
        markup: String::with_capacity(text.len() * 2),
        paragraphs: 0,
        annotated: 0,
        search_matches: 0,
    };

    for paragraph in split_paragraphs(text) {
        let trimmed = paragraph.trim();
        if trimmed.chars().count() < min_paragraph_len {
            continue;
        }
        doc.paragraphs += 1;
        doc.markup.push_str("<p class=\"reading-paragraph\">");
        for token in tokenize(trimmed) {
            match token {
                Token::Text(t) => doc.markup.push_str(&clean_text(t)),
                Token::Word(w) => render_word(&mut doc, w, index, filter),
            }
        }
        doc.markup.push_str("</p>\n");
    }
    doc
}

fn render_word(doc: &mut RenderedDocument, word: &str, index: &AnnotationIndex, filter: &FilterState) {
    let escaped = clean_text(word);
    let Some(annotation) = index.get(word) else {
        doc.markup.push_str(&escaped);
        return;
    };
    let level = annotation.level();
    if !filter.admits_level(level) {
        doc.markup.push_str(&escaped);
        return;
    }

    let is_match = !filter.search_term.is_empty() && contains_ignore_case(word, &filter.search_term);
    doc.annotated += 1;
    doc.markup.push_str("<span class=\"vocab-word cefr-");
    doc.markup.push_str(level.css_class());
    if is_match {
        doc.search_matches += 1;
        doc.markup.push_str(" search-match");
    }
    doc.markup.push_str("\" data-level=\"");
    doc.markup.push_str(&clean_text(level.as_str()));
    doc.markup.push_str("\" data-word=\"");
    doc.markup.push_str(&escaped);
    doc.markup.push('"');
    if is_match {
        doc.markup.push_str(" data-search-match=\"true\"");
    }
    doc.markup.push_str(" tabindex=\"0\">");
    doc.markup.push_str(&escaped);
    doc.markup.push_str("</span>");
}

/// Runs `work` off the control thread. If it is still running after `budget`
/// the surface gets a skeleton, then the finished markup replaces it in one
/// step.
pub async fn show_within_budget<S, F>(surface: &mut S, budget: Duration, work: F) -> Result<RenderedDocument>
where
    S: Surface + ?Sized,
    F: FnOnce() -> RenderedDocument + Send + 'static,
{
    let mut task = tokio::task::spawn_blocking(work);

    let joined = match tokio::time::timeout(budget, &mut task).await {
        Ok(joined) => joined,
        Err(_) => {
            tracing::debug!(budget_ms = budget.as_millis() as u64, "reading view still rendering, showing skeleton");
            surface.show_reading(ReadingContent::Skeleton);
            task.await
        }
    };
    let rendered = joined.map_err(|e| ClientError::Render(e.to_string()))?;

    surface.show_reading(ReadingContent::Markup(&rendered.markup));
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_line_paragraphs() {
        let text = "First paragraph\nstill first.\n\n  \nSecond one.\r\n\r\nThird.";
        assert_eq!(
            split_paragraphs(text),
            vec!["First paragraph\nstill first.", "Second one.", "Third."]
        );
    }

    #[test]
    fn test_single_line_fallback() {
        let text = "Line one.\nLine two.\n\nLine three.";
        // Two blank-line paragraphs: no fallback.
        assert_eq!(split_paragraphs(text).len(), 2);

        let flat = "Line one.\nLine two.\nLine three.";
        assert_eq!(split_paragraphs(flat), vec!["Line one.", "Line two.", "Line three."]);
    }

    #[test]
    fn test_tokenize_alternates_words_and_separators() {
        let tokens = tokenize("Don't stop-now, café 42!");
        assert_eq!(
            tokens,
            vec![
                Token::Word("Don't"),
                Token::Text(" "),
                Token::Word("stop-now"),
                Token::Text(", "),
                Token::Text("café"),
                Token::Text(" "),
                Token::Text("42"),
                Token::Text("!"),
            ]
        );
    }

    #[test]
    fn test_tokens_reassemble_to_input() {
        let input = "He said: “It’s fine…” — and left.";
        let rebuilt: String = tokenize(input)
            .into_iter()
            .map(|t| match t {
                Token::Word(s) | Token::Text(s) => s,
            })
            .collect();
        assert_eq!(rebuilt, input);
    }

    #[test]
    fn test_short_paragraphs_are_skipped() {
        let index = AnnotationIndex::default();
        let doc = render("12\n\nA real paragraph.\n\niv", &index, &FilterState::default(), 3);
        assert_eq!(doc.paragraphs, 1);
        assert!(!doc.markup.contains(">12<"));
    }

    #[test]
    fn test_text_is_escaped() {
        let index = AnnotationIndex::default();
        let doc = render("a <script> tag", &index, &FilterState::default(), 3);
        assert!(!doc.markup.contains("<script>"));
        assert!(doc.markup.contains("&lt;"));
    }
}
