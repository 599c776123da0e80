//! Integration tests for the reading view
//!
//! These tests verify that:
//! 1. Known words admitted by the level filter become interactive spans
//! 2. Words outside the filter, or unknown, stay plain text
//! 3. Search matches are highlighted inside the reading view
//! 4. Document text survives rendering unchanged apart from escaping
//!
//! Run with: cargo test --test reading_view

use vocab_reader_lib::analysis::AnalysisResult;
use vocab_reader_lib::annotation::AnnotationIndex;
use vocab_reader_lib::cefr::{CefrLevel, LevelFilter};
use vocab_reader_lib::filter::FilterState;
use vocab_reader_lib::reading::render;

fn index() -> AnnotationIndex {
    let result = AnalysisResult::from_json(
        r#"{"words": [
            {"word": "run", "level": "B1", "frequency": 1, "original_forms": ["ran"]},
            {"word": "cat", "level": "A1", "frequency": 1}
        ]}"#,
    )
    .unwrap();
    AnnotationIndex::build(&result.words, &result.phrases)
}

fn filter(level: LevelFilter, search: &str) -> FilterState {
    FilterState {
        level,
        search_term: search.to_string(),
    }
}

/// Drops tags and decodes the numeric entities `clean_text` produces.
fn visible_text(markup: &str) -> String {
    let mut out = String::new();
    let mut in_tag = false;
    for c in markup.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&#32;", " ")
        .replace("&#46;", ".")
        .replace("&#44;", ",")
        .replace("&#33;", "!")
}

#[test]
fn test_admitted_word_becomes_a_span() {
    let doc = render("The cat ran quickly.", &index(), &filter(LevelFilter::Only(CefrLevel::B1), ""), 3);

    assert_eq!(doc.paragraphs, 1);
    assert_eq!(doc.annotated, 1);
    assert!(doc.markup.contains("data-word=\"ran\""));
    assert!(doc.markup.contains("cefr-b1"));
    assert!(doc.markup.contains("data-level=\"B1\""));
    assert!(!doc.markup.contains("data-word=\"cat\""));
    assert!(!doc.markup.contains("data-word=\"The\""));
}

#[test]
fn test_filtered_out_word_stays_plain() {
    let doc = render("The cat ran quickly.", &index(), &filter(LevelFilter::Only(CefrLevel::A1), ""), 3);

    assert_eq!(doc.annotated, 1);
    assert!(doc.markup.contains("data-word=\"cat\""));
    assert!(!doc.markup.contains("data-word=\"ran\""));
    assert!(doc.markup.contains("ran"));
}

#[test]
fn test_all_levels_annotate_every_known_word() {
    let doc = render("The cat ran quickly.", &index(), &filter(LevelFilter::All, ""), 3);
    assert_eq!(doc.annotated, 2);
    assert_eq!(doc.search_matches, 0);
    assert!(!doc.markup.contains("search-match"));
}

#[test]
fn test_search_highlights_matching_spans() {
    let doc = render("The cat ran quickly.", &index(), &filter(LevelFilter::All, "RA"), 3);

    assert_eq!(doc.search_matches, 1);
    assert!(doc.markup.contains("class=\"vocab-word cefr-b1 search-match\""));
    assert!(doc.markup.contains("data-search-match=\"true\""));
    assert!(doc.markup.contains("class=\"vocab-word cefr-a1\""));
}

#[test]
fn test_text_survives_rendering() {
    let text = "The cat ran quickly.\n\nThen, the cats ran again!";
    let doc = render(text, &index(), &filter(LevelFilter::All, ""), 3);

    assert_eq!(doc.paragraphs, 2);
    let visible = visible_text(&doc.markup);
    let paragraphs: Vec<&str> = visible.lines().collect();
    assert_eq!(paragraphs, vec!["The cat ran quickly.", "Then, the cats ran again!"]);
}

#[test]
fn test_markup_in_the_document_is_escaped() {
    let doc = render("<script>ran</script> away", &index(), &filter(LevelFilter::All, ""), 3);
    assert!(!doc.markup.contains("<script>"));
    assert!(doc.markup.contains("&lt;script&gt;"));
    assert!(doc.markup.contains("data-word=\"ran\""));
}
