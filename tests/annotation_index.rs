//! Integration tests for the annotation index
//!
//! These tests verify that:
//! 1. Every lemma, inflected form and phrase resolves, whatever its case
//! 2. Forms of one lemma share a single annotation object
//! 3. Building twice from the same result gives the same index
//!
//! Run with: cargo test --test annotation_index

use vocab_reader_lib::analysis::AnalysisResult;
use vocab_reader_lib::annotation::{Annotation, AnnotationIndex};
use vocab_reader_lib::cefr::CefrLevel;

const RESULT: &str = r#"{
    "words": [
        {"word": "run", "level": "B1", "frequency": 4, "definition_cn": "跑",
         "phonetic": "/rʌn/", "examples": ["She ran home."], "original_forms": ["ran", "Running", "runs"]},
        {"word": "meticulous", "level": "C1", "frequency": 1, "original_forms": []},
        {"word": "cat", "level": "A1", "frequency": 2, "original_forms": ["cats"]}
    ],
    "phrasal_verbs": [
        {"phrase": "give up", "level": "B2", "frequency": 1, "definition_cn": "放弃"}
    ],
    "statistics": {"total_word_occurrences": 7, "total_unique_words": 3, "total_unique_phrases": 1},
    "processed_text": "The cats ran. She gave up running."
}"#;

fn build() -> AnnotationIndex {
    let result = AnalysisResult::from_json(RESULT).unwrap();
    AnnotationIndex::build(&result.words, &result.phrases)
}

#[test]
fn test_every_surface_form_resolves() {
    let index = build();
    for token in ["run", "ran", "running", "RUNS", "meticulous", "cat", "Cats", "give up", "GIVE UP"] {
        assert!(index.get(token).is_some(), "{} should resolve", token);
    }
    assert!(index.get("dog").is_none());
    assert!(index.get("").is_none());
}

#[test]
fn test_forms_share_one_annotation() {
    let index = build();
    let lemma = index.get("run").unwrap();
    for form in ["ran", "running", "runs"] {
        assert!(lemma.same_object(index.get(form).unwrap()), "{} is a different object", form);
    }
    assert!(!lemma.same_object(index.get("cat").unwrap()));

    match lemma {
        Annotation::Word(word) => {
            assert_eq!(word.lemma, "run");
            assert_eq!(word.level, CefrLevel::B1);
            assert_eq!(word.frequency, 4);
            assert_eq!(word.definition.as_deref(), Some("跑"));
            assert_eq!(word.phonetic.as_deref(), Some("/rʌn/"));
        }
        Annotation::Phrase(_) => panic!("run resolved to a phrase"),
    }
}

#[test]
fn test_phrases_are_indexed_by_text() {
    let index = build();
    let phrase = index.get("give up").unwrap();
    assert!(matches!(phrase, Annotation::Phrase(_)));
    assert_eq!(phrase.text(), "give up");
    assert_eq!(phrase.level(), CefrLevel::B2);
    assert!(phrase.phonetic().is_none());
}

#[test]
fn test_rebuilding_gives_the_same_index() {
    let first = build();
    let second = build();

    let mut first_keys: Vec<&str> = first.keys().collect();
    let mut second_keys: Vec<&str> = second.keys().collect();
    first_keys.sort_unstable();
    second_keys.sort_unstable();
    assert_eq!(first_keys, second_keys);

    for key in first_keys {
        let a = first.get(key).unwrap();
        let b = second.get(key).unwrap();
        assert_eq!(a.text(), b.text());
        assert_eq!(a.level(), b.level());
        assert_eq!(a.frequency(), b.frequency());
        assert_eq!(a.examples(), b.examples());
    }
    assert_eq!(first.words().len(), 3);
    assert_eq!(first.phrases().len(), 1);
}

#[test]
fn test_later_lemma_wins_a_shared_form() {
    let result = AnalysisResult::from_json(
        r#"{"words": [
            {"word": "lie", "level": "A2", "original_forms": ["lay"]},
            {"word": "lay", "level": "B1", "original_forms": []}
        ]}"#,
    )
    .unwrap();
    let index = AnnotationIndex::build(&result.words, &result.phrases);
    let lay = index.get("lay").unwrap();
    assert_eq!(lay.text(), "lay");
    assert_eq!(lay.level(), CefrLevel::B1);
}
