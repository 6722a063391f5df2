//! Translation of article text into the audience language.
//!
//! Translation never fails hard: the caller always gets text back, tagged
//! with how it was produced so logs and tests can tell "translated" from
//! "posted untranslated".

mod google;

pub use google::{GoogleTranslator, TranslateError};

use async_trait::async_trait;

/// Result of translating one piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    /// Every chunk was translated.
    Translated(String),
    /// Some chunks were translated; the rest are kept in the source language.
    Degraded { text: String, failed_chunks: usize },
    /// Nothing could be translated; `original` is the input text.
    Failed { original: String, reason: String },
}

impl Translation {
    /// Text to display, whatever the outcome.
    pub fn text(&self) -> &str {
        match self {
            Translation::Translated(text) | Translation::Degraded { text, .. } => text,
            Translation::Failed { original, .. } => original,
        }
    }

    pub fn is_translated(&self) -> bool {
        matches!(self, Translation::Translated(_))
    }
}

/// A translation backend.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translates `text` into the `target` language code (e.g. "mn").
    async fn translate(&self, text: &str, target: &str) -> Translation;
}

/// Passes text through unchanged. Used when translation is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTranslator;

#[async_trait]
impl Translator for NoopTranslator {
    async fn translate(&self, text: &str, _target: &str) -> Translation {
        Translation::Translated(text.to_string())
    }
}

/// Splits text into chunks of fewer than `max_chars` characters on sentence
/// boundaries (". "). A single sentence longer than the limit becomes its own
/// chunk rather than being cut mid-sentence.
pub fn split_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in text.split(". ") {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            continue;
        }
        let candidate_len = current.chars().count() + sentence.chars().count() + 2;
        if !current.is_empty() && candidate_len >= max_chars {
            chunks.push(current.trim_end().to_string());
            current.clear();
        }
        current.push_str(sentence);
        if !sentence.ends_with('.') {
            current.push('.');
        }
        current.push(' ');
    }

    if !current.trim().is_empty() {
        chunks.push(current.trim_end().to_string());
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_chunk() {
        assert_eq!(split_chunks("Hello world.", 500), vec!["Hello world.".to_string()]);
    }

    #[test]
    fn test_empty_text_no_chunks() {
        assert!(split_chunks("   ", 500).is_empty());
    }

    #[test]
    fn test_long_text_splits_on_sentences() {
        let text = "First sentence here. Second sentence here. Third sentence here.";
        let chunks = split_chunks(text, 45);
        assert_eq!(
            chunks,
            vec![
                "First sentence here. Second sentence here.".to_string(),
                "Third sentence here.".to_string(),
            ]
        );
        for chunk in &chunks {
            assert!(chunk.chars().count() < 45);
        }
    }

    #[test]
    fn test_oversized_sentence_kept_whole() {
        let long = "a".repeat(30);
        let text = format!("{}. short.", long);
        let chunks = split_chunks(&text, 20);
        assert_eq!(chunks, vec![format!("{}.", long), "short.".to_string()]);
    }

    #[test]
    fn test_translation_text_accessors() {
        let failed = Translation::Failed {
            original: "hello".into(),
            reason: "rate limited".into(),
        };
        assert_eq!(failed.text(), "hello");
        assert!(!failed.is_translated());

        let ok = Translation::Translated("сайн уу".into());
        assert!(ok.is_translated());
        assert_eq!(ok.text(), "сайн уу");
    }

    #[tokio::test]
    async fn test_noop_translator_passes_through() {
        let result = NoopTranslator.translate("unchanged", "mn").await;
        assert_eq!(result, Translation::Translated("unchanged".into()));
    }
}
