use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::PipelineError;
use crate::io::{read_text, write_translation_json};
use crate::models::{BLOCK_PREFIX, UnitState, target_prefix};
use crate::stages::ERROR_MARKER;

/// How strictly raw reply entries are checked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Accept any entry of 3+ lines whose first line starts with `BLOCK_`
    /// and whose last line contains the target prefix
    #[default]
    Compatible,
    /// Additionally require the exact four-line refined shape
    Strict,
}

/// Result of Stage 3 parsing
#[derive(Debug, Default)]
pub struct ParseResult {
    /// Final key to improved text mapping, in first-seen order
    pub translations: Map<String, Value>,
    /// Entries that produced a translation
    pub accepted: usize,
    /// Non-empty entries that did not match the expected shape
    pub dropped: usize,
}

/// Execute Stage 3: turn the raw reply file into the final JSON map
pub fn parse_replies(
    raw_path: &Path,
    output_path: &Path,
    target_lang: &str,
    mode: ParseMode,
) -> Result<ParseResult, PipelineError> {
    let raw = read_text(raw_path)?;

    let result = parse_reply_text(&raw, target_lang, mode);
    write_translation_json(output_path, &result.translations)?;

    info!(
        "Stage 3: {} translations parsed, {} entries dropped; written to {:?}",
        result.translations.len(),
        result.dropped,
        output_path
    );

    Ok(result)
}

/// Parse raw reply text into a translation map
pub fn parse_reply_text(raw: &str, target_lang: &str, mode: ParseMode) -> ParseResult {
    let prefix = target_prefix(target_lang);
    let mut result = ParseResult::default();

    for entry in raw.split("\n\n").map(str::trim).filter(|e| !e.is_empty()) {
        match parse_entry(entry, &prefix, mode) {
            Some((key, text)) => {
                debug!(block = key, state = ?UnitState::Parsed);
                result.translations.insert(key.to_string(), Value::String(text.to_string()));
                result.accepted += 1;
            }
            None => {
                let first_line = entry.split('\n').next().unwrap_or_default();
                debug!(entry = first_line, state = ?UnitState::Dropped, "Dropping reply entry");
                result.dropped += 1;
            }
        }
    }

    result
}

fn parse_entry<'a>(entry: &'a str, prefix: &str, mode: ParseMode) -> Option<(&'a str, &'a str)> {
    let lines: Vec<&str> = entry.split('\n').collect();
    if lines.len() < 3 {
        return None;
    }

    let (first, last) = (lines[0], lines[lines.len() - 1]);
    if !first.starts_with(BLOCK_PREFIX) || !last.contains(prefix) {
        return None;
    }

    if mode == ParseMode::Strict {
        let refined_shape = lines.len() == 4
            && first.contains(" | ")
            && last.starts_with(prefix)
            && !lines.iter().any(|l| l.starts_with(ERROR_MARKER.trim_end()));
        if !refined_shape {
            return None;
        }
    }

    let key = first.split(" | ").next().unwrap_or(first);
    let (_, text) = last.split_once(": ")?;
    Some((key, text))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "BLOCK_1 | <b>\nEN: Hello\nFR: Bonjour\nFR: Bonjour le monde\n\n\n\
                       BLOCK_2 | <i>\nEN: Bye\nFR: \n# ERROR: network error: connection reset\n\n\n\
                       BLOCK_3 | <p>\nEN: Ratio\nFR: Ratio\nFR: Rapport : 3: 1\n";

    #[test]
    fn test_compatible_parse() {
        let result = parse_reply_text(RAW, "FR", ParseMode::Compatible);

        let keys: Vec<&str> = result.translations.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["BLOCK_1", "BLOCK_3"]);
        assert_eq!(result.translations["BLOCK_1"], "Bonjour le monde");
        assert_eq!(result.translations["BLOCK_3"], "Rapport : 3: 1");
        assert_eq!(result.accepted, 2);
        assert_eq!(result.dropped, 1);
    }

    #[test]
    fn test_short_and_foreign_entries_dropped() {
        let raw = "BLOCK_1 | <b>\nFR: Salut\n\nNOTE | x\nEN: a\nFR: b\n\nBLOCK_2 | <b>\nEN: a\nDE: b";
        let result = parse_reply_text(raw, "FR", ParseMode::Compatible);

        assert!(result.translations.is_empty());
        assert_eq!(result.dropped, 3);
    }

    #[test]
    fn test_compatible_accepts_unrefined_block() {
        let raw = "BLOCK_1 | <b>\nEN: Hello\nFR: Bonjour\n";

        let compatible = parse_reply_text(raw, "FR", ParseMode::Compatible);
        assert_eq!(compatible.translations["BLOCK_1"], "Bonjour");

        let strict = parse_reply_text(raw, "FR", ParseMode::Strict);
        assert!(strict.translations.is_empty());
    }

    #[test]
    fn test_strict_parse() {
        let raw = "BLOCK_1 | <b>\nEN: Hello\nFR: Bonjour\nFR: Bonjour le monde\n\n\n\
                   BLOCK_2 | <b>\nEN: Hi\nFR: Salut\nextra\nFR: Coucou\n\n\n\
                   BLOCK_3 | <b>\nEN: Yo\nFR: \n# ERROR: FR: quota exceeded";
        let result = parse_reply_text(raw, "FR", ParseMode::Strict);

        assert_eq!(result.translations.len(), 1);
        assert_eq!(result.translations["BLOCK_1"], "Bonjour le monde");
        assert_eq!(result.dropped, 2);
    }

    #[test]
    fn test_duplicate_key_keeps_first_position() {
        let raw = "BLOCK_1 | <b>\nEN: a\nFR: a\nFR: one\n\n\
                   BLOCK_2 | <b>\nEN: b\nFR: b\nFR: two\n\n\
                   BLOCK_1 | <b>\nEN: a\nFR: a\nFR: three";
        let result = parse_reply_text(raw, "FR", ParseMode::Compatible);

        let keys: Vec<&str> = result.translations.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["BLOCK_1", "BLOCK_2"]);
        assert_eq!(result.translations["BLOCK_1"], "three");
    }

    #[test]
    fn test_parse_replies_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("gpt_raw_FR.txt");
        let out = dir.path().join("openai_translations_FR.json");
        std::fs::write(&raw, RAW).unwrap();

        parse_replies(&raw, &out, "FR", ParseMode::Compatible).unwrap();
        let first = std::fs::read(&out).unwrap();
        parse_replies(&raw, &out, "FR", ParseMode::Compatible).unwrap();
        let second = std::fs::read(&out).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            String::from_utf8(first).unwrap(),
            "{\n  \"BLOCK_1\": \"Bonjour le monde\",\n  \"BLOCK_3\": \"Rapport : 3: 1\"\n}"
        );
    }

    #[test]
    fn test_parse_replies_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_replies(
            &dir.path().join("gpt_raw_FR.txt"),
            &dir.path().join("out.json"),
            "FR",
            ParseMode::Compatible,
        )
        .unwrap_err();

        assert!(matches!(err, PipelineError::MissingFile(_)));
    }
}
