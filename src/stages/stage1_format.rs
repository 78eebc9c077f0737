use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::error::PipelineError;
use crate::io::{ensure_exists, load_catalogue, load_translation_map, write_text};
use crate::models::{
    BLOCK_PREFIX, LanguageConfig, SentenceCatalogue, TAG_KEY, TranslationMap, TranslationUnit,
    value_text,
};

/// Result of Stage 1 formatting
#[derive(Debug)]
pub struct FormatResult {
    /// Number of blocks written to the batch file
    pub units: usize,
}

/// Execute Stage 1: build the prompt batch.
///
/// Both inputs are checked for existence before either is read, and every
/// unit is validated before the batch file is opened, so a bad catalogue
/// leaves no output behind.
pub fn format_batch(
    context_path: &Path,
    translated_path: &Path,
    output_path: &Path,
    languages: &LanguageConfig,
) -> Result<FormatResult, PipelineError> {
    ensure_exists(&[context_path, translated_path])?;

    let catalogue = load_catalogue(context_path)?;
    let translations = load_translation_map(translated_path)?;

    let units = collect_units(&catalogue, &translations)?;
    info!(
        "Stage 1: {} units ({} with an existing translation)",
        units.len(),
        units.iter().filter(|u| !u.target_text.is_empty()).count()
    );

    write_text(output_path, &render_batch(&units, languages))?;
    info!("Batch written to {:?}", output_path);

    Ok(FormatResult { units: units.len() })
}

/// Join the catalogue with the translation map, validating keys and tags
pub fn collect_units(
    catalogue: &SentenceCatalogue,
    translations: &TranslationMap,
) -> Result<Vec<TranslationUnit>, PipelineError> {
    let mut units = Vec::with_capacity(catalogue.unit_count());

    for (category, entries) in catalogue.categories() {
        for entry in entries {
            for (key, source) in entry {
                if key == TAG_KEY {
                    continue;
                }
                if !key.starts_with(BLOCK_PREFIX) {
                    return Err(PipelineError::InvalidKey {
                        key: key.clone(),
                        category: category.to_string(),
                    });
                }

                let tag = normalize_tag(entry.get(TAG_KEY), key)?;
                units.push(TranslationUnit {
                    key: key.clone(),
                    tag,
                    source_text: value_text(source),
                    target_text: translations.get(key).cloned().unwrap_or_default(),
                });
            }
        }
    }

    Ok(units)
}

/// Render units as blank-line separated three-line blocks
pub fn render_batch(units: &[TranslationUnit], languages: &LanguageConfig) -> String {
    units
        .iter()
        .map(|unit| format!("{}\n", unit.to_block(languages)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strip surrounding angle brackets and check what remains is a bare tag name
fn normalize_tag(tag: Option<&Value>, key: &str) -> Result<String, PipelineError> {
    let raw = match tag {
        Some(Value::String(s)) => s.as_str(),
        Some(other) => {
            return Err(PipelineError::MalformedTag {
                tag: other.to_string(),
                key: key.to_string(),
            });
        }
        None => {
            return Err(PipelineError::MalformedTag {
                tag: String::new(),
                key: key.to_string(),
            });
        }
    };

    let name = raw.trim().trim_matches(['<', '>']).trim();
    if name.is_empty() || name.contains(['<', '>']) {
        return Err(PipelineError::MalformedTag {
            tag: raw.to_string(),
            key: key.to_string(),
        });
    }

    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalogue(json: &str) -> SentenceCatalogue {
        serde_json::from_str(json).unwrap()
    }

    fn translations(pairs: &[(&str, &str)]) -> TranslationMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_single_block() {
        let catalogue = catalogue(
            r#"{"1_word":[{"tag":"<b>","BLOCK_1":"Hello"}],"2_words":[],"3_words":[],"4_or_more_words":[]}"#,
        );
        let units = collect_units(&catalogue, &translations(&[("BLOCK_1", "Bonjour")])).unwrap();
        let batch = render_batch(&units, &LanguageConfig::new("EN", "FR"));

        assert_eq!(batch, "BLOCK_1 | <b>\nEN: Hello\nFR: Bonjour\n");
    }

    #[test]
    fn test_blocks_in_category_order_with_missing_translation() {
        let catalogue = catalogue(
            r#"{
                "4_or_more_words": [{"tag": "p", "BLOCK_9": "Read the full manual"}],
                "1_word": [{"tag": "<b>", "BLOCK_1": "Hello", "BLOCK_2": "Bye"}]
            }"#,
        );
        let units = collect_units(&catalogue, &translations(&[("BLOCK_1", "Salut")])).unwrap();

        let keys: Vec<&str> = units.iter().map(|u| u.key.as_str()).collect();
        assert_eq!(keys, vec!["BLOCK_1", "BLOCK_2", "BLOCK_9"]);
        assert_eq!(units[1].target_text, "");
        assert_eq!(units[2].tag, "p");

        let batch = render_batch(&units, &LanguageConfig::new("EN", "FR"));
        assert_eq!(
            batch,
            "BLOCK_1 | <b>\nEN: Hello\nFR: Salut\n\n\
             BLOCK_2 | <b>\nEN: Bye\nFR: \n\n\
             BLOCK_9 | <p>\nEN: Read the full manual\nFR: \n"
        );
    }

    #[test]
    fn test_invalid_key() {
        let catalogue = catalogue(r#"{"2_words":[{"tag":"a","LINK_3":"Go home"}]}"#);
        let err = collect_units(&catalogue, &TranslationMap::new()).unwrap_err();

        match err {
            PipelineError::InvalidKey { key, category } => {
                assert_eq!(key, "LINK_3");
                assert_eq!(category, "2_words");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_tags() {
        for tag in [r#""<>""#, r#""""#, r#""<a<b>""#, "7"] {
            let json = format!(r#"{{"1_word":[{{"tag":{tag},"BLOCK_1":"Hi"}}]}}"#);
            let err = collect_units(&catalogue(&json), &TranslationMap::new()).unwrap_err();
            assert!(
                matches!(err, PipelineError::MalformedTag { ref key, .. } if key == "BLOCK_1"),
                "tag {tag} gave {err}"
            );
        }
    }

    #[test]
    fn test_missing_tag_is_malformed() {
        let catalogue = catalogue(r#"{"1_word":[{"BLOCK_1":"Hi"}]}"#);
        let err = collect_units(&catalogue, &TranslationMap::new()).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedTag { .. }));
    }

    #[test]
    fn test_unbracketed_tag_is_accepted() {
        let catalogue = catalogue(r#"{"1_word":[{"tag":"span","BLOCK_1":"Hi"}]}"#);
        let units = collect_units(&catalogue, &TranslationMap::new()).unwrap();
        assert_eq!(units[0].tag, "span");
    }

    #[test]
    fn test_format_batch_writes_nothing_on_invalid_key() {
        let dir = tempfile::tempdir().unwrap();
        let context = dir.path().join("context.json");
        let translated = dir.path().join("translations.json");
        let output = dir.path().join("gpt_input.txt");
        std::fs::write(
            &context,
            r#"{"1_word":[{"tag":"<b>","BLOCK_1":"Hello"},{"tag":"<i>","oops":"World"}]}"#,
        )
        .unwrap();
        std::fs::write(&translated, "{}").unwrap();

        let err = format_batch(&context, &translated, &output, &LanguageConfig::new("EN", "FR"))
            .unwrap_err();

        assert!(matches!(err, PipelineError::InvalidKey { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn test_format_batch_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let context = dir.path().join("context.json");
        std::fs::write(&context, "{}").unwrap();
        let translated = dir.path().join("nope.json");

        let err = format_batch(
            &context,
            &translated,
            &dir.path().join("out.txt"),
            &LanguageConfig::new("EN", "FR"),
        )
        .unwrap_err();

        assert!(matches!(err, PipelineError::MissingFile(p) if p == translated));
    }
}
