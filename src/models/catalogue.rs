use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key holding an entry's HTML tag
pub const TAG_KEY: &str = "tag";

/// Prefix every translatable key must carry
pub const BLOCK_PREFIX: &str = "BLOCK_";

/// Size categories in the order they are emitted
pub const CATEGORIES: [&str; 4] = ["1_word", "2_words", "3_words", "4_or_more_words"];

/// One catalogue entry: BLOCK keys mapped to source text, plus a `tag` field.
///
/// Kept as a raw JSON object so the key order of the input file survives.
pub type Entry = Map<String, Value>;

/// Previously produced machine translations, keyed by BLOCK key
pub type TranslationMap = HashMap<String, String>;

/// Source sentences grouped by word count
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentenceCatalogue {
    #[serde(rename = "1_word", default)]
    pub one_word: Vec<Entry>,
    #[serde(rename = "2_words", default)]
    pub two_words: Vec<Entry>,
    #[serde(rename = "3_words", default)]
    pub three_words: Vec<Entry>,
    #[serde(rename = "4_or_more_words", default)]
    pub four_or_more_words: Vec<Entry>,
}

impl SentenceCatalogue {
    /// Categories paired with their entries, in emission order
    pub fn categories(&self) -> [(&'static str, &[Entry]); 4] {
        [
            (CATEGORIES[0], self.one_word.as_slice()),
            (CATEGORIES[1], self.two_words.as_slice()),
            (CATEGORIES[2], self.three_words.as_slice()),
            (CATEGORIES[3], self.four_or_more_words.as_slice()),
        ]
    }

    /// Number of translatable (non-tag) keys across all categories
    pub fn unit_count(&self) -> usize {
        self.categories()
            .iter()
            .flat_map(|(_, entries)| entries.iter())
            .map(|entry| entry.keys().filter(|k| *k != TAG_KEY).count())
            .sum()
    }
}

/// Render a JSON value as the text that goes into a prompt line
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
