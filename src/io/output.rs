use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::PipelineError;

/// Name of the formatted batch file
pub const BATCH_FILE_NAME: &str = "gpt_input.txt";

/// Where each artifact of a run is written
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub batch: PathBuf,
    pub raw_replies: PathBuf,
    pub translations: PathBuf,
}

impl ArtifactPaths {
    pub fn new(output_dir: &Path, target_lang: &str) -> Self {
        Self {
            batch: output_dir.join(BATCH_FILE_NAME),
            raw_replies: output_dir.join(format!("gpt_raw_{}.txt", target_lang)),
            translations: output_dir.join(format!("openai_translations_{}.json", target_lang)),
        }
    }
}

/// Write a text artifact, replacing any previous file
pub fn write_text(path: &Path, content: &str) -> Result<(), PipelineError> {
    std::fs::write(path, content).map_err(|e| PipelineError::io(path, e))
}

/// Serialize a translation map with 2-space indentation and unescaped non-ASCII
pub fn render_translation_json(map: &Map<String, Value>) -> String {
    serde_json::to_string_pretty(map).unwrap_or_else(|_| "{}".to_string())
}

/// Write the final translation map
pub fn write_translation_json(path: &Path, map: &Map<String, Value>) -> Result<(), PipelineError> {
    write_text(path, &render_translation_json(map))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_paths_include_target_lang() {
        let paths = ArtifactPaths::new(Path::new("out"), "FR");

        assert_eq!(paths.batch, Path::new("out/gpt_input.txt"));
        assert_eq!(paths.raw_replies, Path::new("out/gpt_raw_FR.txt"));
        assert_eq!(paths.translations, Path::new("out/openai_translations_FR.json"));
    }

    #[test]
    fn test_render_translation_json_keeps_unicode() {
        let mut map = Map::new();
        map.insert("BLOCK_2".to_string(), Value::String("Grüße".to_string()));
        map.insert("BLOCK_1".to_string(), Value::String("日本".to_string()));

        let json = render_translation_json(&map);

        assert_eq!(json, "{\n  \"BLOCK_2\": \"Grüße\",\n  \"BLOCK_1\": \"日本\"\n}");
    }
}
