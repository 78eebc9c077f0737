use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::PipelineError;
use crate::models::{SentenceCatalogue, TranslationMap};

/// Ensure every given input file exists before any processing starts
pub fn ensure_exists<P: AsRef<Path>>(paths: &[P]) -> Result<(), PipelineError> {
    for path in paths {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PipelineError::MissingFile(path.to_path_buf()));
        }
    }
    Ok(())
}

/// Read a whole text file as UTF-8
pub fn read_text(path: &Path) -> Result<String, PipelineError> {
    ensure_exists(&[path])?;
    std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PipelineError> {
    let content = read_text(path)?;
    serde_json::from_str(&content).map_err(|source| PipelineError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the sentence catalogue
pub fn load_catalogue(path: &Path) -> Result<SentenceCatalogue, PipelineError> {
    read_json(path)
}

/// Load the existing machine-translation map
pub fn load_translation_map(path: &Path) -> Result<TranslationMap, PipelineError> {
    read_json(path)
}
