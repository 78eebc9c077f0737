use crate::models::LanguageConfig;

/// Build the system instruction sent with every block of a run
pub fn build_system_prompt(languages: &LanguageConfig) -> String {
    let source_langs = match &languages.secondary {
        Some(secondary) => format!("{}/{}", languages.primary, secondary),
        None => languages.primary.clone(),
    };

    format!(
        "Improve the {target} translation while preserving:\n\
         - Technical terms from {source_langs}\n\
         - HTML tag context requirements\n\
         - BLOCK_ID references\n\
         Return ONLY the improved {target} line, as a single line prefixed with \"{target}: \".",
        target = languages.target,
        source_langs = source_langs,
    )
}
