/// Language codes for one pipeline run.
///
/// Passed explicitly to every stage; nothing reads language settings from
/// global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageConfig {
    /// Language of the source text (e.g. "EN")
    pub primary: String,
    /// Optional second source language whose terms should also be preserved
    pub secondary: Option<String>,
    /// Language being refined (e.g. "FR")
    pub target: String,
}

impl LanguageConfig {
    pub fn new(primary: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: None,
            target: target.into(),
        }
    }

    pub fn with_secondary(mut self, secondary: impl Into<String>) -> Self {
        self.secondary = Some(secondary.into());
        self
    }

    /// Line prefix for target-language text, e.g. "FR: "
    pub fn target_prefix(&self) -> String {
        target_prefix(&self.target)
    }
}

/// Line prefix for a language code, e.g. "FR: "
pub fn target_prefix(lang: &str) -> String {
    format!("{}: ", lang)
}
