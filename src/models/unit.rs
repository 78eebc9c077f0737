use crate::models::LanguageConfig;

/// The atomic item moving through the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationUnit {
    /// BLOCK key
    pub key: String,
    /// Tag name without surrounding angle brackets
    pub tag: String,
    pub source_text: String,
    /// Existing translation, empty if none was produced
    pub target_text: String,
}

impl TranslationUnit {
    /// Render the three-line batch block for this unit
    pub fn to_block(&self, languages: &LanguageConfig) -> String {
        format!(
            "{} | <{}>\n{}: {}\n{}: {}",
            self.key, self.tag, languages.primary, self.source_text, languages.target, self.target_text
        )
    }
}

/// Lifecycle of a unit across the three stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Formatted,
    Sent,
    Refined,
    Failed,
    Parsed,
    Dropped,
}

impl UnitState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UnitState::Parsed | UnitState::Dropped | UnitState::Failed)
    }
}
