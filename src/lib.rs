pub mod error;
pub mod io;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod stages;

pub use error::{PipelineError, RemoteCallError};
pub use io::{ArtifactPaths, load_catalogue, load_translation_map};
pub use llm::{ChatCompletion, OpenAiClient, OpenAiConfig, build_system_prompt};
pub use models::{LanguageConfig, SentenceCatalogue, TranslationMap, TranslationUnit};
pub use pipeline::{PipelineConfig, PipelineResult, run_pipeline};
pub use stages::{
    ParseMode, RefineConfig, RefineResult, format_batch, parse_replies, parse_reply_text,
    refine_batch,
};
