use std::path::PathBuf;

use tracing::info;

use crate::error::PipelineError;
use crate::io::ArtifactPaths;
use crate::llm::ChatCompletion;
use crate::models::LanguageConfig;
use crate::stages::{
    FormatResult, ParseMode, ParseResult, RefineConfig, RefineResult, format_batch, parse_replies,
    refine_batch,
};

/// Everything a full run needs besides the model client
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Sentence catalogue JSON
    pub context_path: PathBuf,
    /// Existing translation map JSON
    pub translated_path: PathBuf,
    /// Directory receiving the batch, raw replies, and final JSON
    pub output_dir: PathBuf,
    pub languages: LanguageConfig,
    pub refine: RefineConfig,
    pub parse_mode: ParseMode,
}

/// Outcome of a full run
#[derive(Debug)]
pub struct PipelineResult {
    pub paths: ArtifactPaths,
    pub format: FormatResult,
    pub refine: RefineResult,
    pub parse: ParseResult,
}

/// Run Formatter, Refinement Client, and Reply Parser in sequence
pub async fn run_pipeline<C: ChatCompletion>(
    client: &C,
    config: &PipelineConfig,
) -> Result<PipelineResult, PipelineError> {
    let paths = ArtifactPaths::new(&config.output_dir, &config.languages.target);

    info!("Stage 1: Formatting batch...");
    let format = format_batch(
        &config.context_path,
        &config.translated_path,
        &paths.batch,
        &config.languages,
    )?;

    info!("Stage 2: Refining translations...");
    let refine = refine_batch(
        client,
        &paths.batch,
        &paths.raw_replies,
        &config.languages,
        &config.refine,
    )
    .await?;

    info!("Stage 3: Parsing replies...");
    let parse = parse_replies(
        &paths.raw_replies,
        &paths.translations,
        &config.languages.target,
        config.parse_mode,
    )?;

    let lost = format.units.saturating_sub(parse.translations.len());
    if lost > 0 {
        info!("{} of {} units missing from the final map", lost, format.units);
    }

    Ok(PipelineResult {
        paths,
        format,
        refine,
        parse,
    })
}
