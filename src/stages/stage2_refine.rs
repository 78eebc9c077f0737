use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{PipelineError, RemoteCallError};
use crate::io::{read_text, write_text};
use crate::llm::{ChatCompletion, build_system_prompt};
use crate::models::{LanguageConfig, UnitState};

/// Prefix of the line recorded when a block exhausts its attempts
pub const ERROR_MARKER: &str = "# ERROR: ";

/// Configuration for Stage 2
#[derive(Debug, Clone)]
pub struct RefineConfig {
    /// Attempts per block before recording an error marker
    pub max_attempts: u32,
    /// Wait after the first failed attempt; doubles after each further failure
    pub backoff_base: Duration,
    /// Fixed wait after every block, successful or not
    pub inter_block_delay: Duration,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
            inter_block_delay: Duration::from_secs(1),
        }
    }
}

impl RefineConfig {
    /// Wait before the attempt following failed attempt `attempt` (0-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base * 2u32.saturating_pow(attempt)
    }
}

/// Result of Stage 2 processing
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RefineResult {
    /// Blocks sent to the model
    pub blocks: usize,
    /// Blocks that received a reply
    pub refined: usize,
    /// Blocks recorded with an error marker
    pub failed: usize,
}

/// Execute Stage 2: send every batch block to the model and save the replies
pub async fn refine_batch<C: ChatCompletion>(
    client: &C,
    batch_path: &Path,
    output_path: &Path,
    languages: &LanguageConfig,
    config: &RefineConfig,
) -> Result<RefineResult, PipelineError> {
    let batch = read_text(batch_path)?;

    let (raw, result) = refine_blocks(client, &batch, languages, config).await;

    write_text(output_path, &raw)?;
    info!(
        "Stage 2: {} blocks, {} refined, {} failed; replies written to {:?}",
        result.blocks, result.refined, result.failed, output_path
    );

    Ok(result)
}

/// Refine every block of a batch text, returning the raw reply file content
pub async fn refine_blocks<C: ChatCompletion>(
    client: &C,
    batch: &str,
    languages: &LanguageConfig,
    config: &RefineConfig,
) -> (String, RefineResult) {
    let system_prompt = build_system_prompt(languages);
    let target_prefix = languages.target_prefix();

    let blocks: Vec<&str> = batch
        .split("\n\n")
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .collect();

    info!("Stage 2: refining {} blocks", blocks.len());

    let mut entries = Vec::with_capacity(blocks.len());
    let mut result = RefineResult {
        blocks: blocks.len(),
        ..Default::default()
    };

    for (index, block) in blocks.into_iter().enumerate() {
        let block_id = block.lines().next().unwrap_or_default();
        debug!(block = block_id, state = ?UnitState::Sent, "Block {} of {}", index + 1, result.blocks);

        match refine_block(client, &system_prompt, block, config).await {
            Ok(reply) => {
                let line = normalize_reply(&reply, &target_prefix);
                debug!(block = block_id, state = ?UnitState::Refined, "{}{}", target_prefix, line);
                entries.push(format!("{}\n{}{}\n", block, target_prefix, line));
                result.refined += 1;
            }
            Err(e) => {
                warn!(block = block_id, state = ?UnitState::Failed, "Giving up after {} attempts: {}", config.max_attempts, e);
                entries.push(format!("{}\n{}{}\n", block, ERROR_MARKER, e.summary()));
                result.failed += 1;
            }
        }

        tokio::time::sleep(config.inter_block_delay).await;
    }

    (entries.join("\n\n"), result)
}

/// Call the model for one block, retrying with exponential backoff
async fn refine_block<C: ChatCompletion>(
    client: &C,
    system_prompt: &str,
    block: &str,
    config: &RefineConfig,
) -> Result<String, RemoteCallError> {
    let attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match client.complete(system_prompt, block).await {
            Ok(reply) => return Ok(reply),
            Err(e) if attempt + 1 < attempts => {
                let wait = config.backoff(attempt);
                warn!(
                    "Attempt {} of {} failed: {}; retrying in {:?}",
                    attempt + 1,
                    attempts,
                    e,
                    wait
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Reduce a model reply to the bare improved text on a single line.
///
/// The reply is asked to carry the target prefix; it is stripped here since
/// the caller writes its own. Multi-line replies keep the last prefixed line,
/// or are joined with spaces when no line carries the prefix.
pub fn normalize_reply(reply: &str, target_prefix: &str) -> String {
    let reply = reply.trim();

    if let Some(line) = reply
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| l.starts_with(target_prefix))
    {
        return line[target_prefix.len()..].trim().to_string();
    }

    reply
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
