use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use refinery::{
    ArtifactPaths, LanguageConfig, OpenAiClient, OpenAiConfig, ParseMode, PipelineConfig,
    RefineConfig, format_batch, parse_replies, refine_batch, run_pipeline,
};

#[derive(Parser)]
#[command(name = "refinery")]
#[command(author, version, about = "Translation refinement pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Format, refine, and parse in one run
    Run {
        #[command(flatten)]
        inputs: InputArgs,

        #[command(flatten)]
        api: ApiArgs,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Build the prompt batch only
    Format {
        #[command(flatten)]
        inputs: InputArgs,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Send an existing batch file to the model
    Refine {
        /// Batch file (defaults to gpt_input.txt in the output directory)
        #[arg(long)]
        batch: Option<PathBuf>,

        #[command(flatten)]
        api: ApiArgs,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Convert a raw reply file into the final JSON map
    Parse {
        /// Raw reply file (defaults to gpt_raw_<target>.txt in the output directory)
        #[arg(long)]
        raw: Option<PathBuf>,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Sentence catalogue (translatable_flat_sentences.json)
    #[arg(long)]
    context: PathBuf,

    /// Existing machine translations (translations.json)
    #[arg(long)]
    translated: PathBuf,
}

#[derive(Args)]
struct ApiArgs {
    /// OpenAI API key (falls back to OPENAI_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Chat model
    #[arg(long, default_value = refinery::llm::DEFAULT_MODEL)]
    model: String,

    /// API root for OpenAI-compatible endpoints
    #[arg(long, default_value = refinery::llm::DEFAULT_BASE_URL)]
    base_url: String,

    /// Attempts per block before recording an error marker
    #[arg(long, default_value = "3")]
    max_attempts: u32,
}

#[derive(Args)]
struct CommonArgs {
    /// Original language code (e.g., EN)
    #[arg(long)]
    primary_lang: String,

    /// Optional secondary language code
    #[arg(long)]
    secondary_lang: Option<String>,

    /// Target language code (e.g., FR)
    #[arg(long)]
    target_lang: String,

    /// Directory for the batch, raw replies, and final JSON
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Require the exact refined four-line shape when parsing replies
    #[arg(long)]
    strict_parse: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl CommonArgs {
    fn languages(&self) -> LanguageConfig {
        LanguageConfig {
            primary: self.primary_lang.clone(),
            secondary: self.secondary_lang.clone(),
            target: self.target_lang.clone(),
        }
    }

    fn paths(&self) -> ArtifactPaths {
        ArtifactPaths::new(&self.output_dir, &self.target_lang)
    }

    fn parse_mode(&self) -> ParseMode {
        if self.strict_parse {
            ParseMode::Strict
        } else {
            ParseMode::Compatible
        }
    }
}

impl ApiArgs {
    fn client(&self) -> Result<OpenAiClient> {
        let config = match &self.api_key {
            Some(key) => OpenAiConfig::new(key.clone()),
            None => OpenAiConfig::from_env()?,
        };
        Ok(OpenAiClient::new(
            config
                .with_model(self.model.clone())
                .with_base_url(self.base_url.clone()),
        ))
    }

    fn refine_config(&self) -> RefineConfig {
        RefineConfig {
            max_attempts: self.max_attempts,
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            inputs,
            api,
            common,
        } => {
            setup_logging(common.verbose);
            let client = api.client()?;
            let config = PipelineConfig {
                context_path: inputs.context,
                translated_path: inputs.translated,
                output_dir: common.output_dir.clone(),
                languages: common.languages(),
                refine: api.refine_config(),
                parse_mode: common.parse_mode(),
            };

            let result = run_pipeline(&client, &config)
                .await
                .context("Pipeline failed")?;

            info!(
                "Complete: {} units formatted, {} refined, {} failed, {} translations saved",
                result.format.units,
                result.refine.refined,
                result.refine.failed,
                result.parse.translations.len()
            );
            println!("{}", result.paths.translations.display());
        }
        Commands::Format { inputs, common } => {
            setup_logging(common.verbose);
            let paths = common.paths();
            format_batch(
                &inputs.context,
                &inputs.translated,
                &paths.batch,
                &common.languages(),
            )
            .context("Failed to format batch")?;
            println!("{}", paths.batch.display());
        }
        Commands::Refine { batch, api, common } => {
            setup_logging(common.verbose);
            let client = api.client()?;
            let paths = common.paths();
            let batch = batch.unwrap_or(paths.batch);
            refine_batch(
                &client,
                &batch,
                &paths.raw_replies,
                &common.languages(),
                &api.refine_config(),
            )
            .await
            .context("Failed to refine batch")?;
            println!("{}", paths.raw_replies.display());
        }
        Commands::Parse { raw, common } => {
            setup_logging(common.verbose);
            let paths = common.paths();
            let raw = raw.unwrap_or(paths.raw_replies);
            parse_replies(
                &raw,
                &paths.translations,
                &common.target_lang,
                common.parse_mode(),
            )
            .context("Failed to parse replies")?;
            println!("{}", paths.translations.display());
        }
    }

    Ok(())
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}
