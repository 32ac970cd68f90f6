//! `triage classify`: run one email file through the processor.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use triage_core::MessageProcessor;
use triage_core::ProcessingOutcome;
use triage_utils_string::decode_text;

use crate::load_config;

#[derive(Debug, Parser)]
pub struct ClassifyArgs {
    /// Email text file (UTF-8 or Latin-1)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Print the full outcome, including diagnostics, as JSON
    #[arg(long)]
    pub json: bool,

    /// Skip the local model and classify by keywords only
    #[arg(long)]
    pub no_model: bool,

    /// Config file (defaults to $TRIAGE_CONFIG or ~/.config/triage/triage.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

pub async fn run_classify(args: ClassifyArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if args.no_model {
        config.model.enabled = false;
    }

    let bytes = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("reading {}", args.file.display()))?;
    let (message, encoding) = decode_text(&bytes);
    tracing::debug!(file = %args.file.display(), ?encoding, "decoded email");

    let outcome = MessageProcessor::new(config.model).process(&message).await;
    println!("{}", render(&outcome, args.json)?);
    Ok(())
}

fn render(outcome: &ProcessingOutcome, json: bool) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(outcome)?);
    }
    Ok(format!(
        "Classificação: {}\nResposta: {}",
        outcome.classification, outcome.response
    ))
}
