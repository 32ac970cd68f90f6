use clap::Parser;
use clap::Subcommand;
use triage_cli::ClassifyArgs;
use triage_cli::ServeArgs;
use triage_cli::classify_cmd::run_classify;
use triage_cli::serve_cmd::run_serve;

/// Email triage: classify messages and suggest replies
#[derive(Debug, Parser)]
#[command(name = "triage", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the web interface
    Serve(ServeArgs),

    /// Classify one email file and print the suggested reply
    Classify(ClassifyArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries command output only.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => run_serve(args).await,
        Command::Classify(args) => run_classify(args).await,
    }
}
