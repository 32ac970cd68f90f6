use std::path::PathBuf;

use clap::Parser;

use crate::load_config;

#[derive(Debug, Parser)]
pub struct ServeArgs {
    /// Listen address, overriding `server.bind`
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Config file (defaults to $TRIAGE_CONFIG or ~/.config/triage/triage.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

pub async fn run_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    triage_server::serve(&config).await?;
    Ok(())
}
