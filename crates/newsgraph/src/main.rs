mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use newsgraph_core::{LlmConfig, OpenAiClient, PipelineDriver};

use crate::cli::{Cli, Commands};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let driver = build_driver(cli.model.as_deref(), cli.base_url.as_deref())?;

    dispatch(&driver, cli.command).await
}

async fn dispatch(driver: &PipelineDriver, command: Commands) -> Result<()> {
    match command {
        Commands::Extract { news, ticker } => {
            let ticker = ticker.to_uppercase();
            let output = driver
                .extract_file(&news, &ticker)
                .await
                .context("extraction failed")?;
            println!("Draft triples written to: {}", output.display());
        }
        Commands::Verify {
            draft,
            news,
            ticker,
        } => {
            let ticker = ticker.to_uppercase();
            let (output, stats) = driver
                .verify_file(&draft, &news, &ticker)
                .await
                .context("verification failed")?;
            println!("Verified triples written to: {}", output.display());
            println!("{stats}");
        }
        Commands::Run { news, ticker } => {
            let ticker = ticker.to_uppercase();
            let log = driver.run(&news, &ticker).await.context("run failed")?;
            println!(
                "Processed {} articles for {}",
                log.articles, log.target
            );
            println!("Draft triples: {}", log.draft_path.display());
            println!("Verified triples: {}", log.verified_path.display());
            println!("{}", log.stats);
        }
    }

    Ok(())
}

fn build_driver(model: Option<&str>, base_url: Option<&str>) -> Result<PipelineDriver> {
    let mut config = LlmConfig::from_env()
        .context("completion client configuration (is OPENAI_API_KEY set?)")?;

    if let Some(model) = model {
        config = config.with_model(model);
    }
    if let Some(base_url) = base_url {
        config = config.with_base_url(base_url);
    }

    let client = OpenAiClient::new(config).context("building completion client")?;

    Ok(PipelineDriver::new(Arc::new(client)))
}
