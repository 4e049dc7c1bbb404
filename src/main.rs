use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use comment_scraper::api::start_api_server;
use comment_scraper::cli::{Cli, Command, OutputArgs};
use comment_scraper::config::{Config, ConfigManager, FileConfigManager};
use comment_scraper::{run_viewer, FileExporter, ScrapeOutcome, ScrapeRequest, Scraper};

#[tokio::main]
async fn main() -> comment_scraper::Result<()> {
    let cli = Cli::parse();

    // logs go to stderr so stdout stays clean for the summary
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config_manager = FileConfigManager::new(cli.config.clone());
    let mut config = config_manager.load_config().await?;
    tracing::debug!("Loaded configuration from {}", config_manager.path().display());

    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
                config_manager.validate_config(&config)?;
            }
            let scraper = Scraper::new(&config)?;
            tracing::info!("Starting comment scraper API");
            start_api_server(Arc::new(scraper), Arc::new(config)).await?;
        }
        command => {
            if let Some((request, output)) = command.into_scrape() {
                let scraper = Scraper::new(&config)?;
                run_scrape(&scraper, &config, request, output).await?;
            }
        }
    }

    Ok(())
}

async fn run_scrape(
    scraper: &Scraper,
    config: &Config,
    request: ScrapeRequest,
    output: OutputArgs,
) -> comment_scraper::Result<()> {
    let outcome = scraper.scrape(&request).await;
    print_summary(&outcome);

    if output.view {
        let title = format!("{} ({} rows)", outcome.platform.display_name(), outcome.dataset.len());
        run_viewer(&title, outcome.dataset.clone(), outcome.error.clone()).await?;
    }

    if output.no_save || outcome.dataset.is_empty() {
        return Ok(());
    }

    let format = output.format.unwrap_or(config.output.format);
    let directory = output.output_dir.unwrap_or_else(|| config.output.directory.clone());
    let path = FileExporter::new(directory)
        .save(&outcome.dataset, outcome.platform, format)
        .await?;
    println!("Saved to {}", path.display());

    Ok(())
}

fn print_summary(outcome: &ScrapeOutcome) {
    match outcome.error {
        Some(ref message) => println!("{}", message),
        None => {
            println!(
                "Collected {} rows from {}",
                outcome.dataset.len(),
                outcome.platform.display_name()
            );
            for row in outcome.dataset.rows().iter().take(5) {
                let line: Vec<String> = row.iter().map(|cell| cell.to_string().replace('\n', " ")).collect();
                println!("  {}", line.join(" | "));
            }
        }
    }
}
