mod checkpoint;
mod config;
mod curator;
mod headers;
mod pipeline;
mod publisher;
mod sheets;
mod window;

use std::time::Instant;

use clap::{Parser, Subcommand};

use crate::curator::OpenAiChat;
use crate::sheets::{SheetStore, SheetsClient};

#[derive(Parser)]
#[command(
    name = "tweet_curator",
    about = "Curates new tweets from a source sheet via OpenAI and publishes the best ones"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the ingest -> curate -> publish pipeline once
    Run,
    /// Show checkpoint position and pending row count
    Status,
    /// Verify credentials and spreadsheet access
    CheckAccess,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let cfg = config::load()?;
    let secrets = config::load_secrets()?;
    let store = SheetsClient::new(secrets.sheets_token)?;

    let result = match cli.command {
        Commands::Run => {
            let model = OpenAiChat::new(secrets.openai_api_key, cfg.model.clone())?;
            let report = pipeline::run_once(&store, &model, &cfg)?;
            report.print();
            Ok(())
        }
        Commands::Status => {
            let status = pipeline::source_status(&store, &cfg)?;
            println!("Total rows: {}", status.total_rows);
            println!("Processed:  {}", status.checkpoint);
            println!("Pending:    {}", status.pending);
            Ok(())
        }
        Commands::CheckAccess => {
            let source = store.spreadsheet_title(&cfg.source_spreadsheet_id)?;
            println!("Source spreadsheet:  '{}' ({})", source, cfg.source_spreadsheet_id);
            let publish = store.spreadsheet_title(&cfg.publish_spreadsheet_id)?;
            println!("Publish spreadsheet: '{}' ({})", publish, cfg.publish_spreadsheet_id);
            println!("Access OK.");
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
