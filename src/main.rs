//! Heart Disease API - Main Entry Point
//!
//! Serves the prediction API, scores files offline, or opens the
//! interactive launcher when no subcommand is given.

use clap::Parser;
use heart_disease_api::cli::{Cli, Commands, cmd_form, cmd_inspect, cmd_interactive, cmd_predict, cmd_serve};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Missing .env is fine
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "heart_disease_api=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { host, port, model }) => {
            cmd_serve(host, port, model).await?;
        }
        Some(Commands::Predict { model, data, output }) => {
            cmd_predict(&model, &data, output.as_deref())?;
        }
        Some(Commands::Inspect { model }) => {
            cmd_inspect(&model)?;
        }
        Some(Commands::Form { url }) => {
            cmd_form(&url).await?;
        }
        None => {
            cmd_interactive().await?;
        }
    }

    Ok(())
}
