//! Tender ML - Main Entry Point
//!
//! Recall-first tender bid prediction with a data preparation and review
//! routing CLI.

use clap::Parser;
use tender_ml::cli::{
    cmd_baselines, cmd_info, cmd_predict, cmd_prepare, cmd_route, cmd_train, Cli, Commands,
};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tender_ml=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            data,
            output,
            threshold,
            n_estimators,
            max_depth,
            seed,
        } => {
            cmd_train(&data, &output, threshold, n_estimators, max_depth, seed)?;
        }
        Commands::Predict {
            model,
            data,
            output,
        } => {
            cmd_predict(&model, &data, output.as_deref())?;
        }
        Commands::Route {
            model,
            data,
            output,
        } => {
            cmd_route(&model, &data, output.as_deref())?;
        }
        Commands::Baselines { data } => {
            cmd_baselines(&data)?;
        }
        Commands::Prepare {
            data,
            output,
            labelled_only,
            modeling_only,
            min_text_chars,
            min_codes,
        } => {
            cmd_prepare(
                &data,
                &output,
                labelled_only,
                modeling_only,
                min_text_chars,
                min_codes,
            )?;
        }
        Commands::Info { data, model } => {
            cmd_info(data.as_ref(), model.as_ref())?;
        }
    }

    Ok(())
}
