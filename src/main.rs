//! Command-line tool that builds an API model from annotated Rust sources.
//!
//! # Usage
//!
//! ```bash
//! api-model-from-source [OPTIONS] <PROJECT_PATH>
//! ```
//!
//! # Examples
//!
//! Write the model as YAML:
//! ```bash
//! api-model-from-source ./my-service -o api-model.yaml
//! ```
//!
//! Group by path, with a context path, as JSON:
//! ```bash
//! api-model-from-source ./my-service --group-by path --context-path /api -f json
//! ```
//!
//! Document types from a shared crate as well:
//! ```bash
//! api-model-from-source ./my-service --include ../shared-types -v
//! ```

use anyhow::Result;
use api_model_from_source::cli;
use clap::Parser;
use log::info;

fn main() -> Result<()> {
    // Parse once up front so the verbose flag can configure the logger before validation logs
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("API model generator starting...");

    let args = cli::parse_args_from_parsed(args)?;

    cli::run(args)?;

    info!("API model generation completed successfully");

    Ok(())
}
