//! Clinic Billing - Front-desk CLI
//!
//! # Usage
//!
//! ```bash
//! # Patients and their billing status
//! clinic-billing patients --screen notification
//!
//! # Collect a full payment
//! CLINIC_AUTH_TOKEN=... clinic-billing pay-full --patient 65f1c2 --method upi
//!
//! # Save a lab report
//! clinic-billing report --request 66a0d1 --out report.pdf
//! ```
//!
//! Configuration keys are documented in `interface_cli::config`.

use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use interface_cli::commands::Cli;
use interface_cli::config::CliConfig;
use interface_cli::error::CliError;
use interface_cli::output::OutputFormat;
use interface_cli::{create_runner, telemetry};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            e.print().ok();
            return ExitCode::from(CliError::from(e).exit_code() as u8);
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = ?e, "Command failed");
            match e.downcast_ref::<CliError>() {
                Some(cli_error) => {
                    eprintln!("error: {}", cli_error.user_message());
                    ExitCode::from(cli_error.exit_code() as u8)
                }
                None => {
                    eprintln!("error: {:#}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::load().context("failed to load configuration")?;
    telemetry::init_tracing(&config.log_level, config.log_format);

    tracing::debug!(api_base_url = %config.api_base_url, scope = ?config.consultation_scope, "Configuration loaded");

    let runner = create_runner(&config, OutputFormat::from_flag(cli.json))
        .context("failed to create the billing API client")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    runner.run(cli.command, &mut out).await?;
    out.flush().context("failed to write output")?;
    Ok(())
}
