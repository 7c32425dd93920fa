//! Clinic Billing Command-Line Interface
//!
//! A thin front end over `domain_billing::BillingDesk` for the reception
//! desk: list patients with their billing status, show pending bills,
//! record payments, bill fees and fetch invoices and lab reports.
//!
//! # Modules
//!
//! - `config`: layered configuration (file, `CLINIC_*` environment)
//! - `telemetry`: tracing subscriber setup
//! - `commands`: clap definitions and the command runner
//! - `output`: table and JSON rendering
//! - `error`: CLI error type and exit codes

pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod telemetry;

use std::sync::Arc;

use core_kernel::{Clock, SystemClock, UserId};
use domain_billing::{BillingDesk, BillingPort};
use infra_http::HttpBillingClient;

use crate::commands::Runner;
use crate::config::CliConfig;
use crate::error::CliError;
use crate::output::OutputFormat;

/// Builds a runner against the configured billing API
pub fn create_runner(config: &CliConfig, format: OutputFormat) -> Result<Runner, CliError> {
    let port: Arc<dyn BillingPort> = Arc::new(HttpBillingClient::new(config.http_config())?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    Ok(create_runner_with(config, port, clock, format))
}

/// Builds a runner on an explicit port and clock
pub fn create_runner_with(
    config: &CliConfig,
    port: Arc<dyn BillingPort>,
    clock: Arc<dyn Clock>,
    format: OutputFormat,
) -> Runner {
    let desk = BillingDesk::new(port, clock.clone(), config.classifier());
    Runner::new(desk, clock, UserId::new(config.operator.clone()), format)
}
