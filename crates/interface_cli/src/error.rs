//! CLI error handling

use thiserror::Error;

use core_kernel::PortError;
use domain_billing::BillingError;

/// CLI error types
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] validator::ValidationErrors),

    /// Command line rejected by the parser, or a help/version request
    #[error("{0}")]
    Usage(#[from] clap::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Billing(#[from] BillingError),

    #[error(transparent)]
    Remote(#[from] PortError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    /// Message printed to the operator
    pub fn user_message(&self) -> String {
        match self {
            CliError::Billing(e) => e.user_message(),
            CliError::Remote(e) => e.user_message(),
            other => other.to_string(),
        }
    }

    /// Process exit code
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::InvalidConfig(_) => 78,
            CliError::Usage(e) if !e.use_stderr() => 0,
            CliError::Usage(_) | CliError::InvalidArgument(_) => 64,
            CliError::Billing(e) if e.is_validation() => 65,
            CliError::Billing(_) | CliError::Remote(_) => 69,
            CliError::Io(_) | CliError::Output(_) => 74,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Money;

    #[test]
    fn test_billing_errors_use_domain_message() {
        let err = CliError::from(BillingError::NothingToPay);
        assert_eq!(err.user_message(), BillingError::NothingToPay.user_message());
        assert_eq!(err.exit_code(), 65);
    }

    #[test]
    fn test_remote_errors_are_unavailable() {
        let err = CliError::from(BillingError::Remote(PortError::connection("refused")));
        assert_eq!(err.exit_code(), 69);

        let err = CliError::from(BillingError::InvalidAmount(Money::zero()));
        assert_eq!(err.exit_code(), 65);
    }
}
