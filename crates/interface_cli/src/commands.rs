//! Command-line surface and command execution

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{debug, info};

use core_kernel::{Clock, DoctorId, Money, PatientId, TestRequestId, UserId};
use domain_billing::{
    BillingDesk, ConsultationFeeRequest, PartialPaymentInput, Patient, PaymentMethod,
    RegistrationFeeRequest, Screen, ServiceCharge, ServiceChargesRequest, SessionContext,
};

use crate::error::CliError;
use crate::output::{self, OutputFormat};

/// Front-desk billing for the clinic
#[derive(Debug, Parser)]
#[command(name = "clinic-billing", version, about)]
pub struct Cli {
    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List patients with their billing status
    Patients {
        /// Label set to use: billing or notification
        #[arg(long, default_value = "billing")]
        screen: Screen,
    },

    /// Show unpaid patients and follow-up bills
    Pending,

    /// Collect everything a patient owes
    PayFull {
        #[arg(long)]
        patient: PatientId,
        #[arg(long, default_value = "cash")]
        method: PaymentMethod,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Collect part of a patient's balance, split by category
    PayPartial {
        #[arg(long)]
        patient: PatientId,
        #[arg(long)]
        consultation: Option<Money>,
        #[arg(long)]
        registration: Option<Money>,
        #[arg(long)]
        service: Option<Money>,
        #[arg(long, default_value = "cash")]
        method: PaymentMethod,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Bill a consultation fee
    ConsultationFee {
        #[arg(long)]
        patient: PatientId,
        #[arg(long)]
        doctor: DoctorId,
        #[arg(long)]
        amount: Money,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Bill a registration fee, optionally with service charges
    RegistrationFee {
        #[arg(long)]
        patient: PatientId,
        #[arg(long = "fee")]
        registration_fee: Money,
        #[arg(long, default_value = "0")]
        service_charges: Money,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Bill itemized services, e.g. --service "ECG=300"
    ServiceCharges {
        #[arg(long)]
        patient: PatientId,
        #[arg(long)]
        doctor: Option<DoctorId>,
        #[arg(long = "service", value_parser = parse_service, required = true)]
        services: Vec<ServiceCharge>,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Generate an invoice
    Invoice {
        #[arg(long)]
        patient: PatientId,
    },

    /// Download a lab report PDF
    Report {
        #[arg(long)]
        request: TestRequestId,
        #[arg(long)]
        out: PathBuf,
    },
}

/// Parses `NAME=AMOUNT`
pub fn parse_service(value: &str) -> Result<ServiceCharge, String> {
    let (name, amount) = value
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=AMOUNT, got '{}'", value))?;
    let amount: Money = amount
        .parse()
        .map_err(|e| format!("invalid amount for '{}': {}", name.trim(), e))?;
    Ok(ServiceCharge::new(name.trim(), amount))
}

/// Executes commands against a billing desk
pub struct Runner {
    desk: BillingDesk,
    clock: Arc<dyn Clock>,
    operator: UserId,
    format: OutputFormat,
}

impl Runner {
    pub fn new(desk: BillingDesk, clock: Arc<dyn Clock>, operator: UserId, format: OutputFormat) -> Self {
        Self {
            desk,
            clock,
            operator,
            format,
        }
    }

    pub fn desk(&self) -> &BillingDesk {
        &self.desk
    }

    /// Runs one command, writing results to `out`
    pub async fn run(&self, command: Command, out: &mut dyn Write) -> Result<(), CliError> {
        match command {
            Command::Patients { screen } => {
                self.desk.refresh_patients().await?;
                let rows = self.desk.statuses(screen).await;
                debug!(rows = rows.len(), ?screen, "Listing patients");
                output::statuses(out, self.format, &rows)
            }

            Command::Pending => {
                self.desk.refresh_all().await?;
                let mut session = SessionContext::new();
                session.login(self.operator.clone(), self.clock.now());
                let digest = self.desk.pending_notice(&mut session).await;
                output::digest(out, self.format, digest.as_ref())
            }

            Command::PayFull {
                patient,
                method,
                notes,
            } => {
                self.desk.refresh_patients().await?;
                let updated = self.desk.record_full_payment(&patient, method, notes).await?;
                self.outcome(out, "Payment recorded", &updated)
            }

            Command::PayPartial {
                patient,
                consultation,
                registration,
                service,
                method,
                notes,
            } => {
                let entered = PartialPaymentInput {
                    consultation,
                    registration,
                    service,
                };
                if entered == PartialPaymentInput::default() {
                    return Err(CliError::InvalidArgument(
                        "enter an amount for at least one of --consultation, --registration, --service".to_string(),
                    ));
                }
                self.desk.refresh_patients().await?;
                let updated = self
                    .desk
                    .record_partial_payment(&patient, &entered, method, notes)
                    .await?;
                self.outcome(out, "Partial payment recorded", &updated)
            }

            Command::ConsultationFee {
                patient,
                doctor,
                amount,
                notes,
            } => {
                let mut request = ConsultationFeeRequest::new(patient, doctor, amount);
                if let Some(notes) = notes {
                    request = request.with_notes(notes);
                }
                let updated = self.desk.create_consultation_fee(&request).await?;
                self.outcome(out, "Consultation fee billed", &updated)
            }

            Command::RegistrationFee {
                patient,
                registration_fee,
                service_charges,
                notes,
            } => {
                let mut request = RegistrationFeeRequest::new(patient, registration_fee, service_charges);
                if let Some(notes) = notes {
                    request = request.with_notes(notes);
                }
                let updated = self.desk.create_registration_fee(&request).await?;
                self.outcome(out, "Registration fee billed", &updated)
            }

            Command::ServiceCharges {
                patient,
                doctor,
                services,
                notes,
            } => {
                let mut request = ServiceChargesRequest::new(patient, services);
                if let Some(doctor) = doctor {
                    request = request.with_doctor(doctor);
                }
                if let Some(notes) = notes {
                    request = request.with_notes(notes);
                }
                let updated = self.desk.create_service_charges(&request).await?;
                self.outcome(out, "Service charges billed", &updated)
            }

            Command::Invoice { patient } => {
                let invoice = self.desk.generate_invoice(&patient).await?;
                output::invoice(out, self.format, &invoice)
            }

            Command::Report { request, out: path } => {
                let bytes = self.desk.download_report(&request).await?;
                tokio::fs::write(&path, &bytes).await?;
                info!(request_id = %request, path = %path.display(), bytes = bytes.len(), "Report saved");
                match self.format {
                    OutputFormat::Json => {
                        serde_json::to_writer(&mut *out, &serde_json::json!({
                            "requestId": request,
                            "path": path,
                            "bytes": bytes.len(),
                        }))?;
                        writeln!(out)?;
                    }
                    OutputFormat::Table => {
                        writeln!(out, "Saved report to {} ({} bytes)", path.display(), bytes.len())?;
                    }
                }
                Ok(())
            }
        }
    }

    fn outcome(&self, out: &mut dyn Write, message: &str, patient: &Patient) -> Result<(), CliError> {
        let summary = self
            .desk
            .classifier()
            .classify_patient(patient, self.clock.now());
        output::patient_outcome(out, self.format, message, patient, &summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_service() {
        let charge = parse_service("Blood test = 450").unwrap();
        assert_eq!(charge.name, "Blood test");
        assert_eq!(charge.amount, Money::from_major(450));

        assert!(parse_service("ECG").is_err());
        assert!(parse_service("ECG=abc").is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
