//! Rendering of command results as text tables or JSON

use std::io::Write;

use serde::Serialize;

use domain_billing::{BillingSummary, Invoice, Patient, PatientStatusRow, PendingBillsDigest, Screen};

use crate::error::CliError;

/// Output format selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Table
        }
    }
}

fn json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let cut: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

/// Patient list
pub fn statuses(
    out: &mut dyn Write,
    format: OutputFormat,
    rows: &[PatientStatusRow],
) -> Result<(), CliError> {
    if format == OutputFormat::Json {
        return json(out, rows);
    }

    if rows.is_empty() {
        writeln!(out, "No patients")?;
        return Ok(());
    }

    writeln!(out, "{:<26} {:<12} {:<32} {:>12}", "PATIENT", "UHID", "STATUS", "OUTSTANDING")?;
    for row in rows {
        writeln!(
            out,
            "{:<26} {:<12} {:<32} {:>12}",
            truncate(&row.name, 26),
            row.uh_id.as_deref().unwrap_or("-"),
            row.label,
            row.outstanding.to_string()
        )?;
    }
    Ok(())
}

/// Pending-bills digest
pub fn digest(
    out: &mut dyn Write,
    format: OutputFormat,
    digest: Option<&PendingBillsDigest>,
) -> Result<(), CliError> {
    let Some(digest) = digest.filter(|d| !d.is_empty()) else {
        return match format {
            OutputFormat::Json => json(out, &serde_json::json!({ "patients": [], "requests": [] })),
            OutputFormat::Table => {
                writeln!(out, "No pending bills")?;
                Ok(())
            }
        };
    };

    if format == OutputFormat::Json {
        return json(out, digest);
    }

    writeln!(out, "{}", digest.headline())?;
    if !digest.patients.is_empty() {
        writeln!(out)?;
        writeln!(out, "{:<26} {:<32} {:>12}", "PATIENT", "STATUS", "OUTSTANDING")?;
        for patient in &digest.patients {
            writeln!(
                out,
                "{:<26} {:<32} {:>12}",
                truncate(&patient.name, 26),
                patient.label,
                patient.outstanding.total.to_string()
            )?;
        }
    }
    if !digest.requests.is_empty() {
        writeln!(out)?;
        writeln!(out, "{:<26} {:<32} {:>12}", "FOLLOW-UP", "TEST", "OUTSTANDING")?;
        for request in &digest.requests {
            writeln!(
                out,
                "{:<26} {:<32} {:>12}",
                truncate(&request.name, 26),
                request.test_type.as_deref().unwrap_or("-"),
                request.outstanding.to_string()
            )?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct PatientOutcome<'a> {
    message: &'a str,
    patient: &'a Patient,
    summary: &'a BillingSummary,
}

/// Result of a payment or charge
pub fn patient_outcome(
    out: &mut dyn Write,
    format: OutputFormat,
    message: &str,
    patient: &Patient,
    summary: &BillingSummary,
) -> Result<(), CliError> {
    if format == OutputFormat::Json {
        return json(out, &PatientOutcome { message, patient, summary });
    }

    writeln!(out, "{}: {}", message, patient.name)?;
    writeln!(
        out,
        "Status: {} (outstanding {})",
        summary.status.label(Screen::ConsultationBilling),
        summary.outstanding.total
    )?;
    Ok(())
}

/// Invoice
pub fn invoice(out: &mut dyn Write, format: OutputFormat, invoice: &Invoice) -> Result<(), CliError> {
    if format == OutputFormat::Json {
        return json(out, invoice);
    }

    writeln!(out, "Invoice {}", invoice.invoice_number.as_deref().unwrap_or("(unnumbered)"))?;
    if let Some(patient) = &invoice.patient {
        writeln!(out, "Patient: {}", patient.name)?;
    }
    writeln!(out)?;
    writeln!(out, "{:<32} {:>12} {:>12}", "ITEM", "AMOUNT", "PAID")?;
    for item in &invoice.items {
        let label = item.description.as_deref().unwrap_or(item.entry_type.as_str());
        writeln!(
            out,
            "{:<32} {:>12} {:>12}",
            truncate(label, 32),
            item.amount.to_string(),
            item.paid_amount.to_string()
        )?;
    }
    writeln!(out)?;
    writeln!(out, "{:<32} {:>12}", "Total", invoice.total_amount().to_string())?;
    writeln!(out, "{:<32} {:>12}", "Paid", invoice.paid_amount().to_string())?;
    writeln!(out, "{:<32} {:>12}", "Balance due", invoice.balance_due().to_string())?;
    Ok(())
}
