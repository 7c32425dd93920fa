//! CLI parsing and command execution against the in-memory billing API

use std::sync::Arc;

use clap::Parser;

use core_kernel::{Money, TestRequestId};
use domain_billing::ports::mock::{MockBillingPort, MockCall};
use domain_billing::{PaymentMethod, ReportAccessError, Screen};
use interface_cli::commands::{Cli, Command, Runner};
use interface_cli::config::CliConfig;
use interface_cli::create_runner_with;
use interface_cli::error::CliError;
use interface_cli::output::OutputFormat;

use test_utils::{ClockFixtures, IdFixtures, PatientFixtures, RequestFixtures, TestPatientBuilder};

fn runner(port: &Arc<MockBillingPort>, format: OutputFormat) -> Runner {
    create_runner_with(
        &CliConfig::default(),
        port.clone(),
        Arc::new(ClockFixtures::clock()),
        format,
    )
}

async fn run(runner: &Runner, args: &[&str]) -> Result<String, CliError> {
    let mut argv = vec!["clinic-billing"];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();

    let mut out = Vec::new();
    runner.run(cli.command, &mut out).await?;
    Ok(String::from_utf8(out).unwrap())
}

// ============================================================================
// Parsing Tests
// ============================================================================

mod parsing_tests {
    use super::*;

    #[test]
    fn test_patients_screen_defaults_to_billing() {
        let cli = Cli::try_parse_from(["clinic-billing", "patients"]).unwrap();
        assert!(matches!(cli.command, Command::Patients { screen: Screen::ConsultationBilling }));

        let cli = Cli::try_parse_from(["clinic-billing", "patients", "--screen", "notification"]).unwrap();
        assert!(matches!(cli.command, Command::Patients { screen: Screen::PendingBillsNotification }));
    }

    #[test]
    fn test_pay_full_arguments() {
        let cli = Cli::try_parse_from([
            "clinic-billing", "--json", "pay-full", "--patient", "p1", "--method", "upi",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Command::PayFull { patient, method, notes } => {
                assert_eq!(patient.as_str(), "p1");
                assert_eq!(method, PaymentMethod::Upi);
                assert!(notes.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Cli::try_parse_from(["clinic-billing", "pay-full", "--patient", "p1", "--method", "barter"]).is_err());
        assert!(Cli::try_parse_from(["clinic-billing", "consultation-fee", "--patient", "p1", "--doctor", "d1", "--amount", "lots"]).is_err());
        assert!(Cli::try_parse_from(["clinic-billing", "service-charges", "--patient", "p1"]).is_err());
    }

    #[test]
    fn test_usage_errors_exit_with_usage_code() {
        let missing_patient = Cli::try_parse_from(["clinic-billing", "pay-full"]).unwrap_err();
        assert_eq!(CliError::from(missing_patient).exit_code(), 64);

        let unknown_command = Cli::try_parse_from(["clinic-billing", "refund"]).unwrap_err();
        assert_eq!(CliError::from(unknown_command).exit_code(), 64);

        let help = Cli::try_parse_from(["clinic-billing", "--help"]).unwrap_err();
        assert_eq!(CliError::from(help).exit_code(), 0);
    }

    #[test]
    fn test_repeated_services() {
        let cli = Cli::try_parse_from([
            "clinic-billing", "service-charges", "--patient", "p1",
            "--service", "ECG=300", "--service", "X-Ray=750.50",
        ])
        .unwrap();

        match cli.command {
            Command::ServiceCharges { services, .. } => {
                assert_eq!(services.len(), 2);
                assert_eq!(services[1].name, "X-Ray");
                assert_eq!(services[1].amount, "750.50".parse::<Money>().unwrap());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}

// ============================================================================
// Command Tests
// ============================================================================

mod command_tests {
    use super::*;

    #[tokio::test]
    async fn test_patients_table() {
        let port = Arc::new(MockBillingPort::with_patients(vec![
            TestPatientBuilder::new().with_name("Asha Rao").consultation(500, 0).build(),
        ]));

        let text = run(&runner(&port, OutputFormat::Table), &["patients"]).await.unwrap();

        assert!(text.contains("Asha Rao"));
        assert!(text.contains("Consultation Pending Payment"));
    }

    #[tokio::test]
    async fn test_patients_json() {
        let port = Arc::new(MockBillingPort::with_patients(vec![PatientFixtures::partial_consultation()]));

        let text = run(&runner(&port, OutputFormat::Json), &["patients"]).await.unwrap();
        let rows: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(rows.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_pending_lists_patients_and_requests() {
        let port = Arc::new(MockBillingPort::with_patients(vec![PatientFixtures::partial_consultation()]));
        port.set_requests(vec![RequestFixtures::billing_generated_without_billing()]).await;

        let text = run(&runner(&port, OutputFormat::Table), &["pending"]).await.unwrap();

        assert!(text.starts_with("1 patient and 1 follow-up bill pending"));
    }

    #[tokio::test]
    async fn test_pending_when_everything_is_paid() {
        let port = Arc::new(MockBillingPort::with_patients(vec![PatientFixtures::fully_paid_consultation()]));

        let text = run(&runner(&port, OutputFormat::Table), &["pending"]).await.unwrap();

        assert_eq!(text.trim(), "No pending bills");
    }

    #[tokio::test]
    async fn test_pay_full_settles_patient() {
        let port = Arc::new(MockBillingPort::with_patients(vec![PatientFixtures::unpaid_services()]));
        let patient_id = IdFixtures::patient_id().to_string();

        let text = run(
            &runner(&port, OutputFormat::Table),
            &["pay-full", "--patient", &patient_id, "--method", "card"],
        )
        .await
        .unwrap();

        assert!(text.contains("Payment recorded"));
        assert!(text.contains("All Paid"));
    }

    #[tokio::test]
    async fn test_pay_partial_requires_an_amount() {
        let port = Arc::new(MockBillingPort::with_patients(vec![PatientFixtures::unpaid_services()]));

        let err = run(&runner(&port, OutputFormat::Table), &["pay-partial", "--patient", "p1"])
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::InvalidArgument(_)));
        assert_eq!(err.exit_code(), 64);
        assert!(port.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_pay_partial_over_outstanding_is_rejected() {
        let patient = TestPatientBuilder::new().with_id("p9").consultation(400, 0).build();
        let port = Arc::new(MockBillingPort::with_patients(vec![patient]));

        let err = run(
            &runner(&port, OutputFormat::Table),
            &["pay-partial", "--patient", "p9", "--consultation", "500"],
        )
        .await
        .unwrap_err();

        assert_eq!(err.exit_code(), 65);
        assert!(err.user_message().contains("cannot exceed"));
        assert_eq!(port.calls().await, vec![MockCall::FetchPatients]);
    }

    #[tokio::test]
    async fn test_consultation_fee() {
        let port = Arc::new(MockBillingPort::with_patients(vec![PatientFixtures::established_without_billing()]));
        let patient_id = IdFixtures::patient_id().to_string();
        let doctor_id = IdFixtures::doctor_id().to_string();

        let text = run(
            &runner(&port, OutputFormat::Table),
            &["consultation-fee", "--patient", &patient_id, "--doctor", &doctor_id, "--amount", "600"],
        )
        .await
        .unwrap();

        assert!(text.contains("Consultation fee billed"));
        assert!(text.contains("Consultation Pending Payment"));
    }

    #[tokio::test]
    async fn test_invoice_table() {
        let port = Arc::new(MockBillingPort::with_patients(vec![PatientFixtures::partial_consultation()]));
        let patient_id = IdFixtures::patient_id().to_string();

        let text = run(&runner(&port, OutputFormat::Table), &["invoice", "--patient", &patient_id])
            .await
            .unwrap();

        assert!(text.contains("Balance due"));
        assert!(text.contains("₹300.00"));
    }

    #[tokio::test]
    async fn test_report_saved_to_file() {
        let port = Arc::new(MockBillingPort::new());
        port.set_report(TestRequestId::new("t1"), Ok(b"%PDF-1.4".to_vec())).await;
        let path = std::env::temp_dir().join(format!("clinic-billing-report-{}.pdf", std::process::id()));
        let path_arg = path.to_string_lossy().to_string();

        let text = run(
            &runner(&port, OutputFormat::Table),
            &["report", "--request", "t1", "--out", &path_arg],
        )
        .await
        .unwrap();

        assert!(text.contains("Saved report"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4");
        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_locked_report_message() {
        let port = Arc::new(MockBillingPort::new());
        port.set_report(
            TestRequestId::new("t2"),
            Err(ReportAccessError::PartialPaymentRestriction { message: None }),
        )
        .await;

        let err = run(
            &runner(&port, OutputFormat::Table),
            &["report", "--request", "t2", "--out", "unused.pdf"],
        )
        .await
        .unwrap_err();

        assert!(err.user_message().contains("fully paid"));
    }
}
