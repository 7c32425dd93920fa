//! Billing Domain - Patient Billing Status and Payment Recording
//!
//! This crate holds the clinic's billing rules, independent of any
//! presentation layer or transport.
//!
//! # Status Classification
//!
//! Every patient carries a list of billing entries (consultation,
//! registration, service, ...). The classifier normalizes each entry to
//! `Paid`, `Partial` or `Unpaid` and derives one canonical status for the
//! patient, evaluated in a fixed priority order:
//!
//! 1. New patient without a registration entry: registration fee required
//! 2. No consultation entry: consultation fee required
//! 3. Unpaid or partial consultation, then registration, then services
//! 4. Everything paid
//! 5. Anything else: pending payment
//!
//! Missing or malformed fields always degrade towards "requires payment",
//! never towards "all paid".
//!
//! # Payment Recording
//!
//! The `PaymentRecorder` validates an entered amount against the
//! classifier's outstanding breakdown before anything is sent to the
//! billing API. The `BillingDesk` service owns loaded data and re-fetches
//! after every mutation instead of applying payments optimistically.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{BillingStatusClassifier, Screen};
//!
//! let summary = BillingStatusClassifier::default().classify_patient(&patient, now);
//! println!("{}: {}", patient.name, summary.status.label(Screen::ConsultationBilling));
//! ```

pub mod entry;
pub mod patient;
pub mod request;
pub mod status;
pub mod classifier;
pub mod payment;
pub mod recorder;
pub mod charges;
pub mod invoice;
pub mod report;
pub mod notice;
pub mod ports;
pub mod services;
pub mod error;
mod lenient;

pub use entry::{BillingCategory, BillingEntry, DoctorRef, EntryStatus, EntryType};
pub use patient::Patient;
pub use request::{BillingRequest, BillingShape, PatientRef, RequestStatus};
pub use status::{BillingStatus, Screen};
pub use classifier::{
    BillingFlags, BillingStatusClassifier, BillingSummary, ConsultationScope,
    OutstandingBalance, classify_patient,
};
pub use payment::{
    FullPayment, PartialPayment, PartialPaymentInput, PaymentBreakdown, PaymentMethod,
    PaymentType, RecordPartialPaymentRequest, RecordPaymentRequest,
};
pub use recorder::PaymentRecorder;
pub use charges::{ConsultationFeeRequest, RegistrationFeeRequest, ServiceCharge, ServiceChargesRequest};
pub use invoice::Invoice;
pub use report::{ReportAccessError, ReportError};
pub use notice::{PendingBillsDigest, PendingPatient, PendingRequest, Session, SessionContext};
pub use ports::BillingPort;
pub use services::{BillingDesk, GenerationGuard, PatientStatusRow, Refresh};
pub use error::BillingError;
