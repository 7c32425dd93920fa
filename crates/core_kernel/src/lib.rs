//! Core Kernel - Foundational types for the clinic billing system
//!
//! This crate provides the building blocks shared by the billing domain,
//! the HTTP adapter and the command-line front end:
//! - Money amounts with precise decimal arithmetic
//! - String identifiers for records owned by the remote clinic API
//! - A clock abstraction so time-dependent rules can be tested
//! - The port error type every adapter reports through

pub mod money;
pub mod clock;
pub mod identifiers;
pub mod ports;
pub mod error;

pub use money::{Money, MoneyError};
pub use clock::{Clock, FixedClock, SystemClock};
pub use identifiers::{
    PatientId, DoctorId, EntryId, BillingRequestId, TestRequestId, UserId,
};
pub use ports::{DomainPort, PortError};
pub use error::CoreError;
