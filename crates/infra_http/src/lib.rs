//! HTTP Adapter for the Clinic Billing API
//!
//! Implements `domain_billing::BillingPort` against the clinic's REST API
//! using reqwest.
//!
//! # Error Handling
//!
//! HTTP failures are mapped to `PortError` variants:
//! - 400/422 -> `PortError::Validation` (server message)
//! - 401/403 -> `PortError::Unauthorized`
//! - 404 -> `PortError::NotFound`
//! - 409 -> `PortError::Conflict`
//! - 429 -> `PortError::RateLimited` (from `Retry-After`)
//! - 5xx -> `PortError::ServiceUnavailable`
//! - Client timeouts -> `PortError::Timeout`
//! - Connection failures -> `PortError::Connection`
//! - Undecodable bodies -> `PortError::Transformation`
//!
//! Report downloads additionally decode the server's structured refusals
//! into `ReportAccessError`.

pub mod client;
pub mod config;
pub mod envelope;
pub mod errors;

pub use client::{endpoints, HttpBillingClient};
pub use config::HttpClientConfig;
