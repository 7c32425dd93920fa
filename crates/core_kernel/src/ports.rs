//! Ports and Adapters Infrastructure
//!
//! The billing domain talks to the clinic's REST API through a port trait
//! defined in `domain_billing`. Adapters (the HTTP client, the in-memory
//! mock) implement it and report failures through `PortError`.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │   BillingDesk / Recorder     │
//! └──────────────────────────────┘
//!                │
//!                ▼
//! ┌──────────────────────────────┐
//! │        BillingPort           │
//! └──────────────────────────────┘
//!        ▲                ▲
//!  ┌─────┴──────┐   ┌─────┴──────┐
//!  │ HTTP client│   │  In-memory │
//!  │ (reqwest)  │   │    mock    │
//!  └────────────┘   └────────────┘
//! ```

use std::fmt;
use thiserror::Error;

/// Error type for port operations
///
/// A unified error type that all port implementations use, so callers
/// translate remote failures into user-visible messages in one place.
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: String,
        id: String,
    },

    /// The remote side rejected the request as invalid
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// The operation conflicts with existing data
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
    },

    /// Connection to the remote system failed
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The operation timed out
    #[error("Timeout after {duration_ms}ms: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
    },

    /// Authentication or authorization failed
    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
    },

    /// Rate limit exceeded
    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        retry_after_secs: u64,
    },

    /// The remote system is unavailable
    #[error("Service unavailable: {service}")]
    ServiceUnavailable {
        service: String,
    },

    /// A response body could not be decoded
    #[error("Transformation error: {message}")]
    Transformation {
        message: String,
    },

    /// An internal error occurred
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PortError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Creates a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        PortError::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a Transformation error
    pub fn transformation(message: impl Into<String>) -> Self {
        PortError::Transformation {
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Short message suitable for a toast or status line
    pub fn user_message(&self) -> String {
        match self {
            PortError::NotFound { entity_type, .. } => format!("{} not found", entity_type),
            PortError::Validation { message, .. } | PortError::Conflict { message } => message.clone(),
            PortError::Unauthorized { .. } => "Your session has expired. Please log in again.".to_string(),
            PortError::RateLimited { retry_after_secs } => {
                format!("Too many requests. Try again in {} seconds.", retry_after_secs)
            }
            PortError::Connection { .. }
            | PortError::Timeout { .. }
            | PortError::ServiceUnavailable { .. } => {
                "The billing server could not be reached. Please try again.".to_string()
            }
            PortError::Transformation { .. } | PortError::Internal { .. } => {
                "Something went wrong while talking to the billing server.".to_string()
            }
        }
    }
}

/// Marker trait for all domain ports
///
/// All port traits extend this marker so they are thread-safe and can be
/// shared across async tasks.
pub trait DomainPort: Send + Sync + 'static {}
