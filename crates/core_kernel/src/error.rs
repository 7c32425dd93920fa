//! Errors raised while parsing or transitioning kernel values

use thiserror::Error;

/// Core error type for the kernel
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A free-text label did not match any known value
    #[error("Unknown {kind}: {value}")]
    UnknownLabel { kind: &'static str, value: String },

    #[error("{0} id must not be empty")]
    EmptyId(&'static str),

    /// A billing entry was asked to move backwards in its payment lifecycle
    #[error("Cannot transition billing entry from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

impl CoreError {
    pub fn unknown_label(kind: &'static str, value: impl Into<String>) -> Self {
        CoreError::UnknownLabel {
            kind,
            value: value.into(),
        }
    }

    pub fn invalid_transition(from: impl std::fmt::Debug, to: impl std::fmt::Debug) -> Self {
        CoreError::InvalidTransition {
            from: format!("{:?}", from),
            to: format!("{:?}", to),
        }
    }
}
