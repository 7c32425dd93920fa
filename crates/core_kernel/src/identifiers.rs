//! Strongly-typed identifiers for records owned by the clinic API
//!
//! The remote API issues document ids as opaque strings. Newtype wrappers
//! keep patient, doctor and request ids from being mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

macro_rules! define_id {
    ($name:ident, $entity:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an identifier issued by the remote API
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the identifier and returns the inner string
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(CoreError::EmptyId($entity));
                }
                Ok(Self(trimmed.to_string()))
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(PatientId, "Patient");
define_id!(DoctorId, "Doctor");
define_id!(EntryId, "BillingEntry");
define_id!(BillingRequestId, "BillingRequest");
define_id!(TestRequestId, "TestRequest");
define_id!(UserId, "User");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_raw_id() {
        let id = PatientId::new("64f1c0a2b9e1");
        assert_eq!(id.to_string(), "64f1c0a2b9e1");
    }

    #[test]
    fn test_parse_rejects_blank() {
        assert!("   ".parse::<DoctorId>().is_err());
        assert_eq!(" d-1 ".parse::<DoctorId>().unwrap(), DoctorId::new("d-1"));
    }

    #[test]
    fn test_serde_transparent() {
        let id: PatientId = serde_json::from_str("\"p-42\"").unwrap();
        assert_eq!(id.as_str(), "p-42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"p-42\"");
    }
}
