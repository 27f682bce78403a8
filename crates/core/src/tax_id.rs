//! Indian tax identifiers (GSTIN and PAN).
//!
//! Both are normalized to upper case before validation.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

static GSTIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{2}[A-Z]{5}[0-9]{4}[A-Z]{1}[1-9A-Z]{1}Z[0-9A-Z]{1}$").expect("GSTIN pattern is a valid regex")
});

static PAN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]{5}[0-9]{4}[A-Z]{1}$").expect("PAN pattern is a valid regex")
});

/// 15-character GST identification number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Gstin(String);

impl Gstin {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let value = raw.trim().to_uppercase();
        if GSTIN_PATTERN.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(DomainError::validation(format!("invalid GSTIN format: {raw}")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two-digit state code prefix.
    pub fn state_code(&self) -> &str {
        &self.0[..2]
    }

    /// The PAN embedded at positions 3..=12.
    pub fn pan(&self) -> Pan {
        Pan(self.0[2..12].to_string())
    }
}

/// 10-character permanent account number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pan(String);

impl Pan {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let value = raw.trim().to_uppercase();
        if PAN_PATTERN.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(DomainError::validation(format!("invalid PAN format: {raw}")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for Gstin {}
impl ValueObject for Pan {}

macro_rules! string_value {
    ($t:ty) => {
        impl TryFrom<String> for $t {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                <$t>::parse(&value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_value!(Gstin);
string_value!(Pan);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gstin_is_upper_cased_before_matching() {
        let gstin = Gstin::parse("29abcde1234f1z5").unwrap();
        assert_eq!(gstin.as_str(), "29ABCDE1234F1Z5");
        assert_eq!(gstin.state_code(), "29");
        assert_eq!(gstin.pan().as_str(), "ABCDE1234F");
    }

    #[test]
    fn gstin_requires_z_in_fourteenth_position() {
        assert!(Gstin::parse("29ABCDE1234F1X5").is_err());
    }

    #[test]
    fn gstin_entity_code_cannot_be_zero() {
        assert!(Gstin::parse("29ABCDE1234F0Z5").is_err());
    }

    #[test]
    fn pan_shape_is_enforced() {
        assert!(Pan::parse("abcde1234f").is_ok());
        assert!(Pan::parse("ABCDE12345").is_err());
        assert!(Pan::parse("").is_err());
    }

    #[test]
    fn serde_rejects_malformed_values() {
        let ok: Result<Pan, _> = serde_json::from_str("\"ABCDE1234F\"");
        assert!(ok.is_ok());
        let bad: Result<Pan, _> = serde_json::from_str("\"nope\"");
        assert!(bad.is_err());
    }
}
