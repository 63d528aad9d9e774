//! Strongly-typed IDs with UUID validation. Use these instead of raw strings.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

fn validate_uuid(s: &str) -> Result<String, String> {
    Uuid::parse_str(s).map_err(|e| format!("Invalid UUID: {}", e))?;
    Ok(s.to_string())
}

/// Customer ID (UUID). Validated on construction via `parse`/`from_str`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CustomerId(pub String);

/// Bank/PF entity ID (UUID). Validated on construction via `parse`/`from_str`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BankPfId(pub String);

/// Product ID (UUID). Validated on construction via `parse`/`from_str`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProductId(pub String);

/// Tariff line ID (UUID). Validated on construction via `parse`/`from_str`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TariffLineId(pub String);

/// Period record ID (UUID). Validated on construction via `parse`/`from_str`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PeriodRecordId(pub String);

macro_rules! id_serde {
    ($name:ident) => {
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
                ser.serialize_str(&self.0)
            }
        }
        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
                let s = String::deserialize(de)?;
                Self::from_str(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}
id_serde!(CustomerId);
id_serde!(BankPfId);
id_serde!(ProductId);
id_serde!(TariffLineId);
id_serde!(PeriodRecordId);

macro_rules! id_type {
    ($name:ident) => {
        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn parse(s: impl AsRef<str>) -> Result<Self, String> {
                Self::from_str(s.as_ref())
            }
        }
        impl FromStr for $name {
            type Err = String;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(validate_uuid(s)?))
            }
        }
        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}
id_type!(CustomerId);
id_type!(BankPfId);
id_type!(ProductId);
id_type!(TariffLineId);
id_type!(PeriodRecordId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_valid_uuid() {
        let id = CustomerId::parse("f27978af-e56a-4b45-aede-fb450557699a").expect("parse");
        assert_eq!(id.as_str(), "f27978af-e56a-4b45-aede-fb450557699a");
    }

    #[test]
    fn parse_rejects_non_uuid() {
        assert!(PeriodRecordId::parse("not-a-uuid").is_err());
        assert!(TariffLineId::parse("").is_err());
    }
}
