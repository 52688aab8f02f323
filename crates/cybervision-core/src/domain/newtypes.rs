//! Domain identifiers
//!
//! Every collection is keyed either by a numeric id (countries, companies,
//! recruitments, advisories, market areas) or by a human-readable code
//! (advisors `A001`, sellers `V001`). Each key has its own newtype so that a
//! `CompanyId` can never be passed where a `CountryId` is expected, and
//! [`RecordKey`] is the untyped form that crosses the storage ports.

use std::fmt::{self, Display, Formatter};
use std::hash::Hash;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::DomainError;

// ============================================================================
// Untyped record key
// ============================================================================

/// Key of a stored record as seen by the cache and remote adapters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordKey {
    /// Sequential numeric id
    Numeric(u64),
    /// Prefixed code such as `A001`
    Code(String),
}

impl RecordKey {
    /// Reads a key out of a JSON value (number or non-empty string)
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().map(RecordKey::Numeric),
            Value::String(s) if !s.trim().is_empty() => Some(RecordKey::Code(s.trim().to_string())),
            _ => None,
        }
    }

    /// Converts the key back into the JSON value stored in the key field
    pub fn to_value(&self) -> Value {
        match self {
            RecordKey::Numeric(n) => Value::from(*n),
            RecordKey::Code(code) => Value::from(code.as_str()),
        }
    }
}

impl Display for RecordKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Numeric(n) => write!(f, "{}", n),
            RecordKey::Code(code) => write!(f, "{}", code),
        }
    }
}

impl FromStr for RecordKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DomainError::InvalidId("key cannot be empty".to_string()));
        }
        Ok(match s.parse::<u64>() {
            Ok(n) => RecordKey::Numeric(n),
            Err(_) => RecordKey::Code(s.to_string()),
        })
    }
}

impl From<u64> for RecordKey {
    fn from(value: u64) -> Self {
        RecordKey::Numeric(value)
    }
}

// ============================================================================
// Typed keys
// ============================================================================

/// Behaviour shared by all typed entity keys
pub trait EntityKey:
    Clone + fmt::Debug + Eq + Hash + Display + FromStr<Err = DomainError> + Send + Sync + 'static
{
    /// Untyped form used by the storage ports
    fn to_record_key(&self) -> RecordKey;

    /// Parses an untyped key, rejecting keys of the wrong shape
    fn from_record_key(key: &RecordKey) -> Result<Self, DomainError>;

    /// Allocates the next key after every key in `existing`
    ///
    /// Used when a record has to be created locally because the backend could
    /// not assign one. Fails when the largest existing key has no successor.
    fn next_after<'a, I>(existing: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = &'a Self>,
        Self: 'a;
}

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            #[must_use]
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            #[must_use]
            pub const fn value(&self) -> u64 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<u64>().map(Self).map_err(|_| {
                    DomainError::InvalidId(format!(
                        "{} must be a positive integer, got '{}'",
                        stringify!($name),
                        s
                    ))
                })
            }
        }

        impl EntityKey for $name {
            fn to_record_key(&self) -> RecordKey {
                RecordKey::Numeric(self.0)
            }

            fn from_record_key(key: &RecordKey) -> Result<Self, DomainError> {
                match key {
                    RecordKey::Numeric(n) => Ok(Self(*n)),
                    RecordKey::Code(code) => code.parse(),
                }
            }

            fn next_after<'a, I>(existing: I) -> Result<Self, DomainError>
            where
                I: IntoIterator<Item = &'a Self>,
                Self: 'a,
            {
                let max = existing.into_iter().map(|id| id.0).max().unwrap_or(0);
                max.checked_add(1).map(Self).ok_or_else(|| {
                    DomainError::InvalidId(format!(
                        "no {} left after {}",
                        stringify!($name),
                        max
                    ))
                })
            }
        }
    };
}

macro_rules! code_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Letter that prefixes locally allocated codes
            pub const PREFIX: &'static str = $prefix;

            /// Creates a code, trimming surrounding whitespace
            pub fn new(code: impl Into<String>) -> Result<Self, DomainError> {
                let code = code.into();
                let trimmed = code.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::InvalidId(format!(
                        "{} cannot be empty",
                        stringify!($name)
                    )));
                }
                Ok(Self(trimmed.to_string()))
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Numeric suffix of a code carrying this prefix (`V007` -> 7)
            fn sequence(&self) -> Option<u64> {
                self.0.strip_prefix(Self::PREFIX)?.parse().ok()
            }
        }

        impl TryFrom<String> for $name {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(code: $name) -> Self {
                code.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl EntityKey for $name {
            fn to_record_key(&self) -> RecordKey {
                RecordKey::Code(self.0.clone())
            }

            fn from_record_key(key: &RecordKey) -> Result<Self, DomainError> {
                match key {
                    RecordKey::Code(code) => Self::new(code.clone()),
                    RecordKey::Numeric(n) => Err(DomainError::InvalidId(format!(
                        "{} expects a code, got number {}",
                        stringify!($name),
                        n
                    ))),
                }
            }

            fn next_after<'a, I>(existing: I) -> Result<Self, DomainError>
            where
                I: IntoIterator<Item = &'a Self>,
                Self: 'a,
            {
                let max = existing
                    .into_iter()
                    .filter_map(|code| code.sequence())
                    .max()
                    .unwrap_or(0);
                let next = max.checked_add(1).ok_or_else(|| {
                    DomainError::InvalidId(format!(
                        "no {} left after {}{}",
                        stringify!($name),
                        Self::PREFIX,
                        max
                    ))
                })?;
                Ok(Self(format!("{}{:03}", Self::PREFIX, next)))
            }
        }
    };
}

numeric_id!(
    /// Identifier for Country records
    CountryId
);
numeric_id!(
    /// Identifier for Company records
    CompanyId
);
numeric_id!(
    /// Identifier for MarketArea records
    MarketAreaId
);
numeric_id!(
    /// Identifier for Recruitment records
    RecruitmentId
);
numeric_id!(
    /// Identifier for Advisory records
    AdvisoryId
);

code_id!(
    /// Code identifying an advisor, e.g. `A001`
    AdvisorCode,
    "A"
);
code_id!(
    /// Code identifying a seller, e.g. `V001`
    SellerCode,
    "V"
);
