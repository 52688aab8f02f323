//! Entity kinds and the common entity contract
//!
//! Each business collection is identified by an [`EntityKind`]. The
//! [`Entity`] trait ties a typed record to its kind, its key type and the
//! checks the reconciliation flow runs before anything is persisted.

use std::fmt::{self, Debug, Display, Formatter};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::hierarchy::RecruitmentForest;
use super::newtypes::{EntityKey, RecordKey};

/// Untyped record exchanged with the storage ports
pub type Record = serde_json::Value;

// ============================================================================
// EntityKind
// ============================================================================

/// The business collections managed by the holding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Country,
    Company,
    Advisor,
    Seller,
    Recruitment,
    Advisory,
    MarketArea,
}

impl EntityKind {
    /// Every kind, in dependency order (referenced kinds first)
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Country,
        EntityKind::MarketArea,
        EntityKind::Company,
        EntityKind::Advisor,
        EntityKind::Seller,
        EntityKind::Recruitment,
        EntityKind::Advisory,
    ];

    /// Name of the local cache collection holding this kind
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Country => "paises",
            EntityKind::Company => "empresas",
            EntityKind::Advisor => "asesores",
            EntityKind::Seller => "vendedores",
            EntityKind::Recruitment => "captaciones",
            EntityKind::Advisory => "asesorias",
            EntityKind::MarketArea => "areasMercado",
        }
    }

    /// Field of a record that holds its key
    pub fn key_field(&self) -> &'static str {
        match self {
            EntityKind::Advisor | EntityKind::Seller => "code",
            _ => "id",
        }
    }

    /// Capitalized label for user-facing titles
    pub fn title(&self) -> &'static str {
        match self {
            EntityKind::Country => "Country",
            EntityKind::Company => "Company",
            EntityKind::Advisor => "Advisor",
            EntityKind::Seller => "Seller",
            EntityKind::Recruitment => "Recruitment",
            EntityKind::Advisory => "Advisory",
            EntityKind::MarketArea => "Market area",
        }
    }

    /// Reads the key of an untyped record of this kind
    pub fn key_of(&self, record: &Record) -> Option<RecordKey> {
        record.get(self.key_field()).and_then(RecordKey::from_value)
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Country => "country",
            EntityKind::Company => "company",
            EntityKind::Advisor => "advisor",
            EntityKind::Seller => "seller",
            EntityKind::Recruitment => "recruitment",
            EntityKind::Advisory => "advisory",
            EntityKind::MarketArea => "market area",
        };
        write!(f, "{}", s)
    }
}

// ============================================================================
// EntityStatus
// ============================================================================

/// Activity flag shared by companies, advisors and sellers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EntityStatus {
    #[default]
    #[serde(alias = "active", alias = "Activo", alias = "Activa", alias = "ACTIVO")]
    Active,
    #[serde(
        alias = "inactive",
        alias = "Inactivo",
        alias = "Inactiva",
        alias = "INACTIVO"
    )]
    Inactive,
}

impl EntityStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, EntityStatus::Active)
    }
}

impl Display for EntityStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            EntityStatus::Active => write!(f, "active"),
            EntityStatus::Inactive => write!(f, "inactive"),
        }
    }
}

// ============================================================================
// Entity trait
// ============================================================================

/// A typed business record stored in one collection
pub trait Entity: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Key type of this collection
    type Key: EntityKey;

    /// Collection this entity lives in
    const KIND: EntityKind;

    /// Key of the record, `None` until one is assigned
    fn key(&self) -> Option<&Self::Key>;

    /// Assigns the record key
    fn set_key(&mut self, key: Self::Key);

    /// Short label for messages
    fn display_name(&self) -> String;

    /// Field-level validation run before every save
    fn validate(&self) -> Result<(), DomainError> {
        Ok(())
    }

    /// Name that must be unique within the collection (trimmed, case-insensitive)
    fn unique_name(&self) -> Option<&str> {
        None
    }

    /// Other records this one points at; each must exist before saving
    fn references(&self) -> Vec<(EntityKind, RecordKey)> {
        Vec::new()
    }

    /// Recomputes fields derived from the recruitment hierarchy
    fn derive_fields(&mut self, _forest: &RecruitmentForest) -> Result<(), DomainError> {
        Ok(())
    }

    /// Serializes into the untyped record stored by the ports
    fn to_record(&self) -> Result<Record, DomainError> {
        serde_json::to_value(self).map_err(|e| DomainError::InvalidRecord(e.to_string()))
    }

    /// Parses an untyped record, rejecting anything that does not fit the schema
    fn from_record(record: Record) -> Result<Self, DomainError> {
        serde_json::from_value(record)
            .map_err(|e| DomainError::InvalidRecord(format!("{}: {}", Self::KIND, e)))
    }

    /// Parses a record received from the backend and validates it
    ///
    /// Cached records go through [`Entity::from_record`] alone; records from
    /// outside must also satisfy [`Entity::validate`].
    fn from_checked_record(record: Record) -> Result<Self, DomainError> {
        let entity = Self::from_record(record)?;
        entity.validate()?;
        Ok(entity)
    }
}

/// Normalizes a name for uniqueness comparisons
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Rejects blank required text fields
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Rejects negative or non-finite amounts
pub(crate) fn require_amount(field: &str, value: f64) -> Result<(), DomainError> {
    if !value.is_finite() || value < 0.0 {
        return Err(DomainError::validation(format!(
            "{} must be a non-negative number, got {}",
            field, value
        )));
    }
    Ok(())
}
