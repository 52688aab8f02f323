//! Country entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{require_amount, require_text, Entity, EntityKind};
use super::errors::DomainError;
use super::newtypes::CountryId;

/// A country where holding companies operate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CountryId>,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(default)]
    pub capital: String,
    /// Gross domestic product
    #[serde(default, alias = "pib")]
    pub gdp: f64,
    #[serde(default, alias = "habitantes")]
    pub population: u64,
    #[serde(default = "Utc::now", alias = "fechaRegistro")]
    pub registered_at: DateTime<Utc>,
}

impl Country {
    pub fn new(name: impl Into<String>, capital: impl Into<String>, gdp: f64, population: u64) -> Self {
        Self {
            id: None,
            name: name.into(),
            capital: capital.into(),
            gdp,
            population,
            registered_at: Utc::now(),
        }
    }
}

impl Entity for Country {
    type Key = CountryId;
    const KIND: EntityKind = EntityKind::Country;

    fn key(&self) -> Option<&CountryId> {
        self.id.as_ref()
    }

    fn set_key(&mut self, key: CountryId) {
        self.id = Some(key);
    }

    fn display_name(&self) -> String {
        self.name.trim().to_string()
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_text("country name", &self.name)?;
        require_amount("gdp", self.gdp)
    }

    fn unique_name(&self) -> Option<&str> {
        Some(&self.name)
    }
}
