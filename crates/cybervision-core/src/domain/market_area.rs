//! Market area entity

use serde::{Deserialize, Serialize};

use super::entity::{require_text, Entity, EntityKind};
use super::errors::DomainError;
use super::newtypes::MarketAreaId;

/// A market segment companies and advisories are classified under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketArea {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MarketAreaId>,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "descripcion")]
    pub description: String,
}

impl MarketArea {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: description.into(),
        }
    }
}

impl Entity for MarketArea {
    type Key = MarketAreaId;
    const KIND: EntityKind = EntityKind::MarketArea;

    fn key(&self) -> Option<&MarketAreaId> {
        self.id.as_ref()
    }

    fn set_key(&mut self, key: MarketAreaId) {
        self.id = Some(key);
    }

    fn display_name(&self) -> String {
        self.name.trim().to_string()
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_text("market area name", &self.name)
    }

    fn unique_name(&self) -> Option<&str> {
        Some(&self.name)
    }
}
