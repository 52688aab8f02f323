//! Company entity

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{require_amount, require_text, Entity, EntityKind, EntityStatus};
use super::errors::DomainError;
use super::newtypes::{CompanyId, CountryId, EntityKey, MarketAreaId, RecordKey};

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// A company owned by the holding
///
/// An active company must belong to a country. Retired companies keep their
/// history but lose their country so that a later country with a recycled id
/// does not silently adopt them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CompanyId>,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "paisId", alias = "pais")]
    pub country: Option<CountryId>,
    #[serde(default, alias = "ciudad")]
    pub city: String,
    #[serde(default, alias = "areaMercadoId", alias = "area")]
    pub market_area: Option<MarketAreaId>,
    #[serde(default, alias = "estado")]
    pub status: EntityStatus,
    #[serde(default, alias = "facturacion")]
    pub revenue: f64,
    #[serde(default, alias = "numeroVendedores", alias = "vendedores")]
    pub seller_count: u32,
    #[serde(default = "today", alias = "fechaEntrada", alias = "fechaIngreso")]
    pub joined_at: NaiveDate,
    #[serde(default, alias = "descripcion")]
    pub description: String,
}

impl Company {
    pub fn new(name: impl Into<String>, country: CountryId, city: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            country: Some(country),
            city: city.into(),
            market_area: None,
            status: EntityStatus::Active,
            revenue: 0.0,
            seller_count: 0,
            joined_at: today(),
            description: String::new(),
        }
    }

    pub fn with_revenue(mut self, revenue: f64) -> Self {
        self.revenue = revenue;
        self
    }

    pub fn with_market_area(mut self, area: MarketAreaId) -> Self {
        self.market_area = Some(area);
        self
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Marks the company inactive and detaches it from its country
    pub fn retire(&mut self) {
        self.status = EntityStatus::Inactive;
        self.country = None;
    }
}

impl Entity for Company {
    type Key = CompanyId;
    const KIND: EntityKind = EntityKind::Company;

    fn key(&self) -> Option<&CompanyId> {
        self.id.as_ref()
    }

    fn set_key(&mut self, key: CompanyId) {
        self.id = Some(key);
    }

    fn display_name(&self) -> String {
        self.name.trim().to_string()
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_text("company name", &self.name)?;
        require_amount("revenue", self.revenue)?;
        if self.is_active() && self.country.is_none() {
            return Err(DomainError::validation(format!(
                "active company '{}' must belong to a country",
                self.name.trim()
            )));
        }
        Ok(())
    }

    fn references(&self) -> Vec<(EntityKind, RecordKey)> {
        let mut refs = Vec::new();
        if let Some(country) = &self.country {
            refs.push((EntityKind::Country, country.to_record_key()));
        }
        if let Some(area) = &self.market_area {
            refs.push((EntityKind::MarketArea, area.to_record_key()));
        }
        refs
    }
}
