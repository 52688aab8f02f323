//! Advisor entity
//!
//! Advisors are external consultants identified by a code (`A001`). Their
//! areas of expertise are stored as a list, but older records carry a single
//! comma-separated string; both shapes are accepted when parsing.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

use super::entity::{require_text, Entity, EntityKind, EntityStatus};
use super::errors::DomainError;
use super::newtypes::{AdvisorCode, CompanyId, EntityKey, RecordKey};

/// An advisor working with one or more companies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advisor {
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "codigo")]
    pub code: Option<AdvisorCode>,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "direccion")]
    pub address: String,
    #[serde(default, alias = "titulacion")]
    pub degree: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "telefono")]
    pub phone: Option<String>,
    #[serde(
        default,
        alias = "areasExperiencia",
        deserialize_with = "deserialize_expertise"
    )]
    pub areas_expertise: Vec<String>,
    #[serde(default, alias = "empresas")]
    pub companies: BTreeSet<CompanyId>,
    #[serde(default, alias = "estado")]
    pub status: EntityStatus,
}

impl Advisor {
    pub fn new(name: impl Into<String>, degree: impl Into<String>, areas: &[&str]) -> Self {
        Self {
            code: None,
            name: name.into(),
            address: String::new(),
            degree: degree.into(),
            email: None,
            phone: None,
            areas_expertise: normalize_areas(areas.iter().map(|a| a.to_string())),
            companies: BTreeSet::new(),
            status: EntityStatus::Active,
        }
    }

    pub fn with_company(mut self, company: CompanyId) -> Self {
        self.companies.insert(company);
        self
    }

    /// Removes a company from the advisor; returns `true` if it was present
    pub fn drop_company(&mut self, company: &CompanyId) -> bool {
        self.companies.remove(company)
    }
}

/// Trims entries, drops blanks and removes duplicates while keeping order
pub fn normalize_areas<I>(areas: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out: Vec<String> = Vec::new();
    for area in areas {
        let area = area.trim();
        if !area.is_empty() && !out.iter().any(|a| a.eq_ignore_ascii_case(area)) {
            out.push(area.to_string());
        }
    }
    out
}

fn deserialize_expertise<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrCsv {
        List(Vec<String>),
        Csv(String),
    }

    Ok(match ListOrCsv::deserialize(deserializer)? {
        ListOrCsv::List(items) => normalize_areas(items),
        ListOrCsv::Csv(text) => normalize_areas(text.split(',').map(str::to_string)),
    })
}

impl Entity for Advisor {
    type Key = AdvisorCode;
    const KIND: EntityKind = EntityKind::Advisor;

    fn key(&self) -> Option<&AdvisorCode> {
        self.code.as_ref()
    }

    fn set_key(&mut self, key: AdvisorCode) {
        self.code = Some(key);
    }

    fn display_name(&self) -> String {
        self.name.trim().to_string()
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_text("advisor name", &self.name)?;
        require_text("degree", &self.degree)?;
        if self.areas_expertise.iter().all(|a| a.trim().is_empty()) {
            return Err(DomainError::validation(
                "advisor needs at least one area of expertise",
            ));
        }
        if let Some(email) = &self.email {
            if !email.trim().is_empty() && !email.contains('@') {
                return Err(DomainError::validation(format!(
                    "invalid email address '{}'",
                    email
                )));
            }
        }
        Ok(())
    }

    fn references(&self) -> Vec<(EntityKind, RecordKey)> {
        self.companies
            .iter()
            .map(|c| (EntityKind::Company, c.to_record_key()))
            .collect()
    }
}
