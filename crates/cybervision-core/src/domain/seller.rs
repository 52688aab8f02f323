//! Seller and recruitment entities
//!
//! Sellers form a recruitment forest: each seller may name the seller who
//! recruited them. The `level` of a seller is derived from that chain (a seller
//! without recruiter is level 1) and is recomputed on every save.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{require_text, Entity, EntityKind, EntityStatus};
use super::errors::DomainError;
use super::hierarchy::RecruitmentForest;
use super::newtypes::{CompanyId, EntityKey, RecordKey, RecruitmentId, SellerCode};

fn first_level() -> u32 {
    1
}

/// A seller working for a company
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seller {
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "codigo")]
    pub code: Option<SellerCode>,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "direccion")]
    pub address: String,
    #[serde(alias = "empresaId")]
    pub company: CompanyId,
    #[serde(default, alias = "captadorCodigo", alias = "captadorId")]
    pub recruiter: Option<SellerCode>,
    #[serde(default = "Utc::now", alias = "fechaCaptacion")]
    pub recruited_at: DateTime<Utc>,
    #[serde(default = "first_level", alias = "nivel")]
    pub level: u32,
    #[serde(default, alias = "estado")]
    pub status: EntityStatus,
}

impl Seller {
    pub fn new(name: impl Into<String>, company: CompanyId) -> Self {
        Self {
            code: None,
            name: name.into(),
            address: String::new(),
            company,
            recruiter: None,
            recruited_at: Utc::now(),
            level: 1,
            status: EntityStatus::Active,
        }
    }

    pub fn recruited_by(mut self, recruiter: SellerCode) -> Self {
        self.recruiter = Some(recruiter);
        self
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

impl Entity for Seller {
    type Key = SellerCode;
    const KIND: EntityKind = EntityKind::Seller;

    fn key(&self) -> Option<&SellerCode> {
        self.code.as_ref()
    }

    fn set_key(&mut self, key: SellerCode) {
        self.code = Some(key);
    }

    fn display_name(&self) -> String {
        self.name.trim().to_string()
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_text("seller name", &self.name)?;
        if let (Some(code), Some(recruiter)) = (&self.code, &self.recruiter) {
            if code == recruiter {
                return Err(DomainError::validation(format!(
                    "seller {} cannot recruit themselves",
                    code
                )));
            }
        }
        Ok(())
    }

    fn references(&self) -> Vec<(EntityKind, RecordKey)> {
        let mut refs = vec![(EntityKind::Company, self.company.to_record_key())];
        if let Some(recruiter) = &self.recruiter {
            refs.push((EntityKind::Seller, recruiter.to_record_key()));
        }
        refs
    }

    fn derive_fields(&mut self, forest: &RecruitmentForest) -> Result<(), DomainError> {
        if let (Some(code), Some(recruiter)) = (&self.code, &self.recruiter) {
            if forest.is_ancestor(code, recruiter) {
                return Err(DomainError::validation(format!(
                    "recruiter {} is already in the downline of {}",
                    recruiter, code
                )));
            }
        }
        self.level = forest.level_below(self.recruiter.as_ref());
        Ok(())
    }
}

// ============================================================================
// Recruitment
// ============================================================================

/// Record of one seller recruiting another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recruitment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecruitmentId>,
    #[serde(alias = "captadorCodigo", alias = "captadorId")]
    pub recruiter: SellerCode,
    #[serde(alias = "captadoCodigo", alias = "captadoId")]
    pub recruit: SellerCode,
    #[serde(alias = "empresaId")]
    pub company: CompanyId,
    #[serde(default = "Utc::now", alias = "fecha", alias = "fechaCaptacion")]
    pub date: DateTime<Utc>,
}

impl Recruitment {
    pub fn new(recruiter: SellerCode, recruit: SellerCode, company: CompanyId) -> Self {
        Self {
            id: None,
            recruiter,
            recruit,
            company,
            date: Utc::now(),
        }
    }
}

impl Entity for Recruitment {
    type Key = RecruitmentId;
    const KIND: EntityKind = EntityKind::Recruitment;

    fn key(&self) -> Option<&RecruitmentId> {
        self.id.as_ref()
    }

    fn set_key(&mut self, key: RecruitmentId) {
        self.id = Some(key);
    }

    fn display_name(&self) -> String {
        format!("{} -> {}", self.recruiter, self.recruit)
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.recruiter == self.recruit {
            return Err(DomainError::validation(format!(
                "seller {} cannot recruit themselves",
                self.recruit
            )));
        }
        Ok(())
    }

    fn references(&self) -> Vec<(EntityKind, RecordKey)> {
        vec![
            (EntityKind::Seller, self.recruiter.to_record_key()),
            (EntityKind::Seller, self.recruit.to_record_key()),
            (EntityKind::Company, self.company.to_record_key()),
        ]
    }
}
