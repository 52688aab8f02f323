//! Advisory entity

use std::fmt::{self, Display, Formatter};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{require_amount, Entity, EntityKind};
use super::errors::DomainError;
use super::newtypes::{AdvisorCode, AdvisoryId, CompanyId, EntityKey, MarketAreaId, RecordKey};

/// Lifecycle of an advisory engagement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AdvisoryStatus {
    #[default]
    #[serde(alias = "in_progress", alias = "En curso", alias = "EN_CURSO")]
    InProgress,
    #[serde(alias = "completed", alias = "Finalizada", alias = "FINALIZADA")]
    Completed,
    #[serde(alias = "cancelled", alias = "Cancelada", alias = "CANCELADA")]
    Cancelled,
}

impl AdvisoryStatus {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, AdvisoryStatus::InProgress)
    }
}

impl Display for AdvisoryStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            AdvisoryStatus::InProgress => "in progress",
            AdvisoryStatus::Completed => "completed",
            AdvisoryStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// An advisor engaged with a company on a market area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advisory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AdvisoryId>,
    #[serde(alias = "asesorCodigo", alias = "asesorId")]
    pub advisor: AdvisorCode,
    #[serde(alias = "empresaId")]
    pub company: CompanyId,
    #[serde(alias = "areaId")]
    pub area: MarketAreaId,
    #[serde(alias = "fechaInicio")]
    pub start_date: NaiveDate,
    #[serde(default, alias = "descripcion")]
    pub description: String,
    #[serde(default, alias = "estado")]
    pub status: AdvisoryStatus,
    #[serde(default, alias = "horasRegistradas", alias = "horasAsesoradas")]
    pub hours_logged: f64,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "proximaReunion")]
    pub next_meeting: Option<NaiveDate>,
}

impl Advisory {
    pub fn new(advisor: AdvisorCode, company: CompanyId, area: MarketAreaId) -> Self {
        Self {
            id: None,
            advisor,
            company,
            area,
            start_date: Utc::now().date_naive(),
            description: String::new(),
            status: AdvisoryStatus::InProgress,
            hours_logged: 0.0,
            next_meeting: None,
        }
    }

    /// Moves the advisory to a terminal status
    pub fn close(&mut self, status: AdvisoryStatus) -> Result<(), DomainError> {
        if !self.status.is_in_progress() {
            return Err(DomainError::validation(format!(
                "advisory is already {}",
                self.status
            )));
        }
        if status.is_in_progress() {
            return Err(DomainError::validation(
                "an advisory can only be closed as completed or cancelled",
            ));
        }
        self.status = status;
        self.next_meeting = None;
        Ok(())
    }
}

impl Entity for Advisory {
    type Key = AdvisoryId;
    const KIND: EntityKind = EntityKind::Advisory;

    fn key(&self) -> Option<&AdvisoryId> {
        self.id.as_ref()
    }

    fn set_key(&mut self, key: AdvisoryId) {
        self.id = Some(key);
    }

    fn display_name(&self) -> String {
        format!("{} @ company {}", self.advisor, self.company)
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_amount("hours logged", self.hours_logged)?;
        if let Some(next) = self.next_meeting {
            if next < self.start_date {
                return Err(DomainError::validation(format!(
                    "next meeting {} is before the start date {}",
                    next, self.start_date
                )));
            }
        }
        Ok(())
    }

    fn references(&self) -> Vec<(EntityKind, RecordKey)> {
        vec![
            (EntityKind::Advisor, self.advisor.to_record_key()),
            (EntityKind::Company, self.company.to_record_key()),
            (EntityKind::MarketArea, self.area.to_record_key()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn advisory() -> Advisory {
        Advisory::new(
            AdvisorCode::new("A001").unwrap(),
            CompanyId::new(1),
            MarketAreaId::new(1),
        )
    }

    #[test]
    fn test_new_advisory_is_in_progress() {
        assert!(advisory().status.is_in_progress());
    }

    #[test]
    fn test_close_once() {
        let mut a = advisory();
        a.close(AdvisoryStatus::Completed).unwrap();
        assert_eq!(a.status, AdvisoryStatus::Completed);
        assert!(a.close(AdvisoryStatus::Cancelled).is_err());
    }

    #[test]
    fn test_close_requires_terminal_status() {
        let mut a = advisory();
        assert!(a.close(AdvisoryStatus::InProgress).is_err());
    }

    #[test]
    fn test_meeting_before_start_is_invalid() {
        let mut a = advisory();
        a.start_date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        a.next_meeting = NaiveDate::from_ymd_opt(2024, 4, 1);
        assert!(a.validate().is_err());
    }

    #[test]
    fn test_parses_legacy_advisory_record() {
        let a = Advisory::from_checked_record(json!({
            "id": 2,
            "asesorId": "A003",
            "empresaId": 1,
            "areaId": 4,
            "fechaInicio": "2024-02-01",
            "descripcion": "Expansion plan",
            "estado": "En curso",
            "horasAsesoradas": 14.5,
            "proximaReunion": null
        }))
        .unwrap();
        assert_eq!(a.advisor, AdvisorCode::new("A003").unwrap());
        assert_eq!(a.hours_logged, 14.5);
        assert!(a.status.is_in_progress());
        assert!(a.next_meeting.is_none());
    }
}
