//! Holding report use case
//!
//! Aggregates the cached collections into the figures shown on the
//! statistics screen. The aggregation itself is a pure function over a
//! [`CacheSnapshot`]; loading the snapshot is the only I/O.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::{
    Advisor, Advisory, Company, CompanyId, Country, CountryId, MarketArea, Recruitment, Seller,
};
use crate::error::SyncError;
use crate::ports::ILocalCache;

use super::reconcile::load_collection;

/// Label used for companies without a country
pub const UNASSIGNED: &str = "Unassigned";

/// All cached collections at one point in time
#[derive(Debug, Clone, Default)]
pub struct CacheSnapshot {
    pub countries: Vec<Country>,
    pub companies: Vec<Company>,
    pub advisors: Vec<Advisor>,
    pub sellers: Vec<Seller>,
    pub recruitments: Vec<Recruitment>,
    pub advisories: Vec<Advisory>,
    pub market_areas: Vec<MarketArea>,
}

impl CacheSnapshot {
    pub async fn load(cache: &dyn ILocalCache) -> Result<Self, SyncError> {
        Ok(Self {
            countries: load_collection(cache).await?,
            companies: load_collection(cache).await?,
            advisors: load_collection(cache).await?,
            sellers: load_collection(cache).await?,
            recruitments: load_collection(cache).await?,
            advisories: load_collection(cache).await?,
            market_areas: load_collection(cache).await?,
        })
    }
}

// ============================================================================
// Report types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    pub companies: usize,
    pub active_companies: usize,
    pub sellers: usize,
    pub advisors: usize,
    pub countries: usize,
    pub recruitments: usize,
    pub active_advisories: usize,
    pub market_areas: usize,
    pub total_revenue: f64,
}

/// Companies grouped under one country (or the unassigned bucket)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryCount {
    pub country: Option<CountryId>,
    pub name: String,
    pub companies: usize,
}

/// Sellers working for one company
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyCount {
    pub company: CompanyId,
    pub name: String,
    pub sellers: usize,
}

/// Holding-wide aggregates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingReport {
    pub totals: Totals,
    pub companies_by_country: Vec<CountryCount>,
    pub sellers_by_company: Vec<CompanyCount>,
    /// Depth of the deepest recruitment chain
    pub max_seller_level: u32,
}

/// Ratio that is 0.0 when the denominator is 0
fn ratio(numerator: f64, denominator: usize) -> f64 {
    if denominator > 0 {
        numerator / denominator as f64
    } else {
        0.0
    }
}

impl HoldingReport {
    pub fn from_snapshot(snapshot: &CacheSnapshot) -> Self {
        let totals = Totals {
            companies: snapshot.companies.len(),
            active_companies: snapshot.companies.iter().filter(|c| c.is_active()).count(),
            sellers: snapshot.sellers.len(),
            advisors: snapshot.advisors.len(),
            countries: snapshot.countries.len(),
            recruitments: snapshot.recruitments.len(),
            active_advisories: snapshot
                .advisories
                .iter()
                .filter(|a| a.status.is_in_progress())
                .count(),
            market_areas: snapshot.market_areas.len(),
            total_revenue: snapshot.companies.iter().map(|c| c.revenue).sum(),
        };

        Self {
            totals,
            companies_by_country: companies_by_country(snapshot),
            sellers_by_company: sellers_by_company(snapshot),
            max_seller_level: snapshot.sellers.iter().map(|s| s.level).max().unwrap_or(0),
        }
    }

    pub fn avg_sellers_per_company(&self) -> f64 {
        ratio(self.totals.sellers as f64, self.totals.companies)
    }

    pub fn avg_advisors_per_company(&self) -> f64 {
        ratio(self.totals.advisors as f64, self.totals.companies)
    }

    pub fn avg_revenue_per_company(&self) -> f64 {
        ratio(self.totals.total_revenue, self.totals.companies)
    }

    /// Countries hosting at least one company
    pub fn countries_with_operations(&self) -> usize {
        self.companies_by_country
            .iter()
            .filter(|c| c.country.is_some() && c.companies > 0)
            .count()
    }
}

fn companies_by_country(snapshot: &CacheSnapshot) -> Vec<CountryCount> {
    let mut counts: HashMap<Option<CountryId>, usize> = HashMap::new();
    for company in &snapshot.companies {
        *counts.entry(company.country).or_default() += 1;
    }

    let mut out: Vec<CountryCount> = snapshot
        .countries
        .iter()
        .filter_map(|country| {
            let id = country.id?;
            Some(CountryCount {
                country: Some(id),
                name: country.name.clone(),
                companies: counts.remove(&Some(id)).unwrap_or(0),
            })
        })
        .collect();

    // Companies without a country, or pointing at a country no longer cached
    let unassigned: usize = counts.values().sum();
    if unassigned > 0 {
        out.push(CountryCount {
            country: None,
            name: UNASSIGNED.to_string(),
            companies: unassigned,
        });
    }
    out
}

fn sellers_by_company(snapshot: &CacheSnapshot) -> Vec<CompanyCount> {
    let mut counts: HashMap<CompanyId, usize> = HashMap::new();
    for seller in &snapshot.sellers {
        *counts.entry(seller.company).or_default() += 1;
    }

    let mut out: Vec<CompanyCount> = snapshot
        .companies
        .iter()
        .filter_map(|company| {
            let id = company.id?;
            Some(CompanyCount {
                company: id,
                name: company.name.clone(),
                sellers: counts.get(&id).copied().unwrap_or(0),
            })
        })
        .collect();
    out.sort_by(|a, b| b.sellers.cmp(&a.sellers).then_with(|| a.name.cmp(&b.name)));
    out
}

// ============================================================================
// ReportUseCase
// ============================================================================

/// Builds [`HoldingReport`]s from the local cache
pub struct ReportUseCase {
    cache: Arc<dyn ILocalCache>,
}

impl ReportUseCase {
    pub fn new(cache: Arc<dyn ILocalCache>) -> Self {
        Self { cache }
    }

    pub async fn snapshot(&self) -> Result<CacheSnapshot, SyncError> {
        CacheSnapshot::load(self.cache.as_ref()).await
    }

    pub async fn report(&self) -> Result<HoldingReport, SyncError> {
        Ok(HoldingReport::from_snapshot(&self.snapshot().await?))
    }
}
