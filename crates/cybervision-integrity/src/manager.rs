//! Integrity manager - guarded deletion of parents with dependents
//!
//! Dependents are found in the local cache. Every rejection happens before
//! anything is written and is reported as an error outcome. Once a policy
//! starts running, each step is persisted on its own; a failure partway
//! through leaves the earlier steps applied.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};

use cybervision_core::domain::{
    Advisor, AdvisorCode, Advisory, AdvisoryStatus, Company, CompanyId, Country, CountryId,
    Entity, EntityKey, EntityKind, EntityStatus, RecordKey, Recruitment, Seller,
};
use cybervision_core::ports::Notification;
use cybervision_core::usecases::{Persistence, ReconciliationService, Saved};
use cybervision_core::SyncError;

use crate::plan::{AppliedPolicy, DeletionPlan, DeletionReport};
use crate::policy::DeletePolicy;

/// Applies delete policies on top of the reconciliation service
pub struct IntegrityManager {
    reconciler: Arc<ReconciliationService>,
}

impl IntegrityManager {
    pub fn new(reconciler: Arc<ReconciliationService>) -> Self {
        Self { reconciler }
    }

    pub fn reconciler(&self) -> &Arc<ReconciliationService> {
        &self.reconciler
    }

    // ========================================================================
    // Countries
    // ========================================================================

    /// Companies referencing the country, and the countries they could move to
    pub async fn plan_country_deletion(&self, id: CountryId) -> Result<DeletionPlan, SyncError> {
        let country: Country = self.reconciler.get(&id).await?;
        let companies: Vec<Company> = self.reconciler.list().await?;
        let countries: Vec<Country> = self.reconciler.list().await?;

        Ok(DeletionPlan {
            kind: EntityKind::Country,
            key: id.to_record_key(),
            name: country.display_name(),
            dependent_kind: EntityKind::Company,
            dependents: companies
                .iter()
                .filter(|c| c.country == Some(id))
                .filter_map(|c| c.key().map(|k| k.to_record_key()))
                .collect(),
            targets: countries
                .iter()
                .filter_map(|c| c.key())
                .filter(|key| **key != id)
                .map(|key| key.to_record_key())
                .collect(),
        })
    }

    /// Deletes a country, resolving its companies first
    ///
    /// Without dependents the policy is ignored. With dependents:
    /// - `None` is refused with `IntegrityViolation`
    /// - `Cascade` retires every company (inactive, no country) and
    ///   deactivates their active sellers and the advisors who only work
    ///   for those companies
    /// - `Reassign(dest)` moves every company to `dest` in one batch
    pub async fn delete_country(
        &self,
        id: CountryId,
        policy: Option<DeletePolicy<CountryId>>,
    ) -> Result<DeletionReport, SyncError> {
        let plan = match self.plan_country_deletion(id).await {
            Ok(plan) => plan,
            Err(err) => return self.reject(EntityKind::Country, err).await,
        };

        if !plan.has_dependents() {
            return self.finish::<Country>(&id, plan, AppliedPolicy::None, Persistence::Remote)
                .await;
        }

        let dependents: Vec<Company> = self
            .reconciler
            .list::<Company>()
            .await?
            .into_iter()
            .filter(|c| c.country == Some(id))
            .collect();

        match policy {
            None => {
                let err = SyncError::IntegrityViolation {
                    kind: EntityKind::Country,
                    key: plan.key.clone(),
                    reason: format!(
                        "{} {} still reference it; choose cascade or reassign",
                        dependents.len(),
                        plural(dependents.len(), "company", "companies")
                    ),
                };
                self.reject(EntityKind::Country, err).await
            }
            Some(DeletePolicy::Cascade) => {
                info!(country = %id, companies = dependents.len(), "Cascading country deletion");
                let company_ids: BTreeSet<CompanyId> =
                    dependents.iter().filter_map(|c| c.id).collect();
                let retired: Vec<Company> = dependents
                    .into_iter()
                    .map(|mut c| {
                        c.retire();
                        c
                    })
                    .collect();

                let persistence = batch_persistence(&self.reconciler.save_batch(retired).await?)
                    .merge(self.deactivate_sellers(&company_ids).await?)
                    .merge(self.deactivate_advisors(&company_ids).await?);

                self.finish::<Country>(&id, plan, AppliedPolicy::Cascade, persistence)
                    .await
            }
            Some(DeletePolicy::Reassign(dest)) => {
                if let Err(err) = check_target(&plan, dest.to_record_key()) {
                    return self.reject(EntityKind::Country, err).await;
                }
                info!(country = %id, dest = %dest, companies = dependents.len(), "Reassigning companies");
                let moved: Vec<Company> = dependents
                    .into_iter()
                    .map(|mut c| {
                        c.country = Some(dest);
                        c
                    })
                    .collect();

                let persistence = batch_persistence(&self.reconciler.save_batch(moved).await?);
                self.finish::<Country>(
                    &id,
                    plan,
                    AppliedPolicy::Reassign(dest.to_record_key()),
                    persistence,
                )
                .await
            }
        }
    }

    // ========================================================================
    // Companies
    // ========================================================================

    /// Active sellers of the company, and the active companies they could move to
    pub async fn plan_company_deletion(&self, id: CompanyId) -> Result<DeletionPlan, SyncError> {
        let company: Company = self.reconciler.get(&id).await?;
        let sellers: Vec<Seller> = self.reconciler.list().await?;
        let companies: Vec<Company> = self.reconciler.list().await?;

        Ok(DeletionPlan {
            kind: EntityKind::Company,
            key: id.to_record_key(),
            name: company.display_name(),
            dependent_kind: EntityKind::Seller,
            dependents: sellers
                .iter()
                .filter(|s| s.company == id && s.is_active())
                .filter_map(|s| s.key().map(|k| k.to_record_key()))
                .collect(),
            targets: companies
                .iter()
                .filter(|c| c.is_active())
                .filter_map(|c| c.key())
                .filter(|key| **key != id)
                .map(|key| key.to_record_key())
                .collect(),
        })
    }

    /// Deletes a company, resolving its active sellers first
    ///
    /// The company is also dropped from every advisor and its in-progress
    /// advisories are cancelled. When sellers, advisories or recruitments
    /// still point at the company afterwards, it is retired instead of
    /// removed so those records keep a valid reference.
    pub async fn delete_company(
        &self,
        id: CompanyId,
        policy: Option<DeletePolicy<CompanyId>>,
    ) -> Result<DeletionReport, SyncError> {
        let plan = match self.plan_company_deletion(id).await {
            Ok(plan) => plan,
            Err(err) => return self.reject(EntityKind::Company, err).await,
        };

        let sellers: Vec<Seller> = self
            .reconciler
            .list::<Seller>()
            .await?
            .into_iter()
            .filter(|s| s.company == id && s.is_active())
            .collect();

        let (applied, mut persistence) = match (plan.has_dependents(), policy) {
            (false, _) => (AppliedPolicy::None, Persistence::Remote),
            (true, None) => {
                let err = SyncError::IntegrityViolation {
                    kind: EntityKind::Company,
                    key: plan.key.clone(),
                    reason: format!(
                        "{} active {} still work for it; choose cascade or reassign",
                        sellers.len(),
                        plural(sellers.len(), "seller", "sellers")
                    ),
                };
                return self.reject(EntityKind::Company, err).await;
            }
            (true, Some(DeletePolicy::Cascade)) => {
                info!(company = %id, sellers = sellers.len(), "Cascading company deletion");
                let cascaded = BTreeSet::from([id]);
                let persistence = self
                    .deactivate_sellers(&cascaded)
                    .await?
                    .merge(self.deactivate_advisors(&cascaded).await?);
                (AppliedPolicy::Cascade, persistence)
            }
            (true, Some(DeletePolicy::Reassign(dest))) => {
                if let Err(err) = check_target(&plan, dest.to_record_key()) {
                    return self.reject(EntityKind::Company, err).await;
                }
                info!(company = %id, dest = %dest, sellers = sellers.len(), "Reassigning sellers");
                let moved: Vec<Seller> = sellers
                    .into_iter()
                    .map(|mut s| {
                        s.company = dest;
                        s
                    })
                    .collect();
                let persistence = batch_persistence(&self.reconciler.save_batch(moved).await?);
                (AppliedPolicy::Reassign(dest.to_record_key()), persistence)
            }
        };

        persistence = persistence.merge(self.detach_company(id).await?);
        if self.company_in_use(id).await? {
            return self.retire_company(id, plan, applied, persistence).await;
        }
        self.finish::<Company>(&id, plan, applied, persistence).await
    }

    /// Whether any seller, advisory or recruitment still names the company
    async fn company_in_use(&self, id: CompanyId) -> Result<bool, SyncError> {
        let sellers: Vec<Seller> = self.reconciler.list().await?;
        if sellers.iter().any(|s| s.company == id) {
            return Ok(true);
        }
        let advisories: Vec<Advisory> = self.reconciler.list().await?;
        if advisories.iter().any(|a| a.company == id) {
            return Ok(true);
        }
        let recruitments: Vec<Recruitment> = self.reconciler.list().await?;
        Ok(recruitments.iter().any(|r| r.company == id))
    }

    /// Keeps a referenced company as an inactive record without a country
    async fn retire_company(
        &self,
        id: CompanyId,
        plan: DeletionPlan,
        applied: AppliedPolicy,
        persistence: Persistence,
    ) -> Result<DeletionReport, SyncError> {
        let mut company: Company = self.reconciler.get(&id).await?;
        company.retire();
        let saved = self.reconciler.save(Some(id), company).await?;
        let persistence = persistence.merge(saved.persistence);

        info!(
            company = %id,
            affected = plan.dependents.len(),
            persistence = ?persistence,
            "Company retired, history still references it"
        );

        Ok(DeletionReport {
            kind: plan.kind,
            key: plan.key,
            name: plan.name,
            policy_applied: applied,
            affected: plan.dependents,
            retired: true,
            persistence,
        })
    }

    /// Drops the company from advisors and cancels its in-progress advisories
    async fn detach_company(&self, id: CompanyId) -> Result<Persistence, SyncError> {
        let advisors: Vec<Advisor> = self
            .reconciler
            .list::<Advisor>()
            .await?
            .into_iter()
            .filter_map(|mut a| a.drop_company(&id).then_some(a))
            .collect();

        let mut advisories = Vec::new();
        for mut advisory in self.reconciler.list::<Advisory>().await? {
            if advisory.company == id && advisory.status.is_in_progress() {
                advisory.close(AdvisoryStatus::Cancelled)?;
                advisories.push(advisory);
            }
        }

        if !advisors.is_empty() || !advisories.is_empty() {
            info!(
                company = %id,
                advisors = advisors.len(),
                advisories = advisories.len(),
                "Detaching company from advisors"
            );
        }

        let advisors = batch_persistence(&self.reconciler.save_batch(advisors).await?);
        let advisories = batch_persistence(&self.reconciler.save_batch(advisories).await?);
        Ok(advisors.merge(advisories))
    }

    // ========================================================================
    // Advisors
    // ========================================================================

    /// Deletes an advisor unless an in-progress advisory still needs them
    pub async fn delete_advisor(&self, code: &AdvisorCode) -> Result<DeletionReport, SyncError> {
        let advisor: Advisor = match self.reconciler.get(code).await {
            Ok(advisor) => advisor,
            Err(err) => return self.reject(EntityKind::Advisor, err).await,
        };

        let open: Vec<_> = self
            .reconciler
            .list::<Advisory>()
            .await?
            .into_iter()
            .filter(|a| &a.advisor == code && a.status.is_in_progress())
            .filter_map(|a| a.id.map(|id| id.to_record_key()))
            .collect();

        let plan = DeletionPlan {
            kind: EntityKind::Advisor,
            key: code.to_record_key(),
            name: advisor.display_name(),
            dependent_kind: EntityKind::Advisory,
            dependents: open,
            targets: Vec::new(),
        };

        if plan.has_dependents() {
            let err = SyncError::IntegrityViolation {
                kind: EntityKind::Advisor,
                key: plan.key.clone(),
                reason: format!(
                    "{} {} in progress; close {} first",
                    plan.dependents.len(),
                    plural(plan.dependents.len(), "advisory is", "advisories are"),
                    plural(plan.dependents.len(), "it", "them")
                ),
            };
            return self.reject(EntityKind::Advisor, err).await;
        }

        self.finish::<Advisor>(code, plan, AppliedPolicy::None, Persistence::Remote)
            .await
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Deactivates every active seller of the given companies
    async fn deactivate_sellers(
        &self,
        companies: &BTreeSet<CompanyId>,
    ) -> Result<Persistence, SyncError> {
        let sellers: Vec<Seller> = self
            .reconciler
            .list::<Seller>()
            .await?
            .into_iter()
            .filter(|s| companies.contains(&s.company) && s.is_active())
            .map(|mut s| {
                s.status = EntityStatus::Inactive;
                s
            })
            .collect();
        if !sellers.is_empty() {
            info!(sellers = sellers.len(), "Deactivating sellers");
        }
        Ok(batch_persistence(&self.reconciler.save_batch(sellers).await?))
    }

    /// Deactivates every active advisor whose companies all belong to the set
    ///
    /// Advisors without any company are left alone.
    async fn deactivate_advisors(
        &self,
        companies: &BTreeSet<CompanyId>,
    ) -> Result<Persistence, SyncError> {
        let advisors: Vec<Advisor> = self
            .reconciler
            .list::<Advisor>()
            .await?
            .into_iter()
            .filter(|a| a.status.is_active())
            .filter(|a| !a.companies.is_empty() && a.companies.is_subset(companies))
            .map(|mut a| {
                a.status = EntityStatus::Inactive;
                a
            })
            .collect();
        if !advisors.is_empty() {
            info!(advisors = advisors.len(), "Deactivating advisors");
        }
        Ok(batch_persistence(&self.reconciler.save_batch(advisors).await?))
    }

    /// Deletes the parent record and builds the report
    async fn finish<E: Entity>(
        &self,
        key: &E::Key,
        plan: DeletionPlan,
        applied: AppliedPolicy,
        persistence: Persistence,
    ) -> Result<DeletionReport, SyncError> {
        let deleted = self.reconciler.delete::<E>(key).await?;
        let persistence = persistence.merge(deleted.persistence);

        info!(
            kind = %E::KIND,
            key = %key,
            affected = plan.dependents.len(),
            persistence = ?persistence,
            "Parent deleted"
        );

        Ok(DeletionReport {
            kind: plan.kind,
            key: plan.key,
            name: plan.name,
            policy_applied: applied,
            affected: plan.dependents,
            retired: false,
            persistence,
        })
    }

    /// Reports a refused deletion and returns the error
    async fn reject<T>(&self, kind: EntityKind, err: SyncError) -> Result<T, SyncError> {
        warn!(kind = %kind, error = %err, "Deletion refused");
        self.reconciler
            .notify(
                Notification::error(format!("{} not deleted", kind.title()), err.to_string())
                    .with_kind(kind),
            )
            .await;
        Err(err)
    }
}

/// Validates a reassignment destination against a plan
fn check_target(plan: &DeletionPlan, dest: RecordKey) -> Result<(), SyncError> {
    if dest == plan.key {
        return Err(SyncError::InvalidReassignTarget {
            kind: plan.kind,
            key: dest,
            reason: "it is the record being deleted".to_string(),
        });
    }
    if !plan.can_reassign() {
        return Err(SyncError::ReassignUnavailable { kind: plan.kind });
    }
    if !plan.targets.contains(&dest) {
        let reason = match plan.kind {
            EntityKind::Company => "it does not exist or is not active",
            _ => "it does not exist",
        };
        return Err(SyncError::InvalidReassignTarget {
            kind: plan.kind,
            key: dest,
            reason: reason.to_string(),
        });
    }
    Ok(())
}

fn batch_persistence<E: Entity>(saved: &[Saved<E>]) -> Persistence {
    saved
        .iter()
        .fold(Persistence::Remote, |acc, s| acc.merge(s.persistence))
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}
