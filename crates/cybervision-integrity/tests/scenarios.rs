//! End-to-end integrity scenarios over in-memory ports
//!
//! Each test seeds a holding through the reconciliation service (so keys are
//! assigned the normal way) and then exercises the integrity manager.

use std::sync::Arc;

use cybervision_core::domain::{
    Advisor, Advisory, AdvisoryStatus, Company, CompanyId, Country, CountryId, EntityKey,
    EntityKind, EntityStatus, MarketArea, Seller, SellerCode,
};
use cybervision_core::ports::OutcomeLevel;
use cybervision_core::testing::{MemoryCache, RecordingNotifier, RecordingObserver, ScriptedGateway};
use cybervision_core::usecases::{Persistence, ReconciliationService, ReportUseCase};
use cybervision_core::SyncError;
use cybervision_integrity::{
    AppliedPolicy, DeletePolicy, IntegrityManager, RecruitmentService,
};

// ============================================================================
// Test harness
// ============================================================================

struct Holding {
    reconciler: Arc<ReconciliationService>,
    manager: IntegrityManager,
    recruitments: RecruitmentService,
    cache: Arc<MemoryCache>,
    remote: Arc<ScriptedGateway>,
    notifier: Arc<RecordingNotifier>,
}

fn holding(online: bool) -> Holding {
    let cache = Arc::new(MemoryCache::new());
    let remote = Arc::new(ScriptedGateway::new(online));
    let notifier = Arc::new(RecordingNotifier::new());
    let reconciler = Arc::new(ReconciliationService::new(
        cache.clone(),
        remote.clone(),
        notifier.clone(),
        Arc::new(RecordingObserver::new()),
    ));
    Holding {
        manager: IntegrityManager::new(reconciler.clone()),
        recruitments: RecruitmentService::new(reconciler.clone()),
        reconciler,
        cache,
        remote,
        notifier,
    }
}

impl Holding {
    async fn country(&self, name: &str) -> CountryId {
        self.reconciler
            .save(None, Country::new(name, "Capital", 100.0, 1_000_000))
            .await
            .unwrap()
            .key
    }

    async fn company(&self, name: &str, country: CountryId) -> CompanyId {
        self.reconciler
            .save(None, Company::new(name, country, "City"))
            .await
            .unwrap()
            .key
    }

    async fn seller(&self, name: &str, company: CompanyId) -> SellerCode {
        self.reconciler
            .save(None, Seller::new(name, company))
            .await
            .unwrap()
            .key
    }

    async fn companies(&self) -> Vec<Company> {
        self.reconciler.list().await.unwrap()
    }

    fn writes(&self) -> usize {
        self.remote.count_prefix("create")
            + self.remote.count_prefix("update")
            + self.remote.count_prefix("delete")
    }
}

/// Chile {id 1, gdp 500, population 19M, Santiago} with two companies
async fn chile_with_two_companies(h: &Holding) -> (CountryId, CompanyId, CompanyId) {
    let chile = h
        .reconciler
        .save(None, Country::new("Chile", "Santiago", 500.0, 19_000_000))
        .await
        .unwrap()
        .key;
    let a = h.company("Andes Retail", chile).await;
    let b = h.company("Pacifico Foods", chile).await;
    (chile, a, b)
}

// ============================================================================
// Country deletion
// ============================================================================

#[tokio::test]
async fn test_chile_cascade_retires_both_companies() {
    let h = holding(true);
    let (chile, a, b) = chile_with_two_companies(&h).await;
    assert_eq!(chile, CountryId::new(1));

    let report = h
        .manager
        .delete_country(chile, Some(DeletePolicy::Cascade))
        .await
        .unwrap();

    assert_eq!(report.policy_applied, AppliedPolicy::Cascade);
    assert_eq!(report.affected.len(), 2);
    assert_eq!(report.persistence, Persistence::Remote);

    let companies = h.companies().await;
    assert_eq!(companies.len(), 2);
    assert!(companies
        .iter()
        .all(|c| c.status == EntityStatus::Inactive && c.country.is_none()));
    assert!(companies.iter().any(|c| c.id == Some(a)));
    assert!(companies.iter().any(|c| c.id == Some(b)));

    assert!(h.cache.records(EntityKind::Country).is_empty());
    assert!(h.remote.records(EntityKind::Country).is_empty());
}

#[tokio::test]
async fn test_cascade_deactivates_sellers_of_retired_companies() {
    let h = holding(true);
    let (chile, a, _) = chile_with_two_companies(&h).await;
    let peru = h.country("Peru").await;
    let lima = h.company("Lima Trade", peru).await;
    let ana = h.seller("Ana", a).await;
    let luis = h.seller("Luis", lima).await;

    h.manager
        .delete_country(chile, Some(DeletePolicy::Cascade))
        .await
        .unwrap();

    let ana: Seller = h.reconciler.get(&ana).await.unwrap();
    let luis: Seller = h.reconciler.get(&luis).await.unwrap();
    assert_eq!(ana.status, EntityStatus::Inactive);
    assert_eq!(ana.company, a);
    assert_eq!(luis.status, EntityStatus::Active);
}

#[tokio::test]
async fn test_reassign_moves_companies_to_destination() {
    let h = holding(true);
    let (chile, _, _) = chile_with_two_companies(&h).await;
    let peru = h.country("Peru").await;

    let report = h
        .manager
        .delete_country(chile, Some(DeletePolicy::Reassign(peru)))
        .await
        .unwrap();

    assert_eq!(
        report.policy_applied,
        AppliedPolicy::Reassign(peru.to_record_key())
    );
    let companies = h.companies().await;
    assert_eq!(companies.len(), 2);
    assert!(companies
        .iter()
        .all(|c| c.country == Some(peru) && c.is_active()));
    let countries: Vec<Country> = h.reconciler.list().await.unwrap();
    assert_eq!(countries.len(), 1);
    assert_eq!(countries[0].id, Some(peru));
}

#[tokio::test]
async fn test_country_without_dependents_deletes_without_policy() {
    let h = holding(true);
    let chile = h.country("Chile").await;

    let report = h.manager.delete_country(chile, None).await.unwrap();

    assert_eq!(report.policy_applied, AppliedPolicy::None);
    assert!(report.affected.is_empty());
    assert!(h.cache.records(EntityKind::Country).is_empty());
}

#[tokio::test]
async fn test_supplied_policy_ignored_without_dependents() {
    let h = holding(true);
    let chile = h.country("Chile").await;

    let report = h
        .manager
        .delete_country(chile, Some(DeletePolicy::Reassign(CountryId::new(99))))
        .await
        .unwrap();

    assert_eq!(report.policy_applied, AppliedPolicy::None);
}

#[tokio::test]
async fn test_dependents_without_policy_is_violation() {
    let h = holding(true);
    let (chile, _, _) = chile_with_two_companies(&h).await;
    let writes = h.writes();

    let err = h.manager.delete_country(chile, None).await.unwrap_err();

    assert!(matches!(err, SyncError::IntegrityViolation { .. }));
    assert!(err.to_string().contains("2 companies"));
    assert_eq!(h.writes(), writes);
    assert_eq!(h.cache.len(EntityKind::Country), 1);
    assert_eq!(h.notifier.last().unwrap().level, OutcomeLevel::Error);
}

#[tokio::test]
async fn test_reassign_to_self_is_rejected() {
    let h = holding(true);
    let (chile, _, _) = chile_with_two_companies(&h).await;
    h.country("Peru").await;
    let writes = h.writes();

    let err = h
        .manager
        .delete_country(chile, Some(DeletePolicy::Reassign(chile)))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::InvalidReassignTarget { .. }));
    assert_eq!(h.writes(), writes);
    assert!(h.companies().await.iter().all(|c| c.country == Some(chile)));
    assert_eq!(h.notifier.last().unwrap().level, OutcomeLevel::Error);
}

#[tokio::test]
async fn test_reassign_to_missing_country_is_rejected() {
    let h = holding(true);
    let (chile, _, _) = chile_with_two_companies(&h).await;
    h.country("Peru").await;
    let writes = h.writes();

    let err = h
        .manager
        .delete_country(chile, Some(DeletePolicy::Reassign(CountryId::new(42))))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::InvalidReassignTarget { .. }));
    assert_eq!(h.writes(), writes);
    assert_eq!(h.cache.len(EntityKind::Country), 2);
}

#[tokio::test]
async fn test_reassign_with_no_other_country_is_unavailable() {
    let h = holding(true);
    let (chile, _, _) = chile_with_two_companies(&h).await;

    let err = h
        .manager
        .delete_country(chile, Some(DeletePolicy::Reassign(CountryId::new(2))))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::ReassignUnavailable { .. }));
    assert_eq!(h.cache.len(EntityKind::Country), 1);
}

#[tokio::test]
async fn test_missing_country_is_not_found() {
    let h = holding(true);
    let err = h
        .manager
        .delete_country(CountryId::new(5), Some(DeletePolicy::Cascade))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::NotFound { .. }));
}

#[tokio::test]
async fn test_cascade_offline_is_local_only() {
    let h = holding(false);
    let (chile, _, _) = chile_with_two_companies(&h).await;

    let report = h
        .manager
        .delete_country(chile, Some(DeletePolicy::Cascade))
        .await
        .unwrap();

    assert_eq!(report.persistence, Persistence::LocalOnly);
    assert!(h.companies().await.iter().all(|c| !c.is_active()));
    assert!(h.cache.records(EntityKind::Country).is_empty());
}

#[tokio::test]
async fn test_backend_lost_midway_keeps_applied_steps() {
    let h = holding(true);
    let (chile, a, b) = chile_with_two_companies(&h).await;
    let peru = h.country("Peru").await;
    // first company update succeeds, everything after it fails
    h.remote.fail_after(1);

    let report = h
        .manager
        .delete_country(chile, Some(DeletePolicy::Reassign(peru)))
        .await
        .unwrap();

    assert_eq!(report.persistence, Persistence::LocalOnly);
    let remote_companies = h.remote.records(EntityKind::Company);
    let country_of = |id: CompanyId| {
        remote_companies
            .iter()
            .find(|r| r["id"] == id.value())
            .map(|r| r["country"].clone())
            .unwrap()
    };
    assert_eq!(country_of(a), serde_json::json!(peru.value()));
    assert_eq!(country_of(b), serde_json::json!(chile.value()));
    // locally both moved
    assert!(h.companies().await.iter().all(|c| c.country == Some(peru)));
}

// ============================================================================
// Company deletion
// ============================================================================

#[tokio::test]
async fn test_company_reassign_moves_active_sellers() {
    let h = holding(true);
    let (_, a, b) = chile_with_two_companies(&h).await;
    let ana = h.seller("Ana", a).await;
    let luis = h.seller("Luis", a).await;

    let report = h
        .manager
        .delete_company(a, Some(DeletePolicy::Reassign(b)))
        .await
        .unwrap();

    assert_eq!(report.affected.len(), 2);
    for code in [ana, luis] {
        let seller: Seller = h.reconciler.get(&code).await.unwrap();
        assert_eq!(seller.company, b);
    }
    assert!(h.reconciler.find::<Company>(&a).await.unwrap().is_none());
}

#[tokio::test]
async fn test_company_reassign_to_inactive_company_is_rejected() {
    let h = holding(true);
    let (_, a, b) = chile_with_two_companies(&h).await;
    h.seller("Ana", a).await;
    let mut other: Company = h.reconciler.get(&b).await.unwrap();
    other.status = EntityStatus::Inactive;
    h.reconciler.save(Some(b), other).await.unwrap();

    let err = h
        .manager
        .delete_company(a, Some(DeletePolicy::Reassign(b)))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::ReassignUnavailable { .. }));
    assert!(h.reconciler.find::<Company>(&a).await.unwrap().is_some());
}

#[tokio::test]
async fn test_company_cascade_prunes_advisors_and_cancels_advisories() {
    let h = holding(true);
    let (_, a, b) = chile_with_two_companies(&h).await;
    let ana = h.seller("Ana", a).await;
    let area = h
        .reconciler
        .save(None, MarketArea::new("Retail", ""))
        .await
        .unwrap()
        .key;
    let advisor = h
        .reconciler
        .save(
            None,
            Advisor::new("Marta", "MBA", &["finance"])
                .with_company(a)
                .with_company(b),
        )
        .await
        .unwrap()
        .key;
    let advisory = h
        .reconciler
        .save(None, Advisory::new(advisor.clone(), a, area))
        .await
        .unwrap()
        .key;

    h.manager
        .delete_company(a, Some(DeletePolicy::Cascade))
        .await
        .unwrap();

    let seller: Seller = h.reconciler.get(&ana).await.unwrap();
    assert_eq!(seller.status, EntityStatus::Inactive);
    let advisor: Advisor = h.reconciler.get(&advisor).await.unwrap();
    assert_eq!(advisor.companies.into_iter().collect::<Vec<_>>(), vec![b]);
    let advisory: Advisory = h.reconciler.get(&advisory).await.unwrap();
    assert_eq!(advisory.status, AdvisoryStatus::Cancelled);

    // Ana and the advisory still point at the company, so it is only retired
    let company: Company = h.reconciler.get(&a).await.unwrap();
    assert_eq!(company.status, EntityStatus::Inactive);
    assert!(company.country.is_none());
}

#[tokio::test]
async fn test_company_with_only_inactive_sellers_needs_no_policy() {
    let h = holding(true);
    let (_, a, _) = chile_with_two_companies(&h).await;
    let code = h.seller("Ana", a).await;
    let mut ana: Seller = h.reconciler.get(&code).await.unwrap();
    ana.status = EntityStatus::Inactive;
    h.reconciler.save(Some(code.clone()), ana).await.unwrap();

    let report = h.manager.delete_company(a, None).await.unwrap();
    assert_eq!(report.policy_applied, AppliedPolicy::None);
    assert!(report.retired);

    let ana: Seller = h.reconciler.get(&code).await.unwrap();
    assert!(h.reconciler.find::<Company>(&ana.company).await.unwrap().is_some());
}

#[tokio::test]
async fn test_company_without_history_is_removed() {
    let h = holding(true);
    let (_, a, _) = chile_with_two_companies(&h).await;

    let report = h.manager.delete_company(a, None).await.unwrap();

    assert!(!report.retired);
    assert!(h.reconciler.find::<Company>(&a).await.unwrap().is_none());
    assert_eq!(h.remote.count_prefix("delete empresas"), 1);
}

#[tokio::test]
async fn test_deactivated_seller_stays_editable_after_company_cascade() {
    let h = holding(true);
    let (_, a, _) = chile_with_two_companies(&h).await;
    let ana = h.seller("Ana", a).await;
    let luis = h.seller("Luis", a).await;

    let report = h
        .manager
        .delete_company(a, Some(DeletePolicy::Cascade))
        .await
        .unwrap();
    assert!(report.retired);

    let mut seller: Seller = h.reconciler.get(&ana).await.unwrap();
    assert_eq!(seller.status, EntityStatus::Inactive);
    assert_eq!(seller.company, a);
    seller.name = "Ana Maria".to_string();
    let saved = h.reconciler.save(Some(ana.clone()), seller).await.unwrap();
    assert_eq!(saved.entity.name, "Ana Maria");

    let outcome = h
        .recruitments
        .record_recruitment(ana, luis, None, None)
        .await
        .unwrap();
    assert_eq!(outcome.recruit.entity.level, 2);
}

#[tokio::test]
async fn test_company_cascade_deactivates_advisors_working_only_there() {
    let h = holding(true);
    let (_, a, b) = chile_with_two_companies(&h).await;
    h.seller("Ana", a).await;
    let sole = h
        .reconciler
        .save(None, Advisor::new("Marta", "MBA", &["finance"]).with_company(a))
        .await
        .unwrap()
        .key;
    let shared = h
        .reconciler
        .save(
            None,
            Advisor::new("Jorge", "BSc", &["retail"])
                .with_company(a)
                .with_company(b),
        )
        .await
        .unwrap()
        .key;
    let idle = h
        .reconciler
        .save(None, Advisor::new("Rosa", "PhD", &["energy"]))
        .await
        .unwrap()
        .key;

    h.manager
        .delete_company(a, Some(DeletePolicy::Cascade))
        .await
        .unwrap();

    let sole: Advisor = h.reconciler.get(&sole).await.unwrap();
    assert_eq!(sole.status, EntityStatus::Inactive);
    assert!(sole.companies.is_empty());
    let shared: Advisor = h.reconciler.get(&shared).await.unwrap();
    assert_eq!(shared.status, EntityStatus::Active);
    assert_eq!(shared.companies.into_iter().collect::<Vec<_>>(), vec![b]);
    let idle: Advisor = h.reconciler.get(&idle).await.unwrap();
    assert_eq!(idle.status, EntityStatus::Active);
}

#[tokio::test]
async fn test_country_cascade_deactivates_advisors_of_retired_companies() {
    let h = holding(true);
    let (chile, a, b) = chile_with_two_companies(&h).await;
    let peru = h.country("Peru").await;
    let lima = h.company("Lima Textiles", peru).await;
    let both = h
        .reconciler
        .save(
            None,
            Advisor::new("Marta", "MBA", &["finance"])
                .with_company(a)
                .with_company(b),
        )
        .await
        .unwrap()
        .key;
    let abroad = h
        .reconciler
        .save(
            None,
            Advisor::new("Jorge", "BSc", &["retail"])
                .with_company(a)
                .with_company(lima),
        )
        .await
        .unwrap()
        .key;

    h.manager
        .delete_country(chile, Some(DeletePolicy::Cascade))
        .await
        .unwrap();

    let both: Advisor = h.reconciler.get(&both).await.unwrap();
    assert_eq!(both.status, EntityStatus::Inactive);
    let abroad: Advisor = h.reconciler.get(&abroad).await.unwrap();
    assert_eq!(abroad.status, EntityStatus::Active);
}

// ============================================================================
// Advisor deletion
// ============================================================================

#[tokio::test]
async fn test_advisor_with_open_advisory_cannot_be_deleted() {
    let h = holding(true);
    let (_, a, _) = chile_with_two_companies(&h).await;
    let area = h
        .reconciler
        .save(None, MarketArea::new("Retail", ""))
        .await
        .unwrap()
        .key;
    let advisor = h
        .reconciler
        .save(None, Advisor::new("Marta", "MBA", &["finance"]))
        .await
        .unwrap()
        .key;
    let id = h
        .reconciler
        .save(None, Advisory::new(advisor.clone(), a, area))
        .await
        .unwrap()
        .key;

    let err = h.manager.delete_advisor(&advisor).await.unwrap_err();
    assert!(matches!(err, SyncError::IntegrityViolation { .. }));
    assert!(err.to_string().contains("1 advisory is in progress"));

    let mut advisory: Advisory = h.reconciler.get(&id).await.unwrap();
    advisory.close(AdvisoryStatus::Completed).unwrap();
    h.reconciler.save(Some(id), advisory).await.unwrap();

    let report = h.manager.delete_advisor(&advisor).await.unwrap();
    assert_eq!(report.kind, EntityKind::Advisor);
    assert!(h.cache.records(EntityKind::Advisor).is_empty());
}

#[tokio::test]
async fn test_advisor_with_empty_areas_is_not_saved() {
    let h = holding(true);
    let advisor: Advisor = serde_json::from_value(serde_json::json!({
        "name": "Marta",
        "degree": "MBA",
        "areasExpertise": []
    }))
    .unwrap();

    let err = h.reconciler.save(None, advisor).await.unwrap_err();

    assert!(matches!(err, SyncError::ValidationFailed(_)));
    assert!(h.cache.records(EntityKind::Advisor).is_empty());
    assert_eq!(h.remote.count_prefix("create asesores"), 0);
}

// ============================================================================
// Recruitment
// ============================================================================

#[tokio::test]
async fn test_record_recruitment_relevels_downline() {
    let h = holding(true);
    let (_, a, _) = chile_with_two_companies(&h).await;
    let ana = h.seller("Ana", a).await;
    let luis = h.seller("Luis", a).await;
    let eva = h.seller("Eva", a).await;

    // Luis recruits Eva, then Ana recruits Luis
    h.recruitments
        .record_recruitment(luis.clone(), eva.clone(), None, None)
        .await
        .unwrap();
    let outcome = h
        .recruitments
        .record_recruitment(ana.clone(), luis.clone(), None, None)
        .await
        .unwrap();

    assert_eq!(outcome.recruit.entity.level, 2);
    assert_eq!(outcome.relevelled, vec![eva.clone()]);
    let eva: Seller = h.reconciler.get(&eva).await.unwrap();
    assert_eq!(eva.level, 3);
    assert_eq!(h.cache.len(EntityKind::Recruitment), 2);
}

#[tokio::test]
async fn test_recruitment_cycle_is_rejected() {
    let h = holding(true);
    let (_, a, _) = chile_with_two_companies(&h).await;
    let ana = h.seller("Ana", a).await;
    let luis = h.seller("Luis", a).await;
    h.recruitments
        .record_recruitment(ana.clone(), luis.clone(), None, None)
        .await
        .unwrap();

    let err = h
        .recruitments
        .record_recruitment(luis, ana, None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::ValidationFailed(_)));
    assert_eq!(h.cache.len(EntityKind::Recruitment), 1);
    assert_eq!(h.notifier.last().unwrap().level, OutcomeLevel::Error);
}

#[tokio::test]
async fn test_rejected_recruit_update_writes_nothing() {
    let h = holding(true);
    let (_, a, _) = chile_with_two_companies(&h).await;
    let ana = h.seller("Ana", a).await;
    // Luis points at a company the cache does not know
    let mut sellers = h.cache.records(EntityKind::Seller);
    sellers.push(serde_json::json!({"code": "V050", "name": "Luis", "company": 99}));
    h.cache.seed(EntityKind::Seller, sellers);
    let writes = h.writes();

    let err = h
        .recruitments
        .record_recruitment(ana, SellerCode::new("V050").unwrap(), None, None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SyncError::UnknownReference {
            kind: EntityKind::Company,
            ..
        }
    ));
    assert_eq!(h.cache.len(EntityKind::Recruitment), 0);
    assert_eq!(h.writes(), writes);
    let luis: Seller = h.reconciler.get(&SellerCode::new("V050").unwrap()).await.unwrap();
    assert!(luis.recruiter.is_none());
    assert_eq!(h.notifier.last().unwrap().level, OutcomeLevel::Error);
}

#[tokio::test]
async fn test_recruitment_of_unknown_seller_is_not_found() {
    let h = holding(true);
    let (_, a, _) = chile_with_two_companies(&h).await;
    let ana = h.seller("Ana", a).await;

    let err = h
        .recruitments
        .record_recruitment(ana, SellerCode::new("V099").unwrap(), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::NotFound { .. }));
}

// ============================================================================
// Report
// ============================================================================

#[tokio::test]
async fn test_report_after_cascade() {
    let h = holding(true);
    let (chile, _, _) = chile_with_two_companies(&h).await;
    h.manager
        .delete_country(chile, Some(DeletePolicy::Cascade))
        .await
        .unwrap();

    let report = ReportUseCase::new(h.cache.clone()).report().await.unwrap();

    assert_eq!(report.totals.countries, 0);
    assert_eq!(report.totals.companies, 2);
    assert_eq!(report.totals.active_companies, 0);
    assert_eq!(report.countries_with_operations(), 0);
}

#[tokio::test]
async fn test_report_on_empty_cache_is_all_zero() {
    let h = holding(true);
    let report = ReportUseCase::new(h.cache.clone()).report().await.unwrap();

    assert_eq!(report.totals.companies, 0);
    assert_eq!(report.totals.sellers, 0);
    assert_eq!(report.avg_sellers_per_company(), 0.0);
    assert_eq!(report.avg_revenue_per_company(), 0.0);
}
