//! Recording recruitments
//!
//! A recruitment links two sellers. Recording one checks both writes up
//! front, then saves the `Recruitment` record and points the recruit at the
//! recruiter; the recruit's save refreshes the level of its downline.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use cybervision_core::domain::{
    CompanyId, EntityKind, Recruitment, RecruitmentForest, Seller, SellerCode,
};
use cybervision_core::ports::Notification;
use cybervision_core::usecases::{Persistence, ReconciliationService, Saved};
use cybervision_core::SyncError;

/// Result of [`RecruitmentService::record_recruitment`]
#[derive(Debug, Clone)]
pub struct RecruitmentOutcome {
    pub recruitment: Saved<Recruitment>,
    pub recruit: Saved<Seller>,
    /// Sellers below the recruit whose level was recomputed
    pub relevelled: Vec<SellerCode>,
    pub persistence: Persistence,
}

/// A recruitment that passed every check, ready to be written
struct Checked {
    record: Recruitment,
    recruit: Seller,
    relevelled: Vec<SellerCode>,
}

pub struct RecruitmentService {
    reconciler: Arc<ReconciliationService>,
}

impl RecruitmentService {
    pub fn new(reconciler: Arc<ReconciliationService>) -> Self {
        Self { reconciler }
    }

    /// Records that `recruiter` brought `recruit` into `company`
    ///
    /// `company` defaults to the recruiter's company and `date` to now.
    /// Rejected when either seller is missing, when they are the same
    /// seller, when the recruiter already sits below the recruit, or when the
    /// updated recruit would not pass its own save checks. Nothing is written
    /// on rejection.
    pub async fn record_recruitment(
        &self,
        recruiter: SellerCode,
        recruit: SellerCode,
        company: Option<CompanyId>,
        date: Option<DateTime<Utc>>,
    ) -> Result<RecruitmentOutcome, SyncError> {
        let checked = match self.check(&recruiter, &recruit, company, date).await {
            Ok(checked) => checked,
            Err(err) => {
                self.reconciler
                    .notify(
                        Notification::error("Recruitment not recorded", err.to_string())
                            .with_kind(EntityKind::Recruitment),
                    )
                    .await;
                return Err(err);
            }
        };

        let recruitment = self.reconciler.save(None, checked.record).await?;
        // Saving the recruit also refreshes the levels of its downline
        let recruit_saved = self
            .reconciler
            .save(Some(recruit.clone()), checked.recruit)
            .await?;
        let persistence = recruitment.persistence.merge(recruit_saved.persistence);

        info!(
            recruiter = %recruiter,
            recruit = %recruit,
            level = recruit_saved.entity.level,
            downline = checked.relevelled.len(),
            "Recruitment recorded"
        );

        Ok(RecruitmentOutcome {
            recruitment,
            recruit: recruit_saved,
            relevelled: checked.relevelled,
            persistence,
        })
    }

    async fn check(
        &self,
        recruiter: &SellerCode,
        recruit: &SellerCode,
        company: Option<CompanyId>,
        date: Option<DateTime<Utc>>,
    ) -> Result<Checked, SyncError> {
        if recruiter == recruit {
            return Err(SyncError::ValidationFailed(format!(
                "seller {} cannot recruit themselves",
                recruit
            )));
        }
        let recruiter_seller: Seller = self.reconciler.get(recruiter).await?;
        let recruit_seller: Seller = self.reconciler.get(recruit).await?;

        let sellers: Vec<Seller> = self.reconciler.list().await?;
        let forest = RecruitmentForest::from_sellers(&sellers);
        if forest.is_ancestor(recruit, recruiter) {
            return Err(SyncError::ValidationFailed(format!(
                "{} is already in the downline of {}",
                recruiter, recruit
            )));
        }

        let mut record = Recruitment::new(
            recruiter.clone(),
            recruit.clone(),
            company.unwrap_or(recruiter_seller.company),
        );
        if let Some(date) = date {
            record.date = date;
        }
        let record = self.reconciler.check(None, record).await?;

        let mut updated = recruit_seller;
        updated.recruiter = Some(recruiter.clone());
        updated.recruited_at = record.date;
        let updated = self.reconciler.check(Some(recruit), updated).await?;

        let mut after = forest;
        after.link(recruit.clone(), recruiter.clone());
        let downline = after.descendants(recruit);
        let relevelled = sellers
            .iter()
            .filter_map(|s| s.code.as_ref().map(|c| (c, s.level)))
            .filter(|(c, level)| downline.contains(c) && after.level(c) != *level)
            .map(|(c, _)| c.clone())
            .collect();

        Ok(Checked {
            record,
            recruit: updated,
            relevelled,
        })
    }
}
