//! Quota ledger service backed by the quota repository.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::ports::{QuotaLedger, QuotaRepository, QuotaRepositoryError};
use super::{Error, QuotaLimit, ResellerId, ResellerQuota, Resource, UsageCounters};

/// Map quota repository failures onto the domain error.
pub(crate) fn map_quota_error(error: QuotaRepositoryError) -> Error {
    match error {
        QuotaRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("quota repository unavailable: {message}"))
        }
        QuotaRepositoryError::Query { message } => {
            Error::internal(format!("quota repository error: {message}"))
        }
        QuotaRepositoryError::Corrupt { message } => {
            Error::internal(format!("quota data is inconsistent: {message}"))
        }
    }
}

fn reseller_not_found(reseller_id: ResellerId) -> Error {
    Error::not_found(format!("reseller {reseller_id} not found"))
}

/// [`QuotaLedger`] implementation.
#[derive(Clone)]
pub struct QuotaLedgerService<Q> {
    quota_repo: Arc<Q>,
}

impl<Q> QuotaLedgerService<Q> {
    pub fn new(quota_repo: Arc<Q>) -> Self {
        Self { quota_repo }
    }
}

#[async_trait]
impl<Q> QuotaLedger for QuotaLedgerService<Q>
where
    Q: QuotaRepository,
{
    async fn current_usage(
        &self,
        reseller_id: ResellerId,
        resource: Resource,
    ) -> Result<u64, Error> {
        Ok(self.snapshot(reseller_id).await?.usage.get(resource))
    }

    async fn maximum(
        &self,
        reseller_id: ResellerId,
        resource: Resource,
    ) -> Result<QuotaLimit, Error> {
        Ok(self.snapshot(reseller_id).await?.limits.get(resource))
    }

    async fn recompute(&self, reseller_id: ResellerId) -> Result<UsageCounters, Error> {
        let usage = self
            .quota_repo
            .recompute(reseller_id)
            .await
            .map_err(map_quota_error)?
            .ok_or_else(|| reseller_not_found(reseller_id))?;
        info!(
            reseller_id = reseller_id.get(),
            domains = usage.domains,
            aliases = usage.aliases,
            "reseller usage recomputed"
        );
        Ok(usage)
    }

    async fn snapshot(&self, reseller_id: ResellerId) -> Result<ResellerQuota, Error> {
        self.quota_repo
            .find_quota(reseller_id)
            .await
            .map_err(map_quota_error)?
            .ok_or_else(|| reseller_not_found(reseller_id))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::QuotaLimits;
    use crate::domain::ports::MockQuotaRepository;
    use rstest::rstest;

    fn quota_with_aliases(limit: QuotaLimit, current: u64) -> ResellerQuota {
        ResellerQuota {
            reseller_id: ResellerId::new(1),
            limits: QuotaLimits::unlimited().with(Resource::Alias, limit),
            usage: UsageCounters::default().with(Resource::Alias, current),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn reads_usage_and_maximum_from_the_snapshot() {
        let mut repo = MockQuotaRepository::new();
        repo.expect_find_quota()
            .times(2)
            .returning(|_| Ok(Some(quota_with_aliases(QuotaLimit::Limited(5), 2))));
        let ledger = QuotaLedgerService::new(Arc::new(repo));

        let usage = ledger
            .current_usage(ResellerId::new(1), Resource::Alias)
            .await
            .expect("usage");
        let maximum = ledger
            .maximum(ResellerId::new(1), Resource::Alias)
            .await
            .expect("maximum");

        assert_eq!(usage, 2);
        assert_eq!(maximum, QuotaLimit::Limited(5));
    }

    #[rstest]
    #[tokio::test]
    async fn recompute_returns_fresh_counters() {
        let mut repo = MockQuotaRepository::new();
        repo.expect_recompute()
            .times(1)
            .return_once(|_| Ok(Some(UsageCounters::default().with(Resource::Alias, 3))));
        let ledger = QuotaLedgerService::new(Arc::new(repo));

        let usage = ledger.recompute(ResellerId::new(1)).await.expect("recompute");
        assert_eq!(usage.aliases, 3);
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_reseller_is_not_found() {
        let mut repo = MockQuotaRepository::new();
        repo.expect_find_quota().times(1).return_once(|_| Ok(None));
        let ledger = QuotaLedgerService::new(Arc::new(repo));

        let err = ledger
            .snapshot(ResellerId::new(7))
            .await
            .expect_err("missing reseller");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[case(QuotaRepositoryError::connection("refused"), ErrorCode::ServiceUnavailable)]
    #[case(QuotaRepositoryError::query("syntax"), ErrorCode::InternalError)]
    #[case(QuotaRepositoryError::corrupt("max_als_cnt = -5"), ErrorCode::InternalError)]
    #[tokio::test]
    async fn repository_failures_map_to_error_codes(
        #[case] failure: QuotaRepositoryError,
        #[case] expected: ErrorCode,
    ) {
        let mut repo = MockQuotaRepository::new();
        repo.expect_recompute()
            .times(1)
            .return_once(move |_| Err(failure));
        let ledger = QuotaLedgerService::new(Arc::new(repo));

        let err = ledger
            .recompute(ResellerId::new(1))
            .await
            .expect_err("failure");
        assert_eq!(err.code(), expected);
    }
}
