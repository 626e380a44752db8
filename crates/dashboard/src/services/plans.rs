//! Cached plan lookup.
//!
//! The subscription tier changes rarely and is needed by every gated view,
//! so it is cached per tenant using `moka` (configurable TTL).

use std::sync::Arc;
use std::time::Duration;

use chairside_core::{PlanTier, TenantId};
use moka::future::Cache;
use tracing::{debug, instrument};

use crate::source::{AnalyticsSource, SourceError};

/// Resolves a tenant's plan tier through a TTL cache.
#[derive(Clone)]
pub struct PlanResolver {
    inner: Arc<PlanResolverInner>,
}

struct PlanResolverInner {
    source: Arc<dyn AnalyticsSource>,
    cache: Cache<TenantId, PlanTier>,
}

impl PlanResolver {
    #[must_use]
    pub fn new(source: Arc<dyn AnalyticsSource>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(ttl)
            .build();

        Self {
            inner: Arc::new(PlanResolverInner { source, cache }),
        }
    }

    /// The tenant's current tier. A tenant without a subscription is on
    /// [`PlanTier::Start`].
    ///
    /// # Errors
    ///
    /// Returns `SourceError` if the subscription cannot be read. Failures are
    /// not cached.
    #[instrument(skip(self), fields(tenant = %tenant))]
    pub async fn resolve(&self, tenant: TenantId) -> Result<PlanTier, SourceError> {
        if let Some(tier) = self.inner.cache.get(&tenant).await {
            debug!(%tier, "Cache hit for plan tier");
            return Ok(tier);
        }

        let tier = self
            .inner
            .source
            .plan_tier(tenant)
            .await?
            .unwrap_or_default();

        self.inner.cache.insert(tenant, tier).await;
        Ok(tier)
    }

    /// Drop the cached tier, e.g. after a plan change.
    pub async fn invalidate(&self, tenant: TenantId) {
        self.inner.cache.invalidate(&tenant).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chairside_core::{BookingActivity, FraudLog, LoginAttempt};
    use chrono::{DateTime, Utc};
    use futures::future::{self, BoxFuture, FutureExt};

    use super::*;

    /// Counts plan lookups and serves a fixed tier.
    struct CountingSource {
        tier: Option<PlanTier>,
        lookups: AtomicUsize,
    }

    impl AnalyticsSource for CountingSource {
        fn ping(&self) -> BoxFuture<'_, Result<(), SourceError>> {
            future::ready(Ok(())).boxed()
        }

        fn plan_tier(&self, _: TenantId) -> BoxFuture<'_, Result<Option<PlanTier>, SourceError>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            future::ready(Ok(self.tier)).boxed()
        }

        fn login_attempts(
            &self,
            _: TenantId,
            _: DateTime<Utc>,
        ) -> BoxFuture<'_, Result<Vec<LoginAttempt>, SourceError>> {
            future::ready(Ok(Vec::new())).boxed()
        }

        fn fraud_logs(
            &self,
            _: TenantId,
            _: DateTime<Utc>,
        ) -> BoxFuture<'_, Result<Vec<FraudLog>, SourceError>> {
            future::ready(Ok(Vec::new())).boxed()
        }

        fn booking_activity(
            &self,
            _: TenantId,
            _: DateTime<Utc>,
            _: DateTime<Utc>,
        ) -> BoxFuture<'_, Result<BookingActivity, SourceError>> {
            future::ready(Ok(BookingActivity::default())).boxed()
        }
    }

    fn resolver(tier: Option<PlanTier>) -> (PlanResolver, Arc<CountingSource>) {
        let source = Arc::new(CountingSource {
            tier,
            lookups: AtomicUsize::new(0),
        });
        let resolver = PlanResolver::new(source.clone(), Duration::from_secs(60));
        (resolver, source)
    }

    #[tokio::test]
    async fn test_second_lookup_is_cached() {
        let (resolver, source) = resolver(Some(PlanTier::Growth));
        let tenant = TenantId::new(uuid::Uuid::new_v4());

        assert_eq!(resolver.resolve(tenant).await.unwrap(), PlanTier::Growth);
        assert_eq!(resolver.resolve(tenant).await.unwrap(), PlanTier::Growth);
        assert_eq!(source.lookups.load(Ordering::SeqCst), 1);

        resolver.invalidate(tenant).await;
        resolver.resolve(tenant).await.unwrap();
        assert_eq!(source.lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_missing_subscription_is_start() {
        let (resolver, _) = resolver(None);
        let tenant = TenantId::new(uuid::Uuid::new_v4());
        assert_eq!(resolver.resolve(tenant).await.unwrap(), PlanTier::Start);
    }
}
