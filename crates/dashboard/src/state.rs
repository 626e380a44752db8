//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use chairside_core::AnalyticsPolicy;
use chrono::{DateTime, Utc};

use crate::services::{AnalyticsService, PlanResolver};
use crate::source::AnalyticsSource;

/// Source of "now" for every windowed view.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stopped at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    source: Arc<dyn AnalyticsSource>,
    analytics: AnalyticsService,
    clock: Arc<dyn Clock>,
}

impl AppState {
    /// Create application state over a data source.
    ///
    /// # Arguments
    ///
    /// * `source` - Where raw events and plans are read from
    /// * `policy` - Validated analytics policy
    /// * `plan_cache_ttl` - How long a resolved plan tier is reused
    #[must_use]
    pub fn new(
        source: Arc<dyn AnalyticsSource>,
        policy: AnalyticsPolicy,
        plan_cache_ttl: Duration,
    ) -> Self {
        Self::with_clock(source, policy, plan_cache_ttl, Arc::new(SystemClock))
    }

    /// Same as [`AppState::new`] with an explicit clock.
    #[must_use]
    pub fn with_clock(
        source: Arc<dyn AnalyticsSource>,
        policy: AnalyticsPolicy,
        plan_cache_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let plans = PlanResolver::new(Arc::clone(&source), plan_cache_ttl);
        let analytics = AnalyticsService::new(Arc::clone(&source), plans, Arc::new(policy));

        Self {
            inner: Arc::new(AppStateInner {
                source,
                analytics,
                clock,
            }),
        }
    }

    /// Get a reference to the data source.
    #[must_use]
    pub fn source(&self) -> &dyn AnalyticsSource {
        self.inner.source.as_ref()
    }

    /// Get a reference to the analytics service.
    #[must_use]
    pub fn analytics(&self) -> &AnalyticsService {
        &self.inner.analytics
    }

    /// The current time according to the state's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }
}
