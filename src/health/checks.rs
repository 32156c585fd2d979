//! Health check records and aggregation.

use async_trait::async_trait;
use futures_util::future::join_all;
use futures_util::FutureExt;
use serde::Serialize;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use crate::observability::metrics;
use crate::persistence::{CatalogRepository, IdentityStore};

/// Ordered worst to best, so the aggregate is the minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum HealthStatus {
    Unhealthy,
    Degraded,
    Healthy,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HealthStatus::Unhealthy => "Unhealthy",
            HealthStatus::Degraded => "Degraded",
            HealthStatus::Healthy => "Healthy",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckResult {
    pub status: HealthStatus,
    pub description: Option<String>,
}

impl HealthCheckResult {
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            description: None,
        }
    }

    pub fn unhealthy(description: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            description: Some(description.into()),
        }
    }
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self) -> HealthCheckResult;
}

/// Liveness of the API process itself. Always healthy.
pub struct SelfCheck;

#[async_trait]
impl HealthCheck for SelfCheck {
    async fn check(&self) -> HealthCheckResult {
        HealthCheckResult::healthy()
    }
}

pub struct CatalogStoreCheck(pub Arc<dyn CatalogRepository>);

#[async_trait]
impl HealthCheck for CatalogStoreCheck {
    async fn check(&self) -> HealthCheckResult {
        match self.0.ping().await {
            Ok(()) => HealthCheckResult::healthy(),
            Err(err) => HealthCheckResult::unhealthy(err.to_string()),
        }
    }
}

pub struct IdentityStoreCheck(pub Arc<dyn IdentityStore>);

#[async_trait]
impl HealthCheck for IdentityStoreCheck {
    async fn check(&self) -> HealthCheckResult {
        match self.0.ping().await {
            Ok(()) => HealthCheckResult::healthy(),
            Err(err) => HealthCheckResult::unhealthy(err.to_string()),
        }
    }
}

/// A named, tagged check.
#[derive(Clone)]
pub struct HealthRecord {
    pub name: String,
    pub tags: Vec<String>,
    check: Arc<dyn HealthCheck>,
}

impl fmt::Debug for HealthRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthRecord")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub entries: Vec<(String, HealthCheckResult)>,
}

#[derive(Default)]
pub struct HealthChecksBuilder {
    records: Vec<HealthRecord>,
    timeout: Option<Duration>,
}

impl HealthChecksBuilder {
    pub fn add<C: HealthCheck + 'static>(mut self, name: impl Into<String>, tags: &[&str], check: C) -> Self {
        self.records.push(HealthRecord {
            name: name.into(),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            check: Arc::new(check),
        });
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> HealthChecks {
        HealthChecks {
            records: self.records,
            timeout: self.timeout.unwrap_or(Duration::from_secs(5)),
        }
    }
}

/// The registered health record set.
#[derive(Debug)]
pub struct HealthChecks {
    records: Vec<HealthRecord>,
    timeout: Duration,
}

impl HealthChecks {
    pub fn builder() -> HealthChecksBuilder {
        HealthChecksBuilder::default()
    }

    pub fn names(&self) -> Vec<&str> {
        self.records.iter().map(|record| record.name.as_str()).collect()
    }

    /// Run the records selected by `predicate` and aggregate them.
    pub async fn report<P>(&self, predicate: P) -> HealthReport
    where
        P: Fn(&HealthRecord) -> bool,
    {
        let selected: Vec<&HealthRecord> = self.records.iter().filter(|r| predicate(r)).collect();
        let results = join_all(selected.iter().map(|record| self.run(record))).await;

        let status = results
            .iter()
            .map(|result| result.status)
            .min()
            .unwrap_or(HealthStatus::Healthy);
        let entries = selected
            .iter()
            .map(|record| record.name.clone())
            .zip(results)
            .collect();

        HealthReport { status, entries }
    }

    async fn run(&self, record: &HealthRecord) -> HealthCheckResult {
        let guarded = AssertUnwindSafe(record.check.check()).catch_unwind();
        let result = match tokio::time::timeout(self.timeout, guarded).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => HealthCheckResult::unhealthy("health check panicked"),
            Err(_) => HealthCheckResult::unhealthy(format!("timed out after {:?}", self.timeout)),
        };

        if result.status != HealthStatus::Healthy {
            tracing::warn!(
                check = %record.name,
                status = %result.status,
                description = result.description.as_deref().unwrap_or(""),
                "Health check not healthy"
            );
        }
        metrics::record_health(&record.name, result.status == HealthStatus::Healthy);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(HealthStatus);

    #[async_trait]
    impl HealthCheck for Fixed {
        async fn check(&self) -> HealthCheckResult {
            HealthCheckResult {
                status: self.0,
                description: None,
            }
        }
    }

    struct Hangs;

    #[async_trait]
    impl HealthCheck for Hangs {
        async fn check(&self) -> HealthCheckResult {
            std::future::pending::<()>().await;
            HealthCheckResult::healthy()
        }
    }

    fn checks() -> HealthChecks {
        HealthChecks::builder()
            .add("selfapi", &[], SelfCheck)
            .add("catalog-store", &["store"], Fixed(HealthStatus::Unhealthy))
            .add("cache", &[], Fixed(HealthStatus::Degraded))
            .timeout(Duration::from_millis(20))
            .build()
    }

    #[tokio::test]
    async fn test_predicate_limits_evaluation() {
        let report = checks().report(|r| r.name == "selfapi").await;
        assert_eq!(report.status, HealthStatus::Healthy);
        assert_eq!(report.entries.len(), 1);
    }

    #[tokio::test]
    async fn test_worst_status_wins() {
        let report = checks().report(|_| true).await;
        assert_eq!(report.status, HealthStatus::Unhealthy);

        let report = checks().report(|r| r.tags.is_empty()).await;
        assert_eq!(report.status, HealthStatus::Degraded);
    }

    #[tokio::test]
    async fn test_empty_selection_is_healthy() {
        let report = checks().report(|_| false).await;
        assert_eq!(report.status, HealthStatus::Healthy);
        assert!(report.entries.is_empty());
    }

    #[tokio::test]
    async fn test_hung_check_times_out() {
        let checks = HealthChecks::builder()
            .add("slow", &[], Hangs)
            .timeout(Duration::from_millis(10))
            .build();
        let report = checks.report(|_| true).await;
        assert_eq!(report.status, HealthStatus::Unhealthy);
    }
}
