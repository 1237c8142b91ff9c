use crate::adapters::database::DbPool;
use crate::config::{HealthConfig, TypingBackend};
use opentelemetry::{KeyValue, global, metrics::Gauge};
use std::time::Duration;
use tokio::time::timeout;

/// Outcome of a single readiness check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentStatus {
    Ok,
    Error,
}

impl ComponentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }

    const fn gauge_value(self) -> i64 {
        match self {
            Self::Ok => 1,
            Self::Error => 0,
        }
    }
}

/// What `/readyz` reports: the database pool and the configured typing store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Readiness {
    pub database: ComponentStatus,
    pub typing: ComponentStatus,
    pub typing_backend: TypingBackend,
}

impl Readiness {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.database == ComponentStatus::Ok && self.typing == ComponentStatus::Ok
    }
}

#[derive(Clone, Debug)]
pub struct HealthService {
    pool: DbPool,
    check_timeout: Duration,
    typing_backend: TypingBackend,
    component_status: Gauge<i64>,
}

impl HealthService {
    #[must_use]
    pub fn new(pool: DbPool, config: &HealthConfig, typing_backend: TypingBackend) -> Self {
        let component_status = global::meter("alertdavao-server")
            .i64_gauge("alertdavao_health_status")
            .with_description("Readiness per component (1 for ok, 0 for error)")
            .build();
        Self { pool, check_timeout: Duration::from_millis(config.db_timeout_ms), typing_backend, component_status }
    }

    /// Runs every readiness check. The typing store only touches the database when it lives there.
    pub async fn readiness(&self) -> Readiness {
        let database = self.run_check("database", "SELECT 1").await;
        let typing = match self.typing_backend {
            TypingBackend::Memory => ComponentStatus::Ok,
            TypingBackend::Database => self.run_check("typing", "SELECT 1 FROM typing_signals LIMIT 1").await,
        };
        for (component, status) in [("database", database), ("typing", typing)] {
            self.component_status.record(status.gauge_value(), &[KeyValue::new("component", component)]);
        }

        Readiness { database, typing, typing_backend: self.typing_backend }
    }

    async fn run_check(&self, component: &'static str, sql: &'static str) -> ComponentStatus {
        match timeout(self.check_timeout, sqlx::query(sql).execute(&self.pool)).await {
            Ok(Ok(_)) => ComponentStatus::Ok,
            Ok(Err(e)) => {
                tracing::warn!(component, error = %e, "Readiness check failed");
                ComponentStatus::Error
            }
            Err(_) => {
                tracing::warn!(component, timeout = ?self.check_timeout, "Readiness check timed out");
                ComponentStatus::Error
            }
        }
    }
}
