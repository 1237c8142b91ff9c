#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod telemetry;
pub mod workers;

use crate::adapters::database::DbPool;
use crate::adapters::database::message_repo::MessageRepository;
use crate::adapters::database::report_repo::ReportRepository;
use crate::adapters::database::typing_repo::TypingRepository;
use crate::adapters::database::user_repo::UserRepository;
use crate::api::ServiceContainer;
use crate::config::{Config, TypingBackend};
use crate::services::account_service::AccountService;
use crate::services::auth_service::AuthService;
use crate::services::conversation_service::ConversationService;
use crate::services::health_service::HealthService;
use crate::services::message_service::MessageService;
use crate::services::rate_limit_service::RateLimitService;
use crate::services::report_service::ReportService;
use crate::services::typing::{InMemoryTypingStore, PgTypingStore, TypingService, TypingStore};
use crate::workers::TypingSweepWorker;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Everything `main` needs after wiring: the services for the routers and the background workers.
#[derive(Debug)]
pub struct App {
    pub services: ServiceContainer,
    pub health_service: HealthService,
    pub workers: Workers,
}

/// Background tasks owned by the process, started explicitly by [`Workers::spawn_all`].
#[derive(Debug)]
pub struct Workers {
    pub typing_sweep: TypingSweepWorker,
}

impl Workers {
    #[must_use]
    pub fn spawn_all(self, shutdown_rx: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        vec![tokio::spawn(self.typing_sweep.run(shutdown_rx))]
    }
}

/// Wires repositories, the typing store and services from configuration. Performs no I/O.
#[derive(Debug)]
pub struct AppBuilder {
    config: Config,
    pool: Option<DbPool>,
}

impl AppBuilder {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config, pool: None }
    }

    #[must_use]
    pub fn with_database(mut self, pool: DbPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// # Errors
    /// Returns an error if no database pool was supplied.
    pub fn build(self) -> anyhow::Result<App> {
        let config = self.config;
        let pool = self.pool.ok_or_else(|| anyhow::anyhow!("Database pool is required"))?;

        let message_repo = MessageRepository::new();
        let user_repo = UserRepository::new();
        let report_repo = ReportRepository::new();

        let window = Duration::from_millis(config.typing.liveness_window_ms);
        let typing_store: Arc<dyn TypingStore> = match config.typing.backend {
            TypingBackend::Memory => Arc::new(InMemoryTypingStore::new(window)),
            TypingBackend::Database => Arc::new(PgTypingStore::new(pool.clone(), TypingRepository::new(), window)),
        };
        tracing::info!(backend = ?config.typing.backend, window_ms = config.typing.liveness_window_ms, "Typing store ready");

        let auth_service = AuthService::new(config.auth.clone());
        let account_service = AccountService::new(pool.clone(), user_repo.clone(), auth_service.clone());
        let message_service = MessageService::new(pool.clone(), message_repo.clone(), config.messaging.clone());
        let conversation_service = ConversationService::new(pool.clone(), message_repo, user_repo.clone());
        let typing_service = TypingService::new(typing_store);
        let report_service = ReportService::new(pool.clone(), report_repo, user_repo, config.reports.clone());
        let health_service = HealthService::new(pool.clone(), &config.health, config.typing.backend);
        let rate_limit_service = RateLimitService::new(config.server.trusted_proxies.clone());

        let typing_sweep = TypingSweepWorker::new(
            typing_service.clone(),
            Duration::from_secs(config.typing.sweep_interval_secs.max(1)),
        );

        Ok(App {
            services: ServiceContainer {
                pool,
                account_service,
                auth_service,
                message_service,
                conversation_service,
                typing_service,
                report_service,
                health_service: health_service.clone(),
                rate_limit_service,
            },
            health_service,
            workers: Workers { typing_sweep },
        })
    }
}

/// Applies the embedded migrations.
///
/// # Errors
/// Returns an error if a migration fails to apply.
pub async fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    sqlx::migrate!().run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Flips `shutdown_tx` on SIGINT or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
            () = terminate => tracing::info!("Received SIGTERM, shutting down"),
        }

        let _ = shutdown_tx.send(true);
    });
}

/// Routes panics through `tracing` so they reach the configured log sink.
pub fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info.location().map(|l| format!("{}:{}", l.file(), l.line())).unwrap_or_default();
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());

        tracing::error!(location = %location, payload = %payload, "Panic occurred");
    }));
}
