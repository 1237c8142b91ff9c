use crate::error::AppError;
use crate::services::typing::TypingService;
use std::time::Duration;
use tracing::Instrument;

/// Drops typing signals that expired without anyone checking them.
#[derive(Debug)]
pub struct TypingSweepWorker {
    typing_service: TypingService,
    interval: Duration,
}

impl TypingSweepWorker {
    #[must_use]
    pub const fn new(typing_service: TypingService, interval: Duration) -> Self {
        Self { typing_service, interval }
    }

    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.interval);

        while !*shutdown.borrow() {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.sweep()
                        .instrument(tracing::info_span!("typing_sweep_iteration"))
                        .await
                    {
                        tracing::error!(error = ?e, "Typing sweep iteration failed");
                    }
                }
                _ = shutdown.changed() => {}
            }
        }
        tracing::info!("Typing sweep loop shutting down...");
    }

    /// # Errors
    /// Returns an error if the store cannot be swept.
    #[tracing::instrument(skip(self), err, fields(purged = tracing::field::Empty))]
    pub async fn sweep(&self) -> Result<u64, AppError> {
        let purged = self.typing_service.purge_expired().await?;
        if purged > 0 {
            tracing::debug!(count = %purged, "Purged stale typing signals");
            tracing::Span::current().record("purged", purged);
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::typing::InMemoryTypingStore;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_sweep_purges_expired_signals() {
        let service = TypingService::new(Arc::new(InMemoryTypingStore::new(Duration::from_millis(3000))));
        service.set_typing(1, 2, true).await.unwrap();
        service.set_typing(2, 1, true).await.unwrap();

        let worker = TypingSweepWorker::new(service, Duration::from_secs(30));
        assert_eq!(worker.sweep().await.unwrap(), 0);

        tokio::time::advance(Duration::from_millis(3001)).await;
        assert_eq!(worker.sweep().await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown() {
        let service = TypingService::new(Arc::new(InMemoryTypingStore::new(Duration::from_millis(3000))));
        let worker = TypingSweepWorker::new(service, Duration::from_secs(30));
        let (tx, rx) = tokio::sync::watch::channel(false);

        let handle = tokio::spawn(worker.run(rx));
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    }
}
