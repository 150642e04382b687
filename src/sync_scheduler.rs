// Drive Menu Sync Scheduler
// Re-syncs the menu tree on a fixed interval until cancelled

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Level};

use crate::config::AppConfig;
use crate::content_provider::ContentProvider;
use crate::providers::StoreError;

/// Transient store failures are warnings; anything else needs an operator
fn failure_level(error: &StoreError) -> Level {
    if error.is_recoverable() {
        Level::WARN
    } else {
        Level::ERROR
    }
}

/// Spawn a task that calls `provider.sync()` every `period`, first after one
/// full period. A failed sync is logged and the previous tree stays live.
pub fn spawn_periodic_sync(
    provider: Arc<ContentProvider>,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        // A sync that overruns its slot pushes the next one back
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Periodic sync every {:?}", period);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Periodic sync stopped");
                    break;
                }
                _ = ticker.tick() => {
                    match provider.sync().await {
                        Ok(report) => debug!(
                            "Scheduled sync done: {} nodes, generation {}",
                            report.nodes, report.generation
                        ),
                        Err(e) if failure_level(&e) == Level::WARN => {
                            warn!("Scheduled sync failed, retrying next interval: {}", e)
                        }
                        Err(e) => error!("Scheduled sync failed: {}", e),
                    }
                }
            }
        }
    })
}

/// Start the scheduler from `sync_interval_secs`; 0 disables it.
pub fn spawn_from_config(
    provider: Arc<ContentProvider>,
    config: &AppConfig,
    cancel: CancellationToken,
) -> Option<JoinHandle<()>> {
    if config.sync_interval_secs == 0 {
        info!("Periodic sync disabled");
        return None;
    }
    Some(spawn_periodic_sync(
        provider,
        Duration::from_secs(config.sync_interval_secs),
        cancel,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{MemoryStore, RemoteItem};

    fn provider(store: Arc<MemoryStore>) -> Arc<ContentProvider> {
        Arc::new(ContentProvider::new(store, &AppConfig::default()))
    }

    fn store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new().with_root(vec![RemoteItem::folder("Songs", "songs")]))
    }

    #[tokio::test]
    async fn test_syncs_until_cancelled() {
        let provider = provider(store());
        let cancel = CancellationToken::new();
        let handle = spawn_periodic_sync(provider.clone(), Duration::from_millis(10), cancel.clone());

        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
        handle.await.unwrap();

        let generation = provider.generation();
        assert!(generation >= 2, "only {} syncs ran", generation);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(provider.generation(), generation);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_loop() {
        let store = store();
        store.set_offline(true);
        let provider = provider(store.clone());
        let cancel = CancellationToken::new();
        let handle = spawn_periodic_sync(provider.clone(), Duration::from_millis(10), cancel.clone());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(provider.generation(), 0);
        store.set_offline(false);
        tokio::time::sleep(Duration::from_millis(80)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert!(provider.generation() >= 1);
        assert_eq!(provider.root().await.buttons().len(), 1);
    }

    #[test]
    fn test_failure_level() {
        assert_eq!(failure_level(&StoreError::ConnectionFailed("reset".into())), Level::WARN);
        assert_eq!(failure_level(&StoreError::ServerError("503".into())), Level::WARN);
        assert_eq!(failure_level(&StoreError::AuthenticationFailed("401".into())), Level::ERROR);
        assert_eq!(failure_level(&StoreError::NotFound("Guitar".into())), Level::ERROR);
    }

    #[tokio::test]
    async fn test_zero_interval_disables() {
        let config = AppConfig {
            sync_interval_secs: 0,
            ..AppConfig::default()
        };
        let handle = spawn_from_config(provider(store()), &config, CancellationToken::new());
        assert!(handle.is_none());
    }
}
