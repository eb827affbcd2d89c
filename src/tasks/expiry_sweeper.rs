//! Expiry sweeper background task

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::state::{AppState, Expirable};

/// Remove every page expired at `now` from both indices and from storage
///
/// Returns the number of pages removed. Each page is checked and removed under
/// its own lock and marked discarded, so a mutation that already holds the page
/// either lands first and keeps it alive or finds it gone. Storage deletes
/// tolerate documents that its own TTL already purged.
pub async fn sweep_once(state: &AppState, now: DateTime<Utc>) -> usize {
    let mut removed = 0;
    for (public_link, shared) in state.public_links.snapshot() {
        let mut page = shared.lock().await;
        if page.is_discarded() || !page.is_expired_at(now) {
            continue;
        }
        if !state.public_links.remove_if_same(&public_link, &shared) {
            continue;
        }
        state.edit_links.remove_if_same(&page.edit_link, &shared);
        page.discard();
        removed += 1;

        debug!("Page {} expired", public_link);
        if let Err(e) = state.store().delete(&public_link).await {
            warn!("Failed to delete expired page {}: {}", public_link, e);
        }
    }
    removed
}

/// Handle on the periodic sweep task
pub struct ExpirySweeper {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl ExpirySweeper {
    /// Start sweeping every `settings.sweep_interval`, first run one interval from now
    pub fn spawn(state: Arc<AppState>) -> Self {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let period = state.settings.sweep_interval;

        let handle = tokio::spawn(async move {
            info!("Starting expiry sweeper, interval {:?}", period);
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = sweep_once(&state, Utc::now()).await;
                        if removed > 0 {
                            info!("Expiry sweep removed {} pages", removed);
                        } else {
                            debug!("Expiry sweep found nothing to remove");
                        }
                    }
                    _ = stop_rx.changed() => break,
                }
            }

            info!("Expiry sweeper stopped");
        });

        Self { stop_tx, handle }
    }

    /// Stop the task and wait for it to finish
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.handle.await {
            warn!("Expiry sweeper ended abnormally: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::{
        config::Settings,
        error::AppError,
        services::{Locale, LocaleCatalog, MemoryStore, PageStore, RequestLimits},
    };

    fn state(store: Arc<MemoryStore>, sweep_interval: Duration) -> Arc<AppState> {
        let settings = Settings {
            sweep_interval,
            ..Settings::default()
        };
        Arc::new(AppState::new(
            settings,
            store,
            LocaleCatalog::builtin(),
            RequestLimits::unlimited(),
        ))
    }

    async fn page_aged(state: &AppState, age: chrono::Duration) -> (String, String) {
        let edit_link = state.create_page(&Locale::default()).await;
        let shared = state.edit_page(&edit_link).unwrap();
        let mut page = shared.lock().await;
        page.touch(Utc::now() - age);
        (edit_link, page.public_link.clone())
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired_pages() {
        let store = Arc::new(MemoryStore::new());
        let state = state(store.clone(), Duration::from_secs(3600));
        let (old_edit, old_public) = page_aged(&state, chrono::Duration::days(8)).await;
        let (new_edit, new_public) = page_aged(&state, chrono::Duration::hours(1)).await;

        assert_eq!(sweep_once(&state, Utc::now()).await, 1);

        assert!(!state.edit_links.contains(&old_edit));
        assert!(!state.public_links.contains(&old_public));
        assert!(store.get(&old_public).is_none());

        assert!(state.edit_links.contains(&new_edit));
        assert!(state.public_links.contains(&new_public));
        assert!(store.get(&new_public).is_some());
    }

    #[tokio::test]
    async fn test_sweep_tolerates_storage_already_purged() {
        let store = Arc::new(MemoryStore::new());
        let state = state(store.clone(), Duration::from_secs(3600));
        let (_, public) = page_aged(&state, chrono::Duration::days(30)).await;
        store.delete(&public).await.unwrap();

        assert_eq!(sweep_once(&state, Utc::now()).await, 1);
        assert!(state.public_links.is_empty());
        assert_eq!(sweep_once(&state, Utc::now()).await, 0);
    }

    #[tokio::test]
    async fn test_spawned_sweeper_runs_and_stops() {
        let store = Arc::new(MemoryStore::new());
        let state = state(store, Duration::from_millis(20));
        let (edit, _) = page_aged(&state, chrono::Duration::days(8)).await;

        let sweeper = ExpirySweeper::spawn(Arc::clone(&state));
        for _ in 0..100 {
            if !state.edit_links.contains(&edit) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!state.edit_links.contains(&edit));

        sweeper.stop().await;
    }

    #[tokio::test]
    async fn test_mutation_after_sweep_finds_page_gone() {
        let store = Arc::new(MemoryStore::new());
        let state = state(store.clone(), Duration::from_secs(3600));
        let (edit, public) = page_aged(&state, chrono::Duration::days(8)).await;
        let shared = state.edit_page(&edit).unwrap();

        // The sweep queues on the page lock first, the edit right behind it
        let guard = shared.lock().await;
        let sweep = sweep_once(&state, Utc::now());
        tokio::pin!(sweep);
        assert!(futures::poll!(sweep.as_mut()).is_pending());
        let locale = Locale::default();
        let edit_op = state.create_timer(&edit, 5.0, &locale);
        tokio::pin!(edit_op);
        assert!(futures::poll!(edit_op.as_mut()).is_pending());
        drop(guard);

        assert_eq!(sweep.await, 1);
        assert!(matches!(edit_op.await, Err(AppError::PageNotFound)));
        assert!(!state.edit_links.contains(&edit));
        assert!(!state.public_links.contains(&public));
        assert!(store.get(&public).is_none());
    }

    #[tokio::test]
    async fn test_mutation_before_sweep_keeps_page() {
        let store = Arc::new(MemoryStore::new());
        let state = state(store.clone(), Duration::from_secs(3600));
        let (edit, public) = page_aged(&state, chrono::Duration::days(8)).await;
        let shared = state.edit_page(&edit).unwrap();

        // The edit queues first and re-stamps the page before the sweep looks
        let guard = shared.lock().await;
        let locale = Locale::default();
        let edit_op = state.create_timer(&edit, 5.0, &locale);
        tokio::pin!(edit_op);
        assert!(futures::poll!(edit_op.as_mut()).is_pending());
        let sweep = sweep_once(&state, Utc::now());
        tokio::pin!(sweep);
        assert!(futures::poll!(sweep.as_mut()).is_pending());
        drop(guard);

        edit_op.await.unwrap();
        assert_eq!(sweep.await, 0);
        assert!(state.edit_links.contains(&edit));
        assert!(state.public_links.contains(&public));
        assert_eq!(store.get(&public).unwrap().page.timers.len(), 1);
    }
}
