//! Main application state management

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info};

use super::{Page, PageIndex, SharedPage, Timer};
use crate::{
    config::Settings,
    error::AppError,
    services::{BroadcastRegistry, Locale, LocaleCatalog, PageStore, RequestLimits, StorageError},
};

/// Positional timer index from a request; negative numbers address nothing
fn timer_index(number: i64) -> Result<usize, AppError> {
    usize::try_from(number).map_err(|_| AppError::TimerNotFound)
}

/// Capability granted by the link a page was resolved through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Public,
    Edit,
}

/// Service-wide state: the page indices, the registry and the collaborators
pub struct AppState {
    pub settings: Settings,
    /// Pages by edit link
    pub edit_links: PageIndex,
    /// Pages by public link
    pub public_links: PageIndex,
    pub registry: BroadcastRegistry,
    pub locales: LocaleCatalog,
    pub limits: RequestLimits,
    pub start_time: Instant,
    store: Arc<dyn PageStore>,
    ready: AtomicBool,
}

impl AppState {
    pub fn new(
        settings: Settings,
        store: Arc<dyn PageStore>,
        locales: LocaleCatalog,
        limits: RequestLimits,
    ) -> Self {
        Self {
            settings,
            edit_links: PageIndex::new(),
            public_links: PageIndex::new(),
            registry: BroadcastRegistry::new(),
            locales,
            limits,
            start_time: Instant::now(),
            store,
            ready: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &Arc<dyn PageStore> {
        &self.store
    }

    /// Whether the startup reload has completed
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Install the storage TTL and rebuild both indices from storage
    ///
    /// Returns the number of pages loaded. The service reports ready afterwards.
    pub async fn initialize(&self) -> Result<usize, StorageError> {
        self.store.ensure_ttl_index(self.settings.retention).await?;
        let documents = self.store.load_all().await?;

        let mut loaded = 0;
        for document in documents {
            let page = Page::from_document(document, self.settings.retention);
            if self.public_links.contains(&page.public_link) {
                continue;
            }
            self.index(page);
            loaded += 1;
        }

        self.ready.store(true, Ordering::Release);
        info!("Loaded {} pages from storage", loaded);
        Ok(loaded)
    }

    fn index(&self, page: Page) -> SharedPage {
        let edit_link = page.edit_link.clone();
        let public_link = page.public_link.clone();
        let shared = Arc::new(Mutex::new(page));
        self.edit_links.insert(edit_link, Arc::clone(&shared));
        self.public_links.insert(public_link, Arc::clone(&shared));
        shared
    }

    /// Create and persist an empty page, returning its edit link
    pub async fn create_page(&self, locale: &Locale) -> String {
        let page = Page::new(locale, self.settings.retention);
        let edit_link = page.edit_link.clone();
        info!("Creating page {}", page.public_link);

        let shared = self.index(page);
        let mut page = shared.lock().await;
        self.save(&mut page).await;
        edit_link
    }

    /// Resolve either link, public links first
    pub fn find_page(&self, link: &str) -> Option<(SharedPage, Permission)> {
        if let Some(page) = self.public_links.get(link) {
            return Some((page, Permission::Public));
        }
        self.edit_links.get(link).map(|page| (page, Permission::Edit))
    }

    /// Resolve an edit link
    pub fn edit_page(&self, edit_link: &str) -> Result<SharedPage, AppError> {
        self.edit_links.get(edit_link).ok_or(AppError::PageNotFound)
    }

    /// Lock the page behind `edit_link` for a mutation
    ///
    /// A page the sweeper discarded while the caller waited reads as missing.
    async fn lock_for_edit(&self, edit_link: &str) -> Result<OwnedMutexGuard<Page>, AppError> {
        let page = self.edit_page(edit_link)?.lock_owned().await;
        if page.is_discarded() {
            return Err(AppError::PageNotFound);
        }
        Ok(page)
    }

    /// Apply `operation` to a timer and commit if it reports a change
    pub async fn update_timer<F>(&self, edit_link: &str, number: i64, operation: F) -> Result<(), AppError>
    where
        F: FnOnce(&mut Timer) -> bool,
    {
        let mut page = self.lock_for_edit(edit_link).await?;
        if operation(page.timer_mut(timer_index(number)?)?) {
            self.save(&mut page).await;
        }
        Ok(())
    }

    pub async fn create_timer(&self, edit_link: &str, duration: f64, locale: &Locale) -> Result<(), AppError> {
        let mut page = self.lock_for_edit(edit_link).await?;
        page.create_timer(duration, locale.default_timer_name.clone());
        self.save(&mut page).await;
        Ok(())
    }

    pub async fn delete_timer(&self, edit_link: &str, number: i64) -> Result<(), AppError> {
        let mut page = self.lock_for_edit(edit_link).await?;
        page.delete_timer(timer_index(number)?)?;
        self.save(&mut page).await;
        Ok(())
    }

    pub async fn modify_settings(&self, edit_link: &str, name: String, color: String) -> Result<(), AppError> {
        let mut page = self.lock_for_edit(edit_link).await?;
        page.modify_settings(name, color);
        self.save(&mut page).await;
        Ok(())
    }

    /// Commit a page mutation: stamp it, push it to subscribers, then persist it
    ///
    /// Subscribers are served before the write so a storage outage never
    /// delays them. A failed write is logged; the next successful save
    /// stores the current state.
    pub async fn save(&self, page: &mut Page) {
        page.touch(Utc::now());

        match serde_json::to_string(&page.snapshot()) {
            Ok(payload) => {
                let delivered = self.registry.broadcast_update(&page.public_link, &payload);
                debug!("Broadcast page {} to {} subscribers", page.public_link, delivered);
            }
            Err(e) => error!("Failed to serialize page {}: {}", page.public_link, e),
        }

        if let Err(e) = self.store.upsert(&page.to_document()).await {
            error!("Failed to persist page {}: {}", page.public_link, e);
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}
