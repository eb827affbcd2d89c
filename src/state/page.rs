//! Timer page structure and its storage/wire representations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Expirable, Timer};
use crate::{
    error::AppError,
    services::Locale,
    utils::{random_link, links::LINK_LENGTH},
};

/// Default page color
pub const DEFAULT_COLOR: &str = "indigo";

/// An ordered set of timers reachable through an edit link and a public link
#[derive(Debug, Clone)]
pub struct Page {
    /// Read-only capability, also the storage key
    pub public_link: String,
    /// Mutation capability
    pub edit_link: String,
    pub name: String,
    pub color: String,
    /// Timers in display and addressing order
    pub timers: Vec<Timer>,
    pub last_modified: DateTime<Utc>,
    retention: chrono::Duration,
    discarded: bool,
}

/// What subscribers and page fetches see
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub timers: Vec<Timer>,
    pub public_link: String,
    pub name: String,
    pub color: String,
}

/// What the page store keeps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub edit_link: String,
    pub last_modified: DateTime<Utc>,
    #[serde(flatten)]
    pub page: PageSnapshot,
}

impl Page {
    /// Create an empty page with fresh links and the locale's default name
    pub fn new(locale: &Locale, retention: chrono::Duration) -> Self {
        Self {
            public_link: random_link(LINK_LENGTH),
            edit_link: random_link(LINK_LENGTH),
            name: locale.default_page_name.clone(),
            color: DEFAULT_COLOR.to_string(),
            timers: Vec::new(),
            last_modified: Utc::now(),
            retention,
            discarded: false,
        }
    }

    /// Rebuild a page from its stored document
    pub fn from_document(document: PageDocument, retention: chrono::Duration) -> Self {
        Self {
            public_link: document.id,
            edit_link: document.edit_link,
            name: document.page.name,
            color: document.page.color,
            timers: document.page.timers,
            last_modified: document.last_modified,
            retention,
            discarded: false,
        }
    }

    /// Append a paused timer of `duration` seconds
    pub fn create_timer(&mut self, duration: f64, name: impl Into<String>) {
        self.timers.push(Timer::new(duration, name));
    }

    /// Remove the timer at `index`, keeping the order of the others
    pub fn delete_timer(&mut self, index: usize) -> Result<Timer, AppError> {
        if index >= self.timers.len() {
            return Err(AppError::TimerNotFound);
        }
        Ok(self.timers.remove(index))
    }

    pub fn modify_settings(&mut self, name: impl Into<String>, color: impl Into<String>) {
        self.name = name.into();
        self.color = color.into();
    }

    pub fn timer_mut(&mut self, index: usize) -> Result<&mut Timer, AppError> {
        self.timers.get_mut(index).ok_or(AppError::TimerNotFound)
    }

    /// Record a modification at `now`
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_modified = now;
    }

    /// Mark the page as removed from service; it must not be saved again
    pub fn discard(&mut self) {
        self.discarded = true;
    }

    pub fn is_discarded(&self) -> bool {
        self.discarded
    }

    pub fn snapshot(&self) -> PageSnapshot {
        PageSnapshot {
            timers: self.timers.clone(),
            public_link: self.public_link.clone(),
            name: self.name.clone(),
            color: self.color.clone(),
        }
    }

    pub fn to_document(&self) -> PageDocument {
        PageDocument {
            id: self.public_link.clone(),
            edit_link: self.edit_link.clone(),
            last_modified: self.last_modified,
            page: self.snapshot(),
        }
    }
}

impl Expirable for Page {
    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now - self.last_modified > self.retention
    }
}
