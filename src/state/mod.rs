//! State management module
//! 
//! This module contains the timer/page model, the lookup indices and the
//! application state that commits page mutations.

pub mod app_state;
pub mod index;
pub mod page;
pub mod timer;

use chrono::{DateTime, Utc};

// Re-export main types
pub use app_state::AppState;
pub use index::{PageIndex, SharedPage};
pub use page::{Page, PageDocument, PageSnapshot};
pub use timer::Timer;

/// Something that becomes stale after a retention window
pub trait Expirable {
    /// Whether the value is stale at `now`
    fn is_expired_at(&self, now: DateTime<Utc>) -> bool;

    /// Whether the value is stale right now
    fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}
