//! Collaborator services module
//! 
//! This module contains the broadcast registry, page storage, clock
//! synchronization, localization and rate limiting.

pub mod clock_sync;
pub mod locale;
pub mod rate_limit;
pub mod registry;
pub mod store;

// Re-export main types
pub use clock_sync::{ClockSyncReply, ClockSyncRequest};
pub use locale::{Locale, LocaleCatalog};
pub use rate_limit::{ClientLimiter, RequestLimits};
pub use registry::{BroadcastRegistry, Connection};
pub use store::{FileStore, MemoryStore, PageStore, StorageError};
