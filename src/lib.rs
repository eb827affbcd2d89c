//! Shared Timers - A live-synchronized shared timer page server
//! 
//! This library provides the timer/page state model, the broadcast registry
//! that pushes page snapshots to subscribers, the expiry sweeper and the
//! clock-sync responder, exposed over an HTTP/WebSocket API.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::{Config, Settings};
pub use error::AppError;
pub use state::AppState;
pub use utils::signals::shutdown_signal;
