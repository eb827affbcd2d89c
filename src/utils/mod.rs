//! Utility functions module
//! 
//! This module contains utility functions used throughout the application.

pub mod links;
pub mod signals;
pub mod time;

// Re-export main functions
pub use links::random_link;
pub use signals::shutdown_signal;
pub use time::{unix_millis, unix_seconds};
