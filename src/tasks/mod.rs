//! Background tasks module
//! 
//! This module contains background tasks that run alongside the HTTP server.

pub mod expiry_sweeper;

// Re-export main types
pub use expiry_sweeper::{sweep_once, ExpirySweeper};
