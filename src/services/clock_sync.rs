//! Clock synchronization exchange
//!
//! The client sends its send time `t1`, the server answers with `t1` echoed,
//! its receive time `t2` and its send time `t3`. With its own receive time
//! `t4` the client estimates
//! `offset = ((t2 - t1) + (t3 - t4)) / 2` and `delay = (t4 - t1) - (t3 - t2)`.
//! All timestamps are milliseconds since the Unix epoch.

use serde::{Deserialize, Serialize};

use crate::utils::unix_millis;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockSyncRequest {
    pub t1: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockSyncReply {
    pub t1: f64,
    pub t2: f64,
    pub t3: f64,
}

impl ClockSyncReply {
    /// Build a reply from the request and the server's receive and send times
    pub fn new(request: ClockSyncRequest, received_at: f64, sent_at: f64) -> Self {
        Self {
            t1: request.t1,
            t2: received_at,
            t3: sent_at,
        }
    }
}

/// Answer one raw clock-sync message, or `None` if it is not a valid request
pub fn respond(message: &str) -> Option<String> {
    let received_at = unix_millis();
    let request: ClockSyncRequest = serde_json::from_str(message).ok()?;
    let reply = ClockSyncReply::new(request, received_at, unix_millis());
    serde_json::to_string(&reply).ok()
}
