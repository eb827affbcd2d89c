//! Per-client rate limiting of page creation and page fetch

use std::{net::IpAddr, num::NonZeroU32, sync::Arc};

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tracing::warn;

use crate::error::AppError;

/// Keyed limiter; `None` means unlimited
#[derive(Clone)]
pub struct ClientLimiter {
    limiter: Option<Arc<DefaultKeyedRateLimiter<IpAddr>>>,
    name: &'static str,
}

impl ClientLimiter {
    /// Allow `per_minute` requests per client address (0 = unlimited)
    pub fn per_minute(name: &'static str, per_minute: u32) -> Self {
        let limiter = NonZeroU32::new(per_minute)
            .map(|rate| Arc::new(RateLimiter::keyed(Quota::per_minute(rate))));
        Self { limiter, name }
    }

    pub fn unlimited(name: &'static str) -> Self {
        Self { limiter: None, name }
    }

    /// Count one request from `client`
    pub fn check(&self, client: IpAddr) -> Result<(), AppError> {
        let Some(limiter) = &self.limiter else {
            return Ok(());
        };
        limiter.check_key(&client).map_err(|_| {
            warn!("Rate limit exceeded for {} by {}", self.name, client);
            AppError::RateLimited
        })
    }
}

/// The limits applied at the request surface
#[derive(Clone)]
pub struct RequestLimits {
    pub create_page: ClientLimiter,
    pub fetch_page: ClientLimiter,
}

impl RequestLimits {
    pub fn new(create_per_minute: u32, fetch_per_minute: u32) -> Self {
        Self {
            create_page: ClientLimiter::per_minute("page creation", create_per_minute),
            fetch_page: ClientLimiter::per_minute("page fetch", fetch_per_minute),
        }
    }

    pub fn unlimited() -> Self {
        Self {
            create_page: ClientLimiter::unlimited("page creation"),
            fetch_page: ClientLimiter::unlimited("page fetch"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const ALICE: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
    const BOB: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

    #[test]
    fn test_unlimited() {
        let limiter = ClientLimiter::per_minute("test", 0);
        for _ in 0..1_000 {
            assert!(limiter.check(ALICE).is_ok());
        }
    }

    #[test]
    fn test_quota_per_client() {
        let limiter = ClientLimiter::per_minute("test", 3);
        for i in 0..3 {
            assert!(limiter.check(ALICE).is_ok(), "Request {} should succeed", i);
        }
        assert!(matches!(limiter.check(ALICE), Err(AppError::RateLimited)));

        // Other clients keep their own budget
        assert!(limiter.check(BOB).is_ok());
    }

    #[test]
    fn test_request_limits() {
        let limits = RequestLimits::new(1, 0);
        assert!(limits.create_page.check(ALICE).is_ok());
        assert!(limits.create_page.check(ALICE).is_err());
        for _ in 0..1_000 {
            assert!(limits.fetch_page.check(ALICE).is_ok());
        }
    }
}
