use std::collections::VecDeque;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use eyre::{Result, bail};
use log::debug;
use serde::{Deserialize, Serialize};

/// Limits applied to every client independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimiterConfig {
    /// Maximum admitted requests per trailing window
    pub call_limit: u32,
    /// Length of the trailing window in seconds
    pub window_seconds: u64,
    /// How often fully-expired clients are dropped (0 disables the sweep)
    pub sweep_interval_secs: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            call_limit: 10,
            window_seconds: 60,
            sweep_interval_secs: 60,
        }
    }
}

impl RateLimiterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.call_limit == 0 {
            bail!("rate_limit.call_limit must be greater than zero");
        }
        if self.window_seconds == 0 {
            bail!("rate_limit.window_seconds must be greater than zero");
        }
        Ok(())
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

/// Outcome of a single rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Rejected,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allowed
    }
}

/// Per-client trailing window rate limiter.
///
/// Each client keeps the instants of its admitted requests, oldest first,
/// never more than `call_limit` of them. A timestamp counts against the
/// client while it is younger than the window. Rejected attempts are not
/// recorded.
///
/// The map is sharded, so the whole check for one client runs under that
/// client's entry lock while checks for other clients proceed.
pub struct RateLimiter {
    config: RateLimiterConfig,
    windows: DashMap<String, VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            windows: DashMap::new(),
        }
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// Admit or reject a request from `client_id` arriving at `now`
    pub fn check(&self, client_id: &str, now: Instant) -> Decision {
        let window = self.config.window();
        let limit = self.config.call_limit as usize;

        let mut entry = self
            .windows
            .entry(client_id.to_string())
            .or_insert_with(|| VecDeque::with_capacity(limit));
        let timestamps = entry.value_mut();

        while let Some(oldest) = timestamps.front() {
            if now.saturating_duration_since(*oldest) < window {
                break;
            }
            timestamps.pop_front();
        }

        if timestamps.len() >= limit {
            debug!("Rejecting {client_id}: {} calls in window", timestamps.len());
            return Decision::Rejected;
        }

        timestamps.push_back(now);
        Decision::Allowed
    }

    /// Drop clients whose every recorded request has aged out. Returns the number removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let window = self.config.window();
        let before = self.windows.len();

        self.windows.retain(|_, timestamps| {
            timestamps
                .back()
                .is_some_and(|newest| now.saturating_duration_since(*newest) < window)
        });

        let removed = before.saturating_sub(self.windows.len());
        debug!("Rate limiter sweep removed {removed} clients, {} remain", self.windows.len());
        removed
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Message returned to rejected clients
    pub fn rejection_message(&self) -> String {
        format!(
            "Rate limit exceeded. Maximum {} calls per {} seconds.",
            self.config.call_limit, self.config.window_seconds
        )
    }
}
