//! Escalation for reserved-subdomain scanners: a fingerprint that keeps
//! probing past `max_retry` within `find_time` is banned for `ban_time`,
//! independent of the refilling throttle quota.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;

#[derive(Debug, Clone, Copy)]
struct Strikes {
    window_start: Instant,
    count: u32,
    banned_until: Option<Instant>,
}

#[derive(Clone)]
pub struct ScannerBans {
    entries: Arc<DashMap<String, Strikes>>,
    max_retry: u32,
    find_time: Duration,
    ban_time: Duration,
}

impl ScannerBans {
    pub fn new(max_retry: u32, find_time: Duration, ban_time: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            max_retry: max_retry.max(1),
            find_time,
            ban_time,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            config.scanner_ban_max_retry,
            Duration::from_secs(config.scanner_ban_find_time_seconds),
            Duration::from_secs(config.scanner_ban_seconds),
        )
    }

    pub fn is_banned(&self, fingerprint: &str) -> bool {
        self.is_banned_at(fingerprint, Instant::now())
    }

    /// Counts one reserved-subdomain request. Returns `true` when this
    /// request starts a ban; the request itself is still let through.
    pub fn record(&self, fingerprint: &str) -> bool {
        self.record_at(fingerprint, Instant::now())
    }

    fn is_banned_at(&self, fingerprint: &str, now: Instant) -> bool {
        self.entries
            .get(fingerprint)
            .and_then(|entry| entry.banned_until)
            .is_some_and(|until| now < until)
    }

    fn record_at(&self, fingerprint: &str, now: Instant) -> bool {
        let mut entry = self.entries.entry(fingerprint.to_string()).or_insert(Strikes {
            window_start: now,
            count: 0,
            banned_until: None,
        });

        if entry.banned_until.is_some_and(|until| now < until) {
            return false;
        }

        if now.duration_since(entry.window_start) >= self.find_time {
            entry.window_start = now;
            entry.count = 0;
            entry.banned_until = None;
        }

        entry.count += 1;
        if entry.count >= self.max_retry {
            entry.banned_until = Some(now + self.ban_time);
            return true;
        }
        false
    }

    /// Forgets fingerprints whose counting window and ban have both lapsed.
    pub fn prune(&self) {
        self.prune_at(Instant::now());
    }

    fn prune_at(&self, now: Instant) {
        self.entries.retain(|_, strikes| {
            let counting = now.duration_since(strikes.window_start) < self.find_time;
            let banned = strikes.banned_until.is_some_and(|until| now < until);
            counting || banned
        });
        self.entries.shrink_to_fit();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
