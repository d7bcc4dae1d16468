//! Fixed-window request counter keyed by an opaque client key.
//!
//! Each window starts with the first request from a key and lasts `window`.
//! A burst of `max_requests` at the tail of one window followed by another
//! `max_requests` at the head of the next is admitted, so up to twice the
//! limit can pass in a short span straddling the boundary.

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{debug, info};

use crate::metrics::RATE_LIMIT_ENTRIES;

// Rate limit entry - tracks requests per key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitEntry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.reset_at > now
    }
}

/// Outcome of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted { count: u32 },
    Rejected { reset_at: DateTime<Utc> },
}

impl Admission {
    #[cfg(test)]
    fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted { .. })
    }
}

pub struct RateLimiter {
    name: &'static str,
    window: Duration,
    max_requests: u32,
    entries: DashMap<String, RateLimitEntry>,
}

impl RateLimiter {
    pub fn new(name: &'static str, window: Duration, max_requests: u32) -> Self {
        Self {
            name,
            window,
            max_requests,
            entries: DashMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    // Number of entries currently held, expired ones included until swept
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    fn entry(&self, key: &str) -> Option<RateLimitEntry> {
        self.entries.get(key).map(|e| *e)
    }

    /// Records a request from `key` at `now` and decides whether it may proceed.
    ///
    /// The whole check-and-update runs under the map's entry guard, so two
    /// concurrent calls for the same key never both observe the same count.
    pub fn admit(&self, key: &str, now: DateTime<Utc>) -> Admission {
        let window = TimeDelta::from_std(self.window).unwrap_or(TimeDelta::MAX);
        let fresh = RateLimitEntry {
            count: 1,
            reset_at: now.checked_add_signed(window).unwrap_or(DateTime::<Utc>::MAX_UTC),
        };

        let mut entry = match self.entries.entry(key.to_string()) {
            Entry::Vacant(vacant) => {
                vacant.insert(fresh);
                return Admission::Admitted { count: 1 };
            }
            Entry::Occupied(occupied) => occupied.into_ref(),
        };

        // window over - start a new one
        if !entry.is_live(now) {
            *entry = fresh;
            return Admission::Admitted { count: 1 };
        }

        if entry.count < self.max_requests {
            entry.count += 1;
            return Admission::Admitted { count: entry.count };
        }

        Admission::Rejected {
            reset_at: entry.reset_at,
        }
    }

    /// Drops every entry whose window has ended at `now`. Returns how many went.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.entries.len())
    }

    // Message shown to a rejected client
    pub fn rejection_message(&self, reset_at: DateTime<Utc>) -> String {
        format!(
            "Rate limit exceeded. Maximum {} requests per {} seconds. Reset at {}",
            self.max_requests,
            self.window.as_secs(),
            reset_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }
}

// Background sweep - runs until shutdown flips to true
pub async fn sweeper(
    limiters: Vec<Arc<RateLimiter>>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = interval(every);

    info!(?every, limiters = limiters.len(), "Rate limit sweeper started");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now = Utc::now();
                for limiter in &limiters {
                    let removed = limiter.sweep(now);
                    RATE_LIMIT_ENTRIES
                        .with_label_values(&[limiter.name()])
                        .set(limiter.len() as f64);
                    if removed > 0 {
                        debug!(limiter = limiter.name(), removed, "Swept expired rate limit entries");
                    }
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    info!("Rate limit sweeper stopped");
}
