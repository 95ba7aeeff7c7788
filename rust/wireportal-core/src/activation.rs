//! Per-player activation records backing the re-activation throttle.
//! Bounded LRU with a time-to-live sweep; a missing record always means "not throttled".

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::config::PortalConfig;
use crate::world::PlayerId;

pub struct ActivationLog {
    records: LruCache<PlayerId, Instant>,
    ttl: Duration,
    // counters for tests/telemetry
    evicted: u64,
    expired: u64,
}

impl ActivationLog {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self { records: LruCache::new(cap), ttl, evicted: 0, expired: 0 }
    }

    pub fn from_config(cfg: &PortalConfig) -> Self {
        Self::new(cfg.activation_capacity, cfg.activation_ttl())
    }

    /// Last activation time, ignoring records past their TTL.
    pub fn last(&self, id: PlayerId, now: Instant) -> Option<Instant> {
        let at = *self.records.peek(&id)?;
        if now.saturating_duration_since(at) >= self.ttl {
            return None;
        }
        Some(at)
    }

    /// True when the player activated less than `interval` ago.
    pub fn is_throttled(&self, id: PlayerId, now: Instant, interval: Duration) -> bool {
        match self.last(id, now) {
            Some(at) => now.saturating_duration_since(at) < interval,
            None => false,
        }
    }

    pub fn record(&mut self, id: PlayerId, now: Instant) {
        if let Some((old, _)) = self.records.push(id, now) {
            if old != id {
                self.evicted += 1;
            }
        }
    }

    pub fn remove(&mut self, id: PlayerId) -> Option<Instant> {
        self.records.pop(&id)
    }

    /// Drop every record older than the TTL. Returns how many were dropped.
    pub fn sweep(&mut self, now: Instant) -> usize {
        let stale: Vec<PlayerId> = self
            .records
            .iter()
            .filter(|(_, at)| now.saturating_duration_since(**at) >= self.ttl)
            .map(|(id, _)| *id)
            .collect();
        for id in &stale {
            self.records.pop(id);
        }
        self.expired += stale.len() as u64;
        stale.len()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn expired(&self) -> u64 {
        self.expired
    }
}
