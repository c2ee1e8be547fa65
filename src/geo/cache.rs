use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::BrandLocation;

pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Brand plus the device-count snapshot it was resolved with; a new count
/// means a new key.
type Key = (String, usize);

/// Time-bounded cache of resolved locations.
#[derive(Debug)]
pub struct LocationCache {
    ttl: Duration,
    entries: HashMap<Key, (Instant, BrandLocation)>,
}

impl Default for LocationCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl LocationCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Fresh entry for `(brand, count)`; expired entries are dropped.
    pub fn get(&mut self, brand: &str, count: usize, now: Instant) -> Option<BrandLocation> {
        let key = (brand.to_owned(), count);
        match self.entries.get(&key) {
            Some((stored, loc)) if now.saturating_duration_since(*stored) < self.ttl => {
                Some(loc.clone())
            }
            Some(_) => {
                self.entries.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Store `location`, dropping every entry that has already expired.
    pub fn insert(&mut self, location: BrandLocation, now: Instant) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, (stored, _)| now.saturating_duration_since(*stored) < ttl);
        let key = (location.brand.clone(), location.device_count);
        self.entries.insert(key, (now, location));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
