//! Time-bounded snapshot cache.
//!
//! Holds at most one `(snapshot, stored_at)` entry. The entry is served
//! until it is older than the TTL; there is no other invalidation apart
//! from the explicit `invalidate` and `refresh` calls.

use crate::data::loader::{LoaderError, SnapshotSource};
use crate::data::record::OrderSnapshot;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

struct CacheEntry {
    snapshot: Arc<OrderSnapshot>,
    stored_at: Instant,
}

pub struct SnapshotCache<S> {
    source: S,
    ttl: Duration,
    entry: Option<CacheEntry>,
}

impl<S: SnapshotSource> SnapshotCache<S> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            entry: None,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached snapshot, reloading when absent or expired.
    pub fn get(&mut self) -> Result<Arc<OrderSnapshot>, LoaderError> {
        self.get_at(Instant::now())
    }

    pub fn get_at(&mut self, now: Instant) -> Result<Arc<OrderSnapshot>, LoaderError> {
        if let Some(entry) = &self.entry {
            if now.saturating_duration_since(entry.stored_at) < self.ttl {
                debug!(source = %self.source.describe(), "Snapshot cache hit");
                return Ok(Arc::clone(&entry.snapshot));
            }
            debug!(source = %self.source.describe(), "Snapshot cache entry expired");
        }
        self.reload_at(now)
    }

    /// Drop the cached entry; the next `get` reloads.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Reload unconditionally.
    pub fn refresh(&mut self) -> Result<Arc<OrderSnapshot>, LoaderError> {
        self.reload_at(Instant::now())
    }

    /// Whether an entry would be served at `now` without reloading.
    pub fn is_fresh_at(&self, now: Instant) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|entry| now.saturating_duration_since(entry.stored_at) < self.ttl)
    }

    fn reload_at(&mut self, now: Instant) -> Result<Arc<OrderSnapshot>, LoaderError> {
        // A failed load must not leave a stale entry behind
        self.entry = None;
        let snapshot = Arc::new(self.source.load()?);
        self.entry = Some(CacheEntry {
            snapshot: Arc::clone(&snapshot),
            stored_at: now,
        });
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::processor::ProcessorError;
    use crate::data::record::OrderRecord;
    use crate::data::schema::Field;
    use std::cell::Cell;

    struct CountingSource {
        loads: Cell<usize>,
        fail: Cell<bool>,
    }

    impl CountingSource {
        fn new() -> Self {
            Self {
                loads: Cell::new(0),
                fail: Cell::new(false),
            }
        }
    }

    impl SnapshotSource for &CountingSource {
        fn load(&self) -> Result<OrderSnapshot, LoaderError> {
            self.loads.set(self.loads.get() + 1);
            if self.fail.get() {
                return Err(ProcessorError::MissingRequiredColumn(Field::Sales).into());
            }
            Ok(OrderSnapshot::from_records(vec![OrderRecord {
                sales: self.loads.get() as f64,
                ..Default::default()
            }]))
        }

        fn describe(&self) -> String {
            "counting".to_string()
        }
    }

    #[test]
    fn test_entry_reused_within_ttl_and_reloaded_after() {
        let source = CountingSource::new();
        let mut cache = SnapshotCache::new(&source, Duration::from_secs(60));
        let start = Instant::now();

        let first = cache.get_at(start).unwrap();
        let second = cache.get_at(start + Duration::from_secs(59)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.loads.get(), 1);

        let third = cache.get_at(start + Duration::from_secs(60)).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(source.loads.get(), 2);
        assert_eq!(third.records()[0].sales, 2.0);
    }

    #[test]
    fn test_invalidate_forces_reload() {
        let source = CountingSource::new();
        let mut cache = SnapshotCache::new(&source, Duration::from_secs(600));
        let now = Instant::now();

        cache.get_at(now).unwrap();
        assert!(cache.is_fresh_at(now));

        cache.invalidate();
        assert!(!cache.is_fresh_at(now));
        cache.get_at(now).unwrap();
        assert_eq!(source.loads.get(), 2);

        cache.refresh().unwrap();
        assert_eq!(source.loads.get(), 3);
    }

    #[test]
    fn test_failed_reload_leaves_no_entry() {
        let source = CountingSource::new();
        let mut cache = SnapshotCache::new(&source, Duration::from_secs(600));
        cache.get().unwrap();

        source.fail.set(true);
        assert!(cache.refresh().is_err());
        assert!(!cache.is_fresh_at(Instant::now()));

        source.fail.set(false);
        cache.get().unwrap();
        assert_eq!(source.loads.get(), 3);
    }
}
