//! Caller-owned memoization of built color ramps.
//!
//! Entries are keyed by everything a ramp depends on: the multiset of
//! aggregate values, the full scheme definition, the normalization and the
//! interpolation. Two calls with different inputs can never share an entry.

use crate::color::ramp::{ColorRamp, Interpolation, Normalization};
use crate::color::scheme::ColorScheme;
use crate::error::Result;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RampKey {
    /// Sorted bit patterns of the aggregate values.
    values: Vec<u64>,
    scheme: String,
    normalization: String,
    interpolation: Interpolation,
}

impl RampKey {
    fn new(
        values: &[f64],
        scheme: &ColorScheme,
        normalization: &Normalization,
        interpolation: Interpolation,
    ) -> Result<Self> {
        let mut bits: Vec<u64> = values.iter().map(|v| v.to_bits()).collect();
        bits.sort_unstable();
        Ok(Self {
            values: bits,
            scheme: serde_json::to_string(scheme)?,
            normalization: serde_json::to_string(normalization)?,
            interpolation,
        })
    }
}

/// Thread-safe ramp cache. Hold one per application (or per session) and
/// pass it into pipeline runs; the library keeps no cache of its own.
#[derive(Debug)]
pub struct RampCache {
    entries: Mutex<FxHashMap<RampKey, Arc<ColorRamp>>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RampCache {
    const DEFAULT_CAPACITY: usize = 64;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Cache holding at most `capacity` ramps. When full, the cache is
    /// emptied before the next insert.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(FxHashMap::default()),
            capacity: capacity.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the cached ramp for these inputs, building it with `build` on
    /// a miss. Build errors are returned and nothing is cached.
    pub fn get_or_build<F>(
        &self,
        values: &[f64],
        scheme: &ColorScheme,
        normalization: &Normalization,
        interpolation: Interpolation,
        build: F,
    ) -> Result<Arc<ColorRamp>>
    where
        F: FnOnce() -> Result<ColorRamp>,
    {
        let key = RampKey::new(values, scheme, normalization, interpolation)?;

        if let Some(ramp) = self.entries.lock().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            log::trace!("ramp cache hit for scheme {:?}", scheme.name());
            return Ok(Arc::clone(ramp));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let ramp = Arc::new(build()?);

        let mut entries = self.entries.lock();
        if entries.len() >= self.capacity {
            entries.clear();
        }
        entries.insert(key, Arc::clone(&ramp));
        Ok(ramp)
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for RampCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeobinError;

    fn build(values: &[f64], scheme: &ColorScheme) -> Result<ColorRamp> {
        let points = Normalization::Quantile.control_points(scheme.fractions(), values)?;
        ColorRamp::from_parts(&points, scheme.colors(), Interpolation::Linear)
    }

    #[test]
    fn test_hit_on_same_multiset() {
        let cache = RampCache::new();
        let scheme = ColorScheme::snowflake();
        let n = Normalization::Quantile;

        let a = cache
            .get_or_build(&[1.0, 2.0, 3.0], &scheme, &n, Interpolation::Linear, || build(&[1.0, 2.0, 3.0], &scheme))
            .unwrap();
        // Same multiset, different order.
        let b = cache
            .get_or_build(&[3.0, 1.0, 2.0], &scheme, &n, Interpolation::Linear, || {
                panic!("should have been cached")
            })
            .unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_different_inputs_do_not_collide() {
        let cache = RampCache::new();
        let n = Normalization::Quantile;
        let snow = ColorScheme::snowflake();
        let contrast = ColorScheme::contrast();

        cache
            .get_or_build(&[1.0, 2.0], &snow, &n, Interpolation::Linear, || build(&[1.0, 2.0], &snow))
            .unwrap();
        cache
            .get_or_build(&[1.0, 2.0], &contrast, &n, Interpolation::Linear, || build(&[1.0, 2.0], &contrast))
            .unwrap();
        cache
            .get_or_build(&[1.0, 2.0], &snow, &n, Interpolation::Step, || build(&[1.0, 2.0], &snow))
            .unwrap();

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.hits(), 0);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = RampCache::new();
        let scheme = ColorScheme::snowflake();
        let result = cache.get_or_build(&[], &scheme, &Normalization::Quantile, Interpolation::Linear, || {
            Err(GeobinError::EmptyInput { dropped: 0 })
        });
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_bound() {
        let cache = RampCache::with_capacity(2);
        let scheme = ColorScheme::snowflake();
        for i in 0..5 {
            let values = [i as f64, i as f64 + 1.0];
            cache
                .get_or_build(&values, &scheme, &Normalization::Quantile, Interpolation::Linear, || build(&values, &scheme))
                .unwrap();
            assert!(cache.len() <= 2);
        }
    }
}
