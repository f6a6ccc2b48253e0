//! Metrics collection.
//!
//! # Metrics
//! - `confcache_cache_hits_total` (counter): lookups served from the cache
//! - `confcache_cache_misses_total` (counter): lookups that loaded a document
//! - `confcache_parse_failures_total` (counter): content rejected by a parser
//! - `confcache_invalidations_total` (counter): entries evicted by change events

use ::metrics::counter;

pub fn record_cache_hit() {
    counter!("confcache_cache_hits_total").increment(1);
}

pub fn record_cache_miss() {
    counter!("confcache_cache_misses_total").increment(1);
}

pub fn record_parse_failure(format: &'static str) {
    counter!("confcache_parse_failures_total", "format" => format).increment(1);
}

pub fn record_invalidation() {
    counter!("confcache_invalidations_total").increment(1);
}
