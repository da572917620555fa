pub mod budget_repository;
pub mod handler;
pub mod models;
pub mod repository;
pub mod service;

use std::time::Duration;

/// Upper bound on cached users; least recently used lists are evicted first.
const CATEGORY_CACHE_CAPACITY: u64 = 10_000;

/// Per-user category lists, keyed by user id.
pub type CategoryCache = moka::sync::Cache<i64, Vec<models::Category>>;

/// Builds the category cache; entries expire `ttl` after they are written.
pub fn category_cache(ttl: Duration) -> CategoryCache {
    moka::sync::Cache::builder()
        .time_to_live(ttl)
        .max_capacity(CATEGORY_CACHE_CAPACITY)
        .build()
}
