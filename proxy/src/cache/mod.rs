pub mod lookup_cache;
pub mod traits;

pub use lookup_cache::{CacheStats, DEFAULT_STALE_AFTER, LookupCache};
pub use traits::{Record, RecordSource};

#[cfg(test)]
mod lookup_cache_test;
