use std::sync::Arc;

use moka::future::Cache;

use crate::document::Document;
use crate::error::LoadError;

/// In-memory cache of parsed documents keyed by resolved target (URL or file path)
///
/// Two locations that resolve to the same target share one fetch. `moka`
/// coalesces concurrent requests for a key, so the loader future runs once even
/// when several traversal tasks ask for the same target at the same time.
/// Failures are not cached.
pub struct DocumentCache {
    cache: Cache<String, Arc<Document>>,
}

impl DocumentCache {
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder().max_capacity(max_capacity).build();

        Self { cache }
    }

    /// Get a parsed document from the cache, or load it if missing.
    ///
    /// The `loader` future is only executed if the key is missing.
    pub async fn get_or_load<F, Fut>(&self, key: &str, loader: F) -> Result<Arc<Document>, LoadError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Document, LoadError>>,
    {
        self.cache
            .try_get_with(key.to_string(), async move { loader().await.map(Arc::new) })
            .await
            .map_err(|e| (*e).clone()) // Unwrap the Arc<E> from moka
    }
}
