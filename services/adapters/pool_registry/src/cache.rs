//! Shared asset handle cache
//!
//! Token metadata is immutable, so once an identifier resolves the handle is
//! kept for the life of the process. One cache is shared by every registry
//! in a directory, pair-only and fee-tiered alike.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;
use types::{format_address, AssetHandle};

use crate::collaborators::AssetResolver;
use crate::selector::normalize_identifier;

/// Thread-safe caching wrapper around another [`AssetResolver`]
pub struct CachedAssetResolver {
    inner: Arc<dyn AssetResolver>,

    /// Normalized identifier -> handle
    cache: DashMap<String, Arc<AssetHandle>>,
}

impl CachedAssetResolver {
    pub fn new(inner: Arc<dyn AssetResolver>) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
        }
    }

    /// Get a cached handle without resolving
    pub fn get(&self, identifier: &str) -> Option<Arc<AssetHandle>> {
        self.cache
            .get(&normalize_identifier(identifier))
            .map(|entry| entry.value().clone())
    }

    /// Seed the cache with a known handle
    pub fn insert(&self, asset: Arc<AssetHandle>) {
        self.cache.insert(format_address(&asset.address), asset);
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.cache.contains_key(&normalize_identifier(identifier))
    }

    /// Number of cached identifiers
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[async_trait]
impl AssetResolver for CachedAssetResolver {
    async fn resolve(&self, identifier: &str) -> Result<Arc<AssetHandle>> {
        let key = normalize_identifier(identifier);
        if let Some(asset) = self.cache.get(&key).map(|entry| entry.value().clone()) {
            debug!("Asset cache hit for {}", key);
            return Ok(asset);
        }

        let resolved = self.inner.resolve(identifier).await?;

        // Two racing resolutions keep whichever landed first
        let asset = self
            .cache
            .entry(format_address(&resolved.address))
            .or_insert(resolved)
            .value()
            .clone();
        if key != format_address(&asset.address) {
            self.cache.entry(key).or_insert_with(|| asset.clone());
        }

        debug!("Cached asset {}", asset);
        Ok(asset)
    }
}
