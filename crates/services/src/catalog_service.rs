use std::sync::Arc;

use async_trait::async_trait;
use catapult_core::model::{Cat, CatId, PhotoUrl};
use storage::repository::{CatalogRepository, StorageError};
use tracing::{debug, warn};

use crate::error::FetchError;

/// Remote fetch path for cat photos. Only invoked on a cache miss.
#[async_trait]
pub trait PhotoFetcher: Send + Sync {
    /// # Errors
    ///
    /// Returns `FetchError` when the remote source cannot be reached.
    async fn fetch_photos(&self, cat: &CatId) -> Result<Vec<PhotoUrl>, FetchError>;
}

/// Fetcher for offline use: never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFetcher;

#[async_trait]
impl PhotoFetcher for NoopFetcher {
    async fn fetch_photos(&self, _cat: &CatId) -> Result<Vec<PhotoUrl>, FetchError> {
        Ok(Vec::new())
    }
}

/// Where question generation gets a cat's photos from.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    /// Photos for `cat`, possibly empty.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the cache cannot be read or written.
    async fn resolve_photos(&self, cat: &Cat) -> Result<Vec<PhotoUrl>, StorageError>;
}

/// Catalog access with fetch-on-miss photo resolution.
#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogRepository>,
    fetcher: Arc<dyn PhotoFetcher>,
}

impl CatalogService {
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogRepository>, fetcher: Arc<dyn PhotoFetcher>) -> Self {
        Self { catalog, fetcher }
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the cache cannot be read.
    pub async fn list_cats(&self) -> Result<Vec<Cat>, StorageError> {
        self.catalog.list_cats().await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the cache cannot be read.
    pub async fn get_cat(&self, id: &CatId) -> Result<Option<Cat>, StorageError> {
        self.catalog.get_cat(id).await
    }

    /// Store a freshly fetched catalog page.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the records cannot be stored.
    pub async fn import(&self, cats: &[Cat]) -> Result<(), StorageError> {
        self.catalog.upsert_cats(cats).await
    }
}

#[async_trait]
impl PhotoSource for CatalogService {
    async fn resolve_photos(&self, cat: &Cat) -> Result<Vec<PhotoUrl>, StorageError> {
        let cached = self.catalog.photos_for(cat.id()).await?;
        if !cached.is_empty() {
            return Ok(cached);
        }

        match self.fetcher.fetch_photos(cat.id()).await {
            Ok(fetched) if fetched.is_empty() => {
                debug!(cat_id = %cat.id(), "fetch returned no photos");
                return Ok(Vec::new());
            }
            Ok(fetched) => {
                self.catalog.insert_photos(cat.id(), &fetched).await?;
            }
            Err(err) => {
                // A failed fetch is treated like an empty result.
                warn!(cat_id = %cat.id(), %err, "photo fetch failed");
                return Ok(Vec::new());
            }
        }

        self.catalog.photos_for(cat.id()).await
    }
}
