//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::debug;

use crate::config::SiteConfig;
use crate::db::{MenuRepository, RepositoryError};
use crate::models::MenuItem;
use crate::services::media::MediaStore;
use crate::services::signing::UploadSigner;

/// How long the public menu is served from memory.
const MENU_CACHE_TTL: Duration = Duration::from_secs(300);

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    pool: PgPool,
    media: MediaStore,
    signer: UploadSigner,
    menu_cache: Cache<(), Arc<Vec<MenuItem>>>,
}

impl AppState {
    #[must_use]
    pub fn new(config: SiteConfig, pool: PgPool) -> Self {
        let media = MediaStore::new(config.uploads.media_dir.clone());
        let signer = UploadSigner::new(config.upload_signing_key.clone(), config.uploads.url_ttl);
        let menu_cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(MENU_CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                media,
                signer,
                menu_cache,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn media(&self) -> &MediaStore {
        &self.inner.media
    }

    #[must_use]
    pub fn signer(&self) -> &UploadSigner {
        &self.inner.signer
    }

    /// Available menu items, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns the repository error on a cache miss that fails to load.
    pub async fn public_menu(&self) -> Result<Arc<Vec<MenuItem>>, RepositoryError> {
        if let Some(items) = self.inner.menu_cache.get(&()).await {
            debug!("Cache hit for menu");
            return Ok(items);
        }

        let items = Arc::new(MenuRepository::new(self.pool()).list_available().await?);
        self.inner.menu_cache.insert((), Arc::clone(&items)).await;
        Ok(items)
    }

    /// Drop the cached public menu after a write.
    pub async fn invalidate_menu(&self) {
        self.inner.menu_cache.invalidate(&()).await;
    }
}
