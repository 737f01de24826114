//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::PosConfig;
use crate::services::ImageStore;
use crate::whatsapp::{FonnteClient, FonnteError};

/// Application state shared across all handlers.
///
/// Cheap to clone via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: PosConfig,
    pool: PgPool,
    fonnte: FonnteClient,
    images: ImageStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns `FonnteError::Http` if the WhatsApp HTTP client cannot be built.
    pub fn new(config: PosConfig, pool: PgPool) -> Result<Self, FonnteError> {
        let fonnte = FonnteClient::new(&config.fonnte)?;
        let images = ImageStore::new(config.storage_dir.clone());

        if !fonnte.is_configured() {
            tracing::warn!("FONNTE_TOKEN not set; order notifications will be marked FAILED");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                fonnte,
                images,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &PosConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the Fonnte WhatsApp client.
    #[must_use]
    pub fn fonnte(&self) -> &FonnteClient {
        &self.inner.fonnte
    }

    /// Get a reference to the product image store.
    #[must_use]
    pub fn images(&self) -> &ImageStore {
        &self.inner.images
    }
}
