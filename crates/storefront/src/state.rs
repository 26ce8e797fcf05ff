//! Application state shared across handlers.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::task::JoinHandle;

use crate::catalog::{Catalog, CatalogError};
use crate::config::StorefrontConfig;
use crate::shoppers::ShopperRegistry;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the current catalog snapshot, the shopper registry and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: RwLock<Arc<Catalog>>,
    shoppers: ShopperRegistry,
}

impl AppState {
    /// Create a new application state around an already-loaded catalog.
    #[must_use]
    pub fn new(config: StorefrontConfig, catalog: Catalog) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog: RwLock::new(Arc::new(catalog)),
                shoppers: ShopperRegistry::new(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// The current catalog snapshot.
    ///
    /// Handlers take one snapshot per request so every check in that request
    /// sees the same stock levels, even if a reload lands mid-request.
    #[must_use]
    pub fn catalog(&self) -> Arc<Catalog> {
        let guard = self
            .inner
            .catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Swap in a new catalog snapshot.
    pub fn replace_catalog(&self, catalog: Catalog) {
        let mut guard = self
            .inner
            .catalog
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(catalog);
    }

    /// Re-read the catalog file and swap it in.
    ///
    /// # Errors
    ///
    /// Returns the load error and keeps the current snapshot if the file is
    /// missing or invalid.
    pub async fn reload_catalog(&self) -> Result<(), CatalogError> {
        let path: PathBuf = self.config().catalog_path.clone();
        let catalog = tokio::task::spawn_blocking(move || Catalog::load(&path))
            .await
            .map_err(|e| CatalogError::Io {
                path: self.config().catalog_path.display().to_string(),
                message: e.to_string(),
            })??;

        let products = catalog.products().len();
        self.replace_catalog(catalog);
        tracing::debug!(products, "catalog reloaded");
        Ok(())
    }

    /// Per-shopper sessions.
    #[must_use]
    pub fn shoppers(&self) -> &ShopperRegistry {
        &self.inner.shoppers
    }

    /// Start reloading the catalog in the background at the configured interval.
    ///
    /// Returns `None` when reloading is disabled. A failed reload is logged and
    /// the previous snapshot stays in service.
    #[must_use]
    pub fn start_catalog_refresh(&self) -> Option<JoinHandle<()>> {
        let period = self.config().catalog_refresh?;
        let state = self.clone();

        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately; the catalog was just loaded.
            interval.tick().await;

            loop {
                interval.tick().await;
                if let Err(e) = state.reload_catalog().await {
                    tracing::warn!(error = %e, "catalog reload failed, keeping previous snapshot");
                }
            }
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use atelier_core::{InventorySnapshot, ProductId, Size};

    use super::*;
    use crate::catalog::tests::SAMPLE;

    fn state() -> AppState {
        let config = StorefrontConfig::for_local(PathBuf::from("/nonexistent/catalog.json")).unwrap();
        AppState::new(config, Catalog::from_json(SAMPLE).unwrap())
    }

    #[test]
    fn test_snapshot_survives_replacement() {
        let state = state();
        let before = state.catalog();

        let updated = SAMPLE.replace(r#""stock": 3"#, r#""stock": 1"#);
        state.replace_catalog(Catalog::from_json(&updated).unwrap());

        let m = Size::parse("M").unwrap();
        assert_eq!(before.stock_for(&ProductId::new(1), &m), Some(3));
        assert_eq!(state.catalog().stock_for(&ProductId::new(1), &m), Some(1));
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_snapshot() {
        let state = state();

        assert!(state.reload_catalog().await.is_err());
        assert_eq!(state.catalog().products().len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_disabled_without_interval() {
        assert!(state().start_catalog_refresh().is_none());
    }
}
