//! Catalog overrides from the mutable `price_config` store.

use std::str::FromStr;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use sqlx::Row;
use tokio::sync::RwLock;
use tracing::warn;

use pvquote_core::{CatalogEntry, CatalogOverrides, PriceCatalog, PriceKey, PriceKind};

use super::RepositoryError;
use crate::DbPool;

pub struct SqlPriceConfigRepository {
    pool: DbPool,
}

impl SqlPriceConfigRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Loads all active override rows. Rows whose key the engine does not
    /// know are skipped with a warning: a stray row must not poison
    /// pricing, and every engine-known key still has its compiled default.
    pub async fn load_overrides(&self) -> Result<CatalogOverrides, RepositoryError> {
        let rows = sqlx::query(
            "SELECT price_key, CAST(value AS TEXT) AS value_text, is_percentage \
             FROM price_config WHERE is_active = 1",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut overrides = CatalogOverrides::new();
        for row in rows {
            let raw_key: String = row.try_get("price_key")?;
            let key = match PriceKey::from_str(&raw_key) {
                Ok(key) => key,
                Err(_) => {
                    warn!(price_key = %raw_key, "ignoring price_config row with unknown key");
                    continue;
                }
            };
            let value_text: String = row.try_get("value_text")?;
            let value = Decimal::from_str(&value_text).map_err(|_| {
                RepositoryError::Decode(format!(
                    "price_config.{raw_key} holds a non-decimal value `{value_text}`"
                ))
            })?;
            let is_percentage: i64 = row.try_get("is_percentage")?;
            let kind = if is_percentage != 0 { PriceKind::Percentage } else { PriceKind::Absolute };
            overrides.insert(key, CatalogEntry { value, kind });
        }
        Ok(overrides)
    }

    pub async fn upsert_override(
        &self,
        key: PriceKey,
        value: Decimal,
        kind: PriceKind,
        description: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO price_config (price_key, value, is_percentage, is_active, description, updated_at) \
             VALUES (?, ?, ?, 1, ?, datetime('now')) \
             ON CONFLICT(price_key) DO UPDATE SET \
               value = excluded.value, \
               is_percentage = excluded.is_percentage, \
               is_active = 1, \
               description = excluded.description, \
               updated_at = datetime('now')",
        )
        .bind(key.as_str())
        .bind(value.to_string())
        .bind(i64::from(kind == PriceKind::Percentage))
        .bind(description)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn deactivate(&self, key: PriceKey) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE price_config SET is_active = 0, updated_at = datetime('now') WHERE price_key = ?",
        )
        .bind(key.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

struct CachedSnapshot {
    taken_at: Instant,
    catalog: PriceCatalog,
}

/// TTL cache over the override store. A pricing computation receives one
/// cloned snapshot and keeps it for its whole duration; the TTL only bounds
/// how stale a freshly handed-out snapshot may be.
pub struct CachedPriceCatalog {
    repository: SqlPriceConfigRepository,
    ttl: Duration,
    state: RwLock<Option<CachedSnapshot>>,
}

impl CachedPriceCatalog {
    pub fn new(pool: DbPool, ttl: Duration) -> Self {
        Self {
            repository: SqlPriceConfigRepository::new(pool),
            ttl,
            state: RwLock::new(None),
        }
    }

    /// Current snapshot, reloading from the store when the cached one has
    /// outlived the TTL.
    pub async fn snapshot(&self) -> Result<PriceCatalog, RepositoryError> {
        {
            let guard = self.state.read().await;
            if let Some(cached) = guard.as_ref() {
                if cached.taken_at.elapsed() < self.ttl {
                    return Ok(cached.catalog.clone());
                }
            }
        }
        self.refresh().await
    }

    /// Unconditional reload, used after seeding or editing overrides.
    pub async fn refresh(&self) -> Result<PriceCatalog, RepositoryError> {
        let overrides = self.repository.load_overrides().await?;
        let catalog = PriceCatalog::new(overrides);
        let mut guard = self.state.write().await;
        *guard = Some(CachedSnapshot { taken_at: Instant::now(), catalog: catalog.clone() });
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rust_decimal::Decimal;

    use pvquote_core::{PriceKey, PriceKind};

    use super::{CachedPriceCatalog, SqlPriceConfigRepository};
    use crate::{connect_with_settings, migrations};

    async fn pool() -> crate::DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn active_rows_become_overrides() {
        let pool = pool().await;
        let repository = SqlPriceConfigRepository::new(pool.clone());

        repository
            .upsert_override(
                PriceKey::InverterTier10,
                Decimal::new(177_700, 2),
                PriceKind::Absolute,
                "Aktionspreis",
            )
            .await
            .expect("upsert");

        let overrides = repository.load_overrides().await.expect("load");
        let entry = overrides.get(&PriceKey::InverterTier10).expect("override present");
        assert_eq!(entry.value, Decimal::new(177_700, 2));
        assert_eq!(entry.kind, PriceKind::Absolute);

        pool.close().await;
    }

    #[tokio::test]
    async fn deactivated_rows_fall_back_to_defaults() {
        let pool = pool().await;
        let repository = SqlPriceConfigRepository::new(pool.clone());

        repository
            .upsert_override(PriceKey::Grid1p, Decimal::new(99900, 2), PriceKind::Absolute, "")
            .await
            .expect("upsert");
        repository.deactivate(PriceKey::Grid1p).await.expect("deactivate");

        let overrides = repository.load_overrides().await.expect("load");
        assert!(!overrides.contains_key(&PriceKey::Grid1p));

        pool.close().await;
    }

    #[tokio::test]
    async fn unknown_keys_are_skipped_not_fatal() {
        let pool = pool().await;
        sqlx::query(
            "INSERT INTO price_config (price_key, value, is_percentage) VALUES ('package_ultra', '1.00', 0)",
        )
        .execute(&pool)
        .await
        .expect("raw insert");

        let overrides =
            SqlPriceConfigRepository::new(pool.clone()).load_overrides().await.expect("load");
        assert!(overrides.is_empty());

        pool.close().await;
    }

    #[tokio::test]
    async fn cached_snapshot_serves_until_refresh() {
        let pool = pool().await;
        let repository = SqlPriceConfigRepository::new(pool.clone());
        let cache = CachedPriceCatalog::new(pool.clone(), Duration::from_secs(3600));

        let before = cache.snapshot().await.expect("first snapshot");
        assert_eq!(before.value(PriceKey::WallboxBase11kw), Decimal::new(50000, 2));

        repository
            .upsert_override(
                PriceKey::WallboxBase11kw,
                Decimal::new(59900, 2),
                PriceKind::Absolute,
                "",
            )
            .await
            .expect("upsert");

        // Within the TTL the stale snapshot is intentionally served.
        let stale = cache.snapshot().await.expect("cached snapshot");
        assert_eq!(stale.value(PriceKey::WallboxBase11kw), Decimal::new(50000, 2));

        let fresh = cache.refresh().await.expect("forced refresh");
        assert_eq!(fresh.value(PriceKey::WallboxBase11kw), Decimal::new(59900, 2));

        pool.close().await;
    }
}
