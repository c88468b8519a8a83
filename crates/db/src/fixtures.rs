//! Deterministic seed data for demos and end-to-end checks.
//!
//! The seed mirrors the historic price sheet: the material flat rates and
//! the 15% complete-kit discount that the compiled-in defaults keep at
//! zero. Loading is idempotent, so `seed` can run against an existing
//! database without duplicating anything.

use rust_decimal::Decimal;

use pvquote_core::{
    calculate_pricing, BuildingType, GridType, PriceCatalog, PriceKey, PriceKind, PricingInput,
    WallboxMount, WallboxPower, WallboxRequest,
};

use crate::connection::DbPool;
use crate::repositories::{
    CachedPriceCatalog, RepositoryError, SqlPrecheckRepository, SqlPriceConfigRepository,
    SqlQuoteRepository,
};

struct SeedPrice {
    key: PriceKey,
    value: Decimal,
    kind: PriceKind,
    description: &'static str,
}

fn seed_prices() -> Vec<SeedPrice> {
    vec![
        SeedPrice {
            key: PriceKey::MaterialAcWiring,
            value: Decimal::new(18000, 2),
            kind: PriceKind::Absolute,
            description: "AC-Verkabelung Pauschale laut Preisliste",
        },
        SeedPrice {
            key: PriceKey::MaterialSpd,
            value: Decimal::new(32000, 2),
            kind: PriceKind::Absolute,
            description: "Überspannungsschutz AC laut Preisliste",
        },
        SeedPrice {
            key: PriceKey::MaterialMeterUpgrade,
            value: Decimal::new(45000, 2),
            kind: PriceKind::Absolute,
            description: "Zählerplatz-Ertüchtigung laut Preisliste",
        },
        SeedPrice {
            key: PriceKey::DiscountCompleteKit,
            value: Decimal::new(1500, 2),
            kind: PriceKind::Percentage,
            description: "Komplett-Kit Rabatt 15%",
        },
    ]
}

fn demo_input() -> PricingInput {
    PricingInput {
        building_type: BuildingType::Efh,
        site_address: "Beispielstraße 12, 22111 Hamburg".to_string(),
        main_fuse_ampere: 35,
        grid_type: GridType::ThreePhase,
        distance_meter: Decimal::from(8),
        desired_power_kw: Decimal::new(98, 1),
        storage_kwh: Decimal::from(10),
        own_components: false,
        wallbox: Some(WallboxRequest {
            power: Some(WallboxPower::Kw11),
            mount: WallboxMount::Wall,
            cable_installed: false,
            cable_length_m: Decimal::from(6),
            pv_surplus: true,
        }),
    }
}

#[derive(Debug)]
pub struct SeedSummary {
    pub prices_seeded: usize,
    pub demo_quote_number: Option<String>,
}

pub struct DemoSeedDataset;

impl DemoSeedDataset {
    /// Seeds the price sheet overrides and, on an empty database, one demo
    /// precheck with its materialized quote.
    pub async fn load(pool: &DbPool) -> Result<SeedSummary, RepositoryError> {
        let price_repository = SqlPriceConfigRepository::new(pool.clone());
        let prices = seed_prices();
        for price in &prices {
            price_repository
                .upsert_override(price.key, price.value, price.kind, price.description)
                .await?;
        }

        let existing_quotes: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM quote").fetch_one(pool).await?;
        if existing_quotes > 0 {
            return Ok(SeedSummary { prices_seeded: prices.len(), demo_quote_number: None });
        }

        let catalog = CachedPriceCatalog::new(pool.clone(), std::time::Duration::ZERO)
            .refresh()
            .await?;
        let input = demo_input();
        let precheck_id = SqlPrecheckRepository::new(pool.clone())
            .insert(&input, "Demodatensatz")
            .await?;
        let breakdown = calculate_pricing(&input, &catalog);
        let quote = SqlQuoteRepository::new(pool.clone())
            .create_from_breakdown(precheck_id, &breakdown)
            .await?;

        Ok(SeedSummary {
            prices_seeded: prices.len(),
            demo_quote_number: Some(quote.quote_number),
        })
    }

    /// True when all seed price rows are present and active.
    pub async fn verify(pool: &DbPool) -> Result<bool, RepositoryError> {
        let overrides = SqlPriceConfigRepository::new(pool.clone()).load_overrides().await?;
        Ok(seed_prices().iter().all(|price| {
            overrides
                .get(&price.key)
                .is_some_and(|entry| entry.value == price.value && entry.kind == price.kind)
        }))
    }
}

/// Catalog as seeded, without going through a database. Used by tests that
/// need the historic price sheet semantics.
pub fn seeded_catalog() -> PriceCatalog {
    let mut overrides = pvquote_core::CatalogOverrides::new();
    for price in seed_prices() {
        overrides.insert(
            price.key,
            pvquote_core::CatalogEntry { value: price.value, kind: price.kind },
        );
    }
    PriceCatalog::new(overrides)
}
