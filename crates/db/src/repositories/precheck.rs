//! Persisted precheck submissions.
//!
//! A precheck row stores the normalized wire values, not a serialized
//! struct: reconstruction goes back through [`PricingRequest`] so stored
//! rows pass the exact same validation as fresh submissions.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::Row;

use pvquote_core::{FlexBool, FlexDecimal, PricingInput, PricingRequest};

use super::RepositoryError;
use crate::DbPool;

#[derive(Clone, Debug, Serialize)]
pub struct PrecheckRecord {
    pub id: i64,
    pub building_type: String,
    pub site_address: String,
    pub main_fuse_ampere: i64,
    pub grid_type: String,
    pub distance_meter: String,
    pub desired_power_kw: String,
    pub storage_kwh: String,
    pub own_components: bool,
    pub has_wallbox: bool,
    pub wallbox_power: String,
    pub wallbox_mount: String,
    pub wallbox_cable_installed: bool,
    pub wallbox_cable_length: String,
    pub wallbox_pv_surplus: bool,
    pub notes: String,
    pub created_at: NaiveDateTime,
}

impl PrecheckRecord {
    /// Rebuilds the pricing input from the stored wire values.
    pub fn to_pricing_input(&self) -> Result<PricingInput, RepositoryError> {
        let request = PricingRequest {
            building_type: Some(self.building_type.clone()),
            site_address: Some(self.site_address.clone()),
            main_fuse_ampere: Some(FlexDecimal::Text(self.main_fuse_ampere.to_string())),
            grid_type: Some(self.grid_type.clone()),
            distance_meter_to_inverter: Some(FlexDecimal::Text(self.distance_meter.clone())),
            desired_power_kw: Some(FlexDecimal::Text(self.desired_power_kw.clone())),
            storage_kwh: Some(FlexDecimal::Text(self.storage_kwh.clone())),
            own_components: Some(FlexBool::Bool(self.own_components)),
            has_wallbox: Some(FlexBool::Bool(self.has_wallbox)),
            wallbox_power: Some(self.wallbox_power.clone()),
            wallbox_mount: Some(self.wallbox_mount.clone()),
            wallbox_cable_installed: Some(FlexBool::Bool(self.wallbox_cable_installed)),
            wallbox_cable_length: Some(FlexDecimal::Text(self.wallbox_cable_length.clone())),
            wallbox_pv_surplus: Some(FlexBool::Bool(self.wallbox_pv_surplus)),
            ..PricingRequest::default()
        };
        request.try_into_input().map_err(|error| {
            RepositoryError::Decode(format!("precheck {} no longer validates: {error}", self.id))
        })
    }
}

fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<PrecheckRecord, RepositoryError> {
    Ok(PrecheckRecord {
        id: row.try_get("id")?,
        building_type: row.try_get("building_type")?,
        site_address: row.try_get("site_address")?,
        main_fuse_ampere: row.try_get("main_fuse_ampere")?,
        grid_type: row.try_get("grid_type")?,
        distance_meter: row.try_get("distance_meter")?,
        desired_power_kw: row.try_get("desired_power_kw")?,
        storage_kwh: row.try_get("storage_kwh")?,
        own_components: row.try_get::<i64, _>("own_components")? != 0,
        has_wallbox: row.try_get::<i64, _>("has_wallbox")? != 0,
        wallbox_power: row.try_get("wallbox_power")?,
        wallbox_mount: row.try_get("wallbox_mount")?,
        wallbox_cable_installed: row.try_get::<i64, _>("wallbox_cable_installed")? != 0,
        wallbox_cable_length: row.try_get("wallbox_cable_length")?,
        wallbox_pv_surplus: row.try_get::<i64, _>("wallbox_pv_surplus")? != 0,
        notes: row.try_get("notes")?,
        created_at: row.try_get("created_at")?,
    })
}

const SELECT_COLUMNS: &str = "id, building_type, site_address, main_fuse_ampere, grid_type, \
     distance_meter, desired_power_kw, storage_kwh, own_components, has_wallbox, \
     wallbox_power, wallbox_mount, wallbox_cable_installed, wallbox_cable_length, \
     wallbox_pv_surplus, notes, created_at";

pub struct SqlPrecheckRepository {
    pool: DbPool,
}

impl SqlPrecheckRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Stores an already-validated input and returns the new row id.
    pub async fn insert(
        &self,
        input: &PricingInput,
        notes: &str,
    ) -> Result<i64, RepositoryError> {
        let wallbox = input.wallbox.as_ref();
        let result = sqlx::query(
            "INSERT INTO precheck (building_type, site_address, main_fuse_ampere, grid_type, \
               distance_meter, desired_power_kw, storage_kwh, own_components, has_wallbox, \
               wallbox_power, wallbox_mount, wallbox_cable_installed, wallbox_cable_length, \
               wallbox_pv_surplus, notes) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(input.building_type.as_str())
        .bind(&input.site_address)
        .bind(i64::from(input.main_fuse_ampere))
        .bind(input.grid_type.as_str())
        .bind(input.distance_meter.to_string())
        .bind(input.desired_power_kw.to_string())
        .bind(input.storage_kwh.to_string())
        .bind(i64::from(input.own_components))
        .bind(i64::from(wallbox.is_some()))
        .bind(wallbox.and_then(|w| w.power).map(|p| p.as_str()).unwrap_or(""))
        .bind(wallbox.map(|w| w.mount.as_str()).unwrap_or(""))
        .bind(i64::from(wallbox.is_some_and(|w| w.cable_installed)))
        .bind(wallbox.map(|w| w.cable_length_m).unwrap_or(Decimal::ZERO).to_string())
        .bind(i64::from(wallbox.is_some_and(|w| w.pv_surplus)))
        .bind(notes)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<PrecheckRecord>, RepositoryError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM precheck WHERE id = ?");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(record_from_row).transpose()
    }

    pub async fn list_recent(&self, limit: i64) -> Result<Vec<PrecheckRecord>, RepositoryError> {
        let sql =
            format!("SELECT {SELECT_COLUMNS} FROM precheck ORDER BY created_at DESC, id DESC LIMIT ?");
        let rows = sqlx::query(&sql).bind(limit).fetch_all(&self.pool).await?;
        rows.iter().map(record_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use pvquote_core::{
        BuildingType, GridType, PricingInput, WallboxMount, WallboxPower, WallboxRequest,
    };

    use super::SqlPrecheckRepository;
    use crate::{connect_with_settings, migrations};

    async fn pool() -> crate::DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn sample_input() -> PricingInput {
        PricingInput {
            building_type: BuildingType::Mfh,
            site_address: "Musterweg 4, Norderstedt".to_string(),
            main_fuse_ampere: 63,
            grid_type: GridType::SinglePhase,
            distance_meter: Decimal::from(12),
            desired_power_kw: Decimal::new(65, 1),
            storage_kwh: Decimal::from(4),
            own_components: false,
            wallbox: Some(WallboxRequest {
                power: Some(WallboxPower::Kw11),
                mount: WallboxMount::Stand,
                cable_installed: false,
                cable_length_m: Decimal::from(10),
                pv_surplus: true,
            }),
        }
    }

    #[tokio::test]
    async fn stored_precheck_rebuilds_the_same_input() {
        let pool = pool().await;
        let repository = SqlPrecheckRepository::new(pool.clone());

        let input = sample_input();
        let id = repository.insert(&input, "Rückruf gewünscht").await.expect("insert");
        let record = repository.find_by_id(id).await.expect("query").expect("row exists");

        assert_eq!(record.notes, "Rückruf gewünscht");
        let rebuilt = record.to_pricing_input().expect("revalidates");
        assert_eq!(rebuilt, input);

        pool.close().await;
    }

    #[tokio::test]
    async fn wallbox_free_precheck_round_trips_without_a_wallbox() {
        let pool = pool().await;
        let repository = SqlPrecheckRepository::new(pool.clone());

        let input = PricingInput { wallbox: None, ..sample_input() };
        let id = repository.insert(&input, "").await.expect("insert");
        let record = repository.find_by_id(id).await.expect("query").expect("row exists");

        assert!(!record.has_wallbox);
        assert!(record.to_pricing_input().expect("revalidates").wallbox.is_none());

        pool.close().await;
    }

    #[tokio::test]
    async fn missing_precheck_is_none_not_an_error() {
        let pool = pool().await;
        let repository = SqlPrecheckRepository::new(pool.clone());

        assert!(repository.find_by_id(4711).await.expect("query").is_none());

        pool.close().await;
    }
}
