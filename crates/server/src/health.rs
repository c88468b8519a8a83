//! Readiness endpoint. Reports the database connection and the migration
//! state separately so an operator can tell a down database apart from a
//! pool that connects to an empty file.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use pvquote_db::{migrations, DbPool};
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    Ready,
    Degraded,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ComponentCheck {
    pub status: ComponentStatus,
    pub detail: String,
}

impl ComponentCheck {
    fn ready(detail: impl Into<String>) -> Self {
        Self { status: ComponentStatus::Ready, detail: detail.into() }
    }

    fn degraded(detail: impl Into<String>) -> Self {
        Self { status: ComponentStatus::Degraded, detail: detail.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub database: ComponentCheck,
    pub schema: ComponentCheck,
    pub checked_at: String,
}

pub fn router(db_pool: DbPool) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { db_pool })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(&state.db_pool).await;
    let schema = schema_check(&state.db_pool).await;
    let ready =
        database.status == ComponentStatus::Ready && schema.status == ComponentStatus::Ready;

    let payload = HealthResponse {
        status: if ready { ComponentStatus::Ready } else { ComponentStatus::Degraded },
        database,
        schema,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn database_check(pool: &DbPool) -> ComponentCheck {
    match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await {
        Ok(_) => ComponentCheck::ready("database query succeeded"),
        Err(error) => ComponentCheck::degraded(format!("database query failed: {error}")),
    }
}

async fn schema_check(pool: &DbPool) -> ComponentCheck {
    match migrations::applied_count(pool).await {
        Ok(applied) if applied > 0 => {
            ComponentCheck::ready(format!("{applied} migration(s) applied"))
        }
        Ok(_) => ComponentCheck::degraded("no migrations applied"),
        Err(error) => ComponentCheck::degraded(format!("schema lookup failed: {error}")),
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, Json};
    use pvquote_db::{connect_with_settings, migrations};

    use crate::health::{health, ComponentStatus, HealthState};

    #[tokio::test]
    async fn health_is_ready_on_a_migrated_database() {
        let pool =
            connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");
        migrations::run_pending(&pool).await.expect("migrations should apply");

        let (status, Json(payload)) = health(State(HealthState { db_pool: pool.clone() })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, ComponentStatus::Ready);
        assert_eq!(payload.database.status, ComponentStatus::Ready);
        assert_eq!(payload.schema.status, ComponentStatus::Ready);

        pool.close().await;
    }

    #[tokio::test]
    async fn health_flags_an_unmigrated_database() {
        let pool =
            connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");

        let (status, Json(payload)) = health(State(HealthState { db_pool: pool.clone() })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.database.status, ComponentStatus::Ready);
        assert_eq!(payload.schema.status, ComponentStatus::Degraded);

        pool.close().await;
    }

    #[tokio::test]
    async fn health_is_service_unavailable_without_a_database() {
        let pool =
            connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");
        pool.close().await;

        let (status, Json(payload)) = health(State(HealthState { db_pool: pool })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, ComponentStatus::Degraded);
        assert_eq!(payload.database.status, ComponentStatus::Degraded);
    }
}
