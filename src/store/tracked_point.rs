use crate::model::TrackedPoint;
use sqlx::PgPool;

/// Tracked-point persistence (spec §3, §4.8.4). The only entity the read API
/// writes directly (via the `POST`/`DELETE` routes).
#[derive(Debug, Clone)]
pub struct TrackedPointStore {
    pool: PgPool,
}

impl TrackedPointStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(level = "debug", skip(self), err)]
    pub async fn create(
        &self, name: Option<&str>, lat: f64, lon: f64,
    ) -> Result<TrackedPoint, sqlx::Error> {
        sqlx::query_as::<_, TrackedPoint>(
            r#"
            INSERT INTO tracked_point (name, lat, lon)
            VALUES ($1, $2, $3)
            ON CONFLICT (lat, lon) DO UPDATE SET name = COALESCE(EXCLUDED.name, tracked_point.name)
            RETURNING id, name, lat, lon
            "#,
        )
        .bind(name)
        .bind(lat)
        .bind(lon)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list(&self) -> Result<Vec<TrackedPoint>, sqlx::Error> {
        sqlx::query_as::<_, TrackedPoint>("SELECT * FROM tracked_point ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn get(&self, id: i64) -> Result<Option<TrackedPoint>, sqlx::Error> {
        sqlx::query_as::<_, TrackedPoint>("SELECT * FROM tracked_point WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn delete_by_id(&self, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tracked_point WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_by_coords(&self, lat: f64, lon: f64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tracked_point WHERE lat = $1 AND lon = $2")
            .bind(lat)
            .bind(lon)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
