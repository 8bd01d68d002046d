use crate::model::{CachedGridAggregate, Gridpoint, GridpointStationMap};
use sqlx::PgPool;

/// Gridpoint + gridpoint↔station mapping persistence (spec §3, §4.5, §4.6).
#[derive(Debug, Clone)]
pub struct GridpointStore {
    pool: PgPool,
}

impl GridpointStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upserts by `grid_id`; `grid_id = office:grid_x,grid_y` is enforced by the
    /// caller via [`crate::model::grid_id`] before this is invoked (spec §3, §8).
    #[instrument(level = "debug", skip(self), err)]
    pub async fn upsert(
        &self, office: &str, grid_x: i32, grid_y: i32, lat: f64, lon: f64,
        forecast_grid_data_url: Option<&str>, forecast_hourly_url: Option<&str>,
    ) -> Result<Gridpoint, sqlx::Error> {
        let grid_id = crate::model::grid_id(office, grid_x, grid_y);
        sqlx::query_as::<_, Gridpoint>(
            r#"
            INSERT INTO geo_gridpoint
                (grid_id, office, grid_x, grid_y, lat, lon, forecast_grid_data_url, forecast_hourly_url, last_refreshed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now())
            ON CONFLICT (grid_id) DO UPDATE SET
                forecast_grid_data_url = EXCLUDED.forecast_grid_data_url,
                forecast_hourly_url = EXCLUDED.forecast_hourly_url,
                last_refreshed_at = now()
            RETURNING grid_id, office, grid_x, grid_y, lat, lon, forecast_grid_data_url, forecast_hourly_url, last_refreshed_at
            "#,
        )
        .bind(grid_id)
        .bind(office)
        .bind(grid_x)
        .bind(grid_y)
        .bind(lat)
        .bind(lon)
        .bind(forecast_grid_data_url)
        .bind(forecast_hourly_url)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn get(&self, grid_id: &str) -> Result<Option<Gridpoint>, sqlx::Error> {
        sqlx::query_as::<_, Gridpoint>("SELECT * FROM geo_gridpoint WHERE grid_id = $1")
            .bind(grid_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn list_in_bbox(
        &self, min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64,
    ) -> Result<Vec<Gridpoint>, sqlx::Error> {
        sqlx::query_as::<_, Gridpoint>(
            "SELECT * FROM geo_gridpoint WHERE lat BETWEEN $1 AND $3 AND lon BETWEEN $2 AND $4",
        )
        .bind(min_lat)
        .bind(min_lon)
        .bind(max_lat)
        .bind(max_lon)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn list_all(&self) -> Result<Vec<Gridpoint>, sqlx::Error> {
        sqlx::query_as::<_, Gridpoint>("SELECT * FROM geo_gridpoint").fetch_all(&self.pool).await
    }

    /// Nearest gridpoint to `(lat, lon)` using the `<->` nearest-neighbour
    /// operator over a geography column (spec §9).
    #[instrument(level = "debug", skip(self), err)]
    pub async fn nearest(&self, lat: f64, lon: f64) -> Result<Option<Gridpoint>, sqlx::Error> {
        sqlx::query_as::<_, Gridpoint>(
            r#"
            SELECT * FROM geo_gridpoint
            ORDER BY geography(ST_SetSRID(ST_MakePoint(lon, lat), 4326)) <->
                     geography(ST_SetSRID(ST_MakePoint($1, $2), 4326))
            LIMIT 1
            "#,
        )
        .bind(lon)
        .bind(lat)
        .fetch_optional(&self.pool)
        .await
    }

    /// Atomically replaces the ranked mapping rows for `grid_id`; the nearest
    /// (rank 0) becomes `is_primary` (spec §4.6).
    #[instrument(level = "debug", skip(self, ranked), err)]
    pub async fn replace_station_map(
        &self, grid_id: &str, ranked: &[(String, f64)],
    ) -> Result<Vec<GridpointStationMap>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM gridpoint_station_map WHERE grid_id = $1")
            .bind(grid_id)
            .execute(&mut *tx)
            .await?;

        let mut rows = Vec::with_capacity(ranked.len());
        for (rank, (station_id, distance_km)) in ranked.iter().enumerate() {
            let row = sqlx::query_as::<_, GridpointStationMap>(
                r#"
                INSERT INTO gridpoint_station_map (grid_id, station_id, distance_km, rank, is_primary)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING grid_id, station_id, distance_km, rank, is_primary
                "#,
            )
            .bind(grid_id)
            .bind(station_id)
            .bind(distance_km)
            .bind(rank as i32)
            .bind(rank == 0)
            .fetch_one(&mut *tx)
            .await?;
            rows.push(row);
        }

        tx.commit().await?;
        Ok(rows)
    }

    pub async fn mapped_stations(&self, grid_id: &str) -> Result<Vec<GridpointStationMap>, sqlx::Error> {
        sqlx::query_as::<_, GridpointStationMap>(
            "SELECT * FROM gridpoint_station_map WHERE grid_id = $1 ORDER BY rank ASC",
        )
        .bind(grid_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn primary_station(&self, grid_id: &str) -> Result<Option<GridpointStationMap>, sqlx::Error> {
        sqlx::query_as::<_, GridpointStationMap>(
            "SELECT * FROM gridpoint_station_map WHERE grid_id = $1 AND is_primary = true",
        )
        .bind(grid_id)
        .fetch_optional(&self.pool)
        .await
    }

    #[instrument(level = "debug", skip(self), err)]
    pub async fn upsert_cached_aggregate(
        &self, grid_id: &str, as_of: chrono::NaiveDate, tmean_c: Option<f64>, prcp_30d_mm: Option<f64>,
    ) -> Result<CachedGridAggregate, sqlx::Error> {
        sqlx::query_as::<_, CachedGridAggregate>(
            r#"
            INSERT INTO cached_grid_agg (grid_id, as_of, tmean_c, prcp_30d_mm, last_updated)
            VALUES ($1, $2, $3, $4, now())
            ON CONFLICT (grid_id) DO UPDATE SET
                as_of = EXCLUDED.as_of,
                tmean_c = EXCLUDED.tmean_c,
                prcp_30d_mm = EXCLUDED.prcp_30d_mm,
                last_updated = now()
            RETURNING grid_id, as_of, tmean_c, prcp_30d_mm, last_updated
            "#,
        )
        .bind(grid_id)
        .bind(as_of)
        .bind(tmean_c)
        .bind(prcp_30d_mm)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn cached_aggregate(&self, grid_id: &str) -> Result<Option<CachedGridAggregate>, sqlx::Error> {
        sqlx::query_as::<_, CachedGridAggregate>("SELECT * FROM cached_grid_agg WHERE grid_id = $1")
            .bind(grid_id)
            .fetch_optional(&self.pool)
            .await
    }
}
