use crate::model::HourlyForecastRow;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

/// Hourly forecast period persistence, keyed `(grid_id, start_time)` (spec §3, §4.5).
#[derive(Debug, Clone)]
pub struct ForecastStore {
    pool: PgPool,
}

impl ForecastStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[allow(clippy::too_many_arguments)]
    #[instrument(level = "debug", skip(self, raw_json), err)]
    pub async fn upsert_period(
        &self, grid_id: &str, start_time: DateTime<Utc>, end_time: DateTime<Utc>,
        temperature_c: Option<f64>, wind_speed_mps: Option<f64>, wind_gust_mps: Option<f64>,
        wind_dir_deg: Option<f64>, precip_prob: Option<f64>, relative_humidity: Option<f64>,
        short_forecast: Option<&str>, issued_at: Option<DateTime<Utc>>, raw_json: Option<Value>,
    ) -> Result<HourlyForecastRow, sqlx::Error> {
        sqlx::query_as::<_, HourlyForecastRow>(
            r#"
            INSERT INTO nws_forecast_hourly
                (grid_id, start_time, end_time, temperature_c, wind_speed_mps, wind_gust_mps,
                 wind_dir_deg, precip_prob, relative_humidity, short_forecast, issued_at, raw_json, ingested_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, now())
            ON CONFLICT (grid_id, start_time) DO UPDATE SET
                end_time = EXCLUDED.end_time,
                temperature_c = EXCLUDED.temperature_c,
                wind_speed_mps = EXCLUDED.wind_speed_mps,
                wind_gust_mps = EXCLUDED.wind_gust_mps,
                wind_dir_deg = EXCLUDED.wind_dir_deg,
                precip_prob = EXCLUDED.precip_prob,
                relative_humidity = EXCLUDED.relative_humidity,
                short_forecast = EXCLUDED.short_forecast,
                issued_at = EXCLUDED.issued_at,
                raw_json = EXCLUDED.raw_json,
                ingested_at = now()
            RETURNING grid_id, start_time, end_time, temperature_c, wind_speed_mps, wind_gust_mps,
                      wind_dir_deg, precip_prob, relative_humidity, short_forecast, issued_at, raw_json, ingested_at
            "#,
        )
        .bind(grid_id)
        .bind(start_time)
        .bind(end_time)
        .bind(temperature_c)
        .bind(wind_speed_mps)
        .bind(wind_gust_mps)
        .bind(wind_dir_deg)
        .bind(precip_prob)
        .bind(relative_humidity)
        .bind(short_forecast)
        .bind(issued_at)
        .bind(raw_json)
        .fetch_one(&self.pool)
        .await
    }

    /// Future periods for `grid_id`, ascending, limited (spec §4.8.1).
    pub async fn future_periods(
        &self, grid_id: &str, now: DateTime<Utc>, limit: i64,
    ) -> Result<Vec<HourlyForecastRow>, sqlx::Error> {
        sqlx::query_as::<_, HourlyForecastRow>(
            r#"
            SELECT * FROM nws_forecast_hourly
            WHERE grid_id = $1 AND start_time >= $2
            ORDER BY start_time ASC
            LIMIT $3
            "#,
        )
        .bind(grid_id)
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn next_period(
        &self, grid_id: &str, now: DateTime<Utc>,
    ) -> Result<Option<HourlyForecastRow>, sqlx::Error> {
        Ok(self.future_periods(grid_id, now, 1).await?.into_iter().next())
    }

    /// `v_latest_hourly_forecast` equivalent (spec §6): the most recently
    /// ingested period per gridpoint, used by the bbox/composite routes.
    pub async fn latest_per_grid(&self, grid_ids: &[String]) -> Result<Vec<HourlyForecastRow>, sqlx::Error> {
        sqlx::query_as::<_, HourlyForecastRow>(
            r#"
            SELECT DISTINCT ON (grid_id) *
            FROM nws_forecast_hourly
            WHERE grid_id = ANY($1)
            ORDER BY grid_id, start_time DESC
            "#,
        )
        .bind(grid_ids)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn range(
        &self, grid_id: &str, start: DateTime<Utc>, end: DateTime<Utc>,
    ) -> Result<Vec<HourlyForecastRow>, sqlx::Error> {
        sqlx::query_as::<_, HourlyForecastRow>(
            r#"
            SELECT * FROM nws_forecast_hourly
            WHERE grid_id = $1 AND start_time >= $2 AND start_time <= $3
            ORDER BY start_time ASC
            "#,
        )
        .bind(grid_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
    }
}
