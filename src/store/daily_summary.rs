use crate::model::{normalize_station_id, DailySummary};
use chrono::NaiveDate;
use serde_json::Value;
use sqlx::PgPool;

/// Daily summary persistence, keyed `(station_id, date)` (spec §3, §4.6, §4.7).
#[derive(Debug, Clone)]
pub struct DailySummaryStore {
    pool: PgPool,
}

impl DailySummaryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Idempotent by design (spec §8): re-running an importer with the same
    /// input produces no new logical rows, only a refreshed `raw_json`.
    #[instrument(level = "debug", skip(self, raw_json), err)]
    pub async fn upsert(
        &self, station_id: &str, date: NaiveDate, tmax_c: Option<f64>, tmin_c: Option<f64>,
        prcp_mm: Option<f64>, raw_json: Option<Value>,
    ) -> Result<DailySummary, sqlx::Error> {
        let station_id = normalize_station_id(station_id);
        sqlx::query_as::<_, DailySummary>(
            r#"
            INSERT INTO noaa_daily_summary (station_id, date, tmax_c, tmin_c, prcp_mm, raw_json)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (station_id, date) DO UPDATE SET
                tmax_c = EXCLUDED.tmax_c,
                tmin_c = EXCLUDED.tmin_c,
                prcp_mm = EXCLUDED.prcp_mm,
                raw_json = EXCLUDED.raw_json
            RETURNING station_id, date, tmax_c, tmin_c, prcp_mm, raw_json
            "#,
        )
        .bind(station_id)
        .bind(date)
        .bind(tmax_c)
        .bind(tmin_c)
        .bind(prcp_mm)
        .bind(raw_json)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn max_date(&self, station_id: &str) -> Result<Option<NaiveDate>, sqlx::Error> {
        let station_id = normalize_station_id(station_id);
        sqlx::query_scalar::<_, Option<NaiveDate>>(
            "SELECT MAX(date) FROM noaa_daily_summary WHERE station_id = $1",
        )
        .bind(station_id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn range(
        &self, station_id: &str, start: NaiveDate, end: NaiveDate,
    ) -> Result<Vec<DailySummary>, sqlx::Error> {
        let station_id = normalize_station_id(station_id);
        sqlx::query_as::<_, DailySummary>(
            "SELECT * FROM noaa_daily_summary WHERE station_id = $1 AND date BETWEEN $2 AND $3 ORDER BY date ASC",
        )
        .bind(station_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn latest(&self, station_id: &str) -> Result<Option<DailySummary>, sqlx::Error> {
        let station_id = normalize_station_id(station_id);
        sqlx::query_as::<_, DailySummary>(
            "SELECT * FROM noaa_daily_summary WHERE station_id = $1 ORDER BY date DESC LIMIT 1",
        )
        .bind(station_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Sum of `prcp_mm` over the trailing `window_days` ending at `as_of`,
    /// used by the cached-aggregate refresh and the point summary (spec §4.6, §4.8.2).
    pub async fn windowed_precip_mm(
        &self, station_id: &str, as_of: NaiveDate, window_days: i64,
    ) -> Result<Option<f64>, sqlx::Error> {
        let station_id = normalize_station_id(station_id);
        let start = as_of - chrono::Duration::days(window_days);
        sqlx::query_scalar::<_, Option<f64>>(
            "SELECT SUM(prcp_mm) FROM noaa_daily_summary WHERE station_id = $1 AND date BETWEEN $2 AND $3",
        )
        .bind(station_id)
        .bind(start)
        .bind(as_of)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn coverage(
        &self, station_id: &str, window_days: i64, as_of: NaiveDate,
    ) -> Result<(i64, Option<NaiveDate>, Option<NaiveDate>), sqlx::Error> {
        let station_id = normalize_station_id(station_id);
        let start = as_of - chrono::Duration::days(window_days);
        let row: (i64, Option<NaiveDate>, Option<NaiveDate>) = sqlx::query_as(
            r#"
            SELECT COUNT(*), MIN(date), MAX(date)
            FROM noaa_daily_summary
            WHERE station_id = $1 AND date BETWEEN $2 AND $3
            "#,
        )
        .bind(station_id)
        .bind(start)
        .bind(as_of)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}
