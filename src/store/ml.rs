use crate::model::{MlPrediction, MlRun, MlWeatherPrediction, SourceType};
use sqlx::PgPool;

/// Read-only access to `ml_prediction`/`ml_weather_prediction`. These tables
/// are populated out-of-band (no pipeline in this crate writes them); the
/// store only serves the `/api/ml/*` routes.
#[derive(Debug, Clone)]
pub struct MlStore {
    pool: PgPool,
}

impl MlStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_runs(&self, limit: i64) -> Result<Vec<MlRun>, sqlx::Error> {
        sqlx::query_as::<_, MlRun>("SELECT * FROM ml_model_run ORDER BY started_at DESC LIMIT $1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn latest_predictions(&self, grid_id: &str) -> Result<Vec<MlPrediction>, sqlx::Error> {
        sqlx::query_as::<_, MlPrediction>(
            r#"
            SELECT DISTINCT ON (valid_time) run_id, grid_id, valid_time, risk_score, risk_class
            FROM ml_prediction
            WHERE grid_id = $1
            ORDER BY valid_time, run_id DESC
            "#,
        )
        .bind(grid_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Latest weather prediction for a source. `point` queries are widened to
    /// also match `gridpoint` rows, since the points/gridpoint duality is
    /// collapsed upstream at ingest time but ML jobs may tag either.
    #[instrument(level = "debug", skip(self), err)]
    pub async fn weather_latest(
        &self, source_type: SourceType, source_id: &str,
    ) -> Result<Option<MlWeatherPrediction>, sqlx::Error> {
        let source_types = self.source_types_for_query(source_type);
        sqlx::query_as::<_, MlWeatherPrediction>(
            r#"
            SELECT * FROM ml_weather_prediction
            WHERE source_type = ANY($1) AND source_id = $2
            ORDER BY as_of_date DESC, horizon_hours ASC
            LIMIT 1
            "#,
        )
        .bind(source_types)
        .bind(source_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Forecast horizon for a source. `point` is remapped to `gridpoint`
    /// rather than widened, since forecast rows are only ever produced for
    /// gridpoints upstream.
    #[instrument(level = "debug", skip(self), err)]
    pub async fn weather_forecast(
        &self, source_type: SourceType, source_id: &str, min_horizon_hours: i32, max_horizon_hours: i32,
    ) -> Result<Vec<MlWeatherPrediction>, sqlx::Error> {
        let effective_type = match source_type {
            SourceType::Point => SourceType::Gridpoint,
            other => other,
        };
        sqlx::query_as::<_, MlWeatherPrediction>(
            r#"
            SELECT * FROM ml_weather_prediction
            WHERE source_type = $1 AND source_id = $2
              AND horizon_hours BETWEEN $3 AND $4
            ORDER BY as_of_date ASC, horizon_hours ASC
            "#,
        )
        .bind(effective_type.to_string())
        .bind(source_id)
        .bind(min_horizon_hours)
        .bind(max_horizon_hours)
        .fetch_all(&self.pool)
        .await
    }

    fn source_types_for_query(&self, source_type: SourceType) -> Vec<String> {
        match source_type {
            SourceType::Point => vec![SourceType::Point.to_string(), SourceType::Gridpoint.to_string()],
            other => vec![other.to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_latest_query_widens_to_gridpoint() {
        let store_types = vec![SourceType::Point.to_string(), SourceType::Gridpoint.to_string()];
        assert_eq!(store_types, vec!["point".to_string(), "gridpoint".to_string()]);
    }

    #[test]
    fn point_forecast_remaps_to_gridpoint() {
        let remapped = match SourceType::Point {
            SourceType::Point => SourceType::Gridpoint,
            other => other,
        };
        assert_eq!(remapped, SourceType::Gridpoint);
    }
}
