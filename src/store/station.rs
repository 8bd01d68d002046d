use crate::model::{normalize_station_id, Station};
use serde_json::Value;
use sqlx::PgPool;

/// Station persistence (spec §3). `station_id` normalisation is applied here,
/// at the write boundary, so every other layer can assume it already holds.
#[derive(Debug, Clone)]
pub struct StationStore {
    pool: PgPool,
}

impl StationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(level = "debug", skip(self, metadata), err)]
    pub async fn upsert(
        &self, station_id: &str, name: &str, lat: f64, lon: f64, elevation_m: Option<f64>,
        metadata: Option<Value>,
    ) -> Result<Station, sqlx::Error> {
        let station_id = normalize_station_id(station_id);
        sqlx::query_as::<_, Station>(
            r#"
            INSERT INTO noaa_station (station_id, name, lat, lon, elevation_m, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (station_id) DO UPDATE SET
                name = EXCLUDED.name,
                lat = EXCLUDED.lat,
                lon = EXCLUDED.lon,
                elevation_m = EXCLUDED.elevation_m,
                metadata = COALESCE(EXCLUDED.metadata, noaa_station.metadata)
            RETURNING station_id, name, lat, lon, elevation_m, metadata
            "#,
        )
        .bind(station_id)
        .bind(name)
        .bind(lat)
        .bind(lon)
        .bind(elevation_m)
        .bind(metadata)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn get(&self, station_id: &str) -> Result<Option<Station>, sqlx::Error> {
        let station_id = normalize_station_id(station_id);
        sqlx::query_as::<_, Station>("SELECT * FROM noaa_station WHERE station_id = $1")
            .bind(station_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn list_in_bbox(
        &self, min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64, limit: i64,
    ) -> Result<Vec<Station>, sqlx::Error> {
        sqlx::query_as::<_, Station>(
            r#"
            SELECT * FROM noaa_station
            WHERE lat BETWEEN $1 AND $3 AND lon BETWEEN $2 AND $4
            LIMIT $5
            "#,
        )
        .bind(min_lat)
        .bind(min_lon)
        .bind(max_lat)
        .bind(max_lon)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /// Nearest `limit` stations to `(lat, lon)`, using the `<->` operator
    /// (spec §9 Spatial queries). Ordering is done in SQL; IDW weighting
    /// against the returned distances happens in the read API.
    #[instrument(level = "debug", skip(self), err)]
    pub async fn nearest(&self, lat: f64, lon: f64, limit: i64) -> Result<Vec<Station>, sqlx::Error> {
        sqlx::query_as::<_, Station>(
            r#"
            SELECT * FROM noaa_station
            ORDER BY geography(ST_SetSRID(ST_MakePoint(lon, lat), 4326)) <->
                     geography(ST_SetSRID(ST_MakePoint($1, $2), 4326))
            LIMIT $3
            "#,
        )
        .bind(lon)
        .bind(lat)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /// Candidate stations within `radius_km` of `(lat, lon)` (spec §4.6, local
    /// GHCN file path). Distance filtering/ranking against these candidates
    /// happens in the ingest pipeline via [`crate::geo::haversine_km`].
    pub async fn candidates_within_radius(
        &self, lat: f64, lon: f64, radius_km: f64,
    ) -> Result<Vec<Station>, sqlx::Error> {
        sqlx::query_as::<_, Station>(
            r#"
            SELECT * FROM noaa_station
            WHERE ST_DWithin(
                geography(ST_SetSRID(ST_MakePoint(lon, lat), 4326)),
                geography(ST_SetSRID(ST_MakePoint($1, $2), 4326)),
                $3 * 1000
            )
            "#,
        )
        .bind(lon)
        .bind(lat)
        .bind(radius_km)
        .fetch_all(&self.pool)
        .await
    }
}
