use crate::model::Alert;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

/// NWS alert persistence, keyed by `alert_id`. Superseded rows are retained
/// (spec §3), so upsert replaces the latest snapshot rather than deleting.
#[derive(Debug, Clone)]
pub struct AlertStore {
    pool: PgPool,
}

impl AlertStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[allow(clippy::too_many_arguments)]
    #[instrument(level = "debug", skip(self, geometry, raw_json), err)]
    pub async fn upsert(
        &self, alert_id: &str, event: &str, severity: Option<&str>, certainty: Option<&str>,
        urgency: Option<&str>, headline: Option<&str>, description: Option<&str>,
        instruction: Option<&str>, effective: Option<DateTime<Utc>>, onset: Option<DateTime<Utc>>,
        expires: Option<DateTime<Utc>>, ends: Option<DateTime<Utc>>, status: Option<&str>,
        message_type: Option<&str>, area_desc: Option<&str>, geometry: Option<Value>,
        raw_json: Option<Value>,
    ) -> Result<Alert, sqlx::Error> {
        sqlx::query_as::<_, Alert>(
            r#"
            INSERT INTO nws_alert
                (alert_id, event, severity, certainty, urgency, headline, description, instruction,
                 effective, onset, expires, ends, status, message_type, area_desc, geometry, raw_json)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ON CONFLICT (alert_id) DO UPDATE SET
                event = EXCLUDED.event,
                severity = EXCLUDED.severity,
                certainty = EXCLUDED.certainty,
                urgency = EXCLUDED.urgency,
                headline = EXCLUDED.headline,
                description = EXCLUDED.description,
                instruction = EXCLUDED.instruction,
                effective = EXCLUDED.effective,
                onset = EXCLUDED.onset,
                expires = EXCLUDED.expires,
                ends = EXCLUDED.ends,
                status = EXCLUDED.status,
                message_type = EXCLUDED.message_type,
                area_desc = EXCLUDED.area_desc,
                geometry = EXCLUDED.geometry,
                raw_json = EXCLUDED.raw_json
            RETURNING alert_id, event, severity, certainty, urgency, headline, description, instruction,
                      effective, onset, expires, ends, status, message_type, area_desc, geometry, raw_json
            "#,
        )
        .bind(alert_id)
        .bind(event)
        .bind(severity)
        .bind(certainty)
        .bind(urgency)
        .bind(headline)
        .bind(description)
        .bind(instruction)
        .bind(effective)
        .bind(onset)
        .bind(expires)
        .bind(ends)
        .bind(status)
        .bind(message_type)
        .bind(area_desc)
        .bind(geometry)
        .bind(raw_json)
        .fetch_one(&self.pool)
        .await
    }

    /// `v_active_alerts` equivalent (spec §6): rows not yet expired, inside `bbox`.
    pub async fn active_in_bbox(
        &self, min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64, now: DateTime<Utc>,
    ) -> Result<Vec<Alert>, sqlx::Error> {
        sqlx::query_as::<_, Alert>(
            r#"
            SELECT * FROM nws_alert
            WHERE (expires IS NULL OR expires > $5)
              AND (
                geometry IS NULL
                OR ST_Intersects(
                    ST_SetSRID(ST_GeomFromGeoJSON(geometry::text), 4326),
                    ST_MakeEnvelope($2, $1, $4, $3, 4326)
                )
              )
            ORDER BY effective DESC NULLS LAST
            "#,
        )
        .bind(min_lat)
        .bind(min_lon)
        .bind(max_lat)
        .bind(max_lon)
        .bind(now)
        .fetch_all(&self.pool)
        .await
    }
}
