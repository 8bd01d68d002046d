//! NOAA CDO v2 client (spec §4.3, §6). Every request carries the `token`
//! header; the stations search computes a lat/lon bounding extent from a
//! radius using the standard 111 km/° approximation.

use crate::errors::UpstreamError;
use crate::fabric::UpstreamFabric;
use crate::geo::bbox_from_radius_km;
use crate::model::{BoundingBox, Point};
use crate::settings::NoaaSettings;
use chrono::NaiveDate;
use reqwest::header::HeaderValue;
use std::sync::Arc;
use url::Url;

const UPSTREAM: &str = "NOAA";

#[derive(Debug, Clone, Deserialize)]
pub struct StationsResponse {
    pub metadata: ResultMetadata,
    #[serde(default)]
    pub results: Vec<StationResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationResult {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataResponse {
    pub metadata: ResultMetadata,
    #[serde(default)]
    pub results: Vec<DataRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultMetadata {
    pub resultset: Resultset,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Resultset {
    pub count: u64,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataRow {
    pub date: chrono::DateTime<chrono::Utc>,
    pub datatype: String,
    pub station: String,
    pub value: f64,
}

pub struct NoaaClient {
    http: reqwest::Client,
    base_url: Url,
    token: HeaderValue,
    fabric: Arc<UpstreamFabric>,
}

impl NoaaClient {
    pub fn new(settings: &NoaaSettings, fabric: Arc<UpstreamFabric>) -> Result<Self, UpstreamError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|e| UpstreamError::InvalidRequest(UPSTREAM, e.to_string()))?;
        let token = settings.token.as_deref().unwrap_or_default();
        let token = HeaderValue::from_str(token)
            .map_err(|e| UpstreamError::InvalidRequest(UPSTREAM, e.to_string()))?;
        let http = super::build_http_client()
            .map_err(|e| UpstreamError::Transient { upstream: UPSTREAM, source: Box::new(e) })?;
        Ok(Self { http, base_url, token, fabric })
    }

    /// Stations within `radius_km` of `center`, ordered by `datacoverage` (spec §4.3).
    #[instrument(level = "debug", skip(self), err)]
    pub async fn stations_near(
        &self, center: Point, radius_km: f64, limit: u32,
    ) -> Result<StationsResponse, UpstreamError> {
        let bbox = bbox_from_radius_km(center, radius_km);
        let mut url = self
            .base_url
            .join("stations")
            .map_err(|e| UpstreamError::InvalidRequest(UPSTREAM, e.to_string()))?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("datasetid", "GHCND");
            q.append_pair("extent", &extent_param(&bbox));
            q.append_pair("sortfield", "datacoverage");
            q.append_pair("limit", &limit.to_string());
        }
        self.get_json(url).await
    }

    /// One page of daily GHCND observations for `station_id` in `[start, end]`,
    /// restricted to `TMAX`, `TMIN`, `PRCP` (spec §4.3). Callers paginate by
    /// incrementing `offset` until `offset + limit > metadata.resultset.count`.
    #[instrument(level = "debug", skip(self), err)]
    pub async fn daily_ghcnd(
        &self, station_id: &str, start: NaiveDate, end: NaiveDate, limit: u32, offset: u32,
    ) -> Result<DataResponse, UpstreamError> {
        let mut url = self
            .base_url
            .join("data")
            .map_err(|e| UpstreamError::InvalidRequest(UPSTREAM, e.to_string()))?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("datasetid", "GHCND");
            q.append_pair("stationid", station_id);
            q.append_pair("startdate", &start.to_string());
            q.append_pair("enddate", &end.to_string());
            q.append_pair("datatypeid", "TMAX");
            q.append_pair("datatypeid", "TMIN");
            q.append_pair("datatypeid", "PRCP");
            q.append_pair("units", "metric");
            q.append_pair("limit", &limit.to_string());
            q.append_pair("offset", &offset.to_string());
        }
        self.get_json(url).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, UpstreamError> {
        let response = self
            .fabric
            .call(|| self.http.get(url.clone()).header("token", self.token.clone()).send())
            .await?;

        response
            .json::<T>()
            .await
            .map_err(|e| UpstreamError::Parse(UPSTREAM, Box::new(e)))
    }
}

fn extent_param(bbox: &BoundingBox) -> String {
    format!("{},{},{},{}", bbox.min_lat, bbox.min_lon, bbox.max_lat, bbox.max_lon)
}

impl std::fmt::Debug for NoaaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoaaClient").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_param_order_is_min_lat_min_lon_max_lat_max_lon() {
        let bbox = BoundingBox { min_lat: 30.0, min_lon: -120.0, max_lat: 40.0, max_lon: -110.0 };
        assert_eq!(extent_param(&bbox), "30,-120,40,-110");
    }
}
