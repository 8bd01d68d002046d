//! NWS (api.weather.gov) client (spec §4.2, §6). Every request sets the
//! required `User-Agent` and `Accept: application/geo+json`.

use crate::errors::UpstreamError;
use crate::fabric::UpstreamFabric;
use crate::settings::NwsSettings;
use reqwest::header::{HeaderValue, ACCEPT};
use serde_json::Value;
use std::sync::Arc;
use url::Url;

const UPSTREAM: &str = "NWS";

#[derive(Debug, Clone, Deserialize)]
pub struct PointsResponse {
    pub properties: PointsProperties,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PointsProperties {
    #[serde(rename = "gridId")]
    pub grid_id: String,
    #[serde(rename = "gridX")]
    pub grid_x: i32,
    #[serde(rename = "gridY")]
    pub grid_y: i32,
    #[serde(rename = "forecastGridData")]
    pub forecast_grid_data: Option<String>,
    #[serde(rename = "forecastHourly")]
    pub forecast_hourly: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HourlyForecastResponse {
    pub properties: HourlyForecastProperties,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HourlyForecastProperties {
    pub periods: Vec<HourlyPeriod>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyPeriod {
    #[serde(rename = "startTime")]
    pub start_time: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "endTime")]
    pub end_time: chrono::DateTime<chrono::Utc>,
    pub temperature: Option<f64>,
    #[serde(rename = "temperatureUnit")]
    pub temperature_unit: Option<String>,
    #[serde(rename = "windSpeed")]
    pub wind_speed: Option<String>,
    #[serde(rename = "windGust")]
    pub wind_gust: Option<String>,
    #[serde(rename = "windDirection")]
    pub wind_direction: Option<String>,
    #[serde(rename = "probabilityOfPrecipitation")]
    pub probability_of_precipitation: Option<QuantitativeValue>,
    #[serde(rename = "relativeHumidity")]
    pub relative_humidity: Option<QuantitativeValue>,
    #[serde(rename = "shortForecast")]
    pub short_forecast: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantitativeValue {
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertsResponse {
    pub features: Vec<AlertFeature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertFeature {
    pub id: Option<String>,
    pub geometry: Option<Value>,
    pub properties: AlertProperties,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertProperties {
    pub id: String,
    pub event: String,
    pub severity: Option<String>,
    pub certainty: Option<String>,
    pub urgency: Option<String>,
    pub headline: Option<String>,
    pub description: Option<String>,
    pub instruction: Option<String>,
    pub effective: Option<chrono::DateTime<chrono::Utc>>,
    pub onset: Option<chrono::DateTime<chrono::Utc>>,
    pub expires: Option<chrono::DateTime<chrono::Utc>>,
    pub ends: Option<chrono::DateTime<chrono::Utc>>,
    pub status: Option<String>,
    #[serde(rename = "messageType")]
    pub message_type: Option<String>,
    #[serde(rename = "areaDesc")]
    pub area_desc: Option<String>,
}

pub struct NwsClient {
    http: reqwest::Client,
    base_url: Url,
    user_agent: HeaderValue,
    fabric: Arc<UpstreamFabric>,
}

impl NwsClient {
    pub fn new(settings: &NwsSettings, fabric: Arc<UpstreamFabric>) -> Result<Self, UpstreamError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|e| UpstreamError::InvalidRequest(UPSTREAM, e.to_string()))?;
        let user_agent = HeaderValue::from_str(&settings.user_agent)
            .map_err(|e| UpstreamError::InvalidRequest(UPSTREAM, e.to_string()))?;
        let http = super::build_http_client()
            .map_err(|e| UpstreamError::Transient { upstream: UPSTREAM, source: Box::new(e) })?;
        Ok(Self { http, base_url, user_agent, fabric })
    }

    #[instrument(level = "debug", skip(self), err)]
    pub async fn points(&self, lat: f64, lon: f64) -> Result<PointsResponse, UpstreamError> {
        let url = self
            .base_url
            .join(&format!("points/{lat:.4},{lon:.4}"))
            .map_err(|e| UpstreamError::InvalidRequest(UPSTREAM, e.to_string()))?;
        self.get_json(url).await
    }

    #[instrument(level = "debug", skip(self), err)]
    pub async fn forecast_hourly(&self, url: &str) -> Result<HourlyForecastResponse, UpstreamError> {
        let url = Url::parse(url).map_err(|e| UpstreamError::InvalidRequest(UPSTREAM, e.to_string()))?;
        self.get_json(url).await
    }

    #[instrument(level = "debug", skip(self), err)]
    pub async fn active_alerts_for_point(
        &self, lat: f64, lon: f64,
    ) -> Result<AlertsResponse, UpstreamError> {
        let mut url = self
            .base_url
            .join("alerts/active")
            .map_err(|e| UpstreamError::InvalidRequest(UPSTREAM, e.to_string()))?;
        url.query_pairs_mut().append_pair("point", &format!("{lat},{lon}"));
        self.get_json(url).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, UpstreamError> {
        let response = self
            .fabric
            .call(|| {
                self.http
                    .get(url.clone())
                    .header(reqwest::header::USER_AGENT, self.user_agent.clone())
                    .header(ACCEPT, "application/geo+json")
                    .send()
            })
            .await?;

        response
            .json::<T>()
            .await
            .map_err(|e| UpstreamError::Parse(UPSTREAM, Box::new(e)))
    }
}

impl std::fmt::Debug for NwsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NwsClient").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}
