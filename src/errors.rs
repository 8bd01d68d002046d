//! Error taxonomy shared across the platform: fabric failures, ingest
//! failures, and the API-facing envelope. See spec §7.

use thiserror::Error;

pub type BoxDynError = Box<dyn std::error::Error + 'static + Send + Sync>;

/// Kinds of failure an outbound call to NWS/NOAA can produce. The fabric
/// (rate limiter + breaker + retry) decides which of these a given attempt
/// resolves to; callers pattern-match on it rather than inspecting status
/// codes directly.
#[derive(Debug, Error, ToSchema)]
pub enum UpstreamError {
    #[error("{upstream} request timed out or failed transport: {source}")]
    Transient { upstream: &'static str, #[source] source: BoxDynError },

    #[error("{upstream} responded with retryable status {status}")]
    TransientStatus { upstream: &'static str, status: u16 },

    #[error("{upstream} responded with non-retryable status {status}: {body}")]
    Permanent { upstream: &'static str, status: u16, body: String },

    #[error("{upstream} circuit breaker is open")]
    BreakerOpen { upstream: &'static str },

    #[error("{upstream} retries exhausted after {attempts} attempts")]
    RetriesExhausted { upstream: &'static str, attempts: u32 },

    #[error("failed to parse {upstream} response: {0}")]
    Parse(&'static str, #[source] BoxDynError),

    #[error("invalid request to {upstream}: {0}")]
    InvalidRequest(&'static str, String),
}

impl UpstreamError {
    pub fn upstream(&self) -> &'static str {
        match self {
            Self::Transient { upstream, .. }
            | Self::TransientStatus { upstream, .. }
            | Self::Permanent { upstream, .. }
            | Self::BreakerOpen { upstream }
            | Self::RetriesExhausted { upstream, .. } => upstream,
            Self::Parse(upstream, _) | Self::InvalidRequest(upstream, _) => upstream,
        }
    }

    pub fn is_breaker_open(&self) -> bool {
        matches!(self, Self::BreakerOpen { .. })
    }
}

/// Failures raised while running a scheduled ingest job. A single-item
/// failure is recorded against the current run and does not abort it; only
/// [`IngestError::Fatal`] aborts the whole run (spec §7 propagation policy).
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("upstream call failed: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("{0}")]
    Validation(String),

    #[error("fatal ingest failure, aborting run: {0}")]
    Fatal(String),
}

/// The stable, client-facing error kinds from spec §7. Each carries a
/// stable `token` string used for branching by API consumers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{upstream} is unavailable: {source}")]
    UpstreamUnavailable { upstream: &'static str, #[source] source: UpstreamError },

    #[error("storage failure")]
    Storage(#[source] sqlx::Error),

    #[error("unexpected failure: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl ApiError {
    /// Stable token used by clients for branching, per spec §7.
    pub fn token(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::NotFound(_) => "not_found",
            Self::UpstreamUnavailable { upstream, .. } if *upstream == "NWS" => "nws_unavailable",
            Self::UpstreamUnavailable { upstream, .. } if *upstream == "NOAA" => "noaa_unavailable",
            Self::UpstreamUnavailable { .. } => "upstream_unavailable",
            Self::Storage(_) => "storage_failure",
            Self::Unexpected(_) => "unexpected_failure",
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::UpstreamUnavailable { .. } => 503,
            Self::Storage(_) => 500,
            Self::Unexpected(_) => 500,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(source: sqlx::Error) -> Self {
        Self::Storage(source)
    }
}

impl From<UpstreamError> for ApiError {
    fn from(source: UpstreamError) -> Self {
        let upstream = source.upstream();
        Self::UpstreamUnavailable { upstream, source }
    }
}
