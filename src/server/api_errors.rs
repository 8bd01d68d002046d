pub use crate::errors::ApiError;

use thiserror::Error;

#[derive(Debug, Error, ToSchema)]
pub enum ApiBootstrapError {
    #[error("invalid HTTP header value: {0}")]
    InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("{0}")]
    ParseUrl(#[from] url::ParseError),

    #[error("{0}")]
    IO(#[from] std::io::Error),

    #[error("failed to connect to database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to construct upstream client: {0}")]
    Upstream(#[from] crate::errors::UpstreamError),
}

impl From<ApiBootstrapError> for ApiError {
    fn from(error: ApiBootstrapError) -> Self {
        Self::Unexpected(error.into())
    }
}
