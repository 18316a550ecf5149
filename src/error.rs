use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single request against the news API.
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("network error: {0}")]
  Transport(#[from] reqwest::Error),
  #[error("HTTP error: status {0}")]
  HttpStatus(StatusCode),
  #[error("API error: {0}")]
  Api(String),
  #[error("malformed response: {0}")]
  Decode(#[from] serde_json::Error),
  #[error("invalid request URL: {0}")]
  Url(#[from] url::ParseError),
}

impl FetchError {
  /// Whether another attempt could plausibly succeed.
  ///
  /// A bad URL never gets better on retry; everything else might.
  pub fn is_retryable(&self) -> bool {
    !matches!(self, FetchError::Url(_))
  }
}

/// A load that produced no data at all: every attempt failed and nothing was cached.
#[derive(Debug, Error)]
#[error("{what} unavailable after {attempts} attempt(s): {source}")]
pub struct LoadError {
  pub what: String,
  pub attempts: u32,
  #[source]
  pub source: FetchError,
}
