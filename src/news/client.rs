use chrono::Utc;
use color_eyre::{eyre::eyre, Result};
use reqwest::Url;
use std::time::Duration;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::FetchError;
use crate::news::api_types::ApiEnvelope;
use crate::news::types::{Article, ArticlePage, SourceCount};

/// News API client wrapper
#[derive(Clone)]
pub struct NewsClient {
  http: reqwest::Client,
  base: Url,
}

impl NewsClient {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let mut base = Url::parse(&config.base_url)
      .map_err(|e| eyre!("Invalid API URL {}: {}", config.base_url, e))?;
    // Url::join replaces the last segment unless the path ends with '/'
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }

    let mut builder = reqwest::Client::builder().user_agent(concat!(
      env!("CARGO_PKG_NAME"),
      "/",
      env!("CARGO_PKG_VERSION")
    ));
    if let Some(secs) = config.timeout_secs {
      builder = builder.timeout(Duration::from_secs(secs));
    }
    let http = builder
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, base })
  }

  /// Get one page of articles for a source
  pub async fn get_articles(
    &self,
    source: &str,
    page: u32,
    per_page: u32,
    date_page: Option<u32>,
  ) -> Result<ArticlePage, FetchError> {
    let mut url = self.base.join("api/articles")?;
    {
      let mut query = url.query_pairs_mut();
      query
        .append_pair("source", source)
        .append_pair("page", &page.to_string())
        .append_pair("per_page", &per_page.to_string());
      if let Some(date_page) = date_page {
        query.append_pair("date_page", &date_page.to_string());
      }
      // Cache buster for intermediaries
      query.append_pair("_t", &Utc::now().timestamp_millis().to_string());
    }

    Ok(self.get_envelope(url).await?.into_page())
  }

  /// Full-text search across all sources
  pub async fn search(&self, text: &str) -> Result<Vec<Article>, FetchError> {
    let mut url = self.base.join("api/search")?;
    url.query_pairs_mut().append_pair("q", text);

    Ok(self.get_envelope(url).await?.into_articles())
  }

  /// Article counts per origin feed
  pub async fn get_sources(&self) -> Result<Vec<SourceCount>, FetchError> {
    let url = self.base.join("api/sources")?;

    Ok(self.get_envelope(url).await?.into_sources())
  }

  async fn get_envelope(&self, url: Url) -> Result<ApiEnvelope, FetchError> {
    debug!(%url, "GET");
    let response = self.http.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
      return Err(FetchError::HttpStatus(status));
    }

    let body = response.text().await?;
    let envelope: ApiEnvelope = serde_json::from_str(&body)?;
    envelope.into_success()
  }

  pub fn base_url(&self) -> &Url {
    &self.base
  }
}
