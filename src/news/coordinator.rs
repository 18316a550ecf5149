//! Fetch coordinator: the news client with transparent caching.

use chrono::Local;
use color_eyre::Result;
use tracing::{info, warn};

use crate::cache::{self, CacheLayer, CacheResult, CacheStore, Cacheable, RetryPolicy, TtlInput, TtlPolicy};
use crate::config::{Config, SourceProfile};
use crate::error::{FetchError, LoadError};

use super::cache::page_fingerprint;
use super::client::NewsClient;
use super::types::{Article, ArticlePage, SourceCount};

/// Outcome of a bounded prefetch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarmSummary {
  pub pages: u32,
  pub articles: usize,
}

/// News client with transparent caching support.
///
/// This wraps the underlying NewsClient, serving pages from the cache when
/// fresh and falling back to stale cache when the network fails.
#[derive(Clone)]
pub struct FetchCoordinator {
  inner: NewsClient,
  cache: CacheLayer,
  ttl: TtlPolicy,
}

impl FetchCoordinator {
  /// Create a coordinator from configuration, opening the configured cache.
  pub fn new(config: &Config) -> Result<Self> {
    let inner = NewsClient::new(&config.api)?;
    let store = cache::open_store(&config.cache)?;
    let retry = RetryPolicy {
      max_retries: config.fetch.max_retries,
      backoff: config.fetch.retry_backoff(),
    };

    Ok(Self::from_parts(inner, store, retry, TtlPolicy::from(&config.cache.ttl)))
  }

  pub fn from_parts(inner: NewsClient, store: CacheStore, retry: RetryPolicy, ttl: TtlPolicy) -> Self {
    Self {
      inner,
      cache: CacheLayer::new(store).with_retry(retry),
      ttl,
    }
  }

  pub fn store(&self) -> &CacheStore {
    self.cache.store()
  }

  /// Load one page of a source tab.
  ///
  /// `force` skips the fresh-cache shortcut (manual refresh, date navigation).
  pub async fn load(
    &self,
    profile: &SourceProfile,
    page: u32,
    date_page: u32,
    force: bool,
  ) -> Result<CacheResult<ArticlePage>, LoadError> {
    let fingerprint = page_fingerprint(profile, page, date_page);
    let ttl = self.ttl.clone();
    let today = Local::now().date_naive();

    self
      .cache
      .load(
        &fingerprint,
        force,
        |data: &ArticlePage| {
          ttl.ttl_for(&TtlInput {
            page: fingerprint.page,
            date_page: fingerprint.date_page,
            content_date: data.content_date(),
            today,
          })
        },
        || {
          let inner = self.inner.clone();
          let source = fingerprint.source.clone();
          let (page, per_page, date_page) = (fingerprint.page, profile.per_page, fingerprint.date_page);
          async move { inner.get_articles(&source, page, per_page, date_page).await }
        },
      )
      .await
  }

  /// Search across sources (not cached - results depend on free text).
  pub async fn search(&self, text: &str) -> Result<Vec<Article>, FetchError> {
    let results = self.inner.search(text).await?;
    info!(query = text, hits = results.len(), "search finished");
    Ok(results)
  }

  /// Source counts (not cached - cheap and used for diagnostics).
  pub async fn sources(&self) -> Result<Vec<SourceCount>, FetchError> {
    self.inner.get_sources().await
  }

  /// Prefetch up to `max_pages` pages of a source into the cache.
  ///
  /// Stops at the last page the API reports or at the first failure.
  pub async fn warm(&self, profile: &SourceProfile, max_pages: u32) -> WarmSummary {
    let mut summary = WarmSummary::default();
    let mut page = 1;

    while page <= max_pages {
      match self.load(profile, page, 1, false).await {
        Ok(result) => {
          summary.pages += 1;
          summary.articles += result.data.articles.len();

          let last_page = crate::view_model::total_pages(result.data.total, profile.per_page);
          if page >= last_page {
            break;
          }
        }
        Err(e) => {
          warn!(source = %profile.key, page, error = %e, "prefetch stopped");
          break;
        }
      }
      page += 1;
    }

    info!(source = %profile.key, pages = summary.pages, articles = summary.articles, "prefetch finished");
    summary
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheEntry, CacheSource, MemoryStorage};
  use crate::config::ApiConfig;
  use chrono::Utc;
  use serde_json::json;
  use wiremock::matchers::{method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn coordinator(server: &MockServer) -> FetchCoordinator {
    let client = NewsClient::new(&ApiConfig {
      base_url: server.uri(),
      timeout_secs: Some(5),
    })
    .unwrap();
    FetchCoordinator::from_parts(
      client,
      CacheStore::new(MemoryStorage::new(), u64::MAX),
      RetryPolicy::default(),
      TtlPolicy::default(),
    )
  }

  fn x_profile() -> SourceProfile {
    SourceProfile::defaults().remove(0)
  }

  fn briefing_profile() -> SourceProfile {
    SourceProfile::defaults().remove(2)
  }

  fn success(data: serde_json::Value, extra: serde_json::Value) -> ResponseTemplate {
    let mut envelope = json!({ "status": "success", "data": data });
    if let (Some(target), serde_json::Value::Object(fields)) = (envelope.as_object_mut(), extra) {
      target.extend(fields);
    }
    ResponseTemplate::new(200).set_body_json(envelope)
  }

  fn page_body(titles: &[&str], total: u64) -> ResponseTemplate {
    let data: Vec<_> = titles
      .iter()
      .map(|t| json!({"title": t, "date_time": "2025-03-01 10:00", "source": "x.com"}))
      .collect();
    success(json!(data), json!({ "total": total }))
  }

  /// Serve every article request with `response`, expecting exactly `calls` of them.
  async fn articles(server: &MockServer, response: ResponseTemplate, calls: u64) {
    Mock::given(method("GET"))
      .and(path("/api/articles"))
      .respond_with(response)
      .expect(calls)
      .mount(server)
      .await;
  }

  async fn queries(server: &MockServer) -> Vec<String> {
    server
      .received_requests()
      .await
      .unwrap()
      .iter()
      .map(|r| r.url.query().unwrap_or("").to_string())
      .collect()
  }

  fn seed_expired(coordinator: &FetchCoordinator, profile: &SourceProfile, titles: &[&str]) {
    let fp = page_fingerprint(profile, 1, 1);
    let page = ArticlePage {
      articles: titles
        .iter()
        .map(|t| Article {
          title: Some(t.to_string()),
          ..Default::default()
        })
        .collect(),
      total: titles.len() as u64,
      ..Default::default()
    };
    let mut entry = CacheEntry::new(&fp, &page, chrono::Duration::minutes(15)).unwrap();
    entry.created_at = Utc::now() - chrono::Duration::hours(1);
    coordinator.store().put(&fp, &entry);
  }

  #[tokio::test]
  async fn test_second_load_is_served_from_cache() {
    let server = MockServer::start().await;
    articles(&server, page_body(&["a", "b"], 2), 1).await;
    let coordinator = coordinator(&server);
    let profile = x_profile();

    let first = coordinator.load(&profile, 1, 1, false).await.unwrap();
    let second = coordinator.load(&profile, 1, 1, false).await.unwrap();

    assert_eq!(first.source, CacheSource::Network);
    assert_eq!(second.source, CacheSource::CacheFresh);
    assert_eq!(second.data, first.data);
    server.verify().await;
  }

  #[tokio::test]
  async fn test_force_refetches_despite_fresh_cache() {
    let server = MockServer::start().await;
    articles(&server, page_body(&["a"], 1), 2).await;
    let coordinator = coordinator(&server);
    let profile = x_profile();

    coordinator.load(&profile, 1, 1, false).await.unwrap();
    let forced = coordinator.load(&profile, 1, 1, true).await.unwrap();

    assert_eq!(forced.source, CacheSource::Network);
    server.verify().await;
  }

  #[tokio::test]
  async fn test_failed_fetches_fall_back_to_stale_cache() {
    let server = MockServer::start().await;
    articles(&server, ResponseTemplate::new(500), 3).await;
    let coordinator = coordinator(&server);
    let profile = x_profile();
    seed_expired(&coordinator, &profile, &["old news"]);

    let result = coordinator.load(&profile, 1, 1, false).await.unwrap();

    assert!(result.is_stale());
    assert_eq!(result.data.articles[0].title.as_deref(), Some("old news"));
    assert!(result.warning.unwrap().contains("Showing cached data from"));
    server.verify().await;
  }

  #[tokio::test]
  async fn test_failed_fetches_without_cache_are_an_error() {
    let server = MockServer::start().await;
    articles(&server, ResponseTemplate::new(502), 3).await;
    let coordinator = coordinator(&server);

    let err = coordinator.load(&x_profile(), 2, 1, false).await.unwrap_err();

    assert_eq!(err.attempts, 3);
    assert!(matches!(err.source, FetchError::HttpStatus(_)));
    assert_eq!(err.what, "v2|x|x.com|p2");
    server.verify().await;
  }

  #[tokio::test]
  async fn test_error_envelope_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/articles"))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(json!({"status": "error", "message": "warming up"})),
      )
      .up_to_n_times(2)
      .expect(2)
      .mount(&server)
      .await;
    articles(&server, page_body(&["finally"], 1), 1).await;
    let coordinator = coordinator(&server);

    let result = coordinator.load(&x_profile(), 1, 1, false).await.unwrap();

    assert_eq!(result.source, CacheSource::Network);
    assert_eq!(result.data.articles[0].title.as_deref(), Some("finally"));
    server.verify().await;
  }

  #[tokio::test]
  async fn test_date_paged_source_keys_cache_by_date_page() {
    let server = MockServer::start().await;
    articles(&server, page_body(&["brief"], 1), 2).await;
    let coordinator = coordinator(&server);
    let profile = briefing_profile();

    coordinator.load(&profile, 1, 1, false).await.unwrap();
    coordinator.load(&profile, 1, 2, false).await.unwrap();
    coordinator.load(&profile, 1, 2, false).await.unwrap();

    let queries = queries(&server).await;
    assert_eq!(queries.len(), 2);
    assert!(queries[0].contains("date_page=1"));
    assert!(queries[1].contains("date_page=2"));
  }

  #[tokio::test]
  async fn test_date_page_ignored_for_plain_sources() {
    let server = MockServer::start().await;
    articles(&server, page_body(&["a"], 1), 1).await;
    let coordinator = coordinator(&server);
    let profile = x_profile();

    coordinator.load(&profile, 1, 1, false).await.unwrap();
    coordinator.load(&profile, 1, 4, false).await.unwrap();

    assert!(!queries(&server).await[0].contains("date_page"));
    server.verify().await;
  }

  #[tokio::test]
  async fn test_warm_stops_at_last_page() {
    let server = MockServer::start().await;
    articles(&server, page_body(&["a", "b", "c"], 15), 2).await;
    let coordinator = coordinator(&server);
    let profile = x_profile();

    let summary = coordinator.warm(&profile, 5).await;

    assert_eq!(summary, WarmSummary { pages: 2, articles: 6 });
    let cached = coordinator.load(&profile, 2, 1, false).await.unwrap();
    assert_eq!(cached.source, CacheSource::CacheFresh);
    server.verify().await;
  }

  #[tokio::test]
  async fn test_warm_stops_at_first_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/articles"))
      .and(query_param("page", "2"))
      .respond_with(ResponseTemplate::new(500))
      .expect(3)
      .mount(&server)
      .await;
    articles(&server, page_body(&["a"], 100), 1).await;
    let coordinator = coordinator(&server);

    let summary = coordinator.warm(&x_profile(), 4).await;

    assert_eq!(summary.pages, 1);
    assert!(queries(&server).await.iter().all(|q| !q.contains("page=3&")));
    server.verify().await;
  }

  #[tokio::test]
  async fn test_warm_of_cached_pages_makes_no_requests() {
    let server = MockServer::start().await;
    articles(&server, page_body(&["a", "b", "c"], 15), 2).await;
    let coordinator = coordinator(&server);
    let profile = x_profile();
    coordinator.warm(&profile, 5).await;
    server.verify().await;
    server.reset().await;

    articles(&server, page_body(&["a"], 15), 0).await;
    let summary = coordinator.warm(&profile, 5).await;

    assert_eq!(summary.pages, 2);
    server.verify().await;
  }

  #[tokio::test]
  async fn test_search_and_sources_bypass_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/sources"))
      .respond_with(success(json!([{"name": "x.com", "count": 12}]), json!({})))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/api/search"))
      .respond_with(success(json!([{"title": "match"}]), json!({})))
      .expect(2)
      .mount(&server)
      .await;
    let coordinator = coordinator(&server);

    coordinator.search("chips").await.unwrap();
    let hits = coordinator.search("chips").await.unwrap();
    let sources = coordinator.sources().await.unwrap();

    assert_eq!(hits[0].title.as_deref(), Some("match"));
    assert_eq!(sources[0].count, 12);
    assert!(coordinator.store().get(&page_fingerprint(&x_profile(), 1, 1)).is_none());
    server.verify().await;
  }
}
