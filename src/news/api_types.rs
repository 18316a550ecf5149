//! Serde-deserializable types matching news API responses.
//!
//! These types are separate from domain types to allow lenient decoding of the
//! envelope while keeping domain types focused on application needs.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::types::{Article, ArticlePage, DateRange, SourceCount};
use crate::error::FetchError;

const STATUS_SUCCESS: &str = "success";

// ============================================================================
// Envelope shared by every endpoint
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiEnvelope {
  #[serde(default)]
  pub status: String,
  #[serde(default)]
  pub message: Option<String>,
  #[serde(default)]
  pub error: Option<String>,
  #[serde(default)]
  pub data: Option<Value>,
  #[serde(default)]
  pub total: Option<u64>,
  #[serde(default)]
  pub total_in_date_range: Option<u64>,
  #[serde(default)]
  pub total_date_pages: Option<u32>,
  #[serde(default)]
  pub date_range: Option<ApiDateRange>,
}

#[derive(Debug, Deserialize)]
pub struct ApiDateRange {
  pub start: Option<String>,
  pub end: Option<String>,
}

impl ApiEnvelope {
  /// Fail with the application-level message unless the status is success.
  pub fn into_success(self) -> Result<Self, FetchError> {
    if self.status == STATUS_SUCCESS {
      Ok(self)
    } else {
      let message = self
        .message
        .or(self.error)
        .unwrap_or_else(|| format!("API returned status '{}'", self.status));
      Err(FetchError::Api(message))
    }
  }

  /// Convert an `/api/articles` response into a page.
  pub fn into_page(self) -> ArticlePage {
    let total = self
      .total_in_date_range
      .or(self.total)
      .unwrap_or_default();
    let date_range = self.date_range.and_then(|r| match (r.start, r.end) {
      (Some(start), Some(end)) => Some(DateRange { start, end }),
      _ => None,
    });
    let articles = decode_articles(self.data);
    let total = total.max(articles.len() as u64);

    ArticlePage {
      articles,
      total,
      total_date_pages: self.total_date_pages,
      date_range,
    }
  }

  /// Convert an `/api/search` response into its articles.
  pub fn into_articles(self) -> Vec<Article> {
    decode_articles(self.data)
  }

  /// Convert an `/api/sources` response into source counts.
  pub fn into_sources(self) -> Vec<SourceCount> {
    match self.data {
      Some(Value::Array(items)) => items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect(),
      _ => Vec::new(),
    }
  }
}

// ============================================================================
// Record decoding
// ============================================================================

/// Decode the `data` array record by record.
///
/// A record that does not match the typed shape is salvaged field by field
/// instead of failing the whole page.
fn decode_articles(data: Option<Value>) -> Vec<Article> {
  match data {
    Some(Value::Array(items)) => items.into_iter().map(decode_article).collect(),
    _ => Vec::new(),
  }
}

fn decode_article(value: Value) -> Article {
  match serde_json::from_value::<Article>(value.clone()) {
    Ok(article) => article,
    Err(e) => {
      debug!(error = %e, "salvaging malformed article record");
      salvage_article(&value)
    }
  }
}

fn salvage_article(value: &Value) -> Article {
  let text = |key: &str| -> Option<String> {
    match value.get(key)? {
      Value::String(s) => Some(s.clone()),
      Value::Null => None,
      other => Some(other.to_string()),
    }
  };
  let count = |key: &str| -> Option<u64> {
    match value.get(key)? {
      Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
      Value::String(s) => s.trim().parse().ok(),
      _ => None,
    }
  };

  Article {
    title: text("title"),
    content: text("content"),
    author: text("author"),
    date_time: text("date_time"),
    source_url: text("source_url"),
    source: text("source"),
    followers: count("followers"),
    likes: count("likes"),
    retweets: count("retweets"),
    company: text("company"),
    funding_round: text("funding_round"),
    funding_amount: text("funding_amount"),
    investors: text("investors"),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn envelope(json: &str) -> ApiEnvelope {
    serde_json::from_str(json).unwrap()
  }

  #[test]
  fn test_error_status_carries_message() {
    let err = envelope(r#"{"status": "error", "message": "db down"}"#)
      .into_success()
      .unwrap_err();
    assert!(matches!(err, FetchError::Api(m) if m == "db down"));
  }

  #[test]
  fn test_error_status_without_message() {
    let err = envelope(r#"{"status": "failed"}"#)
      .into_success()
      .unwrap_err();
    assert!(matches!(err, FetchError::Api(m) if m.contains("failed")));
  }

  #[test]
  fn test_page_prefers_total_in_date_range() {
    let page = envelope(
      r#"{
        "status": "success",
        "total": 120,
        "total_in_date_range": 14,
        "total_date_pages": 6,
        "date_range": {"start": "2025-03-01", "end": "2025-03-07"},
        "data": [{"title": "a"}, {"title": "b"}]
      }"#,
    )
    .into_success()
    .unwrap()
    .into_page();

    assert_eq!(page.total, 14);
    assert_eq!(page.total_date_pages, Some(6));
    assert_eq!(page.articles.len(), 2);
    assert_eq!(page.date_range.unwrap().end, "2025-03-07");
  }

  #[test]
  fn test_malformed_record_is_salvaged_not_dropped() {
    let page = envelope(
      r#"{
        "status": "success",
        "total": 2,
        "data": [
          {"title": "ok", "likes": 3},
          {"title": 42, "likes": "17", "date_time": null}
        ]
      }"#,
    )
    .into_page();

    assert_eq!(page.articles.len(), 2);
    assert_eq!(page.articles[1].title.as_deref(), Some("42"));
    assert_eq!(page.articles[1].likes, Some(17));
    assert!(page.articles[1].date_time.is_none());
  }

  #[test]
  fn test_partial_date_range_is_ignored() {
    let page = envelope(r#"{"status": "success", "date_range": {"start": "2025-03-01"}}"#).into_page();
    assert!(page.date_range.is_none());
    assert!(page.articles.is_empty());
  }

  #[test]
  fn test_sources_decode() {
    let sources = envelope(
      r#"{"status": "success", "data": [{"name": "x.com", "count": 40}, {"bogus": true}]}"#,
    )
    .into_sources();
    assert_eq!(
      sources,
      vec![SourceCount {
        name: "x.com".into(),
        count: 40
      }]
    );
  }
}
