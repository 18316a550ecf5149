use serde::{Deserialize, Serialize};

/// A single article as delivered by the news API.
///
/// Every field is optional on the wire; a record with holes is still a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
  #[serde(default)]
  pub title: Option<String>,
  #[serde(default)]
  pub content: Option<String>,
  #[serde(default)]
  pub author: Option<String>,
  /// "YYYY-MM-DD[ HH:MM[:SS]]"
  #[serde(default)]
  pub date_time: Option<String>,
  #[serde(default)]
  pub source_url: Option<String>,
  #[serde(default)]
  pub source: Option<String>,

  // Social stats
  #[serde(default)]
  pub followers: Option<u64>,
  #[serde(default)]
  pub likes: Option<u64>,
  #[serde(default)]
  pub retweets: Option<u64>,

  // Funding fields
  #[serde(default)]
  pub company: Option<String>,
  #[serde(default)]
  pub funding_round: Option<String>,
  #[serde(default)]
  pub funding_amount: Option<String>,
  #[serde(default)]
  pub investors: Option<String>,
}

impl Article {
  /// Stable identity from origin feed and link.
  ///
  /// Records without a link fall back to their timestamp and title.
  pub fn identity(&self) -> String {
    let source = self.source.as_deref().unwrap_or("");
    match self.source_url.as_deref() {
      Some(url) => format!("{}|{}", source, url),
      None => format!(
        "{}|{}|{}",
        source,
        self.date_time.as_deref().unwrap_or(""),
        self.title.as_deref().unwrap_or("")
      ),
    }
  }

  /// Whether any funding detail is present
  pub fn has_funding(&self) -> bool {
    self.company.is_some()
      || self.funding_round.is_some()
      || self.funding_amount.is_some()
      || self.investors.is_some()
  }
}

/// Inclusive date window reported by the API for date-paged queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
  pub start: String,
  pub end: String,
}

/// One page of articles plus its pagination metadata. This is what gets cached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticlePage {
  pub articles: Vec<Article>,
  /// Total matching articles (within the date range when date paging is in use)
  pub total: u64,
  pub total_date_pages: Option<u32>,
  pub date_range: Option<DateRange>,
}

impl ArticlePage {
  /// Newest calendar date among the articles or the reported range, if any.
  pub fn newest_date(&self) -> Option<chrono::NaiveDate> {
    let from_articles = self
      .articles
      .iter()
      .filter_map(|a| a.date_time.as_deref())
      .filter_map(parse_date_prefix)
      .max();

    let from_range = self
      .date_range
      .as_ref()
      .and_then(|r| parse_date_prefix(&r.end));

    from_articles.max(from_range)
  }
}

/// Article count for one origin feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCount {
  pub name: String,
  pub count: u64,
}

/// Parse the leading "YYYY-MM-DD" of a timestamp.
pub fn parse_date_prefix(s: &str) -> Option<chrono::NaiveDate> {
  let prefix = s.get(..10)?;
  chrono::NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_identity_uses_source_and_url() {
    let article = Article {
      source: Some("x.com".into()),
      source_url: Some("https://x.com/a/status/1".into()),
      title: Some("first".into()),
      ..Default::default()
    };
    let retitled = Article {
      title: Some("edited".into()),
      ..article.clone()
    };
    assert_eq!(article.identity(), "x.com|https://x.com/a/status/1");
    assert_eq!(article.identity(), retitled.identity());
  }

  #[test]
  fn test_identity_without_url() {
    let article = Article {
      source: Some("hotnews".into()),
      date_time: Some("2025-03-01 08:00".into()),
      title: Some("Morning brief".into()),
      ..Default::default()
    };
    assert_eq!(article.identity(), "hotnews|2025-03-01 08:00|Morning brief");
    assert_ne!(Article::default().identity(), article.identity());
  }

  #[test]
  fn test_decode_tolerates_missing_fields() {
    let article: Article = serde_json::from_str(r#"{"title": "only a title"}"#).unwrap();
    assert_eq!(article.title.as_deref(), Some("only a title"));
    assert!(article.date_time.is_none());
    assert!(!article.has_funding());
  }

  #[test]
  fn test_newest_date_prefers_latest_of_articles_and_range() {
    let page = ArticlePage {
      articles: vec![
        Article {
          date_time: Some("2025-03-02 10:00".into()),
          ..Default::default()
        },
        Article {
          date_time: Some("garbage".into()),
          ..Default::default()
        },
      ],
      total: 2,
      total_date_pages: Some(1),
      date_range: Some(DateRange {
        start: "2025-03-01".into(),
        end: "2025-03-04".into(),
      }),
    };
    assert_eq!(
      page.newest_date(),
      chrono::NaiveDate::from_ymd_opt(2025, 3, 4)
    );
  }

  #[test]
  fn test_parse_date_prefix() {
    assert_eq!(
      parse_date_prefix("2025-04-01 08:30:00"),
      chrono::NaiveDate::from_ymd_opt(2025, 4, 1)
    );
    assert_eq!(parse_date_prefix("2025-04"), None);
    assert_eq!(parse_date_prefix("not a date"), None);
  }
}
