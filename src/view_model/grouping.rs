//! Grouping of articles by calendar date.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::news::Article;

/// Group key for records without a usable timestamp.
pub const UNKNOWN_DATE: &str = "unknown";

/// Group key of one record: the first 10 characters of its timestamp.
pub fn date_key(article: &Article) -> String {
  match article.date_time.as_deref().map(str::trim) {
    Some(ts) if !ts.is_empty() => ts.chars().take(10).collect(),
    _ => UNKNOWN_DATE.to_string(),
  }
}

/// Group records by date key. Records keep their input order within a group.
pub fn group_by_date(records: &[Article]) -> BTreeMap<String, Vec<&Article>> {
  let mut grouped: BTreeMap<String, Vec<&Article>> = BTreeMap::new();
  for article in records {
    grouped.entry(date_key(article)).or_default().push(article);
  }
  grouped
}

/// Date keys newest first, with the unknown group last.
pub fn sorted_date_keys<V>(grouped: &BTreeMap<String, V>) -> Vec<String> {
  let mut keys: Vec<String> = grouped.keys().cloned().collect();
  keys.sort_by(|a, b| compare_date_keys(a, b));
  keys
}

fn compare_date_keys(a: &str, b: &str) -> Ordering {
  match (a == UNKNOWN_DATE, b == UNKNOWN_DATE) {
    (true, true) => Ordering::Equal,
    (true, false) => Ordering::Greater,
    (false, true) => Ordering::Less,
    (false, false) => b.cmp(a),
  }
}

/// Records sharing one date key.
#[derive(Debug, Clone, PartialEq)]
pub struct DateGroup<'a> {
  pub key: String,
  pub articles: Vec<&'a Article>,
}

/// Groups in display order.
pub fn date_groups(records: &[Article]) -> Vec<DateGroup<'_>> {
  let mut grouped = group_by_date(records);
  sorted_date_keys(&grouped)
    .into_iter()
    .map(|key| {
      let articles = grouped.remove(&key).unwrap_or_default();
      DateGroup { key, articles }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn article(title: &str, date_time: Option<&str>) -> Article {
    Article {
      title: Some(title.to_string()),
      date_time: date_time.map(String::from),
      ..Default::default()
    }
  }

  #[test]
  fn test_nine_records_over_two_dates() {
    let records: Vec<Article> = (0..9)
      .map(|i| {
        let date = if i % 3 == 0 { "2025-03-02" } else { "2025-03-01" };
        article(&format!("a{}", i), Some(&format!("{} 0{}:00", date, i)))
      })
      .collect();

    let groups = date_groups(&records);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].key, "2025-03-02");
    assert_eq!(groups[1].key, "2025-03-01");
    assert_eq!(groups.iter().map(|g| g.articles.len()).sum::<usize>(), 9);
  }

  #[test]
  fn test_missing_timestamp_goes_to_unknown_once() {
    let records = vec![
      article("dated", Some("2025-03-01 10:00")),
      article("undated", None),
      article("blank", Some("  ")),
    ];

    let groups = date_groups(&records);
    assert_eq!(groups.last().unwrap().key, UNKNOWN_DATE);

    let undated: Vec<_> = groups
      .iter()
      .flat_map(|g| g.articles.iter())
      .filter(|a| a.title.as_deref() == Some("undated"))
      .collect();
    assert_eq!(undated.len(), 1);
    assert_eq!(groups.last().unwrap().articles.len(), 2);
  }

  #[test]
  fn test_flatten_is_a_permutation_preserving_group_order() {
    let records = vec![
      article("1", Some("2025-03-01 09:00")),
      article("2", Some("2025-03-03")),
      article("3", None),
      article("4", Some("2025-03-01 08:00")),
      article("5", Some("2025-03-03 23:59:59")),
    ];

    let groups = date_groups(&records);
    let flat: Vec<&str> = groups
      .iter()
      .flat_map(|g| g.articles.iter().map(|a| a.title.as_deref().unwrap()))
      .collect();

    assert_eq!(flat, vec!["2", "5", "1", "4", "3"]);

    let mut sorted = flat.clone();
    sorted.sort();
    assert_eq!(sorted, vec!["1", "2", "3", "4", "5"]);
  }

  #[test]
  fn test_short_timestamp_is_its_own_key() {
    assert_eq!(date_key(&article("x", Some("2025-03"))), "2025-03");
    assert_eq!(date_key(&article("x", Some("2025-03-01T10:00:00Z"))), "2025-03-01");
  }

  #[test]
  fn test_sorted_keys_descending_unknown_last() {
    let mut map = BTreeMap::new();
    map.insert(UNKNOWN_DATE.to_string(), ());
    map.insert("2024-12-31".to_string(), ());
    map.insert("2025-01-02".to_string(), ());
    assert_eq!(
      sorted_date_keys(&map),
      vec!["2025-01-02", "2024-12-31", UNKNOWN_DATE]
    );
  }
}
