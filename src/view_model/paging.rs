//! Page arithmetic for result pages and date pages.

use crate::news::DateRange;

/// Number of result pages; zero when there is nothing to show.
pub fn total_pages(total: u64, per_page: u32) -> u32 {
  if total == 0 || per_page == 0 {
    return 0;
  }
  total.div_ceil(per_page as u64).min(u32::MAX as u64) as u32
}

/// One window of date keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePageSlice<T> {
  pub items: Vec<T>,
  /// Page actually shown, after clamping
  pub page: usize,
  pub total_pages: usize,
}

/// Slice `keys` into windows of `page_size` and return window `page_index` (1-based).
///
/// Out-of-range page indexes are clamped to `[1, total_pages]`.
pub fn paginate_date_keys<T: Clone>(keys: &[T], page_index: usize, page_size: usize) -> DatePageSlice<T> {
  let page_size = page_size.max(1);
  let total_pages = keys.len().div_ceil(page_size).max(1);
  let page = page_index.clamp(1, total_pages);

  let start = (page - 1) * page_size;
  let end = (start + page_size).min(keys.len());
  let items = keys.get(start..end).map(<[T]>::to_vec).unwrap_or_default();

  DatePageSlice {
    items,
    page,
    total_pages,
  }
}

/// Navigation target in a pager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKind {
  First,
  Prev,
  Next,
  Last,
}

/// One element of the numbered pager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageButton {
  Nav {
    kind: NavKind,
    target: u32,
    enabled: bool,
  },
  Page {
    page: u32,
    current: bool,
  },
  Ellipsis,
}

/// Pager for `current` of `total` pages showing at most `max_visible` numbers.
///
/// The numbers are centred on the current page; the first and last page stay
/// reachable through their own buttons with an ellipsis over any gap. A single
/// page needs no pager.
pub fn page_window(current: u32, total: u32, max_visible: u32) -> Vec<PageButton> {
  if total <= 1 {
    return Vec::new();
  }

  let max_visible = max_visible.max(1);
  let current = current.clamp(1, total);

  let mut start = current.saturating_sub(max_visible / 2).max(1);
  let end = (start + max_visible - 1).min(total);
  if end - start + 1 < max_visible {
    start = (end + 1).saturating_sub(max_visible).max(1);
  }

  let mut buttons = vec![
    PageButton::Nav {
      kind: NavKind::First,
      target: 1,
      enabled: current > 1,
    },
    PageButton::Nav {
      kind: NavKind::Prev,
      target: current.saturating_sub(1).max(1),
      enabled: current > 1,
    },
  ];

  if start > 1 {
    buttons.push(PageButton::Page {
      page: 1,
      current: false,
    });
    if start > 2 {
      buttons.push(PageButton::Ellipsis);
    }
  }

  for page in start..=end {
    buttons.push(PageButton::Page {
      page,
      current: page == current,
    });
  }

  if end < total {
    if end < total - 1 {
      buttons.push(PageButton::Ellipsis);
    }
    buttons.push(PageButton::Page {
      page: total,
      current: false,
    });
  }

  buttons.push(PageButton::Nav {
    kind: NavKind::Next,
    target: (current + 1).min(total),
    enabled: current < total,
  });
  buttons.push(PageButton::Nav {
    kind: NavKind::Last,
    target: total,
    enabled: current < total,
  });

  buttons
}

/// Caption for the date-page axis.
pub fn date_info(range: Option<&DateRange>, date_page: u32, total_date_pages: Option<u32>) -> String {
  let total = total_date_pages
    .map(|t| t.to_string())
    .unwrap_or_else(|| "?".to_string());
  match range {
    Some(r) => format!("{} ~ {} (date page {}/{})", r.start, r.end, date_page, total),
    None => format!("Date range not available (date page {}/{})", date_page, total),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn numbers(buttons: &[PageButton]) -> Vec<String> {
    buttons
      .iter()
      .filter_map(|b| match b {
        PageButton::Page { page, current: true } => Some(format!("[{}]", page)),
        PageButton::Page { page, .. } => Some(page.to_string()),
        PageButton::Ellipsis => Some("...".to_string()),
        PageButton::Nav { .. } => None,
      })
      .collect()
  }

  #[test]
  fn test_total_pages() {
    assert_eq!(total_pages(0, 9), 0);
    assert_eq!(total_pages(9, 9), 1);
    assert_eq!(total_pages(10, 9), 2);
    assert_eq!(total_pages(5, 0), 0);
  }

  #[test]
  fn test_paginate_two_per_page() {
    let keys = vec!["d5", "d4", "d3", "d2", "d1"];
    let slice = paginate_date_keys(&keys, 2, 2);
    assert_eq!(slice.items, vec!["d3", "d2"]);
    assert_eq!(slice.total_pages, 3);

    let last = paginate_date_keys(&keys, 3, 2);
    assert_eq!(last.items, vec!["d1"]);
  }

  #[test]
  fn test_paginate_clamps_out_of_range() {
    let keys = vec!["a", "b", "c", "d"];
    let high = paginate_date_keys(&keys, 99, 3);
    assert_eq!(high.page, 2);
    assert_eq!(high.items, vec!["d"]);

    let low = paginate_date_keys(&keys, 0, 3);
    assert_eq!(low.page, 1);
    assert_eq!(low.items, vec!["a", "b", "c"]);
  }

  #[test]
  fn test_paginate_empty() {
    let keys: Vec<&str> = Vec::new();
    let slice = paginate_date_keys(&keys, 4, 2);
    assert_eq!(slice.page, 1);
    assert_eq!(slice.total_pages, 1);
    assert!(slice.items.is_empty());
  }

  #[test]
  fn test_window_hidden_for_single_page() {
    assert!(page_window(1, 1, 5).is_empty());
    assert!(page_window(1, 0, 5).is_empty());
  }

  #[test]
  fn test_window_small_total() {
    assert_eq!(numbers(&page_window(2, 3, 5)), vec!["1", "[2]", "3"]);
  }

  #[test]
  fn test_window_middle_has_both_ellipses() {
    assert_eq!(
      numbers(&page_window(10, 20, 5)),
      vec!["1", "...", "8", "9", "[10]", "11", "12", "...", "20"]
    );
  }

  #[test]
  fn test_window_near_end_shifts_left() {
    assert_eq!(
      numbers(&page_window(19, 20, 5)),
      vec!["1", "...", "16", "17", "18", "[19]", "20"]
    );
  }

  #[test]
  fn test_window_adjacent_first_page_has_no_ellipsis() {
    assert_eq!(
      numbers(&page_window(4, 10, 5)),
      vec!["1", "2", "3", "[4]", "5", "6", "...", "10"]
    );
  }

  #[test]
  fn test_window_nav_buttons() {
    let buttons = page_window(1, 4, 5);
    assert_eq!(
      buttons.first(),
      Some(&PageButton::Nav {
        kind: NavKind::First,
        target: 1,
        enabled: false
      })
    );
    assert_eq!(
      buttons.last(),
      Some(&PageButton::Nav {
        kind: NavKind::Last,
        target: 4,
        enabled: true
      })
    );
  }

  #[test]
  fn test_date_info() {
    let range = DateRange {
      start: "2025-03-01".into(),
      end: "2025-03-07".into(),
    };
    assert_eq!(
      date_info(Some(&range), 2, Some(5)),
      "2025-03-01 ~ 2025-03-07 (date page 2/5)"
    );
    assert_eq!(
      date_info(None, 1, None),
      "Date range not available (date page 1/?)"
    );
  }
}
