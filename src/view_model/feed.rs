//! Assembles the renderable feed for one tab from a loaded page.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::config::SourceProfile;
use crate::news::{Article, ArticlePage, DateRange};

use super::disclosure::{split_initial_and_overflow, Disclosure};
use super::grouping::{date_groups, DateGroup, UNKNOWN_DATE};
use super::paging::{date_info, paginate_date_keys};

/// Group key used when a source is not grouped by date.
pub const ALL_GROUP: &str = "all";

/// One group of cards with its disclosure state applied.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupView<'a> {
  pub key: String,
  pub heading: String,
  pub visible: Vec<&'a Article>,
  pub hidden: Vec<&'a Article>,
  pub disclosure: Disclosure,
}

impl<'a> GroupView<'a> {
  /// Cards to draw for the current disclosure state.
  pub fn shown(&self) -> impl Iterator<Item = &'a Article> + '_ {
    let overflow: &[&'a Article] = if self.disclosure.is_expanded() {
      &self.hidden
    } else {
      &[]
    };
    self.visible.iter().chain(overflow.iter()).copied()
  }

  pub fn len(&self) -> usize {
    self.visible.len() + self.hidden.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Label of the disclosure control; `None` when there is no overflow.
  pub fn toggle_label(&self) -> Option<String> {
    if self.hidden.is_empty() {
      return None;
    }
    Some(match self.disclosure {
      Disclosure::Collapsed => format!("▼ Show more ({})", self.hidden.len()),
      Disclosure::Expanded => "▲ Collapse".to_string(),
    })
  }
}

/// Everything the feed view needs to draw one tab.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedView<'a> {
  pub groups: Vec<GroupView<'a>>,
  /// Date page shown, after clamping
  pub date_page: u32,
  pub total_date_pages: Option<u32>,
  /// Caption for the date pager; `None` for sources not grouped by date
  pub date_caption: Option<String>,
}

impl FeedView<'_> {
  pub fn is_empty(&self) -> bool {
    self.groups.iter().all(GroupView::is_empty)
  }

  pub fn group(&self, key: &str) -> Option<&GroupView<'_>> {
    self.groups.iter().find(|g| g.key == key)
  }

  /// Display position of the shown card with this `Article::identity`.
  pub fn position_of(&self, identity: &str) -> Option<usize> {
    self
      .groups
      .iter()
      .flat_map(|g| g.shown())
      .position(|a| a.identity() == identity)
  }
}

/// Build the feed for `page` under the source's rules.
///
/// Sources paged by date on the server show every group of the page and take
/// the date-page bounds from the API. Other date-grouped sources slice their
/// groups locally, `date_groups_per_page` at a time.
pub fn build_feed<'a>(
  profile: &SourceProfile,
  page: &'a ArticlePage,
  date_page: u32,
  disclosures: &HashMap<String, Disclosure>,
) -> FeedView<'a> {
  let to_view = |group: DateGroup<'a>, heading: String| {
    let (visible, hidden) = split_initial_and_overflow(&group.articles, profile.initial_visible);
    GroupView {
      disclosure: disclosures.get(&group.key).copied().unwrap_or_default(),
      visible: visible.to_vec(),
      hidden: hidden.to_vec(),
      heading,
      key: group.key,
    }
  };

  if !profile.group_by_date {
    let group = DateGroup {
      key: ALL_GROUP.to_string(),
      articles: page.articles.iter().collect(),
    };
    return FeedView {
      groups: vec![to_view(group, profile.label.clone())],
      date_page: 1,
      total_date_pages: None,
      date_caption: None,
    };
  }

  let groups = date_groups(&page.articles);

  if profile.date_paging {
    let date_page = date_page.max(1);
    return FeedView {
      groups: groups
        .into_iter()
        .map(|g| {
          let heading = date_heading(&g.key);
          to_view(g, heading)
        })
        .collect(),
      date_page,
      total_date_pages: page.total_date_pages,
      date_caption: Some(date_info(
        page.date_range.as_ref(),
        date_page,
        page.total_date_pages,
      )),
    };
  }

  let slice = paginate_date_keys(&groups, date_page as usize, profile.date_groups_per_page);
  let range = local_range(&slice.items);
  let shown = slice.page as u32;
  let total = slice.total_pages as u32;

  FeedView {
    groups: slice
      .items
      .into_iter()
      .map(|g| {
        let heading = date_heading(&g.key);
        to_view(g, heading)
      })
      .collect(),
    date_page: shown,
    total_date_pages: Some(total),
    date_caption: Some(date_info(range.as_ref(), shown, Some(total))),
  }
}

/// Range spanned by the dated groups of a local slice.
fn local_range(groups: &[DateGroup<'_>]) -> Option<DateRange> {
  let mut dated = groups.iter().filter(|g| g.key != UNKNOWN_DATE);
  let newest = dated.next()?;
  let oldest = dated.last().unwrap_or(newest);
  Some(DateRange {
    start: oldest.key.clone(),
    end: newest.key.clone(),
  })
}

/// "2025-03-01 (Sat)" for dates, the raw key otherwise.
pub fn date_heading(key: &str) -> String {
  if key == UNKNOWN_DATE {
    return "Unknown date".to_string();
  }
  match NaiveDate::parse_from_str(key, "%Y-%m-%d") {
    Ok(date) => date.format("%Y-%m-%d (%a)").to_string(),
    Err(_) => key.to_string(),
  }
}
