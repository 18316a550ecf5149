//! Per-tab loading and navigation state.

use std::collections::HashMap;

use tracing::debug;

use crate::cache::{CacheResult, CacheSource};
use crate::config::SourceProfile;
use crate::news::{ArticlePage, FetchCoordinator};
use crate::query::Query;
use crate::view_model::{build_feed, total_pages, Disclosure, FeedView};

/// Which page of a tab is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageState {
  /// Result page, 1-based
  pub page: u32,
  /// Date page, 1-based
  pub date_page: u32,
}

impl Default for PageState {
  fn default() -> Self {
    Self { page: 1, date_page: 1 }
  }
}

/// Movement along a page axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
  First,
  Prev,
  Next,
  Last,
  To(u32),
}

impl Nav {
  /// Target page for this move, clamped to `[1, total]`.
  pub fn target(self, current: u32, total: u32) -> u32 {
    let total = total.max(1);
    let target = match self {
      Nav::First => 1,
      Nav::Prev => current.saturating_sub(1),
      Nav::Next => current.saturating_add(1),
      Nav::Last => total,
      Nav::To(page) => page,
    };
    target.clamp(1, total)
  }
}

/// One source tab: what is shown, what is loading, and what is expanded.
pub struct TabSession {
  profile: SourceProfile,
  coordinator: FetchCoordinator,
  state: PageState,
  pending: Option<PageState>,
  /// Request whose load failed; retried by `refresh`
  failed: Option<PageState>,
  query: Query<CacheResult<ArticlePage>>,
  page: Option<ArticlePage>,
  origin: Option<CacheSource>,
  banner: Option<String>,
  error: Option<String>,
  disclosures: HashMap<String, Disclosure>,
  force_first: bool,
}

impl TabSession {
  pub fn new(profile: SourceProfile, coordinator: FetchCoordinator) -> Self {
    Self {
      profile,
      coordinator,
      state: PageState::default(),
      pending: None,
      failed: None,
      query: Query::new(),
      page: None,
      origin: None,
      banner: None,
      error: None,
      disclosures: HashMap::new(),
      force_first: false,
    }
  }

  /// Bypass the fresh cache for the first load.
  pub fn with_forced_first_load(mut self) -> Self {
    self.force_first = true;
    self
  }

  pub fn profile(&self) -> &SourceProfile {
    &self.profile
  }

  pub fn state(&self) -> PageState {
    self.state
  }

  pub fn page(&self) -> Option<&ArticlePage> {
    self.page.as_ref()
  }

  /// Where the shown page came from.
  pub fn origin(&self) -> Option<CacheSource> {
    self.origin
  }

  /// Warning shown above the feed, e.g. when serving stale data.
  pub fn banner(&self) -> Option<&str> {
    self.banner.as_deref()
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  /// Page and date page of the last failed load.
  pub fn failed(&self) -> Option<PageState> {
    self.failed
  }

  /// Hide the banner until the next load brings a new one.
  pub fn dismiss_banner(&mut self) -> bool {
    self.banner.take().is_some()
  }

  pub fn is_loading(&self) -> bool {
    self.query.is_loading()
  }

  /// Start loading `state`, replacing any load still in flight.
  pub fn request(&mut self, state: PageState, force: bool) {
    let coordinator = self.coordinator.clone();
    let profile = self.profile.clone();
    debug!(tab = %profile.key, page = state.page, date_page = state.date_page, force, "load requested");

    self.pending = Some(state);
    self.query.start(async move {
      coordinator
        .load(&profile, state.page, state.date_page, force)
        .await
        .map_err(|e| e.to_string())
    });
  }

  /// Load the first page unless something is shown or loading already.
  pub fn ensure_loaded(&mut self) {
    if self.page.is_none() && !self.is_loading() && self.error.is_none() {
      let force = std::mem::take(&mut self.force_first);
      self.request(self.state, force);
    }
  }

  /// Reload from the network: the failed request if there is one, else the shown page.
  pub fn refresh(&mut self) {
    let target = self.failed.unwrap_or(self.state);
    self.request(target, true);
  }

  /// Abandon the in-flight load, keeping whatever is shown.
  pub fn cancel(&mut self) -> bool {
    self.pending = None;
    self.query.cancel()
  }

  /// Apply a finished load. Returns whether anything changed.
  pub fn tick(&mut self) -> bool {
    if !self.query.poll() {
      return false;
    }

    let Some(requested) = self.pending.take() else {
      return false;
    };

    if let Some(result) = self.query.data() {
      self.page = Some(result.data.clone());
      self.origin = Some(result.source);
      self.banner = result.warning.clone();
      self.error = None;
      self.failed = None;
      if requested.page != self.state.page || requested.date_page != self.state.date_page {
        self.disclosures.clear();
      }
      self.state = requested;
    } else if let Some(error) = self.query.error() {
      self.error = Some(error.to_string());
      self.failed = Some(requested);
    }
    true
  }

  /// Number of result pages, known once a page has loaded.
  pub fn total_pages(&self) -> u32 {
    self
      .page
      .as_ref()
      .map(|p| total_pages(p.total, self.profile.per_page))
      .unwrap_or(0)
  }

  /// Number of date pages for the shown data.
  pub fn total_date_pages(&self) -> u32 {
    self
      .feed()
      .and_then(|f| f.total_date_pages)
      .unwrap_or(1)
  }

  /// Move along the result-page axis. Returns whether a load was started.
  pub fn go_page(&mut self, nav: Nav) -> bool {
    let target = nav.target(self.state.page, self.total_pages());
    if target == self.state.page {
      return false;
    }

    // Local date slices belong to one result page
    let date_page = if self.profile.date_paging { self.state.date_page } else { 1 };
    self.request(
      PageState {
        page: target,
        date_page,
      },
      false,
    );
    true
  }

  /// Move along the date-page axis. Returns whether the view changed.
  ///
  /// Server-paged sources refetch the new date window; others re-slice the
  /// groups already loaded.
  pub fn go_date(&mut self, nav: Nav) -> bool {
    if !self.profile.group_by_date {
      return false;
    }

    let target = nav.target(self.state.date_page, self.total_date_pages());
    if target == self.state.date_page {
      return false;
    }

    if self.profile.date_paging {
      self.request(
        PageState {
          page: 1,
          date_page: target,
        },
        true,
      );
    } else {
      self.state.date_page = target;
      self.disclosures.clear();
    }
    true
  }

  /// The feed for the shown page.
  pub fn feed(&self) -> Option<FeedView<'_>> {
    self
      .page
      .as_ref()
      .map(|page| build_feed(&self.profile, page, self.state.date_page, &self.disclosures))
  }

  pub fn disclosure(&self, group: &str) -> Disclosure {
    self.disclosures.get(group).copied().unwrap_or_default()
  }

  pub fn show_more(&mut self, group: &str) -> bool {
    self.disclosures.entry(group.to_string()).or_default().show_more()
  }

  pub fn collapse(&mut self, group: &str) -> bool {
    self.disclosures.entry(group.to_string()).or_default().collapse()
  }

  pub fn toggle(&mut self, group: &str) {
    self.disclosures.entry(group.to_string()).or_default().toggle();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheEntry, CacheStore, MemoryStorage, RetryPolicy, TtlPolicy};
  use crate::config::ApiConfig;
  use crate::news::cache::page_fingerprint;
  use crate::news::{Article, NewsClient};
  use std::time::Duration;

  fn profile(key: &str) -> SourceProfile {
    SourceProfile::defaults()
      .into_iter()
      .find(|p| p.key == key)
      .unwrap()
  }

  // Nothing listens on the discard port, so only cached pages load.
  fn offline_coordinator() -> FetchCoordinator {
    let client = NewsClient::new(&ApiConfig {
      base_url: "http://127.0.0.1:9".to_string(),
      timeout_secs: Some(1),
    })
    .unwrap();
    FetchCoordinator::from_parts(
      client,
      CacheStore::new(MemoryStorage::new(), 5 * 1024 * 1024),
      RetryPolicy {
        max_retries: 0,
        backoff: Duration::ZERO,
      },
      TtlPolicy::default(),
    )
  }

  fn seed(coordinator: &FetchCoordinator, profile: &SourceProfile, state: PageState, page: &ArticlePage) {
    let fp = page_fingerprint(profile, state.page, state.date_page);
    let entry = CacheEntry::new(&fp, page, chrono::Duration::hours(1)).unwrap();
    assert!(coordinator.store().put(&fp, &entry));
  }

  fn page_of(dates: &[&str], total: u64) -> ArticlePage {
    ArticlePage {
      articles: dates
        .iter()
        .enumerate()
        .map(|(i, d)| Article {
          title: Some(format!("item {}", i)),
          date_time: Some(format!("{} 09:00", d)),
          ..Default::default()
        })
        .collect(),
      total,
      ..Default::default()
    }
  }

  async fn settle(session: &mut TabSession) {
    for _ in 0..400 {
      if session.tick() {
        return;
      }
      tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("load did not finish");
  }

  #[test]
  fn test_nav_target_clamps() {
    assert_eq!(Nav::Prev.target(1, 5), 1);
    assert_eq!(Nav::Next.target(5, 5), 5);
    assert_eq!(Nav::Last.target(2, 5), 5);
    assert_eq!(Nav::To(99).target(2, 5), 5);
    assert_eq!(Nav::To(0).target(2, 5), 1);
    assert_eq!(Nav::Next.target(1, 0), 1);
  }

  #[tokio::test]
  async fn test_loads_cached_first_page() {
    let coordinator = offline_coordinator();
    let x = profile("x");
    seed(&coordinator, &x, PageState::default(), &page_of(&["2025-03-02", "2025-03-01"], 20));

    let mut session = TabSession::new(x, coordinator);
    session.ensure_loaded();
    assert!(session.is_loading());
    settle(&mut session).await;

    assert_eq!(session.origin(), Some(CacheSource::CacheFresh));
    assert_eq!(session.total_pages(), 3);
    assert_eq!(session.feed().unwrap().groups.len(), 2);
    assert!(session.error().is_none());
  }

  #[tokio::test]
  async fn test_failed_load_without_cache_sets_error() {
    let mut session = TabSession::new(profile("x"), offline_coordinator());
    session.ensure_loaded();
    settle(&mut session).await;

    assert!(session.page().is_none());
    assert!(session.error().unwrap().contains("unavailable"));

    // No automatic retry loop after a failure
    session.ensure_loaded();
    assert!(!session.is_loading());
  }

  #[tokio::test]
  async fn test_page_navigation_moves_and_resets_disclosure() {
    let coordinator = offline_coordinator();
    let crunchbase = profile("crunchbase");
    let first = PageState::default();
    let second = PageState { page: 2, date_page: 1 };
    seed(&coordinator, &crunchbase, first, &page_of(&["2025-03-02"; 3], 6));
    seed(&coordinator, &crunchbase, second, &page_of(&["2025-03-01"; 3], 6));

    let mut session = TabSession::new(crunchbase, coordinator);
    session.ensure_loaded();
    settle(&mut session).await;

    session.show_more("all");
    assert!(session.disclosure("all").is_expanded());

    assert!(!session.go_page(Nav::Prev));
    assert!(session.go_page(Nav::Next));
    settle(&mut session).await;

    assert_eq!(session.state(), second);
    assert!(!session.disclosure("all").is_expanded());
    assert!(!session.go_page(Nav::Next));
  }

  #[tokio::test]
  async fn test_refresh_retries_the_failed_page() {
    let coordinator = offline_coordinator();
    let crunchbase = profile("crunchbase");
    let second = PageState { page: 2, date_page: 1 };
    seed(&coordinator, &crunchbase, PageState::default(), &page_of(&["2025-03-02"; 3], 6));

    let mut session = TabSession::new(crunchbase.clone(), coordinator.clone());
    session.ensure_loaded();
    settle(&mut session).await;

    assert!(session.go_page(Nav::Next));
    settle(&mut session).await;

    assert_eq!(session.state().page, 1);
    assert_eq!(session.failed(), Some(second));
    assert!(session.error().unwrap().contains("p2"));

    // Page 2 shows up in the cache; the retry must ask for it, not page 1
    seed(&coordinator, &crunchbase, second, &page_of(&["2025-03-01"; 3], 6));
    session.refresh();
    settle(&mut session).await;

    assert_eq!(session.state(), second);
    assert_eq!(session.origin(), Some(CacheSource::Stale));
    assert!(session.error().is_none());
    assert!(session.failed().is_none());
    assert_eq!(
      session.page().unwrap().articles[0].date_time.as_deref(),
      Some("2025-03-01 09:00")
    );
  }

  #[tokio::test]
  async fn test_refresh_without_failure_reloads_shown_page() {
    let coordinator = offline_coordinator();
    let crunchbase = profile("crunchbase");
    seed(&coordinator, &crunchbase, PageState::default(), &page_of(&["2025-03-02"; 3], 6));

    let mut session = TabSession::new(crunchbase, coordinator);
    session.ensure_loaded();
    settle(&mut session).await;

    session.refresh();
    settle(&mut session).await;

    assert_eq!(session.state(), PageState::default());
    assert_eq!(session.origin(), Some(CacheSource::Stale));
  }

  #[tokio::test]
  async fn test_local_date_paging_does_not_fetch() {
    let coordinator = offline_coordinator();
    let x = profile("x");
    seed(
      &coordinator,
      &x,
      PageState::default(),
      &page_of(&["2025-03-05", "2025-03-04", "2025-03-03", "2025-03-02", "2025-03-01"], 5),
    );

    let mut session = TabSession::new(x, coordinator);
    session.ensure_loaded();
    settle(&mut session).await;

    assert_eq!(session.total_date_pages(), 3);
    session.show_more("2025-03-05");
    assert!(session.go_date(Nav::Last));
    assert!(!session.disclosure("2025-03-05").is_expanded());
    assert!(!session.is_loading());
    assert_eq!(session.state().date_page, 3);
    assert_eq!(session.feed().unwrap().groups[0].key, "2025-03-01");
    assert!(!session.go_date(Nav::Next));
  }

  #[tokio::test]
  async fn test_server_date_paging_refetches() {
    let coordinator = offline_coordinator();
    let briefing = profile("briefing");
    let mut first = page_of(&["2025-03-05"; 4], 4);
    first.total_date_pages = Some(3);
    let mut second = page_of(&["2025-03-03"; 2], 2);
    second.total_date_pages = Some(3);
    seed(&coordinator, &briefing, PageState::default(), &first);
    seed(&coordinator, &briefing, PageState { page: 1, date_page: 2 }, &second);

    let mut session = TabSession::new(briefing, coordinator);
    session.ensure_loaded();
    settle(&mut session).await;

    assert!(session.go_date(Nav::Next));
    assert!(session.is_loading());
    settle(&mut session).await;

    // Forced refetch fails offline and falls back to the cached window
    assert_eq!(session.state().date_page, 2);
    assert_eq!(session.origin(), Some(CacheSource::Stale));
    assert!(session.banner().is_some());
    assert_eq!(session.feed().unwrap().groups[0].key, "2025-03-03");

    assert!(session.dismiss_banner());
    assert!(session.banner().is_none());
    assert!(!session.dismiss_banner());
  }

  #[tokio::test]
  async fn test_forced_first_load_skips_fresh_cache() {
    let coordinator = offline_coordinator();
    let x = profile("x");
    seed(&coordinator, &x, PageState::default(), &page_of(&["2025-03-02"], 1));

    let mut session = TabSession::new(x, coordinator).with_forced_first_load();
    session.ensure_loaded();
    settle(&mut session).await;

    // The network is down, so the forced load degrades to the cached copy
    assert_eq!(session.origin(), Some(CacheSource::Stale));
    assert!(session.banner().is_some());
  }

  #[tokio::test]
  async fn test_cancel_keeps_shown_page() {
    let coordinator = offline_coordinator();
    let x = profile("x");
    seed(&coordinator, &x, PageState::default(), &page_of(&["2025-03-02"], 1));

    let mut session = TabSession::new(x, coordinator);
    session.ensure_loaded();
    settle(&mut session).await;

    session.refresh();
    assert!(session.cancel());
    assert!(!session.tick());
    assert!(session.page().is_some());
    assert_eq!(session.state(), PageState::default());
  }

  #[tokio::test]
  async fn test_toggle_group() {
    let coordinator = offline_coordinator();
    let briefing = profile("briefing");
    seed(
      &coordinator,
      &briefing,
      PageState::default(),
      &page_of(&["2025-03-02", "2025-03-02", "2025-03-02", "2025-03-02", "2025-03-01"], 5),
    );

    let mut session = TabSession::new(briefing, coordinator);
    session.ensure_loaded();
    settle(&mut session).await;

    session.toggle("2025-03-02");
    assert!(session.disclosure("2025-03-02").is_expanded());
    assert_eq!(session.feed().unwrap().groups[0].shown().count(), 4);

    assert!(session.collapse("2025-03-02"));
    assert!(!session.collapse("2025-03-02"));
    assert_eq!(session.feed().unwrap().groups[0].shown().count(), 3);
  }
}
