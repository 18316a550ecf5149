//! Caching implementations for news types.

use chrono::NaiveDate;

use crate::cache::{Cacheable, Fingerprint};
use crate::config::SourceProfile;

use super::types::ArticlePage;

// ============================================================================
// Cacheable implementations
// ============================================================================

impl Cacheable for ArticlePage {
  fn content_date(&self) -> Option<NaiveDate> {
    self.newest_date()
  }
}

// ============================================================================
// Fingerprints
// ============================================================================

/// Fingerprint for one page request of a source tab.
///
/// The date page only takes part for sources paged by date on the server.
pub fn page_fingerprint(profile: &SourceProfile, page: u32, date_page: u32) -> Fingerprint {
  let date_page = profile.date_paging.then_some(date_page.max(1));
  Fingerprint::new(&profile.key, &profile.source, page.max(1), date_page)
}
