//! Time-to-live selection for freshly written entries.

use chrono::{Duration, NaiveDate};

use crate::config::TtlConfig;

/// Which TTL bucket an entry landed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlTier {
  /// First page of recent content
  Short,
  /// Everything without a more specific rule
  Medium,
  /// Archival content
  Long,
}

/// What the policy knows about a page at write time.
#[derive(Debug, Clone, Copy)]
pub struct TtlInput {
  pub page: u32,
  pub date_page: Option<u32>,
  /// Newest date in the payload
  pub content_date: Option<NaiveDate>,
  pub today: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct TtlPolicy {
  short: Duration,
  medium: Duration,
  long: Duration,
  recent_days: i64,
  archive_after_days: i64,
}

impl Default for TtlPolicy {
  fn default() -> Self {
    Self::from(&TtlConfig::default())
  }
}

impl From<&TtlConfig> for TtlPolicy {
  fn from(config: &TtlConfig) -> Self {
    Self {
      short: Duration::minutes(config.short_mins),
      medium: Duration::minutes(config.medium_mins),
      long: Duration::hours(config.long_hours),
      recent_days: config.recent_days,
      archive_after_days: config.archive_after_days,
    }
  }
}

impl TtlPolicy {
  /// Pick a tier. Rules are checked in order and the first match wins.
  pub fn tier(&self, input: &TtlInput) -> TtlTier {
    let age_days = input
      .content_date
      .map(|date| (input.today - date).num_days());

    let recent = match age_days {
      Some(days) => days <= self.recent_days,
      // No dates at all: only the newest date window counts as recent
      None => input.date_page.map_or(false, |p| p <= 1),
    };
    let archival = age_days.map_or(false, |days| days > self.archive_after_days);

    if input.page <= 1 && recent {
      TtlTier::Short
    } else if input.page <= 1 {
      TtlTier::Medium
    } else if archival {
      TtlTier::Long
    } else {
      TtlTier::Medium
    }
  }

  pub fn duration(&self, tier: TtlTier) -> Duration {
    match tier {
      TtlTier::Short => self.short,
      TtlTier::Medium => self.medium,
      TtlTier::Long => self.long,
    }
  }

  pub fn ttl_for(&self, input: &TtlInput) -> Duration {
    self.duration(self.tier(input))
  }
}
