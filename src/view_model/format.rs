//! Text formatting helpers for article cards.

use std::sync::OnceLock;

use regex::Regex;

use crate::news::Article;

pub const NO_TITLE: &str = "(untitled)";
pub const NO_CONTENT: &str = "No content";
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Content longer than this many characters is clamped until expanded.
pub const LONG_CONTENT_CHARS: usize = 250;

/// Compact count: 999, 1.2K, 3.4M.
pub fn format_number(n: u64) -> String {
  // Tenths of `unit`, rounded half up
  let tenths = |unit: u64| n.saturating_add(unit / 20) / (unit / 10);

  // 999_950 rounds to 1000.0K and is shown as 1.0M instead
  if n >= 1_000_000 || tenths(1_000) >= 10_000 {
    let t = tenths(1_000_000);
    format!("{}.{}M", t / 10, t % 10)
  } else if n >= 1_000 {
    let t = tenths(1_000);
    format!("{}.{}K", t / 10, t % 10)
  } else {
    n.to_string()
  }
}

/// A run of plain text or a link inside article content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
  Text(&'a str),
  Link(&'a str),
}

fn url_regex() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"https?://[^\s<>]+").expect("static url pattern"))
}

/// Split text into plain runs and http(s) links.
pub fn linkify(text: &str) -> Vec<Segment<'_>> {
  let mut segments = Vec::new();
  let mut last = 0;

  for m in url_regex().find_iter(text) {
    if m.start() > last {
      segments.push(Segment::Text(&text[last..m.start()]));
    }
    segments.push(Segment::Link(m.as_str()));
    last = m.end();
  }

  if last < text.len() {
    segments.push(Segment::Text(&text[last..]));
  }
  segments
}

/// "HH:MM" of a "YYYY-MM-DD HH:MM[:SS]" timestamp.
pub fn time_part(date_time: &str) -> Option<String> {
  let (_, time) = date_time.trim().split_once([' ', 'T'])?;
  let hhmm: String = time.chars().take(5).collect();
  (hhmm.len() == 5 && hhmm.as_bytes()[2] == b':').then_some(hhmm)
}

pub fn is_long_content(content: &str) -> bool {
  content.chars().count() > LONG_CONTENT_CHARS
}

/// First `max_chars` characters, with an ellipsis when cut.
pub fn clamp_chars(s: &str, max_chars: usize) -> String {
  if s.chars().count() <= max_chars {
    return s.to_string();
  }
  let mut out: String = s.chars().take(max_chars.saturating_sub(1)).collect();
  out.push('…');
  out
}

pub fn display_title(article: &Article) -> &str {
  non_empty(article.title.as_deref()).unwrap_or(NO_TITLE)
}

pub fn display_content(article: &Article) -> &str {
  non_empty(article.content.as_deref()).unwrap_or(NO_CONTENT)
}

pub fn display_author(article: &Article) -> &str {
  non_empty(article.author.as_deref()).unwrap_or(UNKNOWN_AUTHOR)
}

fn non_empty(s: Option<&str>) -> Option<&str> {
  s.map(str::trim).filter(|s| !s.is_empty())
}
