use ratatui::prelude::Color;

use newsdesk::cache::CacheSource;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", head)
  }
}

/// Greedy word wrap to `width` characters. Words longer than a line are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
  let width = width.max(1);
  let mut lines = Vec::new();

  for paragraph in text.lines() {
    let mut line = String::new();
    let mut line_len = 0;

    for word in paragraph.split_whitespace() {
      let mut word: Vec<char> = word.chars().collect();

      while word.len() > width {
        if line_len > 0 {
          lines.push(std::mem::take(&mut line));
          line_len = 0;
        }
        let rest = word.split_off(width);
        lines.push(word.into_iter().collect());
        word = rest;
      }

      let needed = if line_len == 0 { word.len() } else { line_len + 1 + word.len() };
      if needed > width && line_len > 0 {
        lines.push(std::mem::take(&mut line));
        line_len = 0;
      }
      if line_len > 0 {
        line.push(' ');
        line_len += 1;
      }
      line.extend(word.iter());
      line_len += word.len();
    }

    lines.push(line);
  }

  lines
}

/// Status label and color for where the shown data came from
pub fn origin_badge(origin: CacheSource) -> (&'static str, Color) {
  match origin {
    CacheSource::Network => ("live", Color::Green),
    CacheSource::CacheFresh => ("cached", Color::Cyan),
    CacheSource::Stale => ("stale", Color::Yellow),
  }
}
