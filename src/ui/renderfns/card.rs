use ratatui::prelude::*;

use newsdesk::config::SourceKind;
use newsdesk::news::Article;
use newsdesk::view_model::format::{
  clamp_chars, display_author, display_content, display_title, format_number, is_long_content,
  linkify, time_part, Segment, LONG_CONTENT_CHARS,
};

use super::utils::wrap_text;

/// Lines of one article card, `width` columns wide.
///
/// Long content is clamped unless `full` is set.
pub fn card_lines(article: &Article, kind: SourceKind, width: usize, full: bool) -> Vec<Line<'static>> {
  let mut lines = Vec::new();

  for line in wrap_text(display_title(article), width) {
    lines.push(Line::from(Span::styled(line, Style::default().fg(Color::White).bold())));
  }

  lines.push(meta_line(article, kind));

  match kind {
    SourceKind::Social => {
      if let Some(stats) = social_stats(article) {
        lines.push(Line::from(Span::styled(stats, Style::default().fg(Color::Magenta))));
      }
    }
    SourceKind::Funding => lines.extend(funding_lines(article, width)),
    SourceKind::Briefing => {}
  }

  let content = display_content(article);
  let content = if !full && is_long_content(content) {
    clamp_chars(content, LONG_CONTENT_CHARS)
  } else {
    content.to_string()
  };
  for line in wrap_text(&content, width) {
    lines.push(linkified_line(&line));
  }

  if full {
    if let Some(url) = article.source_url.as_deref() {
      lines.push(Line::from(Span::styled(
        url.to_string(),
        Style::default().fg(Color::Blue).underlined(),
      )));
    }
  }

  lines
}

fn meta_line(article: &Article, kind: SourceKind) -> Line<'static> {
  let author = match kind {
    SourceKind::Social => format!("@{}", display_author(article)),
    _ => display_author(article).to_string(),
  };

  let mut spans = vec![Span::styled(author, Style::default().fg(Color::Cyan))];

  if let Some(time) = article.date_time.as_deref().and_then(time_part) {
    spans.push(Span::styled(" · ", Style::default().fg(Color::DarkGray)));
    spans.push(Span::styled(time, Style::default().fg(Color::DarkGray)));
  }
  if let Some(source) = article.source.as_deref() {
    spans.push(Span::styled(" · ", Style::default().fg(Color::DarkGray)));
    spans.push(Span::styled(source.to_string(), Style::default().fg(Color::DarkGray)));
  }

  Line::from(spans)
}

/// "♥ 1.2K  ↻ 30  followers 5.0M", omitting missing counts
pub fn social_stats(article: &Article) -> Option<String> {
  let parts: Vec<String> = [
    ("♥ ", article.likes),
    ("↻ ", article.retweets),
    ("followers ", article.followers),
  ]
  .into_iter()
  .filter_map(|(label, n)| n.map(|n| format!("{}{}", label, format_number(n))))
  .collect();

  (!parts.is_empty()).then(|| parts.join("  "))
}

fn funding_lines(article: &Article, width: usize) -> Vec<Line<'static>> {
  if !article.has_funding() {
    return Vec::new();
  }

  let headline: Vec<&str> = [
    article.company.as_deref(),
    article.funding_round.as_deref(),
    article.funding_amount.as_deref(),
  ]
  .into_iter()
  .flatten()
  .collect();

  let mut lines = Vec::new();
  if !headline.is_empty() {
    lines.push(Line::from(Span::styled(
      headline.join(" · "),
      Style::default().fg(Color::Green).bold(),
    )));
  }
  if let Some(investors) = article.investors.as_deref() {
    for line in wrap_text(&format!("Investors: {}", investors), width) {
      lines.push(Line::from(Span::styled(line, Style::default().fg(Color::Green))));
    }
  }
  lines
}

fn linkified_line(text: &str) -> Line<'static> {
  let spans: Vec<Span<'static>> = linkify(text)
    .into_iter()
    .map(|segment| match segment {
      Segment::Text(t) => Span::raw(t.to_string()),
      Segment::Link(url) => Span::styled(url.to_string(), Style::default().fg(Color::Blue).underlined()),
    })
    .collect();
  Line::from(spans)
}
