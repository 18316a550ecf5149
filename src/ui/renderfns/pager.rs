use ratatui::prelude::*;

use newsdesk::view_model::{NavKind, PageButton};

/// Render pager buttons as one line: `« ‹ 1 … 4 [5] 6 … 20 › »`
pub fn pager_line(buttons: &[PageButton]) -> Line<'static> {
  let mut spans = Vec::with_capacity(buttons.len() * 2);

  for button in buttons {
    let span = match *button {
      PageButton::Nav { kind, enabled, .. } => {
        let symbol = match kind {
          NavKind::First => "«",
          NavKind::Prev => "‹",
          NavKind::Next => "›",
          NavKind::Last => "»",
        };
        let color = if enabled { Color::Cyan } else { Color::DarkGray };
        Span::styled(symbol, Style::default().fg(color))
      }
      PageButton::Page { page, current: true } => Span::styled(
        format!("[{}]", page),
        Style::default().fg(Color::Yellow).bold(),
      ),
      PageButton::Page { page, .. } => Span::raw(page.to_string()),
      PageButton::Ellipsis => Span::styled("…", Style::default().fg(Color::DarkGray)),
    };
    spans.push(span);
    spans.push(Span::raw(" "));
  }

  Line::from(spans)
}

#[cfg(test)]
mod tests {
  use super::*;
  use newsdesk::view_model::page_window;

  fn text(line: &Line) -> String {
    line.spans.iter().map(|s| s.content.as_ref()).collect()
  }

  #[test]
  fn test_pager_line() {
    let line = pager_line(&page_window(5, 20, 3));
    assert_eq!(text(&line), "« ‹ 1 … 4 [5] 6 … 20 › » ");
  }

  #[test]
  fn test_empty_pager() {
    assert!(pager_line(&page_window(1, 1, 5)).spans.is_empty());
  }
}
