use newsdesk::config::SourceKind;
use newsdesk::news::Article;
use crate::ui::renderfns::{card_lines, truncate};
use crate::ui::view::{Shortcut, View, ViewAction};
use newsdesk::view_model::format::display_title;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// Full article with unclamped content and its link
pub struct ArticleView {
  article: Article,
  kind: SourceKind,
  scroll: u16,
}

impl ArticleView {
  pub fn new(article: Article, kind: SourceKind) -> Self {
    Self {
      article,
      kind,
      scroll: 0,
    }
  }
}

impl View for ArticleView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
      KeyCode::Char('k') | KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
      KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10),
      KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(format!(" {} ", self.article.date_time.as_deref().unwrap_or("undated")))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = card_lines(&self.article, self.kind, inner.width as usize, true);
    let max_scroll = lines.len().saturating_sub(inner.height as usize) as u16;
    self.scroll = self.scroll.min(max_scroll);

    frame.render_widget(Paragraph::new(lines).scroll((self.scroll, 0)), inner);
  }

  fn breadcrumb_label(&self) -> String {
    truncate(display_title(&self.article), 40)
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![Shortcut::new("j/k", "scroll"), Shortcut::new("q", "back")]
  }
}
