use newsdesk::config::{SourceKind, SourceProfile};
use newsdesk::news::{Article, FetchCoordinator};
use newsdesk::query::{Query, QueryState};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::truncate;
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::views::ArticleView;
use newsdesk::view_model::format::display_title;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Search results across all sources
pub struct SearchView {
  coordinator: FetchCoordinator,
  profiles: Vec<SourceProfile>,
  text: String,
  query: Query<Vec<Article>>,
  list_state: ListState,
}

impl SearchView {
  pub fn new(text: String, coordinator: FetchCoordinator, profiles: Vec<SourceProfile>) -> Self {
    let mut view = Self {
      coordinator,
      profiles,
      text,
      query: Query::new(),
      list_state: ListState::default(),
    };
    view.run();
    view
  }

  fn run(&mut self) {
    let coordinator = self.coordinator.clone();
    let text = self.text.clone();
    self.query.start(async move { coordinator.search(&text).await.map_err(|e| e.to_string()) });
  }

  fn results(&self) -> &[Article] {
    self.query.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  /// Card layout for a result, from the profile of its source
  fn kind_of(&self, article: &Article) -> SourceKind {
    article
      .source
      .as_deref()
      .and_then(|s| self.profiles.iter().find(|p| p.source == s))
      .map(|p| p.kind)
      .unwrap_or(SourceKind::Briefing)
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.results().len();
    ensure_valid_selection(&mut self.list_state, len);

    let title = match self.query.state() {
      QueryState::Loading => format!(" Search \"{}\" (loading...) ", self.text),
      QueryState::Error(_) => format!(" Search \"{}\" (error) ", self.text),
      _ => format!(" Search \"{}\" ({}) ", self.text, len),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 {
      let content = match self.query.error() {
        Some(e) => format!("{}\n\nPress 'r' to retry.", e),
        None if self.query.is_loading() => "Searching...".to_string(),
        None => "No matches.".to_string(),
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let title_width = (area.width as usize).saturating_sub(36).max(10);
    let items: Vec<ListItem> = self
      .results()
      .iter()
      .map(|article| {
        let date = article.date_time.as_deref().unwrap_or("");
        let line = Line::from(vec![
          Span::styled(
            format!("{:<16}", truncate(date, 16)),
            Style::default().fg(Color::DarkGray),
          ),
          Span::raw(" "),
          Span::styled(
            format!("{:<14}", truncate(article.source.as_deref().unwrap_or("-"), 14)),
            Style::default().fg(Color::Cyan),
          ),
          Span::raw(" "),
          Span::raw(truncate(display_title(article), title_width)),
        ]);
        ListItem::new(line)
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }
}

impl View for SearchView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('r') => self.run(),
      KeyCode::Enter => {
        let selected = self
          .list_state
          .selected()
          .and_then(|idx| self.results().get(idx));
        if let Some(article) = selected {
          let kind = self.kind_of(article);
          return ViewAction::Push(Box::new(ArticleView::new(article.clone(), kind)));
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_list(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    format!("Search \"{}\"", truncate(&self.text, 20))
  }

  fn tick(&mut self) {
    self.query.poll();
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new("Enter", "open"),
      Shortcut::new("r", "retry"),
      Shortcut::new("q", "back"),
    ]
  }
}
