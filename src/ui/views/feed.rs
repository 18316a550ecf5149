use newsdesk::config::SourceProfile;
use newsdesk::news::{Article, FetchCoordinator};
use newsdesk::session::{Nav, TabSession};
use crate::ui::renderfns::{card_lines, origin_badge, pager_line};
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::views::ArticleView;
use newsdesk::view_model::{page_window, FeedView};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Numbers shown in the pager at most
const PAGER_WIDTH: u32 = 5;

/// One source tab: date-grouped cards with page and date-page navigation
pub struct FeedTabView {
  session: TabSession,
  /// Index into the cards currently shown
  cursor: usize,
  scroll: u16,
}

/// Group key and article of every shown card, in display order
fn shown_cards<'a>(feed: &FeedView<'a>) -> Vec<(String, &'a Article)> {
  feed
    .groups
    .iter()
    .flat_map(|g| g.shown().map(move |a| (g.key.clone(), a)))
    .collect()
}

impl FeedTabView {
  pub fn new(profile: SourceProfile, coordinator: FetchCoordinator, force_first: bool) -> Self {
    let session = TabSession::new(profile, coordinator);
    Self {
      session: if force_first { session.with_forced_first_load() } else { session },
      cursor: 0,
      scroll: 0,
    }
  }

  pub fn label(&self) -> &str {
    &self.session.profile().label
  }

  /// Start the first load of this tab if it has none yet
  pub fn activate(&mut self) {
    self.session.ensure_loaded();
  }

  /// Leaving the tab abandons its in-flight load
  pub fn deactivate(&mut self) {
    self.session.cancel();
  }

  fn card_count(&self) -> usize {
    self.session.feed().map(|f| shown_cards(&f).len()).unwrap_or(0)
  }

  fn clamp_cursor(&mut self) {
    self.cursor = self.cursor.min(self.card_count().saturating_sub(1));
  }

  fn reset_cursor(&mut self) {
    self.cursor = 0;
    self.scroll = 0;
  }

  fn cursor_card(&self) -> Option<(String, Article)> {
    let feed = self.session.feed()?;
    shown_cards(&feed)
      .into_iter()
      .nth(self.cursor)
      .map(|(key, article)| (key, article.clone()))
  }

  /// Apply a disclosure change to the group holding the cursor
  fn with_cursor_group(&mut self, change: impl FnOnce(&mut TabSession, &str) -> bool) {
    if let Some((key, _)) = self.cursor_card() {
      if change(&mut self.session, &key) {
        self.clamp_cursor();
      }
    }
  }

  /// Move the cursor to the first card of a neighbouring group
  fn jump_group(&mut self, delta: isize) {
    let Some(feed) = self.session.feed() else {
      return;
    };

    let mut firsts = Vec::new();
    let mut current = 0;
    let mut index = 0;
    for group in &feed.groups {
      let count = group.shown().count();
      if count == 0 {
        continue;
      }
      if (index..index + count).contains(&self.cursor) {
        current = firsts.len();
      }
      firsts.push(index);
      index += count;
    }

    if firsts.is_empty() {
      return;
    }
    let target = (current as isize + delta).clamp(0, firsts.len() as isize - 1) as usize;
    self.cursor = firsts[target];
  }

  fn render_feed(&mut self, frame: &mut Frame, area: Rect) {
    let profile = self.session.profile();
    let kind = profile.kind;

    let mut title = format!(" {} ", profile.label);
    if self.session.is_loading() {
      title.push_str("(loading...) ");
    }

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1), // Date caption / banner
        Constraint::Min(1),    // Cards
        Constraint::Length(1), // Pager
      ])
      .split(inner);

    // A failed load replaces the cards, whatever page is still held
    if let Some(error) = self.session.error() {
      let target = self.session.failed().unwrap_or(self.session.state());
      let content = format!("{}\n\nPress 'r' to retry page {}.", error, target.page);
      frame.render_widget(
        Paragraph::new(content)
          .style(Style::default().fg(Color::Red))
          .wrap(Wrap { trim: false }),
        chunks[1],
      );
      return;
    }

    let feed = match self.session.feed() {
      Some(feed) => feed,
      None => {
        let content = if self.session.is_loading() {
          "Loading..."
        } else {
          "Nothing loaded yet."
        };
        frame.render_widget(
          Paragraph::new(content).style(Style::default().fg(Color::DarkGray)),
          chunks[1],
        );
        return;
      }
    };

    // Banner wins over the date caption
    let top = if let Some(banner) = self.session.banner() {
      Line::from(Span::styled(banner.to_string(), Style::default().fg(Color::Yellow)))
    } else if let Some(caption) = &feed.date_caption {
      Line::from(vec![
        Span::styled(caption.clone(), Style::default().fg(Color::DarkGray)),
        Span::styled("  [ ] date", Style::default().fg(Color::DarkGray)),
      ])
    } else {
      Line::default()
    };
    frame.render_widget(Paragraph::new(top), chunks[0]);

    if feed.is_empty() {
      frame.render_widget(
        Paragraph::new("No articles.").style(Style::default().fg(Color::DarkGray)),
        chunks[1],
      );
    } else {
      let width = chunks[1].width.saturating_sub(2) as usize;
      let mut lines: Vec<Line> = Vec::new();
      let mut cursor_span = (0, 0);
      let mut index = 0;

      for group in &feed.groups {
        lines.push(Line::from(vec![
          Span::styled(group.heading.clone(), Style::default().fg(Color::Yellow).bold()),
          Span::styled(
            format!(" ({})", group.len()),
            Style::default().fg(Color::DarkGray),
          ),
        ]));

        for article in group.shown() {
          let selected = index == self.cursor;
          let start = lines.len();
          for (i, mut line) in card_lines(article, kind, width, false).into_iter().enumerate() {
            let marker = if selected && i == 0 { "▶ " } else { "  " };
            line.spans.insert(0, Span::styled(marker, Style::default().fg(Color::Cyan)));
            if selected {
              line = line.style(Style::default().bg(Color::Rgb(30, 30, 40)));
            }
            lines.push(line);
          }
          if selected {
            cursor_span = (start, lines.len());
          }
          lines.push(Line::default());
          index += 1;
        }

        if let Some(label) = group.toggle_label() {
          lines.push(Line::from(Span::styled(
            format!("  {}  (m/c)", label),
            Style::default().fg(Color::Cyan),
          )));
          lines.push(Line::default());
        }
      }

      let height = chunks[1].height as usize;
      let (start, end) = cursor_span;
      let mut scroll = self.scroll as usize;
      if start < scroll {
        scroll = start;
      } else if end > scroll + height {
        scroll = end.saturating_sub(height).min(start);
      }
      self.scroll = scroll as u16;

      frame.render_widget(Paragraph::new(lines).scroll((self.scroll, 0)), chunks[1]);
    }

    let state = self.session.state();
    let pager = pager_line(&page_window(state.page, self.session.total_pages(), PAGER_WIDTH));
    frame.render_widget(Paragraph::new(pager).alignment(Alignment::Center), chunks[2]);
  }
}

impl View for FeedTabView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let moved = match key.code {
      KeyCode::Char('r') if ctrl => {
        self.session.refresh();
        false
      }
      KeyCode::Char('j') | KeyCode::Down => {
        self.cursor = (self.cursor + 1).min(self.card_count().saturating_sub(1));
        false
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.cursor = self.cursor.saturating_sub(1);
        false
      }
      KeyCode::Char('J') => {
        self.jump_group(1);
        false
      }
      KeyCode::Char('K') => {
        self.jump_group(-1);
        false
      }
      KeyCode::Char('m') => {
        self.with_cursor_group(|session, key| session.show_more(key));
        false
      }
      KeyCode::Char('c') => {
        self.with_cursor_group(|session, key| session.collapse(key));
        false
      }
      KeyCode::Char(' ') => {
        self.with_cursor_group(|session, key| {
          session.toggle(key);
          true
        });
        false
      }
      KeyCode::Enter => {
        if let Some((_, article)) = self.cursor_card() {
          let kind = self.session.profile().kind;
          return ViewAction::Push(Box::new(ArticleView::new(article, kind)));
        }
        false
      }
      KeyCode::Char('n') | KeyCode::Right => self.session.go_page(Nav::Next),
      KeyCode::Char('p') | KeyCode::Left => self.session.go_page(Nav::Prev),
      KeyCode::Char('g') | KeyCode::Home => self.session.go_page(Nav::First),
      KeyCode::Char('G') | KeyCode::End => self.session.go_page(Nav::Last),
      KeyCode::Char(']') => self.session.go_date(Nav::Next),
      KeyCode::Char('[') => self.session.go_date(Nav::Prev),
      KeyCode::Char('}') => self.session.go_date(Nav::Last),
      KeyCode::Char('{') => self.session.go_date(Nav::First),
      KeyCode::Char('r') => {
        self.session.refresh();
        false
      }
      KeyCode::Char('x') => {
        self.session.dismiss_banner();
        false
      }
      KeyCode::Esc => {
        self.session.cancel();
        false
      }
      KeyCode::Char('q') => return ViewAction::Pop,
      _ => false,
    };

    if moved {
      self.reset_cursor();
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_feed(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    let state = self.session.state();
    format!("{} p{}/{}", self.label(), state.page, self.session.total_pages().max(1))
  }

  fn status(&self) -> Option<Span<'static>> {
    let (label, color) = origin_badge(self.session.origin()?);
    Some(Span::styled(label, Style::default().fg(color)))
  }

  fn tick(&mut self) {
    let before = self.session.state();
    let selected = self.cursor_card().map(|(_, article)| article.identity());
    if self.session.tick() {
      if self.session.state() != before {
        self.reset_cursor();
      } else {
        // A reload of the same page keeps the cursor on its article
        let position = selected
          .and_then(|id| self.session.feed().and_then(|feed| feed.position_of(&id)));
        if let Some(position) = position {
          self.cursor = position;
        }
      }
      self.clamp_cursor();
    }
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new("n/p", "page").with_priority(10),
      Shortcut::new("[/]", "date").with_priority(11),
      Shortcut::new("m/c", "more/less").with_priority(12),
      Shortcut::new("r", "refresh").with_priority(13),
      Shortcut::new("x", "dismiss").with_priority(14),
      Shortcut::new("/", "search").with_priority(20),
      Shortcut::new("q", "quit").with_priority(30),
    ]
  }
}
