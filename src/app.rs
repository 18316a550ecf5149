use crate::event::{Event, EventHandler};
use crate::ui;
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use crate::ui::renderfns::extract_domain;
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{FeedTabView, SearchView};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use newsdesk::config::Config;
use newsdesk::news::FetchCoordinator;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tracing::info;

/// Main application state
pub struct App {
  config: Config,
  coordinator: FetchCoordinator,

  /// One view per configured source
  tabs: Vec<FeedTabView>,
  active: usize,

  /// Views pushed over the active tab (search results, article detail)
  stack: Vec<Box<dyn View>>,

  /// Search prompt (after pressing /)
  search: SearchInput,

  should_quit: bool,
}

impl App {
  /// `refresh` bypasses the fresh cache for the first load of every tab.
  pub fn new(
    config: Config,
    coordinator: FetchCoordinator,
    initial_source: Option<&str>,
    refresh: bool,
  ) -> Self {
    let tabs = config
      .sources
      .iter()
      .map(|profile| FeedTabView::new(profile.clone(), coordinator.clone(), refresh))
      .collect();

    let active = initial_source
      .and_then(|key| config.sources.iter().position(|p| p.key == key))
      .unwrap_or(0);

    Self {
      config,
      coordinator,
      tabs,
      active,
      stack: Vec::new(),
      search: SearchInput::new(),
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;

    let result = self.event_loop().await;

    // Cleanup terminal, also when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(&mut self) -> Result<()> {
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    let mut events = EventHandler::new(Duration::from_millis(100));

    self.select_tab(self.active);

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key),
        Some(Event::Resize) => terminal.autoresize()?,
        Some(Event::Tick) => self.tick(),
        None => break,
      }
    }

    Ok(())
  }

  fn tick(&mut self) {
    // Only the active tab can have a load in flight
    self.tabs[self.active].tick();
    for view in &mut self.stack {
      view.tick();
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    match self.search.handle_key(key) {
      KeyResult::Handled => return,
      KeyResult::Event(SearchEvent::Submitted(text)) => {
        info!(query = %text, "search submitted");
        let view = SearchView::new(text, self.coordinator.clone(), self.config.sources.clone());
        self.stack.push(Box::new(view));
        return;
      }
      KeyResult::Event(SearchEvent::Cancelled) => return,
      KeyResult::NotHandled => {}
    }

    // Tab switching only from the feed itself
    if self.stack.is_empty() {
      match key.code {
        KeyCode::Tab => {
          self.select_tab((self.active + 1) % self.tabs.len().max(1));
          return;
        }
        KeyCode::BackTab => {
          let count = self.tabs.len().max(1);
          self.select_tab((self.active + count - 1) % count);
          return;
        }
        KeyCode::Char(c @ '1'..='9') => {
          let idx = c as usize - '1' as usize;
          if idx < self.tabs.len() {
            self.select_tab(idx);
          }
          return;
        }
        _ => {}
      }
    }

    match self.current_view_mut().handle_key(key) {
      ViewAction::None => {}
      ViewAction::Push(view) => self.stack.push(view),
      ViewAction::Pop => {
        if self.stack.pop().is_none() {
          self.should_quit = true;
        }
      }
    }
  }

  fn select_tab(&mut self, idx: usize) {
    if idx >= self.tabs.len() {
      return;
    }
    if idx != self.active {
      self.tabs[self.active].deactivate();
    }
    self.active = idx;
    self.tabs[idx].activate();
  }

  pub fn current_view(&self) -> &dyn View {
    match self.stack.last() {
      Some(view) => view.as_ref(),
      None => &self.tabs[self.active],
    }
  }

  pub fn current_view_mut(&mut self) -> &mut dyn View {
    match self.stack.last_mut() {
      Some(view) => view.as_mut(),
      None => &mut self.tabs[self.active],
    }
  }

  pub fn search(&self) -> &SearchInput {
    &self.search
  }

  pub fn active_tab(&self) -> usize {
    self.active
  }

  pub fn tab_labels(&self) -> Vec<String> {
    self.tabs.iter().map(|t| t.label().to_string()).collect()
  }

  pub fn title(&self) -> String {
    self
      .config
      .title
      .clone()
      .unwrap_or_else(|| extract_domain(&self.config.api.base_url).to_string())
  }

  pub fn breadcrumb(&self) -> Vec<String> {
    std::iter::once(self.tabs[self.active].breadcrumb_label())
      .chain(self.stack.iter().map(|v| v.breadcrumb_label()))
      .collect()
  }
}
