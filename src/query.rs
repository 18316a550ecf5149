//! Cancellable async query for loading data off the UI loop.
//!
//! A `Query<T>` owns at most one in-flight task. Starting a new load aborts the
//! previous task and drops its channel, so a superseded result can never be
//! observed.
//!
//! # Example
//!
//! ```ignore
//! let coordinator = coordinator.clone();
//! query.start(async move {
//!     coordinator
//!         .load(&profile, page, date_page, false)
//!         .await
//!         .map_err(|e| e.to_string())
//! });
//!
//! // In event loop tick
//! if query.poll() {
//!     // State changed, trigger re-render
//! }
//!
//! // In render
//! match query.state() {
//!     QueryState::Loading => render_spinner(),
//!     QueryState::Success(data) => render_data(data),
//!     QueryState::Error(e) => render_error(e),
//!     QueryState::Idle => {}
//! }
//! ```

use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// The state of a query
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Query has not been started
  Idle,
  /// Query is currently fetching data
  Loading,
  /// Query completed successfully
  Success(T),
  /// Query failed with an error
  Error(String),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn is_success(&self) -> bool {
    matches!(self, QueryState::Success(_))
  }

  pub fn is_error(&self) -> bool {
    matches!(self, QueryState::Error(_))
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }
}

/// Async query with state management and cancellation.
pub struct Query<T> {
  state: QueryState<T>,
  task: Option<JoinHandle<()>>,
  receiver: Option<mpsc::UnboundedReceiver<Result<T, String>>>,
}

impl<T> Default for Query<T> {
  fn default() -> Self {
    Self {
      state: QueryState::Idle,
      task: None,
      receiver: None,
    }
  }
}

impl<T: Send + 'static> Query<T> {
  pub fn new() -> Self {
    Self::default()
  }

  /// Get the current state of the query.
  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  /// Get the data if the query succeeded.
  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  /// Check if the query is currently loading.
  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  /// Check if the query failed.
  pub fn is_error(&self) -> bool {
    self.state.is_error()
  }

  /// Get the error message if the query failed.
  pub fn error(&self) -> Option<&str> {
    self.state.error()
  }

  /// Run `future`, replacing any load still in flight.
  pub fn start<Fut>(&mut self, future: Fut)
  where
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    self.abort_task();

    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.state = QueryState::Loading;

    self.task = Some(tokio::spawn(async move {
      let result = future.await;
      // Ignore send errors - receiver may have been dropped
      let _ = tx.send(result);
    }));
  }

  /// Abort the in-flight load. Returns whether anything was cancelled.
  pub fn cancel(&mut self) -> bool {
    if !self.abort_task() {
      return false;
    }
    if self.state.is_loading() {
      self.state = QueryState::Idle;
    }
    true
  }

  /// Poll for results from a pending fetch.
  ///
  /// Returns `true` if the state changed (data arrived or error occurred).
  /// Call this in your event loop tick handler.
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    match receiver.try_recv() {
      Ok(Ok(data)) => {
        self.state = QueryState::Success(data);
        self.finish();
        true
      }
      Ok(Err(error)) => {
        self.state = QueryState::Error(error);
        self.finish();
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        // Sender dropped without sending (the task panicked)
        self.state = QueryState::Error("Query was cancelled".to_string());
        self.finish();
        true
      }
    }
  }

  fn finish(&mut self) {
    self.receiver = None;
    self.task = None;
  }

  fn abort_task(&mut self) -> bool {
    self.receiver = None;
    match self.task.take() {
      Some(task) => {
        task.abort();
        true
      }
      None => false,
    }
  }
}

impl<T> Drop for Query<T> {
  fn drop(&mut self) {
    if let Some(task) = self.task.take() {
      task.abort();
    }
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .field("in_flight", &self.task.is_some())
      .finish_non_exhaustive()
  }
}
