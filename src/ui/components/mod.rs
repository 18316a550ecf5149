mod input;
mod search_input;

pub use search_input::{SearchEvent, SearchInput};

/// How a component responded to a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Consumed, nothing for the parent to do
  Handled,
  /// Consumed, with an event for the parent
  Event(T),
  /// Not consumed, parent should try next handler
  NotHandled,
}
