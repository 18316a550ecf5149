//! Per-group "show more" state.

/// Whether a group shows its overflow records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Disclosure {
  #[default]
  Collapsed,
  Expanded,
}

impl Disclosure {
  /// Reveal the overflow. Returns whether the state changed.
  pub fn show_more(&mut self) -> bool {
    let changed = *self == Disclosure::Collapsed;
    *self = Disclosure::Expanded;
    changed
  }

  /// Hide the overflow again. Returns whether the state changed.
  pub fn collapse(&mut self) -> bool {
    let changed = *self == Disclosure::Expanded;
    *self = Disclosure::Collapsed;
    changed
  }

  pub fn toggle(&mut self) {
    match self {
      Disclosure::Collapsed => self.show_more(),
      Disclosure::Expanded => self.collapse(),
    };
  }

  pub fn is_expanded(self) -> bool {
    self == Disclosure::Expanded
  }
}

/// Split records into the always-visible head and the collapsible overflow.
pub fn split_initial_and_overflow<T>(records: &[T], initial: usize) -> (&[T], &[T]) {
  records.split_at(initial.min(records.len()))
}
