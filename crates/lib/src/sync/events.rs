//! Collaborator-facing callbacks.

use std::sync::Arc;

use super::types::SyncState;

/// Receives status and progress updates from a sync run.
///
/// Every method is invoked synchronously, in program order, from the thread
/// running the sync. Implementations that drive a UI are responsible for
/// marshaling onto their own thread. All methods default to doing nothing.
pub trait SyncEvents: Send {
  /// Human-readable status line, e.g. `Check: /path` or `Download: /path`.
  fn on_status(&self, _text: &str) {}

  /// Progress of the file currently downloading, in `[0, 1]`.
  fn on_progress(&self, _fraction: f64) {}

  /// Progress of the whole batch, in `[0, 1]`.
  fn on_overall_progress(&self, _fraction: f64) {}

  /// The orchestrator entered a new state.
  fn on_state(&self, _state: SyncState) {}

  /// The tree is ready to use.
  fn on_ready(&self) {}

  /// The run finished.
  fn on_done(&self) {}

  /// The run stopped because the cancel token fired.
  fn on_cancelled(&self) {}
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEvents;

impl SyncEvents for NoopEvents {}

impl<T: SyncEvents + Sync + ?Sized> SyncEvents for Arc<T> {
  fn on_status(&self, text: &str) {
    (**self).on_status(text)
  }

  fn on_progress(&self, fraction: f64) {
    (**self).on_progress(fraction)
  }

  fn on_overall_progress(&self, fraction: f64) {
    (**self).on_overall_progress(fraction)
  }

  fn on_state(&self, state: SyncState) {
    (**self).on_state(state)
  }

  fn on_ready(&self) {
    (**self).on_ready()
  }

  fn on_done(&self) {
    (**self).on_done()
  }

  fn on_cancelled(&self) {
    (**self).on_cancelled()
  }
}

#[cfg(test)]
pub(crate) mod recorder {
  use std::sync::Mutex;

  use super::*;

  #[derive(Debug, Clone, PartialEq)]
  pub enum Event {
    Status(String),
    Progress(f64),
    Overall(f64),
    State(SyncState),
    Ready,
    Done,
    Cancelled,
  }

  /// Records every event for assertions.
  #[derive(Debug, Default)]
  pub struct Recorder {
    events: Mutex<Vec<Event>>,
  }

  impl Recorder {
    pub fn events(&self) -> Vec<Event> {
      self.events.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<String> {
      self
        .events()
        .into_iter()
        .filter_map(|e| match e {
          Event::Status(s) => Some(s),
          _ => None,
        })
        .collect()
    }

    pub fn states(&self) -> Vec<SyncState> {
      self
        .events()
        .into_iter()
        .filter_map(|e| match e {
          Event::State(s) => Some(s),
          _ => None,
        })
        .collect()
    }

    pub fn overall(&self) -> Vec<f64> {
      self
        .events()
        .into_iter()
        .filter_map(|e| match e {
          Event::Overall(f) => Some(f),
          _ => None,
        })
        .collect()
    }

    fn push(&self, event: Event) {
      self.events.lock().unwrap().push(event);
    }
  }

  impl SyncEvents for Recorder {
    fn on_status(&self, text: &str) {
      self.push(Event::Status(text.to_string()));
    }

    fn on_progress(&self, fraction: f64) {
      self.push(Event::Progress(fraction));
    }

    fn on_overall_progress(&self, fraction: f64) {
      self.push(Event::Overall(fraction));
    }

    fn on_state(&self, state: SyncState) {
      self.push(Event::State(state));
    }

    fn on_ready(&self) {
      self.push(Event::Ready);
    }

    fn on_done(&self) {
      self.push(Event::Done);
    }

    fn on_cancelled(&self) {
      self.push(Event::Cancelled);
    }
  }
}
