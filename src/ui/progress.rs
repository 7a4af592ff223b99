//! Progress indicators for multi-step operations
//!
//! Uses `linya`; bars draw to stderr so stdout stays clean for command output.

use linya::{Bar, Progress};

/// Single progress bar advanced one step at a time
pub struct StepProgress {
  progress: Progress,
  bar: Bar,
}

impl StepProgress {
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self { progress, bar }
  }

  /// Increment progress by 1
  pub fn inc(&mut self) {
    self.progress.inc_and_draw(&self.bar, 1);
  }
}
