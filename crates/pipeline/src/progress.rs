use std::cell::{Cell, RefCell};

/// Observer of pipeline progress. One instance is shared by the driver
/// and all stages; implementations use interior mutability.
pub trait Progress {
    /// Set the current task label, returning the previous one so scoped
    /// callers can restore it.
    fn set_task(&self, task: &str) -> String;

    fn set_percent(&self, percent: f64);

    /// Cooperative cancellation: polled between stages and on major loop
    /// iterations.
    fn is_cancelled(&self) -> bool;
}

/// Progress observer that ignores everything.
#[derive(Debug, Default)]
pub struct NullProgress;

impl Progress for NullProgress {
    fn set_task(&self, _task: &str) -> String {
        String::new()
    }

    fn set_percent(&self, _percent: f64) {}

    fn is_cancelled(&self) -> bool {
        false
    }
}

/// In-memory observer, mostly for tests and embedding.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    task: RefCell<String>,
    percent: Cell<f64>,
    cancelled: Cell<bool>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task(&self) -> String {
        self.task.borrow().clone()
    }

    pub fn percent(&self) -> f64 {
        self.percent.get()
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }
}

impl Progress for RecordingProgress {
    fn set_task(&self, task: &str) -> String {
        self.task.replace(task.to_string())
    }

    fn set_percent(&self, percent: f64) {
        self.percent.set(percent);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

/// Sets a task label on creation and restores the previous one on drop,
/// so the outer label survives every exit path of a stage.
pub struct TaskGuard<'a> {
    progress: &'a dyn Progress,
    saved: String,
}

impl<'a> TaskGuard<'a> {
    pub fn new(progress: &'a dyn Progress, task: &str) -> Self {
        let saved = progress.set_task(task);
        Self { progress, saved }
    }
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        self.progress.set_task(&self.saved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_guard_restores_on_drop() {
        let progress = RecordingProgress::new();
        progress.set_task("outer");
        {
            let _guard = TaskGuard::new(&progress, "inner");
            assert_eq!(progress.task(), "inner");
        }
        assert_eq!(progress.task(), "outer");
    }

    #[test]
    fn test_task_guard_restores_on_early_return() {
        let progress = RecordingProgress::new();
        progress.set_task("outer");
        let run = || -> Result<(), ()> {
            let _guard = TaskGuard::new(&progress, "inner");
            Err(())
        };
        assert!(run().is_err());
        assert_eq!(progress.task(), "outer");
    }
}
