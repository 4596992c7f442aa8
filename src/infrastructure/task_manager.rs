use std::collections::HashMap;
use std::future::Future;
use tokio::task::JoinHandle;

/// Manages named background tasks with proper lifecycle handling.
///
/// Spawning under a name that is already tracked aborts the previous task.
/// Dropping the manager aborts everything it still tracks.
pub struct TaskManager {
    handles: HashMap<&'static str, JoinHandle<()>>,
}

impl TaskManager {
    /// Create a new empty task manager
    pub fn new() -> Self {
        Self {
            handles: HashMap::new(),
        }
    }

    /// Spawn a task and track it under `name`
    pub fn spawn<F>(&mut self, name: &'static str, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(future);
        if let Some(previous) = self.handles.insert(name, handle) {
            previous.abort();
        }
    }

    /// Abort a single task
    pub fn abort(&mut self, name: &str) {
        if let Some(handle) = self.handles.remove(name) {
            handle.abort();
        }
    }

    /// Stop tracking a task without aborting it.
    ///
    /// A task calls this on its own name before doing work that may replace
    /// or abort tasks, so it never cancels itself.
    pub fn detach(&mut self, name: &str) {
        self.handles.remove(name);
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.handles
            .get(name)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Abort all tasks without waiting
    pub fn abort_all(&mut self) {
        for (_, handle) in self.handles.drain() {
            handle.abort();
        }
    }
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        self.abort_all();
    }
}
