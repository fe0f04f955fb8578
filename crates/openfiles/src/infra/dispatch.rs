//! Single-threaded UI task queue.
//!
//! Host callbacks may arrive while the UI is in the middle of other work, so they never touch
//! panel state directly. They post a task here and the owner of the UI thread drains the queue.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// Cloneable handle to a FIFO of deferred UI tasks.
#[derive(Clone, Default)]
pub struct UiQueue {
    tasks: Arc<Mutex<VecDeque<UiTask>>>,
}

impl UiQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a task to run on the next drain.
    pub fn post(&self, task: impl FnOnce() + Send + 'static) {
        self.tasks.lock().push_back(Box::new(task));
    }

    /// Run queued tasks in order until the queue is empty, including tasks posted while
    /// draining. Returns the number of tasks run.
    pub fn drain(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = self.tasks.lock().pop_front();
            match next {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }
        if ran > 0 {
            tracing::trace!(tasks = ran, "drained ui queue");
        }
        ran
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }
}

impl fmt::Debug for UiQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiQueue")
            .field("pending", &self.len())
            .finish()
    }
}
