//! Shared FIFO of pending pages
//!
//! Page numbers and shutdown signals travel through the same queue. A blocked
//! `dequeue` is only ever released by an enqueue, which is why shutdown is
//! delivered as one `Task::Shutdown` per worker.

use crate::state::PageNumber;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::{watch, Notify};

/// A unit of work pulled by a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Fetch this page
    Page(PageNumber),

    /// Poison value: the consuming worker terminates
    Shutdown,
}

/// Thread-safe FIFO task queue with blocking dequeue
#[derive(Debug)]
pub struct TaskQueue {
    items: Mutex<VecDeque<Task>>,
    available: Notify,
    depth: watch::Sender<usize>,
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskQueue {
    /// Creates an empty queue
    pub fn new() -> Self {
        let (depth, _) = watch::channel(0);
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Notify::new(),
            depth,
        }
    }

    /// Creates a queue holding the pages of `range`, in ascending order
    pub fn with_pages(range: std::ops::Range<PageNumber>) -> Self {
        let queue = Self::new();
        {
            let mut items = queue.lock();
            items.extend(range.map(Task::Page));
            queue.publish_depth(items.len());
        }
        queue
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Task>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish_depth(&self, len: usize) {
        self.depth.send_replace(len);
    }

    /// Appends a task and wakes one waiting consumer
    pub fn enqueue(&self, task: Task) {
        {
            let mut items = self.lock();
            items.push_back(task);
            self.publish_depth(items.len());
        }
        self.available.notify_one();
    }

    /// Removes the oldest task without blocking
    pub fn try_dequeue(&self) -> Option<Task> {
        let mut items = self.lock();
        let task = items.pop_front();
        if task.is_some() {
            self.publish_depth(items.len());
        }
        task
    }

    /// Waits until a task is available and returns the oldest one
    ///
    /// Each task is handed to exactly one caller.
    pub async fn dequeue(&self) -> Task {
        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            // Register interest before checking so an enqueue between the
            // check and the await is not missed.
            notified.as_mut().enable();

            if let Some(task) = self.try_dequeue() {
                return task;
            }

            notified.await;
        }
    }

    /// Empties the queue without blocking, returning the number of discarded tasks
    pub fn try_dequeue_all(&self) -> usize {
        let mut items = self.lock();
        let discarded = items.len();
        items.clear();
        self.publish_depth(0);
        discarded
    }

    /// Number of queued tasks
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Resolves once the queue holds no tasks
    pub async fn wait_until_empty(&self) {
        let mut depth = self.depth.subscribe();
        let _ = depth.wait_for(|len| *len == 0).await;
    }
}
