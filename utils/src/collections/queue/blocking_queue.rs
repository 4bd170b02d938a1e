use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::collections::{
  BlockingQueueConfig, BlockingQueueConfigOption, Element, Queue, QueueElem, QueueIter, QueueLockGuard, WakePolicy,
};
use crate::concurrent::{InterruptHandler, InterruptToken};


struct Inner<T> {
  queue: Queue<T>,
  mutex: Mutex<()>,
  cond: Condvar,
  config: BlockingQueueConfig,
}

impl<T> Inner<T> {
  fn wake(&self, policy: WakePolicy) {
    match policy {
      WakePolicy::NotifyOne => {
        self.cond.notify_one();
      }
      WakePolicy::NotifyAll => {
        self.cond.notify_all();
      }
    }
  }
}

impl<T> InterruptHandler for Inner<T>
where
  T: Send + Sync,
{
  fn on_interrupt(&self) {
    // Taking the mutex orders the notification after the waiter has started waiting.
    let _guard = self.mutex.lock();
    self.cond.notify_all();
  }
}

/// A [`Queue`] with a consumer side that can sleep until an element arrives.
///
/// The blocking queue has its own mutex and condition variable, separate from the inner
/// queue's lock. Each enqueue wakes waiters according to the configured [`WakePolicy`]:
/// with `NotifyOne` at least one blocked consumer makes progress per enqueue, but which one is
/// not specified.
pub struct BlockingQueue<T> {
  inner: Arc<Inner<T>>,
}

impl<T: Element> BlockingQueue<T> {
  pub fn new() -> Self {
    Self::with_config(BlockingQueueConfig::default())
  }

  pub fn with_config(config: BlockingQueueConfig) -> Self {
    Self {
      inner: Arc::new(Inner {
        queue: Queue::new(),
        mutex: Mutex::new(()),
        cond: Condvar::new(),
        config,
      }),
    }
  }

  pub fn from_options(options: impl IntoIterator<Item = BlockingQueueConfigOption>) -> Self {
    Self::with_config(BlockingQueueConfig::from(options))
  }

  pub fn config(&self) -> &BlockingQueueConfig {
    &self.inner.config
  }

  /// The underlying queue. Mutating it directly bypasses the wake-up of blocked consumers.
  ///
  /// # Deadlocks
  /// Do not call methods of this `BlockingQueue` while holding the inner queue's
  /// [`Queue::lock`]: they take the blocking mutex first and the queue mutex second. Traverse
  /// through [`BlockingQueue::lock`] instead.
  pub fn queue(&self) -> &Queue<T> {
    &self.inner.queue
  }

  pub fn len(&self) -> usize {
    self.inner.queue.len()
  }

  pub fn is_empty(&self) -> bool {
    self.inner.queue.is_empty()
  }

  /// Enqueues `elem` and wakes blocked consumers.
  ///
  /// # Panics
  /// If `elem` is already a member of any queue.
  pub fn enqueue(&self, elem: &QueueElem<T>) {
    let _guard = self.inner.mutex.lock();
    self.inner.queue.enqueue(elem);
    self.inner.wake(self.inner.config.wake_policy);
  }

  /// Takes the blocking mutex, then the inner queue's mutex, so a traversal can't interleave
  /// with producers or consumers on other threads. Mutate through the guard while it is held.
  ///
  /// # Deadlocks
  /// The blocking mutex is not re-entrant: the holder must not call this `BlockingQueue`'s own
  /// methods until the guard is dropped.
  pub fn lock(&self) -> BlockingQueueLockGuard<'_, T> {
    let blocking = self.inner.mutex.lock();
    BlockingQueueLockGuard {
      queue: self.inner.queue.lock(),
      inner: &self.inner,
      _blocking: blocking,
    }
  }

  /// Pops the head without waiting.
  pub fn dequeue(&self) -> Option<QueueElem<T>> {
    let _guard = self.inner.mutex.lock();
    self.inner.queue.dequeue()
  }

  /// Pops the head, waiting up to `timeout` for one to arrive.
  ///
  /// `None` as the timeout waits until an element arrives or `token` is interrupted.
  /// Returns `None` on timeout or interruption. A timeout too large to form a deadline
  /// (such as `Duration::MAX`) waits like `None`.
  pub fn dequeue_blocking(&self, token: &InterruptToken, timeout: Option<Duration>) -> Option<QueueElem<T>> {
    // A deadline past what `Instant` can represent waits without one.
    let deadline = timeout.and_then(|timeout| Instant::now().checked_add(timeout));
    let mut guard = self.inner.mutex.lock();
    let _registration = token.register(self.inner.clone());
    loop {
      if let Some(elem) = self.inner.queue.dequeue() {
        return Some(elem);
      }
      if token.is_interrupted() {
        tracing::debug!(queue = %self.inner.config.name, token = ?token.name(), "BlockingQueue wait interrupted");
        return None;
      }
      match deadline {
        Some(deadline) => {
          if Instant::now() >= deadline {
            tracing::debug!(queue = %self.inner.config.name, ?timeout, "BlockingQueue wait timed out");
            return None;
          }
          let _ = self.inner.cond.wait_until(&mut guard, deadline);
        }
        None => self.inner.cond.wait(&mut guard),
      }
    }
  }

  /// Runs [`BlockingQueue::dequeue_blocking`] on tokio's blocking pool.
  pub async fn dequeue_blocking_async(&self, token: InterruptToken, timeout: Option<Duration>) -> Option<QueueElem<T>> {
    let queue = self.clone();
    match tokio::task::spawn_blocking(move || queue.dequeue_blocking(&token, timeout)).await {
      Ok(elem) => elem,
      Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
      Err(err) => {
        tracing::error!(queue = %self.inner.config.name, error = %err, "BlockingQueue blocking dequeue was cancelled");
        None
      }
    }
  }

  /// Wakes one blocked consumer without enqueueing anything. It re-checks and goes back to sleep.
  pub fn wake_one(&self) {
    let _guard = self.inner.mutex.lock();
    self.inner.wake(WakePolicy::NotifyOne);
  }

  pub fn wake_all(&self) {
    let _guard = self.inner.mutex.lock();
    self.inner.wake(WakePolicy::NotifyAll);
  }
}

/// Both locks of a [`BlockingQueue`], taken in order. See [`BlockingQueue::lock`].
pub struct BlockingQueueLockGuard<'a, T> {
  queue: QueueLockGuard<'a, T>,
  inner: &'a Inner<T>,
  _blocking: MutexGuard<'a, ()>,
}

impl<'a, T: Element> BlockingQueueLockGuard<'a, T> {
  pub fn iter(&self) -> QueueIter<'a, T> {
    self.queue.iter()
  }

  /// Enqueues `elem` and wakes blocked consumers; they run once the guard is dropped.
  ///
  /// # Panics
  /// If `elem` is already a member of any queue.
  pub fn enqueue(&self, elem: &QueueElem<T>) {
    self.inner.queue.enqueue(elem);
    self.inner.wake(self.inner.config.wake_policy);
  }

  /// # Panics
  /// If `elem` is not a member of this queue.
  pub fn remove(&self, elem: &QueueElem<T>) {
    self.inner.queue.remove(elem);
  }

  pub fn dequeue(&self) -> Option<QueueElem<T>> {
    self.inner.queue.dequeue()
  }
}

impl<T: Element> Default for BlockingQueue<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T> Clone for BlockingQueue<T> {
  fn clone(&self) -> Self {
    Self {
      inner: self.inner.clone(),
    }
  }
}

impl<T> Debug for BlockingQueue<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("BlockingQueue")
      .field("name", &self.inner.config.name)
      .field("queue", &self.inner.queue)
      .finish()
  }
}
