use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;


/// Something a thread can be blocked in that knows how to wake it up.
pub trait InterruptHandler: Send + Sync {
  fn on_interrupt(&self);
}

struct Registered {
  id: u64,
  handler: Arc<dyn InterruptHandler>,
}

struct Inner {
  name: Option<String>,
  interrupted: AtomicBool,
  next_registration: AtomicU64,
  registered: Mutex<Option<Registered>>,
}

/// Identifies a worker thread to the waits it blocks in, so that a shutdown path can
/// interrupt them.
///
/// A worker passes its token to [`BlockingQueue::dequeue_blocking`](crate::collections::BlockingQueue::dequeue_blocking);
/// calling [`InterruptToken::interrupt`] from any thread makes that wait return `None` promptly.
/// The flag stays set until [`InterruptToken::clear`] is called.
#[derive(Clone)]
pub struct InterruptToken {
  inner: Arc<Inner>,
}

impl InterruptToken {
  pub fn new() -> Self {
    Self::with_name(None)
  }

  pub fn named(name: impl Into<String>) -> Self {
    Self::with_name(Some(name.into()))
  }

  fn with_name(name: Option<String>) -> Self {
    Self {
      inner: Arc::new(Inner {
        name,
        interrupted: AtomicBool::new(false),
        next_registration: AtomicU64::new(0),
        registered: Mutex::new(None),
      }),
    }
  }

  pub fn name(&self) -> Option<&str> {
    self.inner.name.as_deref()
  }

  pub fn is_interrupted(&self) -> bool {
    self.inner.interrupted.load(Ordering::SeqCst)
  }

  /// Sets the flag, then wakes the wait currently registered on this token, if any.
  pub fn interrupt(&self) {
    self.inner.interrupted.store(true, Ordering::SeqCst);
    let handler = self
      .inner
      .registered
      .lock()
      .as_ref()
      .map(|registered| registered.handler.clone());
    tracing::debug!(token = ?self.name(), waiting = handler.is_some(), "InterruptToken interrupted");
    if let Some(handler) = handler {
      handler.on_interrupt();
    }
  }

  pub fn clear(&self) {
    self.inner.interrupted.store(false, Ordering::SeqCst);
  }

  /// Installs `handler` as the wait to wake on interruption, replacing any previous one.<br/>
  /// The handler is uninstalled when the returned registration is dropped.
  ///
  /// Register before checking [`InterruptToken::is_interrupted`]; the other order can miss an
  /// interrupt that lands in between.
  pub fn register(&self, handler: Arc<dyn InterruptHandler>) -> InterruptRegistration<'_> {
    let id = self.inner.next_registration.fetch_add(1, Ordering::Relaxed);
    *self.inner.registered.lock() = Some(Registered { id, handler });
    InterruptRegistration { token: self, id }
  }

  pub fn ptr_eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }
}

impl Default for InterruptToken {
  fn default() -> Self {
    Self::new()
  }
}

impl Debug for InterruptToken {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("InterruptToken")
      .field("name", &self.inner.name)
      .field("interrupted", &self.is_interrupted())
      .finish()
  }
}

impl PartialEq for InterruptToken {
  fn eq(&self, other: &Self) -> bool {
    self.ptr_eq(other)
  }
}

impl Eq for InterruptToken {}

/// Keeps a handler installed on an [`InterruptToken`] for as long as it lives.
#[must_use = "the handler is uninstalled as soon as the registration is dropped"]
pub struct InterruptRegistration<'a> {
  token: &'a InterruptToken,
  id: u64,
}

impl Drop for InterruptRegistration<'_> {
  fn drop(&mut self) {
    let mut registered = self.token.inner.registered.lock();
    if registered.as_ref().is_some_and(|registered| registered.id == self.id) {
      *registered = None;
    }
  }
}
