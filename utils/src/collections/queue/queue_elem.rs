use std::fmt::{Debug, Formatter};
use std::ptr;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::collections::queue::intrusive_queue::{Link, QueueShared};
use crate::collections::{Element, Queue, QueueError};

#[cfg(test)]
mod tests;

pub(crate) struct Membership<T> {
  pub(crate) queue: Weak<QueueShared<T>>,
  pub(crate) slot: usize,
}

impl<T> Membership<T> {
  pub(crate) fn belongs_to(&self, shared: &Arc<QueueShared<T>>) -> bool {
    ptr::eq(self.queue.as_ptr(), Arc::as_ptr(shared))
  }
}

pub(crate) struct ElemInner<T> {
  enclosing_object: RwLock<Option<T>>,
  pub(crate) membership: Mutex<Option<Membership<T>>>,
}

/// A link node that an owner embeds in its own structure to make it queueable.<br/>
///
/// The handle is cheap to clone; clones refer to the same node. The enclosing object is an
/// arbitrary value the owner attaches so it can get back to its own structure from a bare
/// element (typically an id or a `Weak` to the owner). Queues never look at it.
///
/// An element is a member of at most one [`Queue`] at a time. Dropping the last handle of an
/// element that is still queued detaches it and then panics: remove it first.
pub struct QueueElem<T> {
  pub(crate) inner: Arc<ElemInner<T>>,
}

impl<T: Element> QueueElem<T> {
  pub fn new() -> Self {
    Self::from_enclosing_object(None)
  }

  pub fn with_enclosing_object(enclosing_object: T) -> Self {
    Self::from_enclosing_object(Some(enclosing_object))
  }

  fn from_enclosing_object(enclosing_object: Option<T>) -> Self {
    Self {
      inner: Arc::new(ElemInner {
        enclosing_object: RwLock::new(enclosing_object),
        membership: Mutex::new(None),
      }),
    }
  }

  /// Returns whether this element is currently linked into `queue`.
  pub fn is_member(&self, queue: &Queue<T>) -> bool {
    self.slot_in(&queue.shared).is_some()
  }

  pub fn is_member_of_any_queue(&self) -> bool {
    self.inner.membership.lock().is_some()
  }

  pub fn enclosing_object(&self) -> Option<T>
  where
    T: Clone, {
    self.inner.enclosing_object.read().clone()
  }

  /// Runs `f` against the enclosing object without cloning it.
  pub fn read_enclosing_object<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
    let guard = self.inner.enclosing_object.read();
    f(guard.as_ref())
  }

  pub fn set_enclosing_object(&self, enclosing_object: T) {
    *self.inner.enclosing_object.write() = Some(enclosing_object);
  }

  pub fn take_enclosing_object(&self) -> Option<T> {
    self.inner.enclosing_object.write().take()
  }

  /// The element reached through the forward link, i.e. the one enqueued just before this one.<br/>
  /// `None` when this element is unqueued or sits at the head.
  pub fn next(&self) -> Option<QueueElem<T>> {
    self.neighbour(Link::Forward)
  }

  /// The element reached through the backward link, i.e. the one enqueued just after this one.<br/>
  /// `None` when this element is unqueued or sits at the tail.
  pub fn prev(&self) -> Option<QueueElem<T>> {
    self.neighbour(Link::Backward)
  }

  fn neighbour(&self, link: Link) -> Option<QueueElem<T>> {
    let queue = self.in_queue()?;
    queue.neighbour_of(self, link)
  }

  pub fn in_queue(&self) -> Option<Queue<T>> {
    let membership = self.inner.membership.lock();
    membership
      .as_ref()
      .and_then(|membership| membership.queue.upgrade())
      .map(|shared| Queue { shared })
  }

  /// Removes this element from whichever queue holds it.<br/>
  /// Returns `false` (and does nothing) if it was not queued.
  pub fn remove(&self) -> bool {
    // Membership can change between looking up the queue and locking it; look again.
    loop {
      let Some(queue) = self.in_queue() else {
        return false;
      };
      if queue.try_remove(self).is_ok() {
        return true;
      }
    }
  }

  pub fn ptr_eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }

  pub(crate) fn slot_in(&self, shared: &Arc<QueueShared<T>>) -> Option<usize> {
    let membership = self.inner.membership.lock();
    membership
      .as_ref()
      .filter(|membership| membership.belongs_to(shared))
      .map(|membership| membership.slot)
  }
}

impl<T: Element> Default for QueueElem<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T> Clone for QueueElem<T> {
  fn clone(&self) -> Self {
    Self {
      inner: self.inner.clone(),
    }
  }
}

impl<T> PartialEq for QueueElem<T> {
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }
}

impl<T> Eq for QueueElem<T> {}

impl<T: Debug> Debug for QueueElem<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("QueueElem")
      .field("enclosing_object", &*self.inner.enclosing_object.read())
      .field("queued", &self.inner.membership.lock().is_some())
      .finish()
  }
}

impl<T> Drop for ElemInner<T> {
  fn drop(&mut self) {
    let Some(membership) = self.membership.get_mut().take() else {
      return;
    };
    if let Some(queue) = membership.queue.upgrade() {
      queue.detach_slot(membership.slot, self as *const Self);
    }
    tracing::error!(slot = membership.slot, "{}", QueueError::DroppedWhileQueued);
    if !std::thread::panicking() {
      panic!("{}", QueueError::DroppedWhileQueued);
    }
  }
}
