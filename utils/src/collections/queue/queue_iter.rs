use crate::collections::queue::intrusive_queue::Link;
use crate::collections::{Element, Queue, QueueElem, QueueError};


/// A cursor walking a [`Queue`] from head to tail.
///
/// The cursor does not serialize the traversal against other threads: each step is a short
/// locked read, but elements may be added or removed between steps. For a consistent walk,
/// hold [`Queue::lock`] for the duration of the traversal. The same thread may still remove
/// the current element, after which it must call [`QueueIter::reset`] (advancing from a removed
/// element ends the traversal).
#[derive(Debug)]
pub struct QueueIter<'a, T> {
  queue: &'a Queue<T>,
  current: Option<QueueElem<T>>,
}

impl<'a, T: Element> QueueIter<'a, T> {
  pub fn new(queue: &'a Queue<T>) -> Self {
    Self {
      queue,
      current: queue.head(),
    }
  }

  /// Starts at `start`; `None` yields a cursor that is already done.
  ///
  /// # Panics
  /// If `start` is not a member of `queue`.
  pub fn from_element(queue: &'a Queue<T>, start: Option<&QueueElem<T>>) -> Self {
    if let Some(elem) = start {
      assert!(elem.is_member(queue), "{}", QueueError::NotMember);
    }
    Self {
      queue,
      current: start.cloned(),
    }
  }

  pub fn current(&self) -> Option<&QueueElem<T>> {
    self.current.as_ref()
  }

  pub fn is_done(&self) -> bool {
    self.current.is_none()
  }

  /// Moves one step toward the tail.
  pub fn advance(&mut self) {
    self.current = match self.current.take() {
      Some(current) => self.queue.neighbour_of(&current, Link::Backward),
      None => None,
    };
  }

  pub fn reset(&mut self) {
    self.current = self.queue.head();
  }
}

impl<T: Element> Iterator for QueueIter<'_, T> {
  type Item = QueueElem<T>;

  fn next(&mut self) -> Option<Self::Item> {
    let current = self.current.clone()?;
    self.advance();
    Some(current)
  }
}
