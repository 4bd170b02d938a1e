use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

use crate::collections::queue::queue_elem::{ElemInner, Membership};
use crate::collections::{Element, QueueElem, QueueError, QueueIter};


const SENTINEL: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Link {
  Forward,
  Backward,
}

struct Node<T> {
  next: usize,
  prev: usize,
  elem: Weak<ElemInner<T>>,
}

impl<T> Node<T> {
  fn detached(slot: usize, elem: Weak<ElemInner<T>>) -> Self {
    Self {
      next: slot,
      prev: slot,
      elem,
    }
  }
}

/// Circular doubly-linked list over an arena of slots. Slot 0 is the sentinel:
/// `nodes[SENTINEL].prev` is the head, `nodes[SENTINEL].next` is the tail.
struct Links<T> {
  nodes: Vec<Node<T>>,
  free: Vec<usize>,
}

impl<T> Links<T> {
  fn new() -> Self {
    Self {
      nodes: vec![Node::detached(SENTINEL, Weak::new())],
      free: Vec::new(),
    }
  }

  fn head(&self) -> usize {
    self.nodes[SENTINEL].prev
  }

  fn tail(&self) -> usize {
    self.nodes[SENTINEL].next
  }

  fn neighbour(&self, slot: usize, link: Link) -> usize {
    match link {
      Link::Forward => self.nodes[slot].next,
      Link::Backward => self.nodes[slot].prev,
    }
  }

  fn holds(&self, slot: usize, elem: *const ElemInner<T>) -> bool {
    slot != SENTINEL && slot < self.nodes.len() && ptr::eq(self.nodes[slot].elem.as_ptr(), elem)
  }

  fn link_at_tail(&mut self, elem: Weak<ElemInner<T>>) -> usize {
    let slot = match self.free.pop() {
      Some(slot) => {
        self.nodes[slot].elem = elem;
        slot
      }
      None => {
        self.nodes.push(Node::detached(self.nodes.len(), elem));
        self.nodes.len() - 1
      }
    };
    let old_tail = self.nodes[SENTINEL].next;
    self.nodes[slot].next = old_tail;
    self.nodes[slot].prev = SENTINEL;
    self.nodes[old_tail].prev = slot;
    self.nodes[SENTINEL].next = slot;
    slot
  }

  fn unlink(&mut self, slot: usize) -> Weak<ElemInner<T>> {
    assert_ne!(slot, SENTINEL, "the sentinel is never unlinked");
    let (next, prev) = (self.nodes[slot].next, self.nodes[slot].prev);
    self.nodes[prev].next = next;
    self.nodes[next].prev = prev;
    let node = &mut self.nodes[slot];
    node.next = slot;
    node.prev = slot;
    self.free.push(slot);
    std::mem::take(&mut node.elem)
  }
}

pub(crate) struct QueueShared<T> {
  links: ReentrantMutex<RefCell<Links<T>>>,
  len: AtomicUsize,
}

impl<T> QueueShared<T> {
  /// Unlinks `slot` if it still holds `elem`. Used when an element is dropped while queued.
  pub(crate) fn detach_slot(&self, slot: usize, elem: *const ElemInner<T>) {
    let guard = self.links.lock();
    let mut links = guard.borrow_mut();
    if links.holds(slot, elem) {
      let _released = links.unlink(slot);
      self.len.fetch_sub(1, Ordering::Relaxed);
    }
  }
}

impl<T> Drop for QueueShared<T> {
  fn drop(&mut self) {
    let links = self.links.get_mut().get_mut();
    for node in links.nodes.iter().skip(1) {
      if let Some(inner) = node.elem.upgrade() {
        *inner.membership.lock() = None;
      }
    }
  }
}

/// A thread-safe intrusive FIFO queue of [`QueueElem`]s.<br/>
///
/// Elements are enqueued at the tail and dequeued from the head in O(1); any member can be
/// removed in O(1) regardless of position. The queue never owns its elements: it only holds the
/// links, and only weakly. One re-entrant mutex guards every structural change.
///
/// `Queue` is a handle; clones share the same underlying list.
pub struct Queue<T> {
  pub(crate) shared: Arc<QueueShared<T>>,
}

/// Holds a queue's mutex so a traversal is not interleaved with mutations from other threads.<br/>
/// The owning thread can keep calling queue operations while the guard is alive.
pub struct QueueLockGuard<'a, T> {
  queue: &'a Queue<T>,
  _guard: ReentrantMutexGuard<'a, RefCell<Links<T>>>,
}

impl<'a, T: Element> QueueLockGuard<'a, T> {
  pub fn iter(&self) -> QueueIter<'a, T> {
    QueueIter::new(self.queue)
  }
}

impl<T: Element> Queue<T> {
  pub fn new() -> Self {
    Self {
      shared: Arc::new(QueueShared {
        links: ReentrantMutex::new(RefCell::new(Links::new())),
        len: AtomicUsize::new(0),
      }),
    }
  }

  /// Links `elem` at the tail of this queue.
  ///
  /// # Panics
  /// If `elem` is already a member of any queue.
  pub fn enqueue(&self, elem: &QueueElem<T>) {
    if let Err(err) = self.try_enqueue(elem) {
      panic!("{}", err);
    }
  }

  pub fn try_enqueue(&self, elem: &QueueElem<T>) -> Result<(), QueueError> {
    let guard = self.shared.links.lock();
    let mut membership = elem.inner.membership.lock();
    if membership.is_some() {
      return Err(QueueError::AlreadyQueued);
    }
    let slot = guard.borrow_mut().link_at_tail(Arc::downgrade(&elem.inner));
    *membership = Some(Membership {
      queue: Arc::downgrade(&self.shared),
      slot,
    });
    let len = self.shared.len.fetch_add(1, Ordering::Relaxed) + 1;
    tracing::trace!(slot, len, "Queue enqueued element");
    Ok(())
  }

  /// Unlinks and returns the head, or `None` if the queue is empty. Never blocks on data.
  pub fn dequeue(&self) -> Option<QueueElem<T>> {
    let guard = self.shared.links.lock();
    loop {
      let (slot, released) = {
        let mut links = guard.borrow_mut();
        let head = links.head();
        if head == SENTINEL {
          return None;
        }
        (head, links.unlink(head))
      };
      let len = self.shared.len.fetch_sub(1, Ordering::Relaxed) - 1;
      // An element whose last handle is being dropped right now cannot be handed out;
      // its drop finds the slot already released.
      if let Some(inner) = released.upgrade() {
        *inner.membership.lock() = None;
        tracing::trace!(slot, len, "Queue dequeued element");
        return Some(QueueElem { inner });
      }
    }
  }

  /// Unlinks `elem` from this queue.
  ///
  /// # Panics
  /// If `elem` is not a member of this queue.
  pub fn remove(&self, elem: &QueueElem<T>) {
    if let Err(err) = self.try_remove(elem) {
      panic!("{}", err);
    }
  }

  pub fn try_remove(&self, elem: &QueueElem<T>) -> Result<(), QueueError> {
    let guard = self.shared.links.lock();
    let mut membership = elem.inner.membership.lock();
    let slot = match membership.as_ref() {
      Some(membership) if membership.belongs_to(&self.shared) => membership.slot,
      _ => return Err(QueueError::NotMember),
    };
    let _released = guard.borrow_mut().unlink(slot);
    *membership = None;
    let len = self.shared.len.fetch_sub(1, Ordering::Relaxed) - 1;
    tracing::trace!(slot, len, "Queue removed element");
    Ok(())
  }

  pub fn head(&self) -> Option<QueueElem<T>> {
    self.element_at(|links| links.head())
  }

  pub fn tail(&self) -> Option<QueueElem<T>> {
    self.element_at(|links| links.tail())
  }

  /// Number of queued elements.<br/>
  /// Not synchronized with in-flight mutations; hold [`Queue::lock`] for a consistent value.
  pub fn len(&self) -> usize {
    self.shared.len.load(Ordering::Relaxed)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Holds this queue's mutex until the guard is dropped.
  ///
  /// # Deadlocks
  /// When this queue is the inner queue of a [`BlockingQueue`](crate::collections::BlockingQueue),
  /// calling the blocking queue's methods while the guard is held inverts its lock order. Use
  /// [`BlockingQueue::lock`](crate::collections::BlockingQueue::lock) there.
  pub fn lock(&self) -> QueueLockGuard<'_, T> {
    QueueLockGuard {
      queue: self,
      _guard: self.shared.links.lock(),
    }
  }

  /// A cursor starting at the head. See [`QueueIter`] for the synchronization contract.
  pub fn iter(&self) -> QueueIter<'_, T> {
    QueueIter::new(self)
  }

  /// A cursor starting at `elem`, which must be a member of this queue.
  pub fn iter_from(&self, elem: &QueueElem<T>) -> QueueIter<'_, T> {
    QueueIter::from_element(self, Some(elem))
  }

  pub fn ptr_eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.shared, &other.shared)
  }

  pub(crate) fn neighbour_of(&self, elem: &QueueElem<T>, link: Link) -> Option<QueueElem<T>> {
    let guard = self.shared.links.lock();
    let slot = elem.slot_in(&self.shared)?;
    let inner = {
      let links = guard.borrow();
      let neighbour = links.neighbour(slot, link);
      if neighbour == SENTINEL {
        return None;
      }
      links.nodes[neighbour].elem.upgrade()
    };
    inner.map(|inner| QueueElem { inner })
  }

  fn element_at(&self, pick: impl FnOnce(&Links<T>) -> usize) -> Option<QueueElem<T>> {
    let guard = self.shared.links.lock();
    let inner = {
      let links = guard.borrow();
      let slot = pick(&links);
      if slot == SENTINEL {
        return None;
      }
      links.nodes[slot].elem.upgrade()
    };
    inner.map(|inner| QueueElem { inner })
  }
}

impl<T: Element> Default for Queue<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T> Clone for Queue<T> {
  fn clone(&self) -> Self {
    Self {
      shared: self.shared.clone(),
    }
  }
}

impl<T> Debug for Queue<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Queue")
      .field("len", &self.shared.len.load(Ordering::Relaxed))
      .finish()
  }
}
