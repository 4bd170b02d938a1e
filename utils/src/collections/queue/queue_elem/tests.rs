use std::sync::{Arc, Weak};
use std::thread;

use crate::collections::{Queue, QueueElem};

#[derive(Debug)]
struct Task {
  id: u32,
  elem: QueueElem<Weak<Task>>,
}

impl Task {
  fn new(id: u32) -> Arc<Self> {
    Arc::new_cyclic(|weak| Task {
      id,
      elem: QueueElem::with_enclosing_object(weak.clone()),
    })
  }
}

#[test]
fn test_new_element_is_unqueued() {
  let elem = QueueElem::<u32>::new();
  let queue = Queue::new();
  assert!(!elem.is_member_of_any_queue());
  assert!(!elem.is_member(&queue));
  assert!(elem.in_queue().is_none());
  assert!(elem.next().is_none());
  assert!(elem.prev().is_none());
  assert_eq!(elem.enclosing_object(), None);
}

#[test]
fn test_enclosing_object_accessors() {
  let elem = QueueElem::with_enclosing_object("first".to_string());
  assert_eq!(elem.enclosing_object().as_deref(), Some("first"));

  elem.set_enclosing_object("second".to_string());
  assert_eq!(elem.read_enclosing_object(|obj| obj.map(|s| s.len())), Some(6));

  assert_eq!(elem.take_enclosing_object().as_deref(), Some("second"));
  assert_eq!(elem.enclosing_object(), None);
}

#[test]
fn test_enclosing_object_leads_back_to_owner() {
  let queue = Queue::new();
  let tasks = (1..=3).map(Task::new).collect::<Vec<_>>();
  for task in &tasks {
    queue.enqueue(&task.elem);
  }

  let mut ids = Vec::new();
  while let Some(elem) = queue.dequeue() {
    let owner = elem.enclosing_object().and_then(|weak| weak.upgrade()).unwrap();
    ids.push(owner.id);
  }
  assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn test_next_and_prev_follow_the_links() {
  let queue = Queue::new();
  let a = QueueElem::with_enclosing_object('a');
  let b = QueueElem::with_enclosing_object('b');
  let c = QueueElem::with_enclosing_object('c');
  for elem in [&a, &b, &c] {
    queue.enqueue(elem);
  }

  assert_eq!(b.next(), Some(a.clone()));
  assert_eq!(b.prev(), Some(c.clone()));
  assert_eq!(a.next(), None);
  assert_eq!(c.prev(), None);

  queue.remove(&b);
  assert_eq!(b.next(), None);
  assert_eq!(a.prev(), Some(c.clone()));
  assert_eq!(c.next(), Some(a.clone()));

  queue.remove(&a);
  queue.remove(&c);
}

#[test]
fn test_remove_delegates_to_owning_queue() {
  let queue = Queue::new();
  let elem = QueueElem::with_enclosing_object(1u32);
  assert!(!elem.remove());

  queue.enqueue(&elem);
  assert!(elem.remove());
  assert!(queue.is_empty());
  assert!(!elem.is_member_of_any_queue());
  assert!(!elem.remove());
}

#[test]
fn test_remove_follows_element_between_queues() {
  let first = Queue::new();
  let second = Queue::new();
  let elem = QueueElem::with_enclosing_object(7u32);
  first.enqueue(&elem);

  first.remove(&elem);
  second.enqueue(&elem);
  assert!(elem.remove());
  assert!(!elem.is_member_of_any_queue());
  assert!(second.is_empty());
}

#[test]
fn test_remove_while_element_moves_between_queues() {
  let first = Queue::new();
  let second = Queue::new();
  let elem = QueueElem::with_enclosing_object(8u32);
  first.enqueue(&elem);

  let mover = {
    let (first, second) = (first.clone(), second.clone());
    thread::spawn(move || {
      let mut moves = 0usize;
      loop {
        if let Some(elem) = first.dequeue() {
          second.enqueue(&elem);
        } else if let Some(elem) = second.dequeue() {
          first.enqueue(&elem);
        } else {
          return moves;
        }
        moves += 1;
      }
    })
  };

  while !elem.remove() {
    thread::yield_now();
  }
  mover.join().unwrap();

  assert!(!elem.is_member_of_any_queue());
  assert!(first.is_empty());
  assert!(second.is_empty());
}

#[test]
fn test_owner_handle_as_enclosing_object() {
  let owner = Arc::new("owner".to_string());
  let elem = QueueElem::with_enclosing_object(owner.clone());
  let queue = Queue::new();
  queue.enqueue(&elem);

  let head = queue.dequeue().unwrap();
  assert!(Arc::ptr_eq(&head.enclosing_object().unwrap(), &owner));
}

#[test]
fn test_clones_are_the_same_element() {
  let queue = Queue::new();
  let elem = QueueElem::with_enclosing_object(1u32);
  let alias = elem.clone();
  queue.enqueue(&elem);

  assert!(alias.is_member(&queue));
  assert_eq!(alias, elem);
  assert_ne!(QueueElem::with_enclosing_object(1u32), elem);
  assert!(alias.remove());
  assert!(!elem.is_member_of_any_queue());
}

#[test]
fn test_in_queue_after_queue_handle_dropped() {
  let elem = QueueElem::with_enclosing_object(1u32);
  let queue = Queue::new();
  queue.enqueue(&elem);

  let held = elem.in_queue().unwrap();
  drop(queue);
  assert!(elem.is_member(&held));
  assert!(elem.remove());
}
