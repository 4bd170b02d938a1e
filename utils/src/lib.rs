pub mod collections;
pub mod concurrent;

pub use collections::{
  BlockingQueue, BlockingQueueConfig, BlockingQueueConfigOption, BlockingQueueLockGuard, Element, Queue, QueueElem,
  QueueError, QueueIter, QueueLockGuard, WakePolicy,
};
pub use concurrent::{InterruptHandler, InterruptRegistration, InterruptToken};

pub mod prelude {
  pub use super::{
    BlockingQueue, BlockingQueueConfig, BlockingQueueConfigOption, Element, InterruptToken, Queue, QueueElem,
    QueueError, QueueIter, WakePolicy,
  };
}
