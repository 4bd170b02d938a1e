use thiserror::Error;

/// Contract violations detected by the intrusive queues.<br/>
/// The panicking operations (`enqueue`, `remove`) raise these as assertion failures; the `try_*`
/// variants hand them back to the caller instead.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
  #[error("Element is already a member of a queue")]
  AlreadyQueued,
  #[error("Element is not a member of this queue")]
  NotMember,
  #[error("Element was dropped while still a member of a queue")]
  DroppedWhileQueued,
}
